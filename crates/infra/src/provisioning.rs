//! One-shot startup routines.

use chrono::{DateTime, Duration, Utc};

use tradepost_auth::SystemRole;
use tradepost_core::{DomainResult, ExpectedVersion};
use tradepost_marketplace::{Address, BusinessType, InventoryItem, Product, ProductKey, Section, User};

use crate::config::MarketplaceConfig;
use crate::services::{NewCard, NewListing};
use crate::store::{Change, ChangeSet, MarketStore};
use crate::Marketplace;

/// Make sure a default global application admin exists.
///
/// Idempotent: returns the newly provisioned admin, or `None` when one was
/// already there. An existing account holding the configured email is
/// promoted rather than duplicated.
pub fn ensure_default_admin(
    store: &dyn MarketStore,
    config: &MarketplaceConfig,
    now: DateTime<Utc>,
) -> DomainResult<Option<User>> {
    if !store
        .users_with_role(SystemRole::DefaultGlobalApplicationAdmin)?
        .is_empty()
    {
        tracing::debug!("default global admin already present");
        return Ok(None);
    }

    let identity = &config.default_admin;
    let (admin, expected) = match store.user_by_email(&identity.email)? {
        Some(existing) => {
            tracing::warn!(
                user_id = %existing.id,
                email = %existing.email,
                role = %existing.role.as_role(),
                "default admin email belongs to an existing account; promoting it"
            );
            let version = existing.version;
            (existing.with_role(SystemRole::DefaultGlobalApplicationAdmin), ExpectedVersion::Exact(version))
        }
        None => (
            User::new(&identity.first_name, &identity.last_name, &identity.email, now)?
                .with_role(SystemRole::DefaultGlobalApplicationAdmin),
            ExpectedVersion::Exact(0),
        ),
    };
    store.commit(ChangeSet::new().with(Change::PutUser { user: admin.clone(), expected }))?;

    tracing::error!(
        user_id = %admin.id,
        email = %admin.email,
        "no default global admin found; provisioned one"
    );
    Ok(store.user(admin.id)?)
}

/// What [`seed_demo_data`] created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub users: usize,
    pub businesses: usize,
    pub listings: usize,
    pub cards: usize,
}

/// Populate an empty marketplace with a small, self-consistent data set.
pub fn seed_demo_data(market: &Marketplace) -> DomainResult<SeedReport> {
    let now = market.now();
    let mut report = SeedReport::default();
    if market.store().user_by_email("sam.seller@tradepost.local")?.is_some() {
        tracing::info!("demo data already present");
        return Ok(report);
    }

    let seller = market.register_user("Sam", "Seller", "sam.seller@tradepost.local")?;
    let buyer = market.register_user("Bea", "Buyer", "bea.buyer@tradepost.local")?;
    report.users = 2;

    let seller_actor = seller.actor();
    let business = market.register_business(
        &seller_actor,
        "Sam's Corner Store",
        BusinessType::RetailTrade,
        Address::new("New Zealand").with_city("Christchurch"),
    )?;
    report.businesses = 1;

    let stock = [("BEANS", "Baked Beans", 24_u32, 3), ("MILK", "Whole Milk", 12, 10)];
    for (code, name, quantity, expires_in_days) in stock {
        let key = ProductKey::new(business.id, code)?;
        market.create_product(&seller_actor, Product::new(key.clone(), name, "NZD", now)?)?;
        let expires = (now + Duration::days(expires_in_days)).date_naive();
        let item = market.create_inventory_item(
            &seller_actor,
            InventoryItem::new(key, quantity, expires)?.with_price_per_item(250),
        )?;
        market.create_listing(
            &seller_actor,
            NewListing {
                inventory_item_id: item.id,
                quantity: quantity / 2,
                price: 250 * u64::from(quantity / 2),
                closes: Some(now + Duration::days(2)),
                more_info: None,
            },
        )?;
        report.listings += 1;
    }

    let buyer_actor = buyer.actor();
    let keyword = market.create_keyword(&buyer_actor, "Vintage")?;
    market.create_card(
        &buyer_actor,
        NewCard {
            section: Section::Wanted,
            title: "Vintage road bike".to_string(),
            description: Some("Steel frame, 56cm".to_string()),
            keywords: vec![keyword.id],
        },
    )?;
    report.cards = 1;

    tracing::info!(?report, "demo data seeded");
    Ok(report)
}
