#![allow(dead_code)]

pub mod faults;

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

use tradepost_auth::Actor;
use tradepost_core::FixedClock;
use tradepost_events::InMemoryEventBus;
use tradepost_infra::{
    InMemoryMarketStore, MarketStore, Marketplace, MarketplaceConfig, NewListing, ensure_default_admin,
};
use tradepost_marketplace::{
    Address, Business, BusinessType, InventoryItem, MarketEvent, Product, ProductKey, SaleListing, User,
};
use tradepost_notifications::{
    InMemoryNotificationStore, Notification, NotificationKind, NotificationStore, Recipient,
};

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 3, 1, 9, 0, 0).unwrap()
}

/// A marketplace with a default admin and one seller who owns one business.
pub struct Harness {
    pub market: Marketplace,
    pub clock: Arc<FixedClock>,
    pub dgaa: User,
    pub seller: User,
    pub business: Business,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_stores(
            Arc::new(InMemoryMarketStore::new()),
            Arc::new(InMemoryNotificationStore::new()),
        )
    }

    pub fn with_stores(store: Arc<dyn MarketStore>, notifications: Arc<dyn NotificationStore>) -> Self {
        let clock = Arc::new(FixedClock::new(t0()));
        let market = Marketplace::new(
            MarketplaceConfig::default(),
            clock.clone(),
            store,
            notifications,
            Arc::new(InMemoryEventBus::<MarketEvent>::new()),
        );
        let dgaa = ensure_default_admin(market.store().as_ref(), market.config(), t0())
            .unwrap()
            .unwrap();
        let seller = market.register_user("Sally", "Seller", "sally@example.com").unwrap();
        let business = market
            .register_business(
                &seller.actor(),
                "Sally's Pantry",
                BusinessType::RetailTrade,
                Address::new("New Zealand").with_city("Nelson"),
            )
            .unwrap();
        Self {
            market,
            clock,
            dgaa,
            seller,
            business,
        }
    }

    pub fn seller(&self) -> Actor {
        self.seller.actor()
    }

    pub fn user(&self, first: &str) -> User {
        let email = format!("{}@example.com", first.to_lowercase());
        self.market.register_user(first, "Tester", &email).unwrap()
    }

    /// A product plus one inventory item of it.
    pub fn stock(&self, code: &str, name: &str, quantity: u32) -> InventoryItem {
        let key = ProductKey::new(self.business.id, code).unwrap();
        self.market
            .create_product(&self.seller(), Product::new(key.clone(), name, "NZD", t0()).unwrap())
            .unwrap();
        let expires = NaiveDate::from_ymd_opt(2030, 12, 31).unwrap();
        self.market
            .create_inventory_item(&self.seller(), InventoryItem::new(key, quantity, expires).unwrap())
            .unwrap()
    }

    pub fn list(&self, item: &InventoryItem, quantity: u32, closes: DateTime<Utc>) -> SaleListing {
        self.market
            .create_listing(
                &self.seller(),
                NewListing {
                    inventory_item_id: item.id,
                    quantity,
                    price: 100 * u64::from(quantity),
                    closes: Some(closes),
                    more_info: None,
                },
            )
            .unwrap()
    }

    pub fn inbox(&self, recipient: Recipient) -> Vec<Notification> {
        self.market.notifications().list_for(recipient).unwrap()
    }

    pub fn inbox_of_kind(&self, recipient: Recipient, kind: NotificationKind) -> Vec<Notification> {
        self.inbox(recipient)
            .into_iter()
            .filter(|n| n.kind() == kind)
            .collect()
    }

    pub fn advance(&self, by: Duration) -> DateTime<Utc> {
        self.clock.advance(by);
        self.market.now()
    }
}
