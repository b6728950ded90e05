mod common;

use std::sync::Arc;

use common::{Harness, t0};
use tradepost_auth::{Actor, SystemRole};
use tradepost_core::{DomainError, FixedClock};
use tradepost_infra::{MarketStore, Marketplace, MarketplaceConfig, NewCard, ensure_default_admin};
use tradepost_marketplace::{Address, AdminChange, BusinessType, Section};
use tradepost_notifications::{NotificationKind, NotificationPayload, Recipient};

#[test]
fn default_admin_provisioning_is_idempotent() {
    let h = Harness::new();
    let again = ensure_default_admin(h.market.store().as_ref(), h.market.config(), h.market.now()).unwrap();
    assert!(again.is_none());

    let admins = h
        .market
        .store()
        .users_with_role(SystemRole::DefaultGlobalApplicationAdmin)
        .unwrap();
    assert_eq!(admins.len(), 1);
    assert_eq!(admins[0].id, h.dgaa.id);
}

#[test]
fn provisioning_promotes_an_account_that_already_owns_the_admin_email() {
    let market = Marketplace::in_memory(MarketplaceConfig::default(), Arc::new(FixedClock::new(t0())));
    let email = market.config().default_admin.email.clone();
    let early = market.register_user("Ivy", "Early", &email).unwrap();
    assert_eq!(early.role, SystemRole::User);

    let admin = ensure_default_admin(market.store().as_ref(), market.config(), t0())
        .unwrap()
        .expect("existing account promoted");

    assert_eq!(admin.id, early.id);
    assert_eq!(admin.role, SystemRole::DefaultGlobalApplicationAdmin);
    assert_eq!(admin.version, early.version + 1);
    let admins = market.store().users_with_role(SystemRole::DefaultGlobalApplicationAdmin).unwrap();
    assert_eq!(admins.len(), 1);
    assert!(ensure_default_admin(market.store().as_ref(), market.config(), t0()).unwrap().is_none());
}

#[test]
fn dgaa_cannot_revoke_itself_as_primary_administrator() {
    let h = Harness::new();
    let dgaa = h.dgaa.actor();
    let x = h
        .market
        .register_business(&dgaa, "Admin Co", BusinessType::NonProfitOrganisation, Address::new("New Zealand"))
        .unwrap();

    let err = h.market.remove_administrator(&dgaa, x.id, dgaa.id).unwrap_err();
    assert!(matches!(err, DomainError::State(_)));
    assert!(h.market.business(x.id).unwrap().administrators().contains(&dgaa.id));
}

#[test]
fn primary_administrator_can_remove_another_administrator() {
    let h = Harness::new();
    let helper = h.user("Hal");
    h.market.add_administrator(&h.seller(), h.business.id, helper.id).unwrap();
    assert!(h.market.store().user(helper.id).unwrap().unwrap().businesses_administered.contains(&h.business.id));

    let business = h.market.remove_administrator(&h.seller(), h.business.id, helper.id).unwrap();
    assert!(!business.administrators().contains(&helper.id));
    assert!(!h.market.store().user(helper.id).unwrap().unwrap().businesses_administered.contains(&h.business.id));

    let changes: Vec<AdminChange> = h
        .inbox_of_kind(Recipient::User(helper.id), NotificationKind::AdminStatusChanged)
        .into_iter()
        .filter_map(|n| match n.payload {
            NotificationPayload::AdminStatusChanged { change } => Some(change),
            _ => None,
        })
        .collect();
    assert_eq!(changes.len(), 2);
    assert!(changes.iter().any(|c| matches!(c, AdminChange::BusinessAdministratorRemoved { .. })));
}

#[test]
fn plain_administrators_cannot_manage_administrators() {
    let h = Harness::new();
    let helper = h.user("Ida");
    let other = h.user("Jon");
    h.market.add_administrator(&h.seller(), h.business.id, helper.id).unwrap();

    let err = h.market.add_administrator(&helper.actor(), h.business.id, other.id).unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)));
}

#[test]
fn admin_of_one_business_cannot_touch_another() {
    let h = Harness::new();
    let rival = h.user("Kim");
    let rival_business = h
        .market
        .register_business(&rival.actor(), "Kim's Kiosk", BusinessType::RetailTrade, Address::new("Australia"))
        .unwrap();
    let item = h.stock("TEA", "Green Tea", 3);

    let err = h
        .market
        .create_listing(
            &rival.actor(),
            tradepost_infra::NewListing {
                inventory_item_id: item.id,
                quantity: 1,
                price: 100,
                closes: None,
                more_info: None,
            },
        )
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)));

    let dgaa = h.dgaa.actor();
    h.market.add_administrator(&dgaa, rival_business.id, h.seller.id).unwrap();
}

#[test]
fn transfer_requires_an_existing_administrator() {
    let h = Harness::new();
    let helper = h.user("Lou");

    let err = h.market.transfer_primary_administrator(&h.seller(), h.business.id, helper.id).unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));

    h.market.add_administrator(&h.seller(), h.business.id, helper.id).unwrap();
    let business = h.market.transfer_primary_administrator(&h.seller(), h.business.id, helper.id).unwrap();
    assert!(business.administrators().contains(&h.seller.id));

    let err = h.market.remove_administrator(&h.seller(), h.business.id, helper.id).unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)));
}

#[test]
fn global_admin_grant_and_revoke() {
    let h = Harness::new();
    let dgaa = h.dgaa.actor();
    let mia = h.user("Mia");

    let err = h.market.grant_global_admin(&h.seller(), mia.id).unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)));

    let granted = h.market.grant_global_admin(&dgaa, mia.id).unwrap();
    assert_eq!(granted.role, SystemRole::GlobalApplicationAdmin);

    let err = h.market.revoke_global_admin(&dgaa, dgaa.id).unwrap_err();
    assert!(matches!(err, DomainError::State(_)));

    let revoked = h.market.revoke_global_admin(&dgaa, mia.id).unwrap();
    assert_eq!(revoked.role, SystemRole::User);
    assert_eq!(
        h.inbox_of_kind(Recipient::User(mia.id), NotificationKind::AdminStatusChanged).len(),
        2
    );
}

#[test]
fn new_keywords_notify_every_global_admin() {
    let h = Harness::new();
    let gaa = h.user("Ned");
    h.market.grant_global_admin(&h.dgaa.actor(), gaa.id).unwrap();

    let keyword = h.market.create_keyword(&h.seller(), "Organic").unwrap();
    for admin in [h.dgaa.id, gaa.id] {
        let added = h.inbox_of_kind(Recipient::User(admin), NotificationKind::KeywordAdded);
        assert_eq!(added.len(), 1);
    }
    assert!(h.inbox(Recipient::User(h.seller.id)).is_empty());

    let err = h.market.create_keyword(&h.seller(), "organic").unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));

    let err = h.market.delete_keyword(&h.seller(), keyword.id).unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)));
}

#[test]
fn deleting_a_keyword_removes_it_from_cards() {
    let h = Harness::new();
    let keyword = h.market.create_keyword(&h.seller(), "Retro").unwrap();
    let card = h
        .market
        .create_card(
            &h.seller(),
            NewCard {
                section: Section::ForSale,
                title: "Record player".to_string(),
                description: None,
                keywords: vec![keyword.id],
            },
        )
        .unwrap();

    h.market.delete_keyword(&h.dgaa.actor(), keyword.id).unwrap();
    assert!(h.market.store().card(card.id).unwrap().unwrap().keywords.is_empty());
}

#[test]
fn cards_need_existing_keywords_and_their_creator_or_an_admin() {
    let h = Harness::new();
    let missing = tradepost_core::KeywordId::new();
    let err = h
        .market
        .create_card(
            &h.seller(),
            NewCard {
                section: Section::Wanted,
                title: "Bread maker".to_string(),
                description: None,
                keywords: vec![missing],
            },
        )
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound(_)));

    let card = h
        .market
        .create_card(
            &h.seller(),
            NewCard {
                section: Section::Wanted,
                title: "Bread maker".to_string(),
                description: None,
                keywords: Vec::new(),
            },
        )
        .unwrap();
    let stranger = h.user("Ola");
    let err = h.market.delete_card(&stranger.actor(), card.id).unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)));

    h.market.delete_card(&h.dgaa.actor(), card.id).unwrap();
    assert!(h.market.store().card(card.id).unwrap().is_none());
}

#[test]
fn notifications_are_removed_by_their_recipient_or_the_dgaa() {
    let h = Harness::new();
    let helper = h.user("Pat");
    h.market.add_administrator(&h.seller(), h.business.id, helper.id).unwrap();
    let inbox = h.inbox(Recipient::User(helper.id));
    assert_eq!(inbox.len(), 1);
    let id = inbox[0].id;

    let err = h.market.notifications().remove(id, &h.seller()).unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)));

    let read = h.market.notifications().mark_read(id, &helper.actor(), true).unwrap();
    assert!(read.read);

    let dgaa = Actor::new(h.dgaa.id, SystemRole::DefaultGlobalApplicationAdmin);
    h.market.notifications().remove(id, &dgaa).unwrap();
    assert!(h.inbox(Recipient::User(helper.id)).is_empty());
}
