mod common;

use std::sync::Arc;

use chrono::Duration;

use common::faults::{FaultyMarketStore, FlakyNotificationStore};
use common::{Harness, t0};
use tradepost_infra::{Change, ChangeSet, MarketStore, SweepSummary};
use tradepost_notifications::{NotificationKind, NotificationPayload, Recipient};

#[test]
fn closing_a_listing_that_takes_all_stock_removes_the_item() {
    let h = Harness::new();
    let item = h.stock("BEANS", "Baked Beans", 5);
    let closes = t0() + Duration::days(1);
    let listing = h.list(&item, 5, closes);

    let swept_at = closes + Duration::hours(1);
    let summary = h.market.run_sweep(swept_at).unwrap();
    assert_eq!(summary.listings_closed, 1);
    assert_eq!(summary.failures, 0);

    let store = h.market.store();
    let sale = store.sale(listing.id).unwrap().expect("sale recorded");
    assert_eq!(sale.quantity, 5);
    assert_eq!(sale.price, 500);
    assert_eq!(sale.date_sold, swept_at);
    assert_eq!(sale.closes, closes);
    assert_eq!(sale.product.name, "Baked Beans");
    assert_eq!(sale.business_name, "Sally's Pantry");
    assert!(store.listing(listing.id).unwrap().is_none());
    assert!(store.inventory_item(item.id).unwrap().is_none());

    let completed = h.inbox_of_kind(Recipient::Business(h.business.id), NotificationKind::SaleCompleted);
    assert_eq!(completed.len(), 1);
}

#[test]
fn partial_sale_keeps_the_remaining_stock() {
    let h = Harness::new();
    let item = h.stock("MILK", "Whole Milk", 8);
    let listing = h.list(&item, 3, t0() + Duration::hours(2));

    h.market.run_sweep(t0() + Duration::hours(3)).unwrap();

    let store = h.market.store();
    assert!(store.sale(listing.id).unwrap().is_some());
    assert_eq!(store.inventory_item(item.id).unwrap().unwrap().quantity, 5);
}

#[test]
fn listings_not_yet_due_are_left_alone() {
    let h = Harness::new();
    let item = h.stock("MILK", "Whole Milk", 8);
    let listing = h.list(&item, 3, t0() + Duration::days(2));

    let summary = h.market.run_sweep(t0() + Duration::days(1)).unwrap();
    assert_eq!(summary.listings_closed, 0);
    assert!(h.market.store().listing(listing.id).unwrap().is_some());
}

#[test]
fn starred_likers_each_get_one_purchase_interest_notification() {
    let h = Harness::new();
    let item = h.stock("BEANS", "Baked Beans", 10);
    let closes = t0() + Duration::days(1);
    let listing = h.list(&item, 4, closes);

    let ann = h.user("Ann");
    let bob = h.user("Bob");
    let cat = h.user("Cat");
    for user in [&ann, &bob, &cat] {
        h.market.like_listing(&user.actor(), listing.id).unwrap();
    }
    h.market.star_listing(&ann.actor(), listing.id, true).unwrap();
    h.market.star_listing(&bob.actor(), listing.id, true).unwrap();

    h.market.run_sweep(closes + Duration::minutes(5)).unwrap();

    for user in [&ann, &bob] {
        let interest = h.inbox_of_kind(Recipient::User(user.id), NotificationKind::PurchaseInterest);
        assert_eq!(interest.len(), 1);
        match &interest[0].payload {
            NotificationPayload::PurchaseInterest { listing: snapshot } => {
                assert_eq!(snapshot.product_name, "Baked Beans");
                assert_eq!(snapshot.listing_id, listing.id);
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }
    assert!(h.inbox(Recipient::User(cat.id)).is_empty());
    assert!(h.market.store().likes_for_listing(listing.id).unwrap().is_empty());
    assert!(h.market.liked_listings(&ann.actor()).unwrap().is_empty());
}

#[test]
fn sweeping_twice_changes_nothing_the_second_time() {
    let h = Harness::new();
    let item = h.stock("BEANS", "Baked Beans", 10);
    let closes = t0() + Duration::days(1);
    let listing = h.list(&item, 4, closes);
    let buyer = h.user("Dee");
    h.market.like_listing(&buyer.actor(), listing.id).unwrap();
    h.market.star_listing(&buyer.actor(), listing.id, true).unwrap();

    let at = closes + Duration::days(20);
    let first = h.market.run_sweep(at).unwrap();
    assert_eq!(first.listings_closed, 1);
    let buyer_inbox = h.inbox(Recipient::User(buyer.id)).len();
    let business_inbox = h.inbox(Recipient::Business(h.business.id)).len();

    let second = h.market.run_sweep(at).unwrap();
    assert_eq!(second, SweepSummary::default());
    assert_eq!(h.inbox(Recipient::User(buyer.id)).len(), buyer_inbox);
    assert_eq!(h.inbox(Recipient::Business(h.business.id)).len(), business_inbox);
    assert_eq!(h.market.store().inventory_item(item.id).unwrap().unwrap().quantity, 6);
}

#[test]
fn closing_an_already_closed_listing_is_a_no_op() {
    let h = Harness::new();
    let item = h.stock("BEANS", "Baked Beans", 10);
    let listing = h.list(&item, 4, t0() + Duration::hours(1));
    let at = t0() + Duration::hours(2);

    let lifecycle = h.market.lifecycle();
    assert!(lifecycle.close_listing(listing.id, at).unwrap().is_some());
    assert!(lifecycle.close_listing(listing.id, at).unwrap().is_none());
    assert_eq!(h.market.store().inventory_item(item.id).unwrap().unwrap().quantity, 6);
}

#[test]
fn cards_are_warned_then_deleted_at_the_end_of_their_display_period() {
    let h = Harness::new();
    let poster = h.user("Eve");
    let card = h
        .market
        .create_card(
            &poster.actor(),
            tradepost_infra::NewCard {
                section: tradepost_marketplace::Section::Exchange,
                title: "Swap: tent for kayak".to_string(),
                description: None,
                keywords: Vec::new(),
            },
        )
        .unwrap();
    let inbox = Recipient::User(poster.id);

    let early = h.market.run_sweep(t0() + Duration::days(12)).unwrap();
    assert_eq!((early.warnings, early.cards_expired), (0, 0));

    let day13 = t0() + Duration::days(13);
    let warned = h.market.run_sweep(day13).unwrap();
    assert_eq!(warned.warnings, 1);
    assert_eq!(warned.notifications_sent, 1);
    let again = h.market.run_sweep(day13 + Duration::hours(1)).unwrap();
    assert_eq!(again.notifications_sent, 0);
    assert_eq!(again.warnings, 0);
    assert_eq!(h.inbox_of_kind(inbox, NotificationKind::CardExpiringSoon).len(), 1);
    assert!(h.market.store().card(card.id).unwrap().is_some());

    let expired = h.market.run_sweep(t0() + Duration::days(14) + Duration::seconds(1)).unwrap();
    assert_eq!(expired.cards_expired, 1);
    assert!(h.market.store().card(card.id).unwrap().is_none());
    assert_eq!(h.inbox_of_kind(inbox, NotificationKind::CardDeleted).len(), 1);
}

#[test]
fn extended_cards_survive_the_sweep() {
    let h = Harness::new();
    let poster = h.user("Fay");
    let card = h
        .market
        .create_card(
            &poster.actor(),
            tradepost_infra::NewCard {
                section: tradepost_marketplace::Section::ForSale,
                title: "Lawn mower".to_string(),
                description: None,
                keywords: Vec::new(),
            },
        )
        .unwrap();

    h.advance(Duration::days(10));
    let extended = h.market.extend_card(&poster.actor(), card.id).unwrap();
    assert_eq!(extended.id, card.id);
    assert_eq!(extended.display_period_end, t0() + Duration::days(24));

    let summary = h.market.run_sweep(t0() + Duration::days(15)).unwrap();
    assert_eq!(summary.cards_expired, 0);
    assert!(h.market.store().card(card.id).unwrap().is_some());
}

#[test]
fn a_star_committed_mid_close_still_earns_purchase_interest() {
    let store = Arc::new(FaultyMarketStore::default());
    let h = Harness::with_stores(store.clone(), Arc::new(tradepost_notifications::InMemoryNotificationStore::new()));
    let item = h.stock("BEANS", "Baked Beans", 10);
    let closes = t0() + Duration::days(1);
    let listing = h.list(&item, 4, closes);
    let gus = h.user("Gus");
    let like = h.market.like_listing(&gus.actor(), listing.id).unwrap();
    assert!(!like.starred);

    store.before_next_commit(move |inner| {
        let mut starred = like.clone();
        starred.starred = true;
        inner.commit(ChangeSet::new().with(Change::PutLike(starred))).unwrap();
    });
    let summary = h.market.run_sweep(closes + Duration::minutes(1)).unwrap();

    assert_eq!(summary.listings_closed, 1);
    assert_eq!(summary.failures, 0);
    let interest = h.inbox_of_kind(Recipient::User(gus.id), NotificationKind::PurchaseInterest);
    assert_eq!(interest.len(), 1);
    assert!(h.market.store().likes_for_listing(listing.id).unwrap().is_empty());
}

#[test]
fn one_broken_listing_and_a_notification_outage_do_not_stop_the_sweep() {
    let store = Arc::new(FaultyMarketStore::default());
    let notifications = Arc::new(FlakyNotificationStore::default());
    let h = Harness::with_stores(store.clone(), notifications.clone());
    let closes = t0() + Duration::days(1);
    let good_item = h.stock("BEANS", "Baked Beans", 10);
    let good = h.list(&good_item, 4, closes);
    let broken_item = h.stock("MILK", "Whole Milk", 10);
    let broken = h.list(&broken_item, 2, closes);

    store.hide_product(broken_item.product.clone());
    notifications.set_failing(true);
    let at = closes + Duration::hours(1);
    let first = h.market.run_sweep(at).unwrap();

    assert_eq!(first.listings_closed, 1);
    assert_eq!(first.failures, 1);
    assert_eq!(first.notifications_sent, 0);
    assert!(h.market.store().sale(good.id).unwrap().is_some());
    assert!(h.market.store().listing(good.id).unwrap().is_none());
    assert!(h.market.store().sale(broken.id).unwrap().is_none());
    assert!(h.market.store().listing(broken.id).unwrap().is_some());
    assert_eq!(h.market.pending_notifications(), 1);
    assert!(h.inbox(Recipient::Business(h.business.id)).is_empty());

    store.reveal_products();
    notifications.set_failing(false);
    let second = h.market.run_sweep(at).unwrap();

    assert_eq!(second.listings_closed, 1);
    assert_eq!(second.failures, 0);
    assert_eq!(second.notifications_sent, 2);
    assert_eq!(h.market.pending_notifications(), 0);
    assert!(h.market.store().sale(broken.id).unwrap().is_some());
    let completed = h.inbox_of_kind(Recipient::Business(h.business.id), NotificationKind::SaleCompleted);
    assert_eq!(completed.len(), 2);
    assert_eq!(h.market.store().inventory_item(good_item.id).unwrap().unwrap().quantity, 6);
}
