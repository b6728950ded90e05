mod common;

use std::thread;

use chrono::Duration;
use proptest::prelude::*;

use common::{Harness, t0};
use tradepost_core::DomainError;
use tradepost_infra::{MarketStore, NewListing};
use tradepost_marketplace::InventoryItem;

fn reserved(h: &Harness, item: &InventoryItem) -> u64 {
    h.market
        .store()
        .listings_for_item(item.id)
        .unwrap()
        .iter()
        .map(|l| u64::from(l.quantity))
        .sum()
}

fn request(item: &InventoryItem, quantity: u32) -> NewListing {
    NewListing {
        inventory_item_id: item.id,
        quantity,
        price: 100,
        closes: Some(t0() + Duration::days(1)),
        more_info: None,
    }
}

#[test]
fn over_reserving_is_a_conflict() {
    let h = Harness::new();
    let item = h.stock("SOAP", "Lavender Soap", 5);
    h.list(&item, 3, t0() + Duration::days(1));

    let err = h.market.create_listing(&h.seller(), request(&item, 3)).unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));

    let err = h.market.update_inventory_quantity(&h.seller(), item.id, 2).unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));

    let updated = h.market.update_inventory_quantity(&h.seller(), item.id, 9).unwrap();
    assert_eq!(updated.quantity, 9);
    h.market.create_listing(&h.seller(), request(&item, 6)).unwrap();
    assert_eq!(reserved(&h, &item), 9);
}

#[test]
fn concurrent_listings_never_over_reserve() {
    let h = Harness::new();
    let item = h.stock("SOAP", "Lavender Soap", 10);

    let outcomes: Vec<bool> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| h.market.create_listing(&h.seller(), request(&item, 3)).is_ok()))
            .collect();
        handles.into_iter().map(|handle| handle.join().unwrap()).collect()
    });

    let created = outcomes.iter().filter(|ok| **ok).count();
    assert_eq!(created, 3);
    assert_eq!(reserved(&h, &item), 9);
}

#[derive(Debug, Clone)]
enum Op {
    List(u32),
    SetQuantity(u32),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![(1u32..6).prop_map(Op::List), (1u32..12).prop_map(Op::SetQuantity)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn listings_never_exceed_stock(ops in prop::collection::vec(op(), 1..12)) {
        let h = Harness::new();
        let item = h.stock("SOAP", "Lavender Soap", 6);

        for op in ops {
            let _ = match op {
                Op::List(quantity) => h.market.create_listing(&h.seller(), request(&item, quantity)).map(|_| ()),
                Op::SetQuantity(quantity) => h.market.update_inventory_quantity(&h.seller(), item.id, quantity).map(|_| ()),
            };
            let stock = h.market.store().inventory_item(item.id).unwrap().unwrap().quantity;
            prop_assert!(reserved(&h, &item) <= u64::from(stock));
        }
    }
}
