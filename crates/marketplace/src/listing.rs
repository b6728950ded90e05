use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use tradepost_core::{
    BusinessId, DomainError, DomainResult, Entity, InventoryItemId, SaleListingId,
};

use crate::{Business, InventoryItem, Product};

/// An offer to sell part of an inventory item until `closes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleListing {
    pub id: SaleListingId,
    pub business_id: BusinessId,
    pub inventory_item_id: InventoryItemId,
    pub price: u64,
    pub quantity: u32,
    pub more_info: Option<String>,
    pub created: DateTime<Utc>,
    pub closes: DateTime<Utc>,
}

impl SaleListing {
    /// Open a listing on `item`.
    ///
    /// Without an explicit `closes` the listing closes when the item expires
    /// (start of the expiry day, UTC). The closing time must be in the future.
    /// The reservation invariant is not checked here; see [`check_reservation`].
    pub fn open(
        item: &InventoryItem,
        quantity: u32,
        price: u64,
        closes: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if quantity == 0 {
            return Err(DomainError::validation("listing quantity must be positive"));
        }
        let closes = closes.unwrap_or_else(|| item.expires.and_time(NaiveTime::MIN).and_utc());
        if closes <= now {
            return Err(DomainError::validation("listing must close in the future"));
        }
        Ok(Self {
            id: SaleListingId::new(),
            business_id: item.business_id(),
            inventory_item_id: item.id,
            price,
            quantity,
            more_info: None,
            created: now,
            closes,
        })
    }

    pub fn with_more_info(mut self, more_info: impl Into<String>) -> Self {
        self.more_info = Some(more_info.into());
        self
    }

    /// Eligible for closing by the sweep.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.closes <= now
    }
}

impl Entity for SaleListing {
    type Id = SaleListingId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// What remains known about a listing once it has been closed and deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingSnapshot {
    pub listing_id: SaleListingId,
    pub business_id: BusinessId,
    pub business_name: String,
    pub product_code: String,
    pub product_name: String,
    pub price: u64,
    pub quantity: u32,
    pub more_info: Option<String>,
    pub closes: DateTime<Utc>,
}

impl ListingSnapshot {
    pub fn capture(listing: &SaleListing, business: &Business, product: &Product) -> Self {
        Self {
            listing_id: listing.id,
            business_id: business.id,
            business_name: business.name.clone(),
            product_code: product.key.code.clone(),
            product_name: product.name.clone(),
            price: listing.price,
            quantity: listing.quantity,
            more_info: listing.more_info.clone(),
            closes: listing.closes,
        }
    }
}

/// Units of `item` not yet promised to other active listings.
pub fn available_for_listing(item: &InventoryItem, reserved_by_others: u64) -> u64 {
    u64::from(item.quantity).saturating_sub(reserved_by_others)
}

/// Reservation invariant: a listing may only offer what other active listings
/// on the same item have not already reserved.
pub fn check_reservation(
    item: &InventoryItem,
    reserved_by_others: u64,
    requested: u32,
) -> DomainResult<()> {
    let available = available_for_listing(item, reserved_by_others);
    if u64::from(requested) > available {
        return Err(DomainError::conflict(format!(
            "inventory item {} has {available} unreserved units, {requested} requested",
            item.id
        )));
    }
    Ok(())
}
