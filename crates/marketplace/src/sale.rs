//! Historical sale records.
//!
//! A [`Sale`] is written once, by the lifecycle sweep, from a listing that is
//! being closed. It copies everything it needs so that it stays meaningful
//! after the listing, and possibly the inventory item, are gone.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use tradepost_core::{BusinessId, Entity, InventoryItemId, SaleListingId};

use crate::{Business, InventoryItem, Product, SaleListing};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub manufacturer: Option<String>,
    pub recommended_retail_price: Option<u64>,
    pub currency: String,
}

impl From<&Product> for ProductSnapshot {
    fn from(product: &Product) -> Self {
        Self {
            code: product.key.code.clone(),
            name: product.name.clone(),
            description: product.description.clone(),
            manufacturer: product.manufacturer.clone(),
            recommended_retail_price: product.recommended_retail_price,
            currency: product.currency.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    /// Same id as the listing the sale was recorded from.
    pub id: SaleListingId,
    pub business_id: BusinessId,
    pub business_name: String,
    pub inventory_item_id: InventoryItemId,
    pub product: ProductSnapshot,
    pub manufactured: Option<NaiveDate>,
    pub sell_by: Option<NaiveDate>,
    pub best_before: Option<NaiveDate>,
    pub expires: NaiveDate,
    pub price: u64,
    pub quantity: u32,
    pub more_info: Option<String>,
    pub listed: DateTime<Utc>,
    pub closes: DateTime<Utc>,
    pub date_sold: DateTime<Utc>,
}

impl Sale {
    pub fn record(
        listing: &SaleListing,
        business: &Business,
        product: &Product,
        item: &InventoryItem,
        date_sold: DateTime<Utc>,
    ) -> Self {
        Self {
            id: listing.id,
            business_id: business.id,
            business_name: business.name.clone(),
            inventory_item_id: item.id,
            product: ProductSnapshot::from(product),
            manufactured: item.manufactured,
            sell_by: item.sell_by,
            best_before: item.best_before,
            expires: item.expires,
            price: listing.price,
            quantity: listing.quantity,
            more_info: listing.more_info.clone(),
            listed: listing.created,
            closes: listing.closes,
            date_sold,
        }
    }
}

impl Entity for Sale {
    type Id = SaleListingId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
