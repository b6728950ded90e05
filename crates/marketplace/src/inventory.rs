use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use tradepost_core::{BusinessId, DomainError, DomainResult, Entity, InventoryItemId, Versioned};

use crate::ProductKey;

/// Stock of one product held by a business.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: InventoryItemId,
    pub product: ProductKey,
    pub quantity: u32,
    pub price_per_item: Option<u64>,
    pub total_price: Option<u64>,
    pub manufactured: Option<NaiveDate>,
    pub sell_by: Option<NaiveDate>,
    pub best_before: Option<NaiveDate>,
    pub expires: NaiveDate,
    pub version: u64,
}

impl InventoryItem {
    pub fn new(product: ProductKey, quantity: u32, expires: NaiveDate) -> DomainResult<Self> {
        if quantity == 0 {
            return Err(DomainError::validation("inventory quantity must be positive"));
        }
        Ok(Self {
            id: InventoryItemId::new(),
            product,
            quantity,
            price_per_item: None,
            total_price: None,
            manufactured: None,
            sell_by: None,
            best_before: None,
            expires,
            version: 0,
        })
    }

    pub fn with_price_per_item(mut self, price: u64) -> Self {
        self.price_per_item = Some(price);
        self.total_price = Some(price.saturating_mul(u64::from(self.quantity)));
        self
    }

    pub fn business_id(&self) -> BusinessId {
        self.product.business_id
    }

    /// Remove `quantity` units, returning what is left.
    pub fn deduct(&mut self, quantity: u32) -> DomainResult<u32> {
        let remaining = self.quantity.checked_sub(quantity).ok_or_else(|| {
            DomainError::conflict(format!(
                "inventory item {} holds {} but {} were requested",
                self.id, self.quantity, quantity
            ))
        })?;
        self.quantity = remaining;
        if let Some(price) = self.price_per_item {
            self.total_price = Some(price.saturating_mul(u64::from(remaining)));
        }
        Ok(remaining)
    }
}

impl Entity for InventoryItem {
    type Id = InventoryItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Versioned for InventoryItem {
    fn version(&self) -> u64 {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}
