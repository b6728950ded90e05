use tradepost_auth::{Action, Actor, Resource, enforce};
use tradepost_core::{DomainError, DomainResult, ExpectedVersion, InventoryItemId};
use tradepost_marketplace::{InventoryItem, Product, ProductKey};

use super::missing;
use crate::Marketplace;
use crate::store::{Change, ChangeSet};

impl Marketplace {
    /// Add a product to its business's catalogue. Codes are unique per business.
    pub fn create_product(&self, actor: &Actor, product: Product) -> DomainResult<Product> {
        let business = self.load_business(product.key.business_id)?;
        enforce(actor, Action::Modify, Resource::Business(&business))?;

        let key = product.key.clone();
        self.store.commit(ChangeSet::new().with(Change::InsertProduct(product)))?;
        tracing::info!(product = %key, actor = %actor.id, "product created");
        self.load_product(&key)
    }

    pub fn create_inventory_item(&self, actor: &Actor, item: InventoryItem) -> DomainResult<InventoryItem> {
        let business = self.load_business(item.business_id())?;
        enforce(actor, Action::Modify, Resource::Business(&business))?;

        let id = item.id;
        self.store.commit(ChangeSet::new().with(Change::PutInventoryItem {
            item,
            expected: ExpectedVersion::Exact(0),
        }))?;
        tracing::info!(inventory_item_id = %id, actor = %actor.id, "inventory item created");
        self.load_inventory_item(id)
    }

    /// Set the quantity on hand. It may not drop below what active listings
    /// have reserved.
    pub fn update_inventory_quantity(
        &self,
        actor: &Actor,
        id: InventoryItemId,
        quantity: u32,
    ) -> DomainResult<InventoryItem> {
        if quantity == 0 {
            return Err(DomainError::validation("inventory quantity must be positive"));
        }
        self.with_conflict_retry("update_inventory_quantity", || {
            let mut item = self.load_inventory_item(id)?;
            let business = self.load_business(item.business_id())?;
            enforce(actor, Action::Modify, Resource::Business(&business))?;

            let reserved = self.reserved_units(id)?;
            if u64::from(quantity) < reserved {
                return Err(DomainError::conflict(format!(
                    "inventory item {id} has {reserved} units reserved by listings"
                )));
            }

            let expected = ExpectedVersion::Exact(item.version);
            item.quantity = quantity;
            if let Some(price) = item.price_per_item {
                item.total_price = Some(price.saturating_mul(u64::from(quantity)));
            }
            self.store.commit(ChangeSet::new().with(Change::PutInventoryItem { item, expected }))
        })?;
        self.load_inventory_item(id)
    }

    pub(crate) fn load_inventory_item(&self, id: InventoryItemId) -> DomainResult<InventoryItem> {
        self.store.inventory_item(id)?.ok_or_else(|| missing("inventory item", id))
    }

    pub(crate) fn load_product(&self, key: &ProductKey) -> DomainResult<Product> {
        self.store.product(key)?.ok_or_else(|| missing("product", key))
    }

    /// Units promised to active listings on the item.
    pub(crate) fn reserved_units(&self, id: InventoryItemId) -> DomainResult<u64> {
        Ok(self
            .store
            .listings_for_item(id)?
            .iter()
            .map(|l| u64::from(l.quantity))
            .sum())
    }
}
