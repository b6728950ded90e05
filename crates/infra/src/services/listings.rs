use chrono::{DateTime, Utc};

use tradepost_auth::{Action, Actor, Resource, enforce};
use tradepost_core::{DomainError, DomainResult, InventoryItemId, SaleListingId};
use tradepost_marketplace::{LikedSaleListing, SaleListing, Tag, check_reservation};

use super::missing;
use crate::Marketplace;
use crate::store::{Change, ChangeSet};

/// A sale listing to open on an inventory item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewListing {
    pub inventory_item_id: InventoryItemId,
    pub quantity: u32,
    /// Total price in minor units.
    pub price: u64,
    /// Defaults to the start of the item's expiry day.
    pub closes: Option<DateTime<Utc>>,
    pub more_info: Option<String>,
}

impl Marketplace {
    pub fn create_listing(&self, actor: &Actor, request: NewListing) -> DomainResult<SaleListing> {
        let id = self.with_conflict_retry("create_listing", || {
            let item = self.load_inventory_item(request.inventory_item_id)?;
            let business = self.load_business(item.business_id())?;
            enforce(actor, Action::Modify, Resource::Business(&business))?;

            check_reservation(&item, self.reserved_units(item.id)?, request.quantity)?;
            let mut listing = SaleListing::open(&item, request.quantity, request.price, request.closes, self.now())?;
            if let Some(info) = &request.more_info {
                listing = listing.with_more_info(info.clone());
            }

            let id = listing.id;
            self.store.commit(ChangeSet::new().with(Change::InsertListing(listing)))?;
            Ok(id)
        })?;

        tracing::info!(listing_id = %id, actor = %actor.id, "sale listing opened");
        self.load_listing(id)
    }

    /// Closed listings are gone, so liking one is a not-found.
    pub fn like_listing(&self, actor: &Actor, listing_id: SaleListingId) -> DomainResult<LikedSaleListing> {
        self.load_listing(listing_id)?;
        if self.find_like(actor, listing_id)?.is_some() {
            return Err(DomainError::conflict(format!("listing {listing_id} is already liked")));
        }
        let like = LikedSaleListing::new(actor.id, listing_id, self.now());
        self.store.commit(ChangeSet::new().with(Change::PutLike(like.clone())))?;
        tracing::debug!(%listing_id, user_id = %actor.id, "listing liked");
        Ok(like)
    }

    pub fn unlike_listing(&self, actor: &Actor, listing_id: SaleListingId) -> DomainResult<()> {
        let like = self.require_like(actor, listing_id)?;
        self.store.commit(ChangeSet::new().with(Change::DeleteLike(like.id)))
    }

    /// Starred likes get a purchase-interest notification when the listing closes.
    pub fn star_listing(
        &self,
        actor: &Actor,
        listing_id: SaleListingId,
        starred: bool,
    ) -> DomainResult<LikedSaleListing> {
        let mut like = self.require_like(actor, listing_id)?;
        like.starred = starred;
        self.store.commit(ChangeSet::new().with(Change::PutLike(like.clone())))?;
        Ok(like)
    }

    pub fn tag_listing(
        &self,
        actor: &Actor,
        listing_id: SaleListingId,
        tag: Tag,
    ) -> DomainResult<LikedSaleListing> {
        let mut like = self.require_like(actor, listing_id)?;
        like.tag = tag;
        self.store.commit(ChangeSet::new().with(Change::PutLike(like.clone())))?;
        Ok(like)
    }

    pub fn liked_listings(&self, actor: &Actor) -> DomainResult<Vec<LikedSaleListing>> {
        self.store.likes_for_user(actor.id)
    }

    pub(crate) fn load_listing(&self, id: SaleListingId) -> DomainResult<SaleListing> {
        self.store.listing(id)?.ok_or_else(|| missing("sale listing", id))
    }

    fn find_like(&self, actor: &Actor, listing_id: SaleListingId) -> DomainResult<Option<LikedSaleListing>> {
        Ok(self
            .store
            .likes_for_user(actor.id)?
            .into_iter()
            .find(|like| like.listing_id == listing_id))
    }

    fn require_like(&self, actor: &Actor, listing_id: SaleListingId) -> DomainResult<LikedSaleListing> {
        self.find_like(actor, listing_id)?
            .ok_or_else(|| missing("liked listing", listing_id))
    }
}
