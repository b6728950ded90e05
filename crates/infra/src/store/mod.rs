//! Persistence gateway.
//!
//! Reads are plain getters; every write goes through [`MarketStore::commit`],
//! which applies a [`ChangeSet`] atomically: either every change lands or none
//! does. Versioned rows are checked against their [`ExpectedVersion`], and the
//! listing reservation invariant is re-checked for every inventory item the
//! change set touches, all under the store's write lock.

mod in_memory;
mod views;

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use tradepost_auth::SystemRole;
use tradepost_core::{
    BusinessId, CardId, DomainResult, ExpectedVersion, InventoryItemId, KeywordId,
    LikedSaleListingId, SaleListingId, UserId,
};
use tradepost_marketplace::{
    Business, Card, InventoryItem, Keyword, LikedSaleListing, Product, ProductKey, Sale,
    SaleListing, User,
};
use tradepost_search::{CompiledQuery, Page};

pub use in_memory::InMemoryMarketStore;

/// One row-level write.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    PutUser { user: User, expected: ExpectedVersion },
    PutBusiness { business: Business, expected: ExpectedVersion },
    /// Product codes are unique within a business.
    InsertProduct(Product),
    PutInventoryItem { item: InventoryItem, expected: ExpectedVersion },
    DeleteInventoryItem { id: InventoryItemId, expected: ExpectedVersion },
    InsertListing(SaleListing),
    /// Also removes every like on the listing. With `expected_likes`, the
    /// likes being removed must be exactly those (in any order), or the
    /// commit fails with a concurrent modification.
    DeleteListing {
        id: SaleListingId,
        expected_likes: Option<Vec<LikedSaleListing>>,
    },
    PutLike(LikedSaleListing),
    DeleteLike(LikedSaleListingId),
    PutCard { card: Card, expected: ExpectedVersion },
    DeleteCard { id: CardId, expected: ExpectedVersion },
    PutKeyword(Keyword),
    /// Also removes the keyword from every card.
    DeleteKeyword(KeywordId),
    InsertSale(Sale),
}

/// An ordered batch of changes committed as one unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    changes: Vec<Change>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, change: Change) -> Self {
        self.changes.push(change);
        self
    }

    pub fn push(&mut self, change: Change) {
        self.changes.push(change);
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn into_changes(self) -> Vec<Change> {
        self.changes
    }
}

/// A search result row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "row", rename_all = "snake_case")]
pub enum SearchHit {
    User(User),
    Business(Business),
    Product(Product),
    InventoryItem(InventoryItem),
    SaleListing(SaleListing),
    Card(Card),
    Keyword(Keyword),
    Sale(Sale),
}

pub trait MarketStore: Send + Sync {
    fn user(&self, id: UserId) -> DomainResult<Option<User>>;

    /// Case-insensitive.
    fn user_by_email(&self, email: &str) -> DomainResult<Option<User>>;

    fn users_with_role(&self, role: SystemRole) -> DomainResult<Vec<User>>;

    fn business(&self, id: BusinessId) -> DomainResult<Option<Business>>;

    fn product(&self, key: &ProductKey) -> DomainResult<Option<Product>>;

    fn inventory_item(&self, id: InventoryItemId) -> DomainResult<Option<InventoryItem>>;

    fn listing(&self, id: SaleListingId) -> DomainResult<Option<SaleListing>>;

    fn listings_for_item(&self, id: InventoryItemId) -> DomainResult<Vec<SaleListing>>;

    fn likes_for_listing(&self, id: SaleListingId) -> DomainResult<Vec<LikedSaleListing>>;

    fn likes_for_user(&self, user: UserId) -> DomainResult<Vec<LikedSaleListing>>;

    fn card(&self, id: CardId) -> DomainResult<Option<Card>>;

    fn keyword(&self, id: KeywordId) -> DomainResult<Option<Keyword>>;

    /// Case-insensitive.
    fn keyword_by_name(&self, name: &str) -> DomainResult<Option<Keyword>>;

    fn sale(&self, id: SaleListingId) -> DomainResult<Option<Sale>>;

    /// Listings with `closes <= now`, oldest deadline first.
    fn due_listings(&self, now: DateTime<Utc>) -> DomainResult<Vec<SaleListing>>;

    /// Cards with `display_period_end <= now`.
    fn expired_cards(&self, now: DateTime<Utc>) -> DomainResult<Vec<Card>>;

    /// Active cards whose display period ends within `window` of `now`.
    fn cards_expiring_within(&self, now: DateTime<Utc>, window: Duration) -> DomainResult<Vec<Card>>;

    /// Evaluate a compiled query.
    fn search(&self, query: &CompiledQuery) -> DomainResult<Page<SearchHit>>;

    fn commit(&self, changes: ChangeSet) -> DomainResult<()>;
}

impl<S> MarketStore for Arc<S>
where
    S: MarketStore + ?Sized,
{
    fn user(&self, id: UserId) -> DomainResult<Option<User>> {
        (**self).user(id)
    }

    fn user_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        (**self).user_by_email(email)
    }

    fn users_with_role(&self, role: SystemRole) -> DomainResult<Vec<User>> {
        (**self).users_with_role(role)
    }

    fn business(&self, id: BusinessId) -> DomainResult<Option<Business>> {
        (**self).business(id)
    }

    fn product(&self, key: &ProductKey) -> DomainResult<Option<Product>> {
        (**self).product(key)
    }

    fn inventory_item(&self, id: InventoryItemId) -> DomainResult<Option<InventoryItem>> {
        (**self).inventory_item(id)
    }

    fn listing(&self, id: SaleListingId) -> DomainResult<Option<SaleListing>> {
        (**self).listing(id)
    }

    fn listings_for_item(&self, id: InventoryItemId) -> DomainResult<Vec<SaleListing>> {
        (**self).listings_for_item(id)
    }

    fn likes_for_listing(&self, id: SaleListingId) -> DomainResult<Vec<LikedSaleListing>> {
        (**self).likes_for_listing(id)
    }

    fn likes_for_user(&self, user: UserId) -> DomainResult<Vec<LikedSaleListing>> {
        (**self).likes_for_user(user)
    }

    fn card(&self, id: CardId) -> DomainResult<Option<Card>> {
        (**self).card(id)
    }

    fn keyword(&self, id: KeywordId) -> DomainResult<Option<Keyword>> {
        (**self).keyword(id)
    }

    fn keyword_by_name(&self, name: &str) -> DomainResult<Option<Keyword>> {
        (**self).keyword_by_name(name)
    }

    fn sale(&self, id: SaleListingId) -> DomainResult<Option<Sale>> {
        (**self).sale(id)
    }

    fn due_listings(&self, now: DateTime<Utc>) -> DomainResult<Vec<SaleListing>> {
        (**self).due_listings(now)
    }

    fn expired_cards(&self, now: DateTime<Utc>) -> DomainResult<Vec<Card>> {
        (**self).expired_cards(now)
    }

    fn cards_expiring_within(&self, now: DateTime<Utc>, window: Duration) -> DomainResult<Vec<Card>> {
        (**self).cards_expiring_within(now, window)
    }

    fn search(&self, query: &CompiledQuery) -> DomainResult<Page<SearchHit>> {
        (**self).search(query)
    }

    fn commit(&self, changes: ChangeSet) -> DomainResult<()> {
        (**self).commit(changes)
    }
}
