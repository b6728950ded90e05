use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};

use tradepost_auth::SystemRole;
use tradepost_core::{
    BusinessId, CardId, DomainError, DomainResult, ExpectedVersion, InventoryItemId, KeywordId,
    LikedSaleListingId, SaleListingId, UserId, Versioned,
};
use tradepost_marketplace::{
    Business, Card, InventoryItem, Keyword, LikedSaleListing, Product, ProductKey, Sale,
    SaleListing, User,
};
use tradepost_search::{CompiledQuery, EntityKind, Page};

use super::views::{CardView, ItemView, ListingView, RowView};
use super::{Change, ChangeSet, MarketStore, SearchHit};

#[derive(Debug, Clone, Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    businesses: BTreeMap<BusinessId, Business>,
    products: BTreeMap<ProductKey, Product>,
    items: BTreeMap<InventoryItemId, InventoryItem>,
    listings: BTreeMap<SaleListingId, SaleListing>,
    likes: BTreeMap<LikedSaleListingId, LikedSaleListing>,
    cards: BTreeMap<CardId, Card>,
    keywords: BTreeMap<KeywordId, Keyword>,
    sales: BTreeMap<SaleListingId, Sale>,
}

fn next_version(table: &str, current: Option<u64>, expected: ExpectedVersion) -> DomainResult<u64> {
    let current = current.unwrap_or(0);
    expected
        .check(current)
        .map_err(|e| DomainError::concurrency(format!("{table}: {e}")))?;
    Ok(current + 1)
}

/// Check `expected` against the stored row and stamp the next version on `row`.
fn stamp<T: Versioned>(
    table: &str,
    rows: &BTreeMap<T::Id, T>,
    row: &mut T,
    expected: ExpectedVersion,
) -> DomainResult<()> {
    let version = next_version(table, rows.get(row.id()).map(T::version), expected)?;
    row.set_version(version);
    Ok(())
}

impl Tables {
    /// Apply one change to the staged tables, recording touched items for
    /// the post-apply invariant check.
    fn apply(&mut self, change: Change, touched: &mut BTreeSet<InventoryItemId>) -> DomainResult<()> {
        match change {
            Change::PutUser { mut user, expected } => {
                let email = user.email_key();
                if self.users.values().any(|u| u.id != user.id && u.email_key() == email) {
                    return Err(DomainError::conflict(format!("email {} is already registered", user.email)));
                }
                stamp("user", &self.users, &mut user, expected)?;
                self.users.insert(user.id, user);
            }
            Change::PutBusiness { mut business, expected } => {
                stamp("business", &self.businesses, &mut business, expected)?;
                self.businesses.insert(business.id, business);
            }
            Change::InsertProduct(product) => {
                if !self.businesses.contains_key(&product.key.business_id) {
                    return Err(DomainError::not_found(format!("business {}", product.key.business_id)));
                }
                if self.products.contains_key(&product.key) {
                    return Err(DomainError::conflict(format!("product {} already exists", product.key)));
                }
                self.products.insert(product.key.clone(), product);
            }
            Change::PutInventoryItem { mut item, expected } => {
                if !self.products.contains_key(&item.product) {
                    return Err(DomainError::not_found(format!("product {}", item.product)));
                }
                stamp("inventory item", &self.items, &mut item, expected)?;
                touched.insert(item.id);
                self.items.insert(item.id, item);
            }
            Change::DeleteInventoryItem { id, expected } => {
                let current = self
                    .items
                    .get(&id)
                    .ok_or_else(|| DomainError::not_found(format!("inventory item {id}")))?;
                next_version("inventory item", Some(current.version), expected)?;
                if self.listings.values().any(|l| l.inventory_item_id == id) {
                    return Err(DomainError::conflict(format!(
                        "inventory item {id} still has active listings"
                    )));
                }
                self.items.remove(&id);
            }
            Change::InsertListing(listing) => {
                if self.listings.contains_key(&listing.id) {
                    return Err(DomainError::conflict(format!("listing {} already exists", listing.id)));
                }
                let item = self
                    .items
                    .get(&listing.inventory_item_id)
                    .ok_or_else(|| DomainError::not_found(format!("inventory item {}", listing.inventory_item_id)))?;
                if item.business_id() != listing.business_id {
                    return Err(DomainError::validation("listing business does not own the inventory item"));
                }
                touched.insert(listing.inventory_item_id);
                self.listings.insert(listing.id, listing);
            }
            Change::DeleteListing { id, expected_likes } => {
                if self.listings.remove(&id).is_none() {
                    return Err(DomainError::not_found(format!("listing {id}")));
                }
                if let Some(mut expected) = expected_likes {
                    expected.sort_by_key(|like| like.id);
                    let current: Vec<&LikedSaleListing> =
                        self.likes.values().filter(|like| like.listing_id == id).collect();
                    if current.len() != expected.len() || current.iter().zip(&expected).any(|(c, e)| *c != e) {
                        return Err(DomainError::concurrency(format!(
                            "likes on listing {id} changed since they were read"
                        )));
                    }
                }
                self.likes.retain(|_, like| like.listing_id != id);
            }
            Change::PutLike(like) => {
                if !self.listings.contains_key(&like.listing_id) {
                    return Err(DomainError::not_found(format!("listing {}", like.listing_id)));
                }
                if self
                    .likes
                    .values()
                    .any(|l| l.id != like.id && l.user_id == like.user_id && l.listing_id == like.listing_id)
                {
                    return Err(DomainError::conflict("listing is already liked by this user"));
                }
                self.likes.insert(like.id, like);
            }
            Change::DeleteLike(id) => {
                if self.likes.remove(&id).is_none() {
                    return Err(DomainError::not_found(format!("liked listing {id}")));
                }
            }
            Change::PutCard { mut card, expected } => {
                if let Some(missing) = card.keywords.iter().find(|k| !self.keywords.contains_key(k)) {
                    return Err(DomainError::not_found(format!("keyword {missing}")));
                }
                stamp("card", &self.cards, &mut card, expected)?;
                self.cards.insert(card.id, card);
            }
            Change::DeleteCard { id, expected } => {
                let current = self
                    .cards
                    .get(&id)
                    .ok_or_else(|| DomainError::not_found(format!("card {id}")))?;
                next_version("card", Some(current.version), expected)?;
                self.cards.remove(&id);
            }
            Change::PutKeyword(keyword) => {
                let name = keyword.normalized_name();
                if self.keywords.values().any(|k| k.id != keyword.id && k.normalized_name() == name) {
                    return Err(DomainError::conflict(format!("keyword '{}' already exists", keyword.name)));
                }
                self.keywords.insert(keyword.id, keyword);
            }
            Change::DeleteKeyword(id) => {
                if self.keywords.remove(&id).is_none() {
                    return Err(DomainError::not_found(format!("keyword {id}")));
                }
                for card in self.cards.values_mut() {
                    if card.remove_keyword(id) {
                        card.version += 1;
                    }
                }
            }
            Change::InsertSale(sale) => {
                if self.sales.contains_key(&sale.id) {
                    return Err(DomainError::conflict(format!("sale {} already recorded", sale.id)));
                }
                self.sales.insert(sale.id, sale);
            }
        }
        Ok(())
    }

    /// Active listings on an item never reserve more than the item holds.
    fn check_reservations(&self, touched: &BTreeSet<InventoryItemId>) -> DomainResult<()> {
        for id in touched {
            let Some(item) = self.items.get(id) else {
                continue;
            };
            let reserved: u64 = self
                .listings
                .values()
                .filter(|l| l.inventory_item_id == *id)
                .map(|l| u64::from(l.quantity))
                .sum();
            if reserved > u64::from(item.quantity) {
                return Err(DomainError::conflict(format!(
                    "inventory item {id} holds {} but listings reserve {reserved}",
                    item.quantity
                )));
            }
        }
        Ok(())
    }

    fn listing_view(&self, listing: &SaleListing) -> ListingView {
        let item = self.items.get(&listing.inventory_item_id).cloned();
        let product = item.as_ref().and_then(|i| self.products.get(&i.product)).cloned();
        ListingView {
            listing: listing.clone(),
            item,
            product,
            business: self.businesses.get(&listing.business_id).cloned(),
        }
    }

    fn card_view(&self, card: &Card) -> CardView {
        CardView {
            card: card.clone(),
            keyword_names: card
                .keywords
                .iter()
                .filter_map(|k| self.keywords.get(k))
                .map(|k| k.name.clone())
                .collect(),
        }
    }
}

/// In-memory gateway for tests, demos and the single-process worker.
#[derive(Debug, Default)]
pub struct InMemoryMarketStore {
    tables: RwLock<Tables>,
}

impl InMemoryMarketStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(&self, f: impl FnOnce(&Tables) -> T) -> DomainResult<T> {
        let tables = self
            .tables
            .read()
            .map_err(|_| DomainError::storage("market store lock poisoned"))?;
        Ok(f(&tables))
    }
}

impl MarketStore for InMemoryMarketStore {
    fn user(&self, id: UserId) -> DomainResult<Option<User>> {
        self.read(|t| t.users.get(&id).cloned())
    }

    fn user_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        let email = email.trim().to_lowercase();
        self.read(|t| t.users.values().find(|u| u.email_key() == email).cloned())
    }

    fn users_with_role(&self, role: SystemRole) -> DomainResult<Vec<User>> {
        self.read(|t| t.users.values().filter(|u| u.role == role).cloned().collect())
    }

    fn business(&self, id: BusinessId) -> DomainResult<Option<Business>> {
        self.read(|t| t.businesses.get(&id).cloned())
    }

    fn product(&self, key: &ProductKey) -> DomainResult<Option<Product>> {
        self.read(|t| t.products.get(key).cloned())
    }

    fn inventory_item(&self, id: InventoryItemId) -> DomainResult<Option<InventoryItem>> {
        self.read(|t| t.items.get(&id).cloned())
    }

    fn listing(&self, id: SaleListingId) -> DomainResult<Option<SaleListing>> {
        self.read(|t| t.listings.get(&id).cloned())
    }

    fn listings_for_item(&self, id: InventoryItemId) -> DomainResult<Vec<SaleListing>> {
        self.read(|t| {
            t.listings
                .values()
                .filter(|l| l.inventory_item_id == id)
                .cloned()
                .collect()
        })
    }

    fn likes_for_listing(&self, id: SaleListingId) -> DomainResult<Vec<LikedSaleListing>> {
        self.read(|t| t.likes.values().filter(|l| l.listing_id == id).cloned().collect())
    }

    fn likes_for_user(&self, user: UserId) -> DomainResult<Vec<LikedSaleListing>> {
        self.read(|t| t.likes.values().filter(|l| l.user_id == user).cloned().collect())
    }

    fn card(&self, id: CardId) -> DomainResult<Option<Card>> {
        self.read(|t| t.cards.get(&id).cloned())
    }

    fn keyword(&self, id: KeywordId) -> DomainResult<Option<Keyword>> {
        self.read(|t| t.keywords.get(&id).cloned())
    }

    fn keyword_by_name(&self, name: &str) -> DomainResult<Option<Keyword>> {
        let name = name.trim().to_lowercase();
        self.read(|t| t.keywords.values().find(|k| k.normalized_name() == name).cloned())
    }

    fn sale(&self, id: SaleListingId) -> DomainResult<Option<Sale>> {
        self.read(|t| t.sales.get(&id).cloned())
    }

    fn due_listings(&self, now: DateTime<Utc>) -> DomainResult<Vec<SaleListing>> {
        self.read(|t| {
            let mut due: Vec<SaleListing> =
                t.listings.values().filter(|l| l.is_due(now)).cloned().collect();
            due.sort_by(|a, b| a.closes.cmp(&b.closes).then_with(|| a.id.cmp(&b.id)));
            due
        })
    }

    fn expired_cards(&self, now: DateTime<Utc>) -> DomainResult<Vec<Card>> {
        self.read(|t| t.cards.values().filter(|c| c.is_expired(now)).cloned().collect())
    }

    fn cards_expiring_within(&self, now: DateTime<Utc>, window: Duration) -> DomainResult<Vec<Card>> {
        self.read(|t| t.cards.values().filter(|c| c.expires_within(now, window)).cloned().collect())
    }

    fn search(&self, query: &CompiledQuery) -> DomainResult<Page<SearchHit>> {
        self.read(|t| match query.kind {
            EntityKind::User => query
                .apply(t.users.values().cloned().map(RowView))
                .map(|v| SearchHit::User(v.0)),
            EntityKind::Business => query
                .apply(t.businesses.values().cloned().map(RowView))
                .map(|v| SearchHit::Business(v.0)),
            EntityKind::Product => query
                .apply(t.products.values().cloned().map(RowView))
                .map(|v| SearchHit::Product(v.0)),
            EntityKind::InventoryItem => query
                .apply(t.items.values().map(|item| ItemView {
                    item: item.clone(),
                    product: t.products.get(&item.product).cloned(),
                }))
                .map(|v| SearchHit::InventoryItem(v.item)),
            EntityKind::SaleListing => query
                .apply(t.listings.values().map(|l| t.listing_view(l)))
                .map(|v| SearchHit::SaleListing(v.listing)),
            EntityKind::Card => query
                .apply(t.cards.values().map(|c| t.card_view(c)))
                .map(|v| SearchHit::Card(v.card)),
            EntityKind::Keyword => query
                .apply(t.keywords.values().cloned().map(RowView))
                .map(|v| SearchHit::Keyword(v.0)),
            EntityKind::Sale => query
                .apply(t.sales.values().cloned().map(RowView))
                .map(|v| SearchHit::Sale(v.0)),
        })
    }

    fn commit(&self, changes: ChangeSet) -> DomainResult<()> {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| DomainError::storage("market store lock poisoned"))?;

        let mut staged = tables.clone();
        let mut touched = BTreeSet::new();
        let count = changes.len();
        for change in changes.into_changes() {
            staged.apply(change, &mut touched)?;
        }
        staged.check_reservations(&touched)?;

        *tables = staged;
        tracing::trace!(changes = count, "change set committed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate, TimeZone};
    use tradepost_marketplace::{Address, BusinessType};

    use super::*;

    struct Fixture {
        store: InMemoryMarketStore,
        business: Business,
        item: InventoryItem,
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 5, 1, 12, 0, 0).unwrap()
    }

    fn fixture(quantity: u32) -> Fixture {
        let store = InMemoryMarketStore::new();
        let owner = User::new("Olive", "Owner", "olive@example.com", now()).unwrap();
        let business = Business::new(
            "Olive's",
            BusinessType::RetailTrade,
            Address::new("New Zealand"),
            owner.id,
            now(),
        )
        .unwrap();
        let key = ProductKey::new(business.id, "OIL").unwrap();
        let product = Product::new(key.clone(), "Olive Oil", "NZD", now()).unwrap();
        let item = InventoryItem::new(key, quantity, NaiveDate::from_ymd_opt(2031, 1, 1).unwrap()).unwrap();

        store
            .commit(
                ChangeSet::new()
                    .with(Change::PutUser { user: owner, expected: ExpectedVersion::Exact(0) })
                    .with(Change::PutBusiness { business: business.clone(), expected: ExpectedVersion::Exact(0) })
                    .with(Change::InsertProduct(product))
                    .with(Change::PutInventoryItem { item: item.clone(), expected: ExpectedVersion::Exact(0) }),
            )
            .unwrap();
        let item = store.inventory_item(item.id).unwrap().unwrap();
        Fixture { store, business, item }
    }

    fn listing(item: &InventoryItem, quantity: u32) -> SaleListing {
        SaleListing::open(item, quantity, 100, Some(now() + Duration::days(1)), now()).unwrap()
    }

    #[test]
    fn versions_bump_on_commit_and_stale_writes_conflict() {
        let f = fixture(5);
        assert_eq!(f.item.version, 1);

        let mut stale = f.item.clone();
        stale.quantity = 7;
        f.store
            .commit(ChangeSet::new().with(Change::PutInventoryItem { item: stale.clone(), expected: ExpectedVersion::Exact(1) }))
            .unwrap();

        let err = f
            .store
            .commit(ChangeSet::new().with(Change::PutInventoryItem { item: stale, expected: ExpectedVersion::Exact(1) }))
            .unwrap_err();
        assert!(matches!(err, DomainError::Concurrency(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn over_reservation_is_rejected_atomically() {
        let f = fixture(5);
        let a = listing(&f.item, 3);
        let b = listing(&f.item, 3);

        f.store.commit(ChangeSet::new().with(Change::InsertListing(a))).unwrap();
        let err = f.store.commit(ChangeSet::new().with(Change::InsertListing(b.clone()))).unwrap_err();

        assert!(matches!(err, DomainError::Conflict(_)));
        assert!(f.store.listing(b.id).unwrap().is_none());
        assert_eq!(f.store.listings_for_item(f.item.id).unwrap().len(), 1);
    }

    #[test]
    fn lowering_stock_below_reservations_is_rejected() {
        let f = fixture(5);
        f.store.commit(ChangeSet::new().with(Change::InsertListing(listing(&f.item, 4)))).unwrap();

        let mut item = f.item.clone();
        item.quantity = 3;
        let err = f
            .store
            .commit(ChangeSet::new().with(Change::PutInventoryItem { item, expected: ExpectedVersion::Any }))
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn failed_change_sets_leave_no_trace() {
        let f = fixture(5);
        let l = listing(&f.item, 1);
        let err = f.store.commit(
            ChangeSet::new()
                .with(Change::InsertListing(l.clone()))
                .with(Change::DeleteListing { id: SaleListingId::new(), expected_likes: None }),
        );
        assert!(matches!(err, Err(DomainError::NotFound(_))));
        assert!(f.store.listing(l.id).unwrap().is_none());
    }

    #[test]
    fn deleting_a_listing_cascades_to_likes() {
        let f = fixture(5);
        let l = listing(&f.item, 1);
        let like = LikedSaleListing::new(UserId::new(), l.id, now());
        f.store
            .commit(ChangeSet::new().with(Change::InsertListing(l.clone())).with(Change::PutLike(like)))
            .unwrap();
        assert_eq!(f.store.likes_for_listing(l.id).unwrap().len(), 1);

        f.store
            .commit(ChangeSet::new().with(Change::DeleteListing { id: l.id, expected_likes: None }))
            .unwrap();
        assert!(f.store.likes_for_listing(l.id).unwrap().is_empty());
        assert_eq!(f.store.business(f.business.id).unwrap().unwrap().version, 1);
    }

    #[test]
    fn deleting_a_listing_checks_the_likes_it_removes() {
        let f = fixture(5);
        let l = listing(&f.item, 1);
        let early = LikedSaleListing::new(UserId::new(), l.id, now());
        f.store
            .commit(ChangeSet::new().with(Change::InsertListing(l.clone())).with(Change::PutLike(early.clone())))
            .unwrap();
        let seen = f.store.likes_for_listing(l.id).unwrap();

        let mut late = LikedSaleListing::new(UserId::new(), l.id, now());
        late.starred = true;
        f.store.commit(ChangeSet::new().with(Change::PutLike(late))).unwrap();

        let err = f
            .store
            .commit(ChangeSet::new().with(Change::DeleteListing { id: l.id, expected_likes: Some(seen) }))
            .unwrap_err();
        assert!(matches!(err, DomainError::Concurrency(_)));
        assert!(f.store.listing(l.id).unwrap().is_some());
        assert_eq!(f.store.likes_for_listing(l.id).unwrap().len(), 2);

        let seen = f.store.likes_for_listing(l.id).unwrap();
        f.store
            .commit(ChangeSet::new().with(Change::DeleteListing { id: l.id, expected_likes: Some(seen) }))
            .unwrap();
        assert!(f.store.likes_for_listing(l.id).unwrap().is_empty());
    }

    #[test]
    fn duplicate_emails_conflict_case_insensitively() {
        let f = fixture(1);
        let twin = User::new("Other", "Olive", "OLIVE@example.com", now()).unwrap();
        let err = f
            .store
            .commit(ChangeSet::new().with(Change::PutUser { user: twin, expected: ExpectedVersion::Exact(0) }))
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }
}
