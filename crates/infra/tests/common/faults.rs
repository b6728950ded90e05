//! Store wrappers that inject failures and interleaved writes.

use std::collections::BTreeSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Duration, Utc};

use tradepost_auth::SystemRole;
use tradepost_core::{
    BusinessId, CardId, DomainError, DomainResult, InventoryItemId, KeywordId, NotificationId,
    SaleListingId, UserId,
};
use tradepost_infra::{ChangeSet, InMemoryMarketStore, MarketStore, SearchHit};
use tradepost_marketplace::{
    Business, Card, InventoryItem, Keyword, LikedSaleListing, Product, ProductKey, Sale,
    SaleListing, User,
};
use tradepost_notifications::{InMemoryNotificationStore, Notification, NotificationStore, Recipient};
use tradepost_search::{CompiledQuery, Page};

type CommitHook = Box<dyn FnOnce(&InMemoryMarketStore) + Send>;

/// In-memory market store that can hide product rows and run a write just
/// before its next commit.
#[derive(Default)]
pub struct FaultyMarketStore {
    inner: InMemoryMarketStore,
    hidden_products: Mutex<BTreeSet<ProductKey>>,
    before_next_commit: Mutex<Option<CommitHook>>,
}

impl FaultyMarketStore {
    pub fn hide_product(&self, key: ProductKey) {
        self.hidden_products.lock().unwrap().insert(key);
    }

    pub fn reveal_products(&self) {
        self.hidden_products.lock().unwrap().clear();
    }

    /// Run `hook` against the underlying store right before the next commit.
    pub fn before_next_commit(&self, hook: impl FnOnce(&InMemoryMarketStore) + Send + 'static) {
        *self.before_next_commit.lock().unwrap() = Some(Box::new(hook));
    }
}

impl MarketStore for FaultyMarketStore {
    fn user(&self, id: UserId) -> DomainResult<Option<User>> {
        self.inner.user(id)
    }

    fn user_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        self.inner.user_by_email(email)
    }

    fn users_with_role(&self, role: SystemRole) -> DomainResult<Vec<User>> {
        self.inner.users_with_role(role)
    }

    fn business(&self, id: BusinessId) -> DomainResult<Option<Business>> {
        self.inner.business(id)
    }

    fn product(&self, key: &ProductKey) -> DomainResult<Option<Product>> {
        if self.hidden_products.lock().unwrap().contains(key) {
            return Ok(None);
        }
        self.inner.product(key)
    }

    fn inventory_item(&self, id: InventoryItemId) -> DomainResult<Option<InventoryItem>> {
        self.inner.inventory_item(id)
    }

    fn listing(&self, id: SaleListingId) -> DomainResult<Option<SaleListing>> {
        self.inner.listing(id)
    }

    fn listings_for_item(&self, id: InventoryItemId) -> DomainResult<Vec<SaleListing>> {
        self.inner.listings_for_item(id)
    }

    fn likes_for_listing(&self, id: SaleListingId) -> DomainResult<Vec<LikedSaleListing>> {
        self.inner.likes_for_listing(id)
    }

    fn likes_for_user(&self, user: UserId) -> DomainResult<Vec<LikedSaleListing>> {
        self.inner.likes_for_user(user)
    }

    fn card(&self, id: CardId) -> DomainResult<Option<Card>> {
        self.inner.card(id)
    }

    fn keyword(&self, id: KeywordId) -> DomainResult<Option<Keyword>> {
        self.inner.keyword(id)
    }

    fn keyword_by_name(&self, name: &str) -> DomainResult<Option<Keyword>> {
        self.inner.keyword_by_name(name)
    }

    fn sale(&self, id: SaleListingId) -> DomainResult<Option<Sale>> {
        self.inner.sale(id)
    }

    fn due_listings(&self, now: DateTime<Utc>) -> DomainResult<Vec<SaleListing>> {
        self.inner.due_listings(now)
    }

    fn expired_cards(&self, now: DateTime<Utc>) -> DomainResult<Vec<Card>> {
        self.inner.expired_cards(now)
    }

    fn cards_expiring_within(&self, now: DateTime<Utc>, window: Duration) -> DomainResult<Vec<Card>> {
        self.inner.cards_expiring_within(now, window)
    }

    fn search(&self, query: &CompiledQuery) -> DomainResult<Page<SearchHit>> {
        self.inner.search(query)
    }

    fn commit(&self, changes: ChangeSet) -> DomainResult<()> {
        let hook = self.before_next_commit.lock().unwrap().take();
        if let Some(hook) = hook {
            hook(&self.inner);
        }
        self.inner.commit(changes)
    }
}

/// In-memory notification store whose inserts can be switched to fail.
#[derive(Debug, Default)]
pub struct FlakyNotificationStore {
    inner: InMemoryNotificationStore,
    failing: AtomicBool,
}

impl FlakyNotificationStore {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> DomainResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DomainError::storage("notification store unavailable"));
        }
        Ok(())
    }
}

impl NotificationStore for FlakyNotificationStore {
    fn insert(&self, notification: Notification) -> DomainResult<()> {
        self.check()?;
        self.inner.insert(notification)
    }

    fn insert_unless_outstanding(&self, notification: Notification) -> DomainResult<bool> {
        self.check()?;
        self.inner.insert_unless_outstanding(notification)
    }

    fn get(&self, id: NotificationId) -> DomainResult<Option<Notification>> {
        self.inner.get(id)
    }

    fn list_for(&self, recipient: Recipient) -> DomainResult<Vec<Notification>> {
        self.inner.list_for(recipient)
    }

    fn set_read(&self, id: NotificationId, read: bool) -> DomainResult<Notification> {
        self.inner.set_read(id, read)
    }

    fn remove(&self, id: NotificationId) -> DomainResult<Option<Notification>> {
        self.inner.remove(id)
    }
}
