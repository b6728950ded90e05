//! Time-driven lifecycle sweep.
//!
//! A sweep closes every due sale listing into a [`Sale`], deletes expired
//! cards and warns the creators of cards about to expire. Each listing or card
//! is its own atomic change set. A failure on one item is logged and counted,
//! and the sweep moves on. Notifications go out only after the transition has
//! committed.

use std::sync::{Arc, Mutex, TryLockError};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use thiserror::Error;

use tradepost_core::{DomainError, DomainResult, ExpectedVersion, SaleListingId};
use tradepost_marketplace::{Card, ListingSnapshot, MarketEvent, Sale};

use crate::publisher::{MarketPublisher, PublishOutcome};
use crate::store::{Change, ChangeSet, MarketStore};

#[derive(Debug, Error)]
pub enum SweepError {
    #[error("a sweep is already running")]
    AlreadyRunning,

    #[error("sweep could not read the store: {0}")]
    Store(#[from] DomainError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepSummary {
    pub listings_closed: usize,
    pub cards_expired: usize,
    /// Expiry warnings created this sweep; cards already warned are not counted.
    pub warnings: usize,
    pub notifications_sent: usize,
    /// Items that could not be processed this time round.
    pub failures: usize,
}

impl SweepSummary {
    fn record(&mut self, outcome: PublishOutcome) {
        self.notifications_sent += outcome.sent;
    }
}

pub struct LifecycleManager {
    store: Arc<dyn MarketStore>,
    publisher: Arc<MarketPublisher>,
    expiry_warning_window: Duration,
    max_conflict_retries: u32,
    running: Mutex<()>,
}

impl LifecycleManager {
    pub fn new(
        store: Arc<dyn MarketStore>,
        publisher: Arc<MarketPublisher>,
        expiry_warning_window: Duration,
        max_conflict_retries: u32,
    ) -> Self {
        Self {
            store,
            publisher,
            expiry_warning_window,
            max_conflict_retries,
            running: Mutex::new(()),
        }
    }

    /// Run one sweep as of `now`. Overlapping calls are refused with
    /// [`SweepError::AlreadyRunning`].
    pub fn run_sweep(&self, now: DateTime<Utc>) -> Result<SweepSummary, SweepError> {
        let _guard = match self.running.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => return Err(SweepError::AlreadyRunning),
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
        };

        let mut summary = SweepSummary::default();
        summary.record(self.publisher.retry_pending());

        self.close_due_listings(now, &mut summary)?;
        self.expire_cards(now, &mut summary)?;
        self.warn_expiring_cards(now, &mut summary)?;

        tracing::info!(
            %now,
            listings_closed = summary.listings_closed,
            cards_expired = summary.cards_expired,
            warnings = summary.warnings,
            notifications_sent = summary.notifications_sent,
            failures = summary.failures,
            "lifecycle sweep finished"
        );
        Ok(summary)
    }

    fn close_due_listings(&self, now: DateTime<Utc>, summary: &mut SweepSummary) -> DomainResult<()> {
        for listing in self.store.due_listings(now)? {
            match self.close_listing(listing.id, now) {
                Ok(Some(event)) => {
                    summary.listings_closed += 1;
                    summary.record(self.publisher.publish(event));
                }
                Ok(None) => {}
                Err(err) => {
                    summary.failures += 1;
                    tracing::warn!(listing_id = %listing.id, error = %err, "failed to close listing");
                }
            }
        }
        Ok(())
    }

    /// Close one listing. `Ok(None)` when it is no longer there, i.e. some
    /// earlier sweep already closed it.
    pub fn close_listing(&self, id: SaleListingId, now: DateTime<Utc>) -> DomainResult<Option<MarketEvent>> {
        let mut attempt = 0;
        loop {
            let Some(listing) = self.store.listing(id)? else {
                return Ok(None);
            };
            let item = self
                .store
                .inventory_item(listing.inventory_item_id)?
                .ok_or_else(|| DomainError::not_found(format!("inventory item {}", listing.inventory_item_id)))?;
            let business = self
                .store
                .business(listing.business_id)?
                .ok_or_else(|| DomainError::not_found(format!("business {}", listing.business_id)))?;
            let product = self
                .store
                .product(&item.product)?
                .ok_or_else(|| DomainError::not_found(format!("product {}", item.product)))?;
            let likes = self.store.likes_for_listing(id)?;
            let starred_by: Vec<_> = likes.iter().filter(|like| like.starred).map(|like| like.user_id).collect();

            let snapshot = ListingSnapshot::capture(&listing, &business, &product);
            let sale = Sale::record(&listing, &business, &product, &item, now);

            let mut remaining = item.clone();
            remaining.deduct(listing.quantity)?;
            let expected = ExpectedVersion::Exact(item.version);
            let item_change = if remaining.quantity == 0 {
                Change::DeleteInventoryItem { id: item.id, expected }
            } else {
                Change::PutInventoryItem { item: remaining, expected }
            };

            let changes = ChangeSet::new()
                .with(Change::InsertSale(sale.clone()))
                .with(Change::DeleteListing { id, expected_likes: Some(likes) })
                .with(item_change);

            match self.store.commit(changes) {
                Ok(()) => {
                    tracing::info!(
                        listing_id = %id,
                        business_id = %business.id,
                        quantity = sale.quantity,
                        "listing closed"
                    );
                    return Ok(Some(MarketEvent::ListingClosed {
                        sale,
                        snapshot,
                        starred_by,
                        occurred_at: now,
                    }));
                }
                Err(err) if err.is_retryable() && attempt < self.max_conflict_retries => {
                    attempt += 1;
                    tracing::debug!(listing_id = %id, attempt, error = %err, "retrying listing close");
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn expire_cards(&self, now: DateTime<Utc>, summary: &mut SweepSummary) -> DomainResult<()> {
        for card in self.store.expired_cards(now)? {
            match self.expire_card(&card) {
                Ok(true) => {
                    summary.cards_expired += 1;
                    summary.record(self.publisher.publish(MarketEvent::CardExpired {
                        card_id: card.id,
                        creator: card.creator,
                        title: card.title.clone(),
                        occurred_at: now,
                    }));
                }
                Ok(false) => {}
                Err(err) => {
                    summary.failures += 1;
                    tracing::warn!(card_id = %card.id, error = %err, "failed to expire card");
                }
            }
        }
        Ok(())
    }

    /// Delete an expired card. `false` when it was already gone.
    fn expire_card(&self, card: &Card) -> DomainResult<bool> {
        let changes = ChangeSet::new().with(Change::DeleteCard {
            id: card.id,
            expected: ExpectedVersion::Any,
        });
        match self.store.commit(changes) {
            Ok(()) => {
                tracing::info!(card_id = %card.id, creator = %card.creator, "card expired");
                Ok(true)
            }
            Err(DomainError::NotFound(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    fn warn_expiring_cards(&self, now: DateTime<Utc>, summary: &mut SweepSummary) -> DomainResult<()> {
        for card in self.store.cards_expiring_within(now, self.expiry_warning_window)? {
            let outcome = self.publisher.publish(MarketEvent::CardExpiringSoon {
                card_id: card.id,
                creator: card.creator,
                title: card.title.clone(),
                display_period_end: card.display_period_end,
                occurred_at: now,
            });
            summary.warnings += outcome.sent;
            summary.record(outcome);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use tradepost_core::{FixedClock, UserId};
    use tradepost_events::InMemoryEventBus;
    use tradepost_notifications::{InMemoryNotificationStore, NotificationDispatcher};

    use super::*;
    use crate::directory::StoreDirectory;
    use crate::store::InMemoryMarketStore;

    fn manager() -> (Arc<InMemoryMarketStore>, LifecycleManager) {
        let now = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let store = Arc::new(InMemoryMarketStore::new());
        let dispatcher = Arc::new(NotificationDispatcher::new(
            Arc::new(InMemoryNotificationStore::new()),
            Arc::new(StoreDirectory::new(store.clone())),
            Arc::new(FixedClock::new(now)),
        ));
        let publisher = Arc::new(MarketPublisher::new(dispatcher, Arc::new(InMemoryEventBus::<MarketEvent>::new())));
        let manager = LifecycleManager::new(store.clone(), publisher, Duration::hours(24), 3);
        (store, manager)
    }

    #[test]
    fn overlapping_sweeps_are_refused() {
        let (_store, manager) = manager();
        let now = Utc::now();

        let held = manager.running.lock().unwrap();
        assert!(matches!(manager.run_sweep(now), Err(SweepError::AlreadyRunning)));
        drop(held);

        assert_eq!(manager.run_sweep(now).unwrap(), SweepSummary::default());
    }

    #[test]
    fn expired_cards_are_deleted_once() {
        let (store, manager) = manager();
        let created = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let card = Card::new(
            UserId::new(),
            tradepost_marketplace::Section::Wanted,
            "Piano",
            created,
            Duration::days(14),
        )
        .unwrap();
        store
            .commit(ChangeSet::new().with(Change::PutCard { card: card.clone(), expected: ExpectedVersion::Exact(0) }))
            .unwrap();

        let later = created + Duration::days(15);
        let first = manager.run_sweep(later).unwrap();
        assert_eq!(first.cards_expired, 1);
        assert_eq!(first.notifications_sent, 1);
        assert!(store.card(card.id).unwrap().is_none());

        let second = manager.run_sweep(later).unwrap();
        assert_eq!(second, SweepSummary::default());
    }
}
