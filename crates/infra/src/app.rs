//! The assembled marketplace: store, notifications, event bus and sweep.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use tradepost_core::{Clock, DomainResult};
use tradepost_events::{EventBus, InMemoryEventBus, Subscription};
use tradepost_marketplace::MarketEvent;
use tradepost_notifications::{InMemoryNotificationStore, NotificationDispatcher, NotificationStore};

use crate::config::MarketplaceConfig;
use crate::directory::StoreDirectory;
use crate::lifecycle::{LifecycleManager, SweepError, SweepSummary};
use crate::publisher::{MarketPublisher, PublishOutcome};
use crate::store::{InMemoryMarketStore, MarketStore};

pub struct Marketplace {
    pub(crate) config: MarketplaceConfig,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) store: Arc<dyn MarketStore>,
    pub(crate) bus: Arc<dyn EventBus<MarketEvent>>,
    pub(crate) publisher: Arc<MarketPublisher>,
    pub(crate) lifecycle: Arc<LifecycleManager>,
}

impl Marketplace {
    pub fn new(
        config: MarketplaceConfig,
        clock: Arc<dyn Clock>,
        store: Arc<dyn MarketStore>,
        notifications: Arc<dyn NotificationStore>,
        bus: Arc<dyn EventBus<MarketEvent>>,
    ) -> Self {
        let directory = Arc::new(StoreDirectory::new(store.clone()));
        let dispatcher = Arc::new(NotificationDispatcher::new(notifications, directory, clock.clone()));
        let publisher = Arc::new(MarketPublisher::new(dispatcher, bus.clone()));
        let lifecycle = Arc::new(LifecycleManager::new(
            store.clone(),
            publisher.clone(),
            config.expiry_warning_window,
            config.max_conflict_retries,
        ));

        Self {
            config,
            clock,
            store,
            bus,
            publisher,
            lifecycle,
        }
    }

    /// Everything in memory; for tests, demos and the single-process worker.
    pub fn in_memory(config: MarketplaceConfig, clock: Arc<dyn Clock>) -> Self {
        Self::new(
            config,
            clock,
            Arc::new(InMemoryMarketStore::new()),
            Arc::new(InMemoryNotificationStore::new()),
            Arc::new(InMemoryEventBus::<MarketEvent>::new()),
        )
    }

    pub fn config(&self) -> &MarketplaceConfig {
        &self.config
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn store(&self) -> &Arc<dyn MarketStore> {
        &self.store
    }

    pub fn notifications(&self) -> &NotificationDispatcher {
        self.publisher.dispatcher()
    }

    /// Notifications parked after a failed delivery, awaiting the next sweep.
    pub fn pending_notifications(&self) -> usize {
        self.publisher.pending()
    }

    pub fn lifecycle(&self) -> Arc<LifecycleManager> {
        self.lifecycle.clone()
    }

    /// Market events, as published after each committed change.
    pub fn subscribe(&self) -> Subscription<MarketEvent> {
        self.bus.subscribe()
    }

    pub fn run_sweep(&self, now: DateTime<Utc>) -> Result<SweepSummary, SweepError> {
        self.lifecycle.run_sweep(now)
    }

    /// Announce a committed change.
    pub(crate) fn publish(&self, event: MarketEvent) -> PublishOutcome {
        self.publisher.publish(event)
    }

    /// Re-run a read-modify-write while it loses optimistic version races.
    /// Other errors, including plain conflicts, are returned at once.
    pub(crate) fn with_conflict_retry<T>(
        &self,
        operation: &'static str,
        mut attempt: impl FnMut() -> DomainResult<T>,
    ) -> DomainResult<T> {
        let mut retries = 0;
        loop {
            match attempt() {
                Err(err) if err.is_retryable() && retries < self.config.max_conflict_retries => {
                    retries += 1;
                    tracing::debug!(operation, retries, error = %err, "retrying after conflict");
                }
                result => return result,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use chrono::TimeZone;
    use tradepost_core::{DomainError, FixedClock};

    use super::*;

    fn market() -> Marketplace {
        let now = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        Marketplace::in_memory(
            MarketplaceConfig::default().with_max_conflict_retries(3),
            Arc::new(FixedClock::new(now)),
        )
    }

    #[test]
    fn lost_races_are_retried_up_to_the_limit() {
        let market = market();
        let calls = Cell::new(0);
        let result: DomainResult<()> = market.with_conflict_retry("test", || {
            calls.set(calls.get() + 1);
            Err(DomainError::concurrency("item: stale version"))
        });
        assert!(matches!(result, Err(DomainError::Concurrency(_))));
        assert_eq!(calls.get(), 4);

        let calls = Cell::new(0);
        let result = market.with_conflict_retry("test", || {
            calls.set(calls.get() + 1);
            if calls.get() < 3 { Err(DomainError::concurrency("stale")) } else { Ok(calls.get()) }
        });
        assert_eq!(result, Ok(3));
    }

    #[test]
    fn plain_conflicts_are_not_retried() {
        let market = market();
        let calls = Cell::new(0);
        let result: DomainResult<()> = market.with_conflict_retry("test", || {
            calls.set(calls.get() + 1);
            Err(DomainError::conflict("only 2 units left to list"))
        });
        assert!(matches!(result, Err(DomainError::Conflict(_))));
        assert_eq!(calls.get(), 1);
    }
}
