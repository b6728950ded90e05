//! Post-commit fan-out of market events.
//!
//! Every event goes to the notification dispatcher and then to the event bus.
//! Deliveries that could not be stored are parked in an outbox and retried by
//! [`MarketPublisher::retry_pending`]; nothing here ever touches the market
//! store, so a retry can never redo the transition that raised the event.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;

use tradepost_events::{Event, EventBus};
use tradepost_marketplace::MarketEvent;
use tradepost_notifications::{Delivery, NotificationDispatcher};

#[derive(Debug, Default)]
struct Outbox {
    /// Events whose recipients could not be resolved.
    events: Vec<MarketEvent>,
    deliveries: Vec<Delivery>,
}

/// What happened to the notifications of one or more events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PublishOutcome {
    pub sent: usize,
    pub deduplicated: usize,
    /// Parked in the outbox for a later retry.
    pub deferred: usize,
}

impl PublishOutcome {
    pub fn merge(&mut self, other: PublishOutcome) {
        self.sent += other.sent;
        self.deduplicated += other.deduplicated;
        self.deferred += other.deferred;
    }
}

pub struct MarketPublisher {
    dispatcher: Arc<NotificationDispatcher>,
    bus: Arc<dyn EventBus<MarketEvent>>,
    outbox: Mutex<Outbox>,
}

impl MarketPublisher {
    pub fn new(dispatcher: Arc<NotificationDispatcher>, bus: Arc<dyn EventBus<MarketEvent>>) -> Self {
        Self {
            dispatcher,
            bus,
            outbox: Mutex::new(Outbox::default()),
        }
    }

    pub fn dispatcher(&self) -> &NotificationDispatcher {
        &self.dispatcher
    }

    /// Publish an already committed event. Never fails; see the module docs.
    pub fn publish(&self, event: MarketEvent) -> PublishOutcome {
        let outcome = self.notify(&event);
        if let Err(err) = self.bus.publish(event.clone()) {
            tracing::warn!(event_type = event.event_type(), error = %err, "event bus publish failed");
        }
        outcome
    }

    /// Retry everything parked in the outbox.
    pub fn retry_pending(&self) -> PublishOutcome {
        let Outbox { events, deliveries } = std::mem::take(&mut *self.outbox());
        if events.is_empty() && deliveries.is_empty() {
            return PublishOutcome::default();
        }
        tracing::debug!(events = events.len(), deliveries = deliveries.len(), "retrying pending notifications");

        let mut outcome = PublishOutcome::default();
        for event in &events {
            outcome.merge(self.notify(event));
        }
        let mut failed = Vec::new();
        for delivery in deliveries {
            match self.dispatcher.deliver(&delivery) {
                Ok(true) => outcome.sent += 1,
                Ok(false) => outcome.deduplicated += 1,
                Err(err) => {
                    tracing::warn!(recipient = %delivery.recipient, error = %err, "notification retry failed");
                    failed.push(delivery);
                }
            }
        }
        outcome.deferred += failed.len();
        self.outbox().deliveries.extend(failed);
        outcome
    }

    /// Number of events and deliveries awaiting a retry.
    pub fn pending(&self) -> usize {
        let outbox = self.outbox();
        outbox.events.len() + outbox.deliveries.len()
    }

    fn notify(&self, event: &MarketEvent) -> PublishOutcome {
        match self.dispatcher.handle_event(event) {
            Ok(report) => {
                let deferred = report.failed.len();
                if deferred > 0 {
                    self.outbox().deliveries.extend(report.failed);
                }
                PublishOutcome {
                    sent: report.sent,
                    deduplicated: report.deduplicated,
                    deferred,
                }
            }
            Err(err) => {
                tracing::warn!(
                    event_type = event.event_type(),
                    error = %err,
                    "could not resolve notification recipients"
                );
                self.outbox().events.push(event.clone());
                PublishOutcome {
                    deferred: 1,
                    ..PublishOutcome::default()
                }
            }
        }
    }

    fn outbox(&self) -> MutexGuard<'_, Outbox> {
        self.outbox.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use chrono::{TimeZone, Utc};
    use tradepost_core::{BusinessId, CardId, DomainError, DomainResult, FixedClock, NotificationId, UserId};
    use tradepost_events::InMemoryEventBus;
    use tradepost_marketplace::Business;
    use tradepost_notifications::{
        InMemoryNotificationStore, Notification, NotificationStore, Recipient, RecipientDirectory,
    };

    use super::*;

    /// Store that refuses writes while `failing` is set.
    #[derive(Default)]
    struct FlakyStore {
        inner: InMemoryNotificationStore,
        failing: AtomicBool,
    }

    impl FlakyStore {
        fn guard(&self) -> DomainResult<()> {
            if self.failing.load(Ordering::SeqCst) {
                Err(DomainError::storage("unavailable"))
            } else {
                Ok(())
            }
        }
    }

    impl NotificationStore for FlakyStore {
        fn insert(&self, notification: Notification) -> DomainResult<()> {
            self.guard()?;
            self.inner.insert(notification)
        }

        fn insert_unless_outstanding(&self, notification: Notification) -> DomainResult<bool> {
            self.guard()?;
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

    struct NoDirectory;

    impl RecipientDirectory for NoDirectory {
        fn global_admins(&self) -> DomainResult<Vec<UserId>> {
            Ok(Vec::new())
        }

        fn business(&self, _id: BusinessId) -> DomainResult<Option<Business>> {
            Ok(None)
        }
    }

    #[test]
    fn failed_deliveries_are_parked_and_retried() {
        let now = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let store = Arc::new(FlakyStore::default());
        let dispatcher = Arc::new(NotificationDispatcher::new(
            store.clone(),
            Arc::new(NoDirectory),
            Arc::new(FixedClock::new(now)),
        ));
        let bus = Arc::new(InMemoryEventBus::<MarketEvent>::new());
        let subscription = bus.subscribe();
        let publisher = MarketPublisher::new(dispatcher, bus);

        let creator = UserId::new();
        let event = MarketEvent::CardExpired {
            card_id: CardId::new(),
            creator,
            title: "Old bike".into(),
            occurred_at: now,
        };

        store.failing.store(true, Ordering::SeqCst);
        let outcome = publisher.publish(event);
        assert_eq!(outcome.deferred, 1);
        assert_eq!(publisher.pending(), 1);
        assert_eq!(subscription.drain().len(), 1);

        store.failing.store(false, Ordering::SeqCst);
        let outcome = publisher.retry_pending();
        assert_eq!(outcome.sent, 1);
        assert_eq!(publisher.pending(), 0);
        assert_eq!(publisher.dispatcher().list_for(Recipient::User(creator)).unwrap().len(), 1);
    }
}
