use std::sync::Arc;

use serde::Serialize;

use tradepost_auth::{Action, Actor, NotificationOwner, Resource, enforce};
use tradepost_core::{BusinessId, Clock, DomainError, DomainResult, NotificationId, UserId};
use tradepost_marketplace::{Business, MarketEvent};

use crate::{Notification, NotificationPayload, NotificationStore, Recipient};

/// Who can be reached, resolved at dispatch time.
pub trait RecipientDirectory: Send + Sync {
    /// Every GAA and the DGAA.
    fn global_admins(&self) -> DomainResult<Vec<UserId>>;

    fn business(&self, id: BusinessId) -> DomainResult<Option<Business>>;
}

/// One notification to be created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Delivery {
    pub recipient: Recipient,
    pub payload: NotificationPayload,
}

/// Outcome of fanning out a single event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub sent: usize,
    pub deduplicated: usize,
    /// Deliveries that could not be stored; safe to retry individually.
    pub failed: Vec<Delivery>,
}

impl DispatchReport {
    pub fn merge(&mut self, other: DispatchReport) {
        self.sent += other.sent;
        self.deduplicated += other.deduplicated;
        self.failed.extend(other.failed);
    }
}

pub struct NotificationDispatcher {
    store: Arc<dyn NotificationStore>,
    directory: Arc<dyn RecipientDirectory>,
    clock: Arc<dyn Clock>,
}

impl NotificationDispatcher {
    pub fn new(
        store: Arc<dyn NotificationStore>,
        directory: Arc<dyn RecipientDirectory>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            directory,
            clock,
        }
    }

    /// Create a notification for `recipient`.
    ///
    /// Recurring kinds are de-duplicated per (kind, recipient, subject): when
    /// one is still outstanding nothing is stored and `None` is returned.
    pub fn dispatch(
        &self,
        recipient: Recipient,
        payload: NotificationPayload,
    ) -> DomainResult<Option<Notification>> {
        let notification = Notification::new(recipient, payload, self.clock.now());
        let kind = notification.kind();

        let stored = if kind.is_recurring() {
            self.store.insert_unless_outstanding(notification.clone())?
        } else {
            self.store.insert(notification.clone())?;
            true
        };

        if stored {
            tracing::debug!(%recipient, ?kind, notification_id = %notification.id, "notification created");
            Ok(Some(notification))
        } else {
            tracing::debug!(%recipient, ?kind, "duplicate notification suppressed");
            Ok(None)
        }
    }

    /// Store one delivery. Returns `false` when it was de-duplicated.
    pub fn deliver(&self, delivery: &Delivery) -> DomainResult<bool> {
        self.dispatch(delivery.recipient, delivery.payload.clone())
            .map(|n| n.is_some())
    }

    /// Resolve who should hear about `event`, and what they should be told.
    pub fn deliveries_for(&self, event: &MarketEvent) -> DomainResult<Vec<Delivery>> {
        let deliveries = match event {
            MarketEvent::ListingClosed {
                sale,
                snapshot,
                starred_by,
                ..
            } => {
                let mut out: Vec<Delivery> = starred_by
                    .iter()
                    .map(|user| Delivery {
                        recipient: Recipient::User(*user),
                        payload: NotificationPayload::PurchaseInterest {
                            listing: snapshot.clone(),
                        },
                    })
                    .collect();
                out.push(Delivery {
                    recipient: Recipient::Business(sale.business_id),
                    payload: NotificationPayload::SaleCompleted {
                        sale_id: sale.id,
                        product_name: sale.product.name.clone(),
                        quantity: sale.quantity,
                        price: sale.price,
                        date_sold: sale.date_sold,
                    },
                });
                out
            }
            MarketEvent::CardExpiringSoon {
                card_id,
                creator,
                title,
                display_period_end,
                ..
            } => vec![Delivery {
                recipient: Recipient::User(*creator),
                payload: NotificationPayload::CardExpiringSoon {
                    card_id: *card_id,
                    title: title.clone(),
                    display_period_end: *display_period_end,
                },
            }],
            MarketEvent::CardExpired {
                card_id,
                creator,
                title,
                ..
            } => vec![Delivery {
                recipient: Recipient::User(*creator),
                payload: NotificationPayload::CardDeleted {
                    card_id: *card_id,
                    title: title.clone(),
                },
            }],
            MarketEvent::KeywordAdded {
                keyword,
                created_by,
                ..
            } => self
                .directory
                .global_admins()?
                .into_iter()
                .map(|admin| Delivery {
                    recipient: Recipient::User(admin),
                    payload: NotificationPayload::KeywordAdded {
                        keyword_id: keyword.id,
                        name: keyword.name.clone(),
                        created_by: *created_by,
                    },
                })
                .collect(),
            MarketEvent::AdminStatusChanged {
                user_id, change, ..
            } => vec![Delivery {
                recipient: Recipient::User(*user_id),
                payload: NotificationPayload::AdminStatusChanged {
                    change: change.clone(),
                },
            }],
        };
        Ok(deliveries)
    }

    /// Fan `event` out into notifications. Individual failures are logged and
    /// reported back for retry; they never stop the remaining deliveries.
    pub fn handle_event(&self, event: &MarketEvent) -> DomainResult<DispatchReport> {
        let mut report = DispatchReport::default();
        for delivery in self.deliveries_for(event)? {
            match self.deliver(&delivery) {
                Ok(true) => report.sent += 1,
                Ok(false) => report.deduplicated += 1,
                Err(err) => {
                    tracing::warn!(
                        recipient = %delivery.recipient,
                        error = %err,
                        "failed to store notification"
                    );
                    report.failed.push(delivery);
                }
            }
        }
        Ok(report)
    }

    /// Notifications for `recipient`, newest first. No authorization.
    pub fn list_for(&self, recipient: Recipient) -> DomainResult<Vec<Notification>> {
        self.store.list_for(recipient)
    }

    /// [`Self::list_for`] on behalf of `actor`.
    pub fn list_for_actor(&self, actor: &Actor, recipient: Recipient) -> DomainResult<Vec<Notification>> {
        self.authorize(actor, Action::View, recipient)?;
        self.store.list_for(recipient)
    }

    /// Remove a notification. Allowed for its recipient (any administrator of
    /// a recipient business) and the DGAA.
    pub fn remove(&self, id: NotificationId, actor: &Actor) -> DomainResult<()> {
        let notification = self.find(id)?;
        self.authorize(actor, Action::RemoveNotification, notification.recipient)?;
        self.store.remove(id)?;
        tracing::info!(notification_id = %id, actor = %actor.id, "notification removed");
        Ok(())
    }

    pub fn mark_read(&self, id: NotificationId, actor: &Actor, read: bool) -> DomainResult<Notification> {
        let notification = self.find(id)?;
        self.authorize(actor, Action::Modify, notification.recipient)?;
        self.store.set_read(id, read)
    }

    fn find(&self, id: NotificationId) -> DomainResult<Notification> {
        self.store
            .get(id)?
            .ok_or_else(|| DomainError::not_found(format!("notification {id}")))
    }

    fn authorize(&self, actor: &Actor, action: Action, recipient: Recipient) -> DomainResult<()> {
        match recipient {
            Recipient::User(user) => enforce(
                actor,
                action,
                Resource::Notification(NotificationOwner::User(user)),
            ),
            Recipient::Business(id) => {
                let business = self
                    .directory
                    .business(id)?
                    .ok_or_else(|| DomainError::not_found(format!("business {id}")))?;
                enforce(
                    actor,
                    action,
                    Resource::Notification(NotificationOwner::Business(&business)),
                )
            }
        }
    }
}
