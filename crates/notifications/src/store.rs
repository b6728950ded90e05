use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use tradepost_core::{DomainError, DomainResult, NotificationId};

use crate::{Notification, Recipient};

/// Persistence for notification records.
pub trait NotificationStore: Send + Sync {
    /// Insert unconditionally.
    fn insert(&self, notification: Notification) -> DomainResult<()>;

    /// Insert unless a notification with the same [`Notification::dedupe_key`]
    /// is still stored (read or not). Check and insert are atomic. Returns
    /// whether the notification was stored.
    fn insert_unless_outstanding(&self, notification: Notification) -> DomainResult<bool>;

    fn get(&self, id: NotificationId) -> DomainResult<Option<Notification>>;

    /// All notifications addressed to `recipient`, newest first.
    fn list_for(&self, recipient: Recipient) -> DomainResult<Vec<Notification>>;

    fn set_read(&self, id: NotificationId, read: bool) -> DomainResult<Notification>;

    fn remove(&self, id: NotificationId) -> DomainResult<Option<Notification>>;
}

impl<S> NotificationStore for Arc<S>
where
    S: NotificationStore + ?Sized,
{
    fn insert(&self, notification: Notification) -> DomainResult<()> {
        (**self).insert(notification)
    }

    fn insert_unless_outstanding(&self, notification: Notification) -> DomainResult<bool> {
        (**self).insert_unless_outstanding(notification)
    }

    fn get(&self, id: NotificationId) -> DomainResult<Option<Notification>> {
        (**self).get(id)
    }

    fn list_for(&self, recipient: Recipient) -> DomainResult<Vec<Notification>> {
        (**self).list_for(recipient)
    }

    fn set_read(&self, id: NotificationId, read: bool) -> DomainResult<Notification> {
        (**self).set_read(id, read)
    }

    fn remove(&self, id: NotificationId) -> DomainResult<Option<Notification>> {
        (**self).remove(id)
    }
}

/// In-memory notification store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryNotificationStore {
    rows: RwLock<BTreeMap<NotificationId, Notification>>,
}

impl InMemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.read().map(|rows| rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> DomainError {
    DomainError::storage("notification store lock poisoned")
}

impl NotificationStore for InMemoryNotificationStore {
    fn insert(&self, notification: Notification) -> DomainResult<()> {
        let mut rows = self.rows.write().map_err(|_| poisoned())?;
        rows.insert(notification.id, notification);
        Ok(())
    }

    fn insert_unless_outstanding(&self, notification: Notification) -> DomainResult<bool> {
        let mut rows = self.rows.write().map_err(|_| poisoned())?;
        if let Some(key) = notification.dedupe_key() {
            if rows.values().any(|n| n.dedupe_key().as_ref() == Some(&key)) {
                return Ok(false);
            }
        }
        rows.insert(notification.id, notification);
        Ok(true)
    }

    fn get(&self, id: NotificationId) -> DomainResult<Option<Notification>> {
        let rows = self.rows.read().map_err(|_| poisoned())?;
        Ok(rows.get(&id).cloned())
    }

    fn list_for(&self, recipient: Recipient) -> DomainResult<Vec<Notification>> {
        let rows = self.rows.read().map_err(|_| poisoned())?;
        let mut out: Vec<Notification> = rows
            .values()
            .filter(|n| n.recipient == recipient)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created.cmp(&a.created).then_with(|| b.id.cmp(&a.id)));
        Ok(out)
    }

    fn set_read(&self, id: NotificationId, read: bool) -> DomainResult<Notification> {
        let mut rows = self.rows.write().map_err(|_| poisoned())?;
        let row = rows
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found(format!("notification {id}")))?;
        row.read = read;
        Ok(row.clone())
    }

    fn remove(&self, id: NotificationId) -> DomainResult<Option<Notification>> {
        let mut rows = self.rows.write().map_err(|_| poisoned())?;
        Ok(rows.remove(&id))
    }
}
