//! In-system notifications.
//!
//! The dispatcher turns market events and administrative actions into
//! recipient-scoped [`Notification`] records. Delivery beyond the record (email,
//! push) belongs to external consumers.

pub mod dispatcher;
pub mod notification;
pub mod store;

pub use dispatcher::{Delivery, DispatchReport, NotificationDispatcher, RecipientDirectory};
pub use notification::{Notification, NotificationKind, NotificationPayload, Recipient};
pub use store::{InMemoryNotificationStore, NotificationStore};
