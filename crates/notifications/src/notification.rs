use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tradepost_core::{BusinessId, CardId, KeywordId, NotificationId, SaleListingId, UserId};
use tradepost_marketplace::{AdminChange, ListingSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Recipient {
    User(UserId),
    Business(BusinessId),
}

impl core::fmt::Display for Recipient {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Recipient::User(id) => write!(f, "user:{id}"),
            Recipient::Business(id) => write!(f, "business:{id}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    AdminStatusChanged,
    KeywordAdded,
    SaleCompleted,
    PurchaseInterest,
    CardExpiringSoon,
    CardDeleted,
}

impl NotificationKind {
    /// Generated by the periodic sweep and therefore liable to repeat.
    pub fn is_recurring(self) -> bool {
        matches!(self, NotificationKind::CardExpiringSoon | NotificationKind::CardDeleted)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationPayload {
    AdminStatusChanged {
        change: AdminChange,
    },
    KeywordAdded {
        keyword_id: KeywordId,
        name: String,
        created_by: UserId,
    },
    SaleCompleted {
        sale_id: SaleListingId,
        product_name: String,
        quantity: u32,
        price: u64,
        date_sold: DateTime<Utc>,
    },
    /// Snapshot of a listing the recipient had starred; the listing itself is gone.
    PurchaseInterest {
        listing: ListingSnapshot,
    },
    CardExpiringSoon {
        card_id: CardId,
        title: String,
        display_period_end: DateTime<Utc>,
    },
    CardDeleted {
        card_id: CardId,
        title: String,
    },
}

impl NotificationPayload {
    pub fn kind(&self) -> NotificationKind {
        match self {
            NotificationPayload::AdminStatusChanged { .. } => NotificationKind::AdminStatusChanged,
            NotificationPayload::KeywordAdded { .. } => NotificationKind::KeywordAdded,
            NotificationPayload::SaleCompleted { .. } => NotificationKind::SaleCompleted,
            NotificationPayload::PurchaseInterest { .. } => NotificationKind::PurchaseInterest,
            NotificationPayload::CardExpiringSoon { .. } => NotificationKind::CardExpiringSoon,
            NotificationPayload::CardDeleted { .. } => NotificationKind::CardDeleted,
        }
    }

    /// The entity the notification is about, used for de-duplication.
    pub fn subject(&self) -> Option<Uuid> {
        match self {
            NotificationPayload::AdminStatusChanged { change } => match change {
                AdminChange::BusinessAdministratorAdded { business_id, .. }
                | AdminChange::BusinessAdministratorRemoved { business_id, .. }
                | AdminChange::PrimaryAdministratorTransferred { business_id, .. } => {
                    Some(business_id.as_uuid())
                }
                AdminChange::GlobalAdminGranted | AdminChange::GlobalAdminRevoked => None,
            },
            NotificationPayload::KeywordAdded { keyword_id, .. } => Some(keyword_id.as_uuid()),
            NotificationPayload::SaleCompleted { sale_id, .. } => Some(sale_id.as_uuid()),
            NotificationPayload::PurchaseInterest { listing } => Some(listing.listing_id.as_uuid()),
            NotificationPayload::CardExpiringSoon { card_id, .. }
            | NotificationPayload::CardDeleted { card_id, .. } => Some(card_id.as_uuid()),
        }
    }

    /// Short human-readable text.
    pub fn message(&self) -> String {
        match self {
            NotificationPayload::AdminStatusChanged { change } => match change {
                AdminChange::BusinessAdministratorAdded { business_name, .. } => {
                    format!("You are now an administrator of {business_name}")
                }
                AdminChange::BusinessAdministratorRemoved { business_name, .. } => {
                    format!("You are no longer an administrator of {business_name}")
                }
                AdminChange::PrimaryAdministratorTransferred { business_name, .. } => {
                    format!("You are now the primary administrator of {business_name}")
                }
                AdminChange::GlobalAdminGranted => "You have been made a global administrator".into(),
                AdminChange::GlobalAdminRevoked => {
                    "Your global administrator rights have been revoked".into()
                }
            },
            NotificationPayload::KeywordAdded { name, .. } => {
                format!("A new keyword '{name}' was added")
            }
            NotificationPayload::SaleCompleted { product_name, quantity, .. } => {
                format!("{quantity} x {product_name} sold")
            }
            NotificationPayload::PurchaseInterest { listing } => format!(
                "A listing you starred has closed: {} from {}",
                listing.product_name, listing.business_name
            ),
            NotificationPayload::CardExpiringSoon { title, display_period_end, .. } => {
                format!("Your card '{title}' expires at {display_period_end}")
            }
            NotificationPayload::CardDeleted { title, .. } => {
                format!("Your card '{title}' expired and was removed")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub recipient: Recipient,
    pub payload: NotificationPayload,
    pub created: DateTime<Utc>,
    pub read: bool,
}

impl Notification {
    pub fn new(recipient: Recipient, payload: NotificationPayload, created: DateTime<Utc>) -> Self {
        Self {
            id: NotificationId::new(),
            recipient,
            payload,
            created,
            read: false,
        }
    }

    pub fn kind(&self) -> NotificationKind {
        self.payload.kind()
    }

    /// Key under which at most one notification may be outstanding, for
    /// recurring kinds only.
    pub fn dedupe_key(&self) -> Option<(NotificationKind, Recipient, Option<Uuid>)> {
        let kind = self.kind();
        kind.is_recurring()
            .then(|| (kind, self.recipient, self.payload.subject()))
    }

    /// JSON export for external delivery channels.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id,
            "recipient": self.recipient,
            "kind": self.kind(),
            "message": self.payload.message(),
            "payload": self.payload,
            "created": self.created,
            "read": self.read,
        })
    }
}
