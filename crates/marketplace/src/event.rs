use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tradepost_core::{BusinessId, CardId, UserId};
use tradepost_events::Event;

use crate::{Keyword, ListingSnapshot, Sale};

/// A change to someone's administrative standing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum AdminChange {
    BusinessAdministratorAdded { business_id: BusinessId, business_name: String },
    BusinessAdministratorRemoved { business_id: BusinessId, business_name: String },
    PrimaryAdministratorTransferred { business_id: BusinessId, business_name: String },
    GlobalAdminGranted,
    GlobalAdminRevoked,
}

/// Facts published after the corresponding change has been committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MarketEvent {
    ListingClosed {
        sale: Sale,
        snapshot: ListingSnapshot,
        /// Users who had starred the listing, captured before their likes were removed.
        starred_by: Vec<UserId>,
        occurred_at: DateTime<Utc>,
    },
    CardExpiringSoon {
        card_id: CardId,
        creator: UserId,
        title: String,
        display_period_end: DateTime<Utc>,
        occurred_at: DateTime<Utc>,
    },
    CardExpired {
        card_id: CardId,
        creator: UserId,
        title: String,
        occurred_at: DateTime<Utc>,
    },
    KeywordAdded {
        keyword: Keyword,
        created_by: UserId,
        occurred_at: DateTime<Utc>,
    },
    AdminStatusChanged {
        user_id: UserId,
        change: AdminChange,
        occurred_at: DateTime<Utc>,
    },
}

impl Event for MarketEvent {
    fn event_type(&self) -> &'static str {
        match self {
            MarketEvent::ListingClosed { .. } => "listing.closed",
            MarketEvent::CardExpiringSoon { .. } => "card.expiring_soon",
            MarketEvent::CardExpired { .. } => "card.expired",
            MarketEvent::KeywordAdded { .. } => "keyword.added",
            MarketEvent::AdminStatusChanged { .. } => "user.admin_status_changed",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            MarketEvent::ListingClosed { occurred_at, .. }
            | MarketEvent::CardExpiringSoon { occurred_at, .. }
            | MarketEvent::CardExpired { occurred_at, .. }
            | MarketEvent::KeywordAdded { occurred_at, .. }
            | MarketEvent::AdminStatusChanged { occurred_at, .. } => *occurred_at,
        }
    }
}
