use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tradepost_core::{DomainError, Entity, LikedSaleListingId, SaleListingId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tag {
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
    #[default]
    None,
}

impl core::str::FromStr for Tag {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "red" => Ok(Tag::Red),
            "orange" => Ok(Tag::Orange),
            "yellow" => Ok(Tag::Yellow),
            "green" => Ok(Tag::Green),
            "blue" => Ok(Tag::Blue),
            "purple" => Ok(Tag::Purple),
            "none" | "" => Ok(Tag::None),
            other => Err(DomainError::validation(format!("unknown tag colour '{other}'"))),
        }
    }
}

/// A user's bookmark on an active listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikedSaleListing {
    pub id: LikedSaleListingId,
    pub user_id: UserId,
    pub listing_id: SaleListingId,
    pub starred: bool,
    pub tag: Tag,
    pub liked_at: DateTime<Utc>,
}

impl LikedSaleListing {
    pub fn new(user_id: UserId, listing_id: SaleListingId, liked_at: DateTime<Utc>) -> Self {
        Self {
            id: LikedSaleListingId::new(),
            user_id,
            listing_id,
            starred: false,
            tag: Tag::None,
            liked_at,
        }
    }
}

impl Entity for LikedSaleListing {
    type Id = LikedSaleListingId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
