//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $t:ident, $name:literal) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $t(Uuid);

        impl $t {
            /// Create a new identifier.
            ///
            /// UUIDv7, so ids are roughly time-ordered.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $t {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $t {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$t> for Uuid {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = Uuid::from_str(s)
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                Ok(Self(uuid))
            }
        }
    };
}

uuid_id!(
    /// Identifier of a user (actor identity).
    UserId,
    "UserId"
);
uuid_id!(
    /// Identifier of a business.
    BusinessId,
    "BusinessId"
);
uuid_id!(
    /// Identifier of an inventory item.
    InventoryItemId,
    "InventoryItemId"
);
uuid_id!(
    /// Identifier of a sale listing. A `Sale` reuses the id of the listing it closed.
    SaleListingId,
    "SaleListingId"
);
uuid_id!(
    /// Identifier of a user's like on a sale listing.
    LikedSaleListingId,
    "LikedSaleListingId"
);
uuid_id!(
    /// Identifier of a marketplace card.
    CardId,
    "CardId"
);
uuid_id!(KeywordId, "KeywordId");
uuid_id!(NotificationId, "NotificationId");
