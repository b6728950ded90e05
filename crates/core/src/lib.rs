//! Domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod clock;
pub mod entity;
pub mod error;
pub mod id;
pub mod version;

pub use clock::{Clock, FixedClock, SystemClock};
pub use entity::{Entity, Versioned};
pub use error::{DomainError, DomainResult};
pub use id::{
    BusinessId, CardId, InventoryItemId, KeywordId, LikedSaleListingId, NotificationId,
    SaleListingId, UserId,
};
pub use version::ExpectedVersion;
