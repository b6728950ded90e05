//! Marketplace domain model.
//!
//! Plain entities and their local rules (no IO, no storage, no clocks: every
//! time-dependent method takes `now`). Cross-entity rules such as the listing
//! reservation invariant are expressed as free functions over the entities
//! involved so the store can re-check them inside its commit.

pub mod business;
pub mod card;
pub mod event;
pub mod inventory;
pub mod keyword;
pub mod liked;
pub mod listing;
pub mod product;
pub mod sale;
pub mod user;

pub use business::{Address, Business, BusinessType};
pub use card::{Card, DEFAULT_DISPLAY_PERIOD_DAYS, Section, default_display_period};
pub use event::{AdminChange, MarketEvent};
pub use inventory::InventoryItem;
pub use keyword::Keyword;
pub use liked::{LikedSaleListing, Tag};
pub use listing::{ListingSnapshot, SaleListing, available_for_listing, check_reservation};
pub use product::{Product, ProductKey};
pub use sale::{ProductSnapshot, Sale};
pub use user::User;
