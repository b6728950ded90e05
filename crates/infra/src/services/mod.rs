//! User-facing operations. Each one authorizes the actor, commits a single
//! change set, and publishes its events once the commit has landed.

mod businesses;
mod cards;
mod inventory;
mod keywords;
mod listings;
mod search;
mod users;

use core::fmt::Display;

use tradepost_core::DomainError;

pub use cards::{CardEdit, NewCard};
pub use listings::NewListing;
pub use search::{BusinessSearch, CardSearch, ListingField, ListingSearch, ListingSort};

fn missing(what: &str, id: impl Display) -> DomainError {
    DomainError::not_found(format!("{what} {id}"))
}
