//! Pure authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: it receives an
//! already-authenticated [`Actor`] and answers yes/no.

pub mod actor;
pub mod authorize;
pub mod policy;
pub mod roles;

pub use actor::{Actor, Administered};
pub use authorize::{
    Action, AuthorizationExplanation, AuthzError, Resource, authorize, enforce,
    explain_authorization,
};
pub use policy::{Denial, NotificationOwner};
pub use roles::{Role, SystemRole};
