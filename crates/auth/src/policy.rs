//! Pure authorization rules.
//!
//! - No IO
//! - No panics
//! - No state mutation
//!
//! Every rule reduces to a comparison against [`Role`]'s ordering. Callers turn
//! a `false` into an error at their boundary (see [`crate::enforce`]).

use serde::Serialize;

use tradepost_core::UserId;

use crate::authorize::AuthzError;
use crate::{Actor, Administered, Role};

/// Why a revocation was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Denial {
    /// The actor's effective role is too low for the action.
    InsufficientRole,
    /// The target is the business's primary administrator; it can only be transferred.
    PrimaryAdministrator,
    /// The default global admin tried to revoke its own privilege.
    SelfRevocation,
}

impl Denial {
    /// Map a denial onto the authorization error vocabulary.
    ///
    /// Refusals caused by the *state* of the target (primary admin, self
    /// revocation) are state errors; lack of privilege is forbidden.
    pub fn into_error(self, context: impl Into<String>) -> AuthzError {
        let context = context.into();
        match self {
            Denial::InsufficientRole => AuthzError::Forbidden(context),
            Denial::PrimaryAdministrator => AuthzError::State(format!(
                "{context}: the primary administrator cannot be removed, only transferred"
            )),
            Denial::SelfRevocation => {
                AuthzError::State(format!("{context}: the default admin cannot revoke itself"))
            }
        }
    }
}

/// Highest role the actor holds with respect to an (optional) business.
pub fn effective_role(actor: &Actor, business: Option<&dyn Administered>) -> Role {
    let relation = match business {
        Some(b) if b.primary_administrator_id() == actor.id => Role::PrimaryAdministrator,
        Some(b) if b.is_administrator(actor.id) => Role::BusinessAdministrator,
        _ => Role::User,
    };
    relation.max(actor.role.as_role())
}

/// Administrators of the business, GAA and DGAA.
pub fn can_act_on_business(actor: &Actor, business: &dyn Administered) -> bool {
    effective_role(actor, Some(business)) >= Role::BusinessAdministrator
}

/// Adding/removing administrators needs the primary administrator or a global admin.
pub fn can_manage_administrators(actor: &Actor, business: &dyn Administered) -> bool {
    effective_role(actor, Some(business)) >= Role::PrimaryAdministrator
}

/// The user themself, GAA and DGAA.
pub fn can_act_on_user(actor: &Actor, target: UserId) -> bool {
    actor.id == target || actor.role.as_role() >= Role::GlobalApplicationAdmin
}

pub fn check_revoke_admin(
    actor: &Actor,
    business: &dyn Administered,
    target: UserId,
) -> Result<(), Denial> {
    if !can_manage_administrators(actor, business) {
        return Err(Denial::InsufficientRole);
    }
    if target == business.primary_administrator_id() {
        return Err(Denial::PrimaryAdministrator);
    }
    if actor.id == target && actor.is_default_admin() {
        return Err(Denial::SelfRevocation);
    }
    Ok(())
}

pub fn can_revoke_admin(actor: &Actor, business: &dyn Administered, target: UserId) -> bool {
    check_revoke_admin(actor, business, target).is_ok()
}

/// Only the DGAA hands out global admin.
pub fn can_grant_global_admin(actor: &Actor) -> bool {
    actor.role.as_role() >= Role::DefaultGlobalApplicationAdmin
}

pub fn check_revoke_global_admin(actor: &Actor, target: UserId) -> Result<(), Denial> {
    if !can_grant_global_admin(actor) {
        return Err(Denial::InsufficientRole);
    }
    if actor.id == target {
        return Err(Denial::SelfRevocation);
    }
    Ok(())
}

/// Keyword curation is reserved for global admins.
pub fn can_manage_keywords(actor: &Actor) -> bool {
    actor.role.as_role() >= Role::GlobalApplicationAdmin
}

/// Owner of a notification: a user, or a business (through its administrators).
#[derive(Debug, Clone, Copy)]
pub enum NotificationOwner<'a> {
    User(UserId),
    Business(&'a dyn Administered),
}

/// Reading a notification inbox: the same rules as acting on its owner.
pub fn can_read_notifications(actor: &Actor, owner: NotificationOwner<'_>) -> bool {
    match owner {
        NotificationOwner::User(user) => can_act_on_user(actor, user),
        NotificationOwner::Business(business) => can_act_on_business(actor, business),
    }
}

/// Removing a notification: its recipient, or the DGAA.
pub fn can_remove_notification(actor: &Actor, owner: NotificationOwner<'_>) -> bool {
    if actor.is_default_admin() {
        return true;
    }
    match owner {
        NotificationOwner::User(user) => actor.id == user,
        NotificationOwner::Business(business) => business.is_administrator(actor.id),
    }
}
