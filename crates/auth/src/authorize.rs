use serde::Serialize;
use thiserror::Error;

use tradepost_core::{DomainError, DomainResult, UserId};

use crate::policy::{self, Denial, NotificationOwner};
use crate::{Actor, Administered, Role, SystemRole};

/// What the actor is trying to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    View,
    Modify,
    ManageAdministrators,
    RevokeAdministrator { target: UserId },
    GrantGlobalAdmin,
    RevokeGlobalAdmin { target: UserId },
    RemoveNotification,
    ManageKeywords,
}

/// What the action is performed on.
#[derive(Debug, Clone, Copy)]
pub enum Resource<'a> {
    Business(&'a dyn Administered),
    User(UserId),
    Card { creator: UserId },
    Notification(NotificationOwner<'a>),
    Marketplace,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("denied by state: {0}")]
    State(String),
}

impl From<AuthzError> for DomainError {
    fn from(value: AuthzError) -> Self {
        match value {
            AuthzError::Forbidden(msg) => DomainError::forbidden(msg),
            AuthzError::State(msg) => DomainError::state(msg),
        }
    }
}

fn decide(actor: &Actor, action: Action, resource: Resource<'_>) -> Result<(), Denial> {
    let allowed = match (action, resource) {
        (Action::View | Action::Modify, Resource::Business(b)) => {
            policy::can_act_on_business(actor, b)
        }
        (Action::ManageAdministrators, Resource::Business(b)) => {
            policy::can_manage_administrators(actor, b)
        }
        (Action::RevokeAdministrator { target }, Resource::Business(b)) => {
            return policy::check_revoke_admin(actor, b, target);
        }
        (Action::View | Action::Modify, Resource::User(target)) => {
            policy::can_act_on_user(actor, target)
        }
        (Action::View | Action::Modify, Resource::Card { creator }) => {
            policy::can_act_on_user(actor, creator)
        }
        (Action::GrantGlobalAdmin, Resource::User(_)) => policy::can_grant_global_admin(actor),
        (Action::RevokeGlobalAdmin { target }, Resource::User(_)) => {
            return policy::check_revoke_global_admin(actor, target);
        }
        (Action::View, Resource::Notification(owner)) => {
            policy::can_read_notifications(actor, owner)
        }
        (Action::Modify | Action::RemoveNotification, Resource::Notification(owner)) => {
            policy::can_remove_notification(actor, owner)
        }
        (Action::ManageKeywords, Resource::Marketplace) => policy::can_manage_keywords(actor),
        _ => false,
    };

    if allowed { Ok(()) } else { Err(Denial::InsufficientRole) }
}

/// Decide whether `actor` may perform `action` on `resource`.
///
/// Unknown (action, resource) pairings are denied.
pub fn authorize(actor: &Actor, action: Action, resource: Resource<'_>) -> bool {
    decide(actor, action, resource).is_ok()
}

/// Like [`authorize`], but returns the boundary error for a refusal.
pub fn enforce(actor: &Actor, action: Action, resource: Resource<'_>) -> DomainResult<()> {
    decide(actor, action, resource).map_err(|denial| {
        let context = format!("user {} may not {:?} on {:?}", actor.id, action, resource);
        DomainError::from(denial.into_error(context))
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Authorization Explanation (Audit Trail)
// ─────────────────────────────────────────────────────────────────────────────

/// Detailed explanation of an authorization decision, for audit logs.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationExplanation {
    pub action: Action,
    pub granted: bool,
    pub actor_id: UserId,
    pub system_role: SystemRole,
    /// Role after folding in business membership, when a business is involved.
    pub effective_role: Role,
    pub reason: String,
    pub denial: Option<Denial>,
}

pub fn explain_authorization(
    actor: &Actor,
    action: Action,
    resource: Resource<'_>,
) -> AuthorizationExplanation {
    let business = match resource {
        Resource::Business(b) => Some(b),
        Resource::Notification(NotificationOwner::Business(b)) => Some(b),
        _ => None,
    };
    let effective_role = policy::effective_role(actor, business);

    match decide(actor, action, resource) {
        Ok(()) => AuthorizationExplanation {
            action,
            granted: true,
            actor_id: actor.id,
            system_role: actor.role,
            effective_role,
            reason: format!("effective role '{effective_role}' satisfies {action:?}"),
            denial: None,
        },
        Err(denial) => {
            let reason = match denial {
                Denial::InsufficientRole => {
                    format!("effective role '{effective_role}' does not satisfy {action:?}")
                }
                Denial::PrimaryAdministrator => {
                    "target is the primary administrator and can only be transferred".to_string()
                }
                Denial::SelfRevocation => {
                    "the default global admin cannot revoke its own privilege".to_string()
                }
            };
            AuthorizationExplanation {
                action,
                granted: false,
                actor_id: actor.id,
                system_role: actor.role,
                effective_role,
                reason,
                denial: Some(denial),
            }
        }
    }
}
