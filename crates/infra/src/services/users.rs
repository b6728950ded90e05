use tradepost_auth::{Action, Actor, Resource, SystemRole, enforce};
use tradepost_core::{DomainError, DomainResult, ExpectedVersion, UserId};
use tradepost_marketplace::{AdminChange, MarketEvent, User};

use super::missing;
use crate::Marketplace;
use crate::store::{Change, ChangeSet};

impl Marketplace {
    /// Create a plain user account. Emails are unique, case-insensitively.
    pub fn register_user(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
    ) -> DomainResult<User> {
        let user = User::new(first_name, last_name, email, self.now())?;
        self.store.commit(ChangeSet::new().with(Change::PutUser {
            user: user.clone(),
            expected: ExpectedVersion::Exact(0),
        }))?;
        tracing::info!(user_id = %user.id, "user registered");
        self.load_user(user.id)
    }

    pub fn user(&self, actor: &Actor, id: UserId) -> DomainResult<User> {
        enforce(actor, Action::View, Resource::User(id))?;
        self.load_user(id)
    }

    /// DGAA only.
    pub fn grant_global_admin(&self, actor: &Actor, target: UserId) -> DomainResult<User> {
        enforce(actor, Action::GrantGlobalAdmin, Resource::User(target))?;
        let granted = self.with_conflict_retry("grant_global_admin", || {
            let mut user = self.load_user(target)?;
            if user.role.is_global_admin() {
                return Ok(false);
            }
            let expected = ExpectedVersion::Exact(user.version);
            user.role = SystemRole::GlobalApplicationAdmin;
            self.store.commit(ChangeSet::new().with(Change::PutUser { user, expected }))?;
            Ok(true)
        })?;

        if granted {
            tracing::info!(actor = %actor.id, user_id = %target, "global admin granted");
            self.publish(MarketEvent::AdminStatusChanged {
                user_id: target,
                change: AdminChange::GlobalAdminGranted,
                occurred_at: self.now(),
            });
        }
        self.load_user(target)
    }

    /// DGAA only; the DGAA cannot revoke itself.
    pub fn revoke_global_admin(&self, actor: &Actor, target: UserId) -> DomainResult<User> {
        enforce(actor, Action::RevokeGlobalAdmin { target }, Resource::User(target))?;
        self.with_conflict_retry("revoke_global_admin", || {
            let mut user = self.load_user(target)?;
            if user.role != SystemRole::GlobalApplicationAdmin {
                return Err(DomainError::state(format!("user {target} is not a global admin")));
            }
            let expected = ExpectedVersion::Exact(user.version);
            user.role = SystemRole::User;
            self.store.commit(ChangeSet::new().with(Change::PutUser { user, expected }))
        })?;

        tracing::info!(actor = %actor.id, user_id = %target, "global admin revoked");
        self.publish(MarketEvent::AdminStatusChanged {
            user_id: target,
            change: AdminChange::GlobalAdminRevoked,
            occurred_at: self.now(),
        });
        self.load_user(target)
    }

    pub(crate) fn load_user(&self, id: UserId) -> DomainResult<User> {
        self.store.user(id)?.ok_or_else(|| missing("user", id))
    }
}
