use serde::{Deserialize, Serialize};

use tradepost_core::{BusinessId, UserId};

use crate::SystemRole;

/// An already-authenticated caller.
///
/// Resolving credentials into an actor is the job of the authentication
/// middleware in front of the core; the core never sees tokens or passwords.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: UserId,
    pub role: SystemRole,
}

impl Actor {
    pub fn new(id: UserId, role: SystemRole) -> Self {
        Self { id, role }
    }

    pub fn user(id: UserId) -> Self {
        Self::new(id, SystemRole::User)
    }

    pub fn is_global_admin(&self) -> bool {
        self.role.is_global_admin()
    }

    pub fn is_default_admin(&self) -> bool {
        self.role.is_default_admin()
    }
}

/// Read-only view of a business's administration, as seen by the policy.
///
/// Implemented by the business entity so the policy stays free of storage
/// and domain-model details.
pub trait Administered {
    fn business_id(&self) -> BusinessId;

    fn primary_administrator_id(&self) -> UserId;

    fn is_administrator(&self, user_id: UserId) -> bool;
}

impl core::fmt::Debug for dyn Administered + '_ {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Administered")
            .field("business_id", &self.business_id())
            .field("primary_administrator_id", &self.primary_administrator_id())
            .finish()
    }
}
