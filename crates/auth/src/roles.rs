use serde::{Deserialize, Serialize};

/// Totally ordered authority levels.
///
/// Every authorization rule is a comparison against this ordering: a role
/// satisfies every check that any lower role satisfies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    User,
    BusinessAdministrator,
    PrimaryAdministrator,
    GlobalApplicationAdmin,
    DefaultGlobalApplicationAdmin,
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Role::User => "user",
            Role::BusinessAdministrator => "businessAdministrator",
            Role::PrimaryAdministrator => "primaryAdministrator",
            Role::GlobalApplicationAdmin => "globalApplicationAdmin",
            Role::DefaultGlobalApplicationAdmin => "defaultGlobalApplicationAdmin",
        };
        f.write_str(name)
    }
}

/// Role stored on the user account itself.
///
/// Business administration is not a system role; it is derived from business
/// membership at decision time (see [`crate::policy::effective_role`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SystemRole {
    #[default]
    User,
    GlobalApplicationAdmin,
    DefaultGlobalApplicationAdmin,
}

impl SystemRole {
    pub fn as_role(self) -> Role {
        match self {
            SystemRole::User => Role::User,
            SystemRole::GlobalApplicationAdmin => Role::GlobalApplicationAdmin,
            SystemRole::DefaultGlobalApplicationAdmin => Role::DefaultGlobalApplicationAdmin,
        }
    }

    /// GAA or DGAA.
    pub fn is_global_admin(self) -> bool {
        self.as_role() >= Role::GlobalApplicationAdmin
    }

    pub fn is_default_admin(self) -> bool {
        self == SystemRole::DefaultGlobalApplicationAdmin
    }
}
