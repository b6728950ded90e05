use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tradepost_auth::{Actor, SystemRole};
use tradepost_core::{BusinessId, DomainError, DomainResult, Entity, UserId, Versioned};

/// A registered account.
///
/// Business administration is not stored as a role here: it is derived from
/// the business's administrator set. `businesses_administered` mirrors that
/// set for lookups and is kept in step by the services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub nickname: Option<String>,
    pub email: String,
    pub role: SystemRole,
    pub businesses_administered: BTreeSet<BusinessId>,
    pub created: DateTime<Utc>,
    pub version: u64,
}

impl User {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        created: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let first_name = first_name.into();
        let last_name = last_name.into();
        let email = email.into();

        if first_name.trim().is_empty() || last_name.trim().is_empty() {
            return Err(DomainError::validation("first and last name are required"));
        }
        if email.trim().is_empty() {
            return Err(DomainError::validation("email is required"));
        }

        Ok(Self {
            id: UserId::new(),
            first_name: first_name.trim().to_string(),
            middle_name: None,
            last_name: last_name.trim().to_string(),
            nickname: None,
            email: email.trim().to_string(),
            role: SystemRole::User,
            businesses_administered: BTreeSet::new(),
            created,
            version: 0,
        })
    }

    pub fn with_middle_name(mut self, middle_name: impl Into<String>) -> Self {
        self.middle_name = Some(middle_name.into());
        self
    }

    pub fn with_nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = Some(nickname.into());
        self
    }

    pub fn with_role(mut self, role: SystemRole) -> Self {
        self.role = role;
        self
    }

    /// The authenticated identity this account acts as.
    pub fn actor(&self) -> Actor {
        Actor::new(self.id, self.role)
    }

    pub fn full_name(&self) -> String {
        match &self.middle_name {
            Some(middle) => format!("{} {} {}", self.first_name, middle, self.last_name),
            None => format!("{} {}", self.first_name, self.last_name),
        }
    }

    /// Emails are unique case-insensitively.
    pub fn email_key(&self) -> String {
        self.email.to_lowercase()
    }
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Versioned for User {
    fn version(&self) -> u64 {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_names_are_rejected() {
        let err = User::new(" ", "Smith", "a@b.c", Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn full_name_includes_middle_name() {
        let user = User::new("Ada", "Lovelace", "ada@example.com", Utc::now())
            .unwrap()
            .with_middle_name("King");
        assert_eq!(user.full_name(), "Ada King Lovelace");
        assert_eq!(user.actor().role, SystemRole::User);
    }
}
