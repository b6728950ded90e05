use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tradepost_core::{DomainError, DomainResult, Entity, KeywordId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyword {
    pub id: KeywordId,
    pub name: String,
    pub created: DateTime<Utc>,
}

impl Keyword {
    pub fn new(name: impl Into<String>, created: DateTime<Utc>) -> DomainResult<Self> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("keyword cannot be empty"));
        }
        if name.chars().count() > 25 {
            return Err(DomainError::validation("keyword cannot exceed 25 characters"));
        }
        Ok(Self {
            id: KeywordId::new(),
            name,
            created,
        })
    }

    /// Uniqueness key (names are unique case-insensitively).
    pub fn normalized_name(&self) -> String {
        self.name.to_lowercase()
    }
}

impl Entity for Keyword {
    type Id = KeywordId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
