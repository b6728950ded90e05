use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tradepost_core::{BusinessId, DomainError, DomainResult, Entity};

/// Products are keyed by their business and a business-chosen code.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProductKey {
    pub business_id: BusinessId,
    pub code: String,
}

impl ProductKey {
    /// Codes are upper-case letters, digits and hyphens.
    pub fn new(business_id: BusinessId, code: impl Into<String>) -> DomainResult<Self> {
        let code = code.into().trim().to_uppercase();
        if code.is_empty() {
            return Err(DomainError::validation("product code cannot be empty"));
        }
        if !code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(DomainError::validation(format!(
                "product code '{code}' may only contain letters, digits and hyphens"
            )));
        }
        Ok(Self { business_id, code })
    }
}

impl core::fmt::Display for ProductKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}", self.business_id, self.code)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub key: ProductKey,
    pub name: String,
    pub description: Option<String>,
    pub manufacturer: Option<String>,
    /// Recommended retail price in minor units of `currency`.
    pub recommended_retail_price: Option<u64>,
    pub currency: String,
    pub created: DateTime<Utc>,
}

impl Product {
    pub fn new(
        key: ProductKey,
        name: impl Into<String>,
        currency: impl Into<String>,
        created: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("product name cannot be empty"));
        }
        Ok(Self {
            key,
            name: name.trim().to_string(),
            description: None,
            manufacturer: None,
            recommended_retail_price: None,
            currency: currency.into(),
            created,
        })
    }

    pub fn with_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }

    pub fn with_recommended_retail_price(mut self, price: u64) -> Self {
        self.recommended_retail_price = Some(price);
        self
    }
}

impl Entity for Product {
    type Id = ProductKey;

    fn id(&self) -> &Self::Id {
        &self.key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_normalised_and_checked() {
        let business = BusinessId::new();
        assert_eq!(ProductKey::new(business, " wat-01 ").unwrap().code, "WAT-01");
        assert!(ProductKey::new(business, "bad code").is_err());
        assert!(ProductKey::new(business, "").is_err());
    }
}
