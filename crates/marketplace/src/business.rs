use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tradepost_auth::Administered;
use tradepost_core::{BusinessId, DomainError, DomainResult, Entity, UserId, Versioned};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BusinessType {
    #[serde(rename = "Accommodation and Food Services")]
    AccommodationAndFoodServices,
    #[serde(rename = "Retail Trade")]
    RetailTrade,
    #[serde(rename = "Charitable organisation")]
    CharitableOrganisation,
    #[serde(rename = "Non-profit organisation")]
    NonProfitOrganisation,
}

impl BusinessType {
    pub const ALL: [BusinessType; 4] = [
        BusinessType::AccommodationAndFoodServices,
        BusinessType::RetailTrade,
        BusinessType::CharitableOrganisation,
        BusinessType::NonProfitOrganisation,
    ];

    pub fn label(self) -> &'static str {
        match self {
            BusinessType::AccommodationAndFoodServices => "Accommodation and Food Services",
            BusinessType::RetailTrade => "Retail Trade",
            BusinessType::CharitableOrganisation => "Charitable organisation",
            BusinessType::NonProfitOrganisation => "Non-profit organisation",
        }
    }
}

impl core::fmt::Display for BusinessType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

impl core::str::FromStr for BusinessType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BusinessType::ALL
            .into_iter()
            .find(|t| t.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DomainError::validation(format!("unknown business type '{s}'")))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street_number: Option<String>,
    pub street_name: Option<String>,
    pub suburb: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: String,
    pub postcode: Option<String>,
}

impl Address {
    pub fn new(country: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            ..Self::default()
        }
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }
}

/// A trading entity run by one or more administrators.
///
/// `administrators` always contains `primary_administrator_id`; the mutators
/// below are the only way to change either and they keep that true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Business {
    pub id: BusinessId,
    pub name: String,
    pub description: Option<String>,
    pub business_type: BusinessType,
    pub address: Address,
    primary_administrator_id: UserId,
    administrators: BTreeSet<UserId>,
    pub created: DateTime<Utc>,
    pub version: u64,
}

impl Business {
    pub fn new(
        name: impl Into<String>,
        business_type: BusinessType,
        address: Address,
        primary_administrator_id: UserId,
        created: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("business name cannot be empty"));
        }
        if address.country.trim().is_empty() {
            return Err(DomainError::validation("business address must include a country"));
        }
        Ok(Self {
            id: BusinessId::new(),
            name: name.trim().to_string(),
            description: None,
            business_type,
            address,
            primary_administrator_id,
            administrators: BTreeSet::from([primary_administrator_id]),
            created,
            version: 0,
        })
    }

    pub fn administrators(&self) -> &BTreeSet<UserId> {
        &self.administrators
    }

    pub fn add_administrator(&mut self, user_id: UserId) -> DomainResult<()> {
        if !self.administrators.insert(user_id) {
            return Err(DomainError::conflict(format!(
                "user {user_id} is already an administrator of {}",
                self.name
            )));
        }
        Ok(())
    }

    pub fn remove_administrator(&mut self, user_id: UserId) -> DomainResult<()> {
        if user_id == self.primary_administrator_id {
            return Err(DomainError::state(
                "the primary administrator cannot be removed, only transferred",
            ));
        }
        if !self.administrators.remove(&user_id) {
            return Err(DomainError::validation(format!(
                "user {user_id} is not an administrator of {}",
                self.name
            )));
        }
        Ok(())
    }

    /// Hand primary administration to an existing administrator. The previous
    /// primary stays on as a regular administrator.
    pub fn transfer_primary_administrator(&mut self, user_id: UserId) -> DomainResult<UserId> {
        if !self.administrators.contains(&user_id) {
            return Err(DomainError::validation(format!(
                "user {user_id} must be an administrator before becoming primary"
            )));
        }
        let previous = self.primary_administrator_id;
        self.primary_administrator_id = user_id;
        Ok(previous)
    }
}

impl Administered for Business {
    fn business_id(&self) -> BusinessId {
        self.id
    }

    fn primary_administrator_id(&self) -> UserId {
        self.primary_administrator_id
    }

    fn is_administrator(&self, user_id: UserId) -> bool {
        self.administrators.contains(&user_id)
    }
}

impl Entity for Business {
    type Id = BusinessId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Versioned for Business {
    fn version(&self) -> u64 {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}
