use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use tradepost_core::{CardId, DomainError, DomainResult, Entity, KeywordId, UserId, Versioned};

pub const DEFAULT_DISPLAY_PERIOD_DAYS: i64 = 14;

pub fn default_display_period() -> Duration {
    Duration::days(DEFAULT_DISPLAY_PERIOD_DAYS)
}

fn period_end(now: DateTime<Utc>, period: Duration) -> DomainResult<DateTime<Utc>> {
    now.checked_add_signed(period)
        .ok_or_else(|| DomainError::validation(format!("display period {period} is out of range")))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Section {
    ForSale,
    Wanted,
    Exchange,
}

impl Section {
    pub fn label(self) -> &'static str {
        match self {
            Section::ForSale => "ForSale",
            Section::Wanted => "Wanted",
            Section::Exchange => "Exchange",
        }
    }
}

impl core::str::FromStr for Section {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "forsale" | "for_sale" | "for sale" => Ok(Section::ForSale),
            "wanted" => Ok(Section::Wanted),
            "exchange" => Ok(Section::Exchange),
            other => Err(DomainError::validation(format!("unknown card section '{other}'"))),
        }
    }
}

/// A community marketplace card, visible until `display_period_end`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub creator: UserId,
    pub section: Section,
    pub title: String,
    pub description: Option<String>,
    pub keywords: BTreeSet<KeywordId>,
    pub created: DateTime<Utc>,
    pub display_period_end: DateTime<Utc>,
    pub version: u64,
}

impl Card {
    pub fn new(
        creator: UserId,
        section: Section,
        title: impl Into<String>,
        now: DateTime<Utc>,
        display_period: Duration,
    ) -> DomainResult<Self> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(DomainError::validation("card title cannot be empty"));
        }
        let display_period_end = period_end(now, display_period)?;
        Ok(Self {
            id: CardId::new(),
            creator,
            section,
            title: title.trim().to_string(),
            description: None,
            keywords: BTreeSet::new(),
            created: now,
            display_period_end,
            version: 0,
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_keywords(mut self, keywords: impl IntoIterator<Item = KeywordId>) -> Self {
        self.keywords.extend(keywords);
        self
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.display_period_end <= now
    }

    /// Still active, but will expire within `window` of `now`. A window
    /// reaching past the representable range covers every active card.
    pub fn expires_within(&self, now: DateTime<Utc>, window: Duration) -> bool {
        !self.is_expired(now)
            && now
                .checked_add_signed(window)
                .is_none_or(|horizon| self.display_period_end <= horizon)
    }

    /// Push the end of the display period to `now + period`, keeping identity.
    pub fn extend_display_period(
        &mut self,
        now: DateTime<Utc>,
        period: Duration,
    ) -> DomainResult<()> {
        if self.is_expired(now) {
            return Err(DomainError::state(format!("card {} has already expired", self.id)));
        }
        self.display_period_end = period_end(now, period)?;
        Ok(())
    }

    pub fn remove_keyword(&mut self, keyword: KeywordId) -> bool {
        self.keywords.remove(&keyword)
    }
}

impl Entity for Card {
    type Id = CardId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Versioned for Card {
    fn version(&self) -> u64 {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}
