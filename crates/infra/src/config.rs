//! Startup configuration, read from `TRADEPOST_*` environment variables.

use std::time::Duration as StdDuration;

use chrono::Duration;
use thiserror::Error;

use tradepost_marketplace::DEFAULT_DISPLAY_PERIOD_DAYS;
use tradepost_search::DEFAULT_PAGE_SIZE;

pub const SWEEP_INTERVAL_SECS: &str = "TRADEPOST_SWEEP_INTERVAL_SECS";
pub const CARD_DISPLAY_DAYS: &str = "TRADEPOST_CARD_DISPLAY_DAYS";
pub const EXPIRY_WARNING_HOURS: &str = "TRADEPOST_EXPIRY_WARNING_HOURS";
pub const PAGE_SIZE: &str = "TRADEPOST_PAGE_SIZE";
pub const DEFAULT_ADMIN_EMAIL: &str = "TRADEPOST_DEFAULT_ADMIN_EMAIL";
pub const SEED_DEMO_DATA: &str = "TRADEPOST_SEED_DEMO_DATA";

/// Upper bounds keep `now + period` representable for any realistic `now`.
pub const MAX_CARD_DISPLAY_DAYS: u64 = 3_650;
pub const MAX_EXPIRY_WARNING_HOURS: u64 = 24 * 365;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Identity of the default global application admin created at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultAdmin {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl Default for DefaultAdmin {
    fn default() -> Self {
        Self {
            email: "admin@tradepost.local".to_string(),
            first_name: "Default".to_string(),
            last_name: "Admin".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketplaceConfig {
    /// How often the scheduler runs the lifecycle sweep.
    pub sweep_interval: StdDuration,
    /// Display period for new and extended cards.
    pub card_display_period: Duration,
    /// Cards whose display period ends within this window get a warning.
    pub expiry_warning_window: Duration,
    pub page_size: usize,
    pub default_admin: DefaultAdmin,
    pub seed_demo_data: bool,
    /// Attempts for a read-modify-write that keeps hitting version conflicts.
    pub max_conflict_retries: u32,
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        Self {
            sweep_interval: StdDuration::from_secs(60 * 60),
            card_display_period: Duration::days(DEFAULT_DISPLAY_PERIOD_DAYS),
            expiry_warning_window: Duration::hours(24),
            page_size: DEFAULT_PAGE_SIZE,
            default_admin: DefaultAdmin::default(),
            seed_demo_data: false,
            max_conflict_retries: 3,
        }
    }
}

impl MarketplaceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(secs) = parse_positive(&lookup, SWEEP_INTERVAL_SECS)? {
            config.sweep_interval = StdDuration::from_secs(secs);
        }
        if let Some(days) = parse_positive(&lookup, CARD_DISPLAY_DAYS)? {
            config.card_display_period =
                bounded(CARD_DISPLAY_DAYS, days, MAX_CARD_DISPLAY_DAYS, Duration::try_days)?;
        }
        if let Some(hours) = parse_positive(&lookup, EXPIRY_WARNING_HOURS)? {
            config.expiry_warning_window =
                bounded(EXPIRY_WARNING_HOURS, hours, MAX_EXPIRY_WARNING_HOURS, Duration::try_hours)?;
        }
        if let Some(size) = parse_positive(&lookup, PAGE_SIZE)? {
            config.page_size = usize::try_from(size).map_err(|_| invalid(PAGE_SIZE, size, "too large"))?;
        }
        if let Some(email) = lookup(DEFAULT_ADMIN_EMAIL) {
            let email = email.trim().to_string();
            if !email.contains('@') {
                return Err(invalid(DEFAULT_ADMIN_EMAIL, &email, "not an email address"));
            }
            config.default_admin.email = email;
        }
        if let Some(raw) = lookup(SEED_DEMO_DATA) {
            config.seed_demo_data = raw
                .trim()
                .parse::<bool>()
                .map_err(|_| invalid(SEED_DEMO_DATA, &raw, "expected true or false"))?;
        }

        Ok(config)
    }

    pub fn with_sweep_interval(mut self, interval: StdDuration) -> Self {
        self.sweep_interval = interval;
        self
    }

    pub fn with_card_display_period(mut self, period: Duration) -> Self {
        self.card_display_period = period;
        self
    }

    pub fn with_expiry_warning_window(mut self, window: Duration) -> Self {
        self.expiry_warning_window = window;
        self
    }

    pub fn with_page_size(mut self, size: usize) -> Self {
        self.page_size = size;
        self
    }

    pub fn with_default_admin(mut self, admin: DefaultAdmin) -> Self {
        self.default_admin = admin;
        self
    }

    pub fn with_seed_demo_data(mut self, seed: bool) -> Self {
        self.seed_demo_data = seed;
        self
    }

    pub fn with_max_conflict_retries(mut self, retries: u32) -> Self {
        self.max_conflict_retries = retries;
        self
    }
}

fn invalid(key: &'static str, value: impl ToString, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_positive(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<u64>, ConfigError> {
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(invalid(key, &raw, "must be greater than zero")),
        Ok(value) => Ok(Some(value)),
        Err(e) => Err(invalid(key, &raw, &e.to_string())),
    }
}

fn bounded(
    key: &'static str,
    value: u64,
    max: u64,
    to_duration: fn(i64) -> Option<Duration>,
) -> Result<Duration, ConfigError> {
    if value > max {
        return Err(invalid(key, value, &format!("must be at most {max}")));
    }
    i64::try_from(value)
        .ok()
        .and_then(to_duration)
        .ok_or_else(|| invalid(key, value, "out of range"))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = MarketplaceConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, MarketplaceConfig::default());
        assert_eq!(config.page_size, 10);
        assert_eq!(config.card_display_period, Duration::days(14));
    }

    #[test]
    fn overrides_are_applied() {
        let config = MarketplaceConfig::from_lookup(lookup(&[
            (SWEEP_INTERVAL_SECS, "30"),
            (EXPIRY_WARNING_HOURS, "48"),
            (DEFAULT_ADMIN_EMAIL, " root@example.com "),
            (SEED_DEMO_DATA, "true"),
        ]))
        .unwrap();

        assert_eq!(config.sweep_interval, StdDuration::from_secs(30));
        assert_eq!(config.expiry_warning_window, Duration::hours(48));
        assert_eq!(config.default_admin.email, "root@example.com");
        assert!(config.seed_demo_data);
    }

    #[test]
    fn zero_and_garbage_are_rejected() {
        let err = MarketplaceConfig::from_lookup(lookup(&[(PAGE_SIZE, "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: PAGE_SIZE, .. }));

        let err = MarketplaceConfig::from_lookup(lookup(&[(SEED_DEMO_DATA, "maybe")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: SEED_DEMO_DATA, .. }));
    }

    #[test]
    fn oversized_periods_are_rejected_not_panicking() {
        for days in ["200000000000", "1000000000", "3651"] {
            let err = MarketplaceConfig::from_lookup(lookup(&[(CARD_DISPLAY_DAYS, days)])).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { key: CARD_DISPLAY_DAYS, .. }));
        }
        for hours in ["99999999999999999", "8761"] {
            let err = MarketplaceConfig::from_lookup(lookup(&[(EXPIRY_WARNING_HOURS, hours)])).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { key: EXPIRY_WARNING_HOURS, .. }));
        }

        let config = MarketplaceConfig::from_lookup(lookup(&[
            (CARD_DISPLAY_DAYS, "3650"),
            (EXPIRY_WARNING_HOURS, "8760"),
        ]))
        .unwrap();
        assert_eq!(config.card_display_period, Duration::days(3650));
        assert_eq!(config.expiry_warning_window, Duration::hours(8760));
    }
}
