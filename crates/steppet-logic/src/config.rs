//! Game constants and their validation.
//!
//! [`GameConfig`] bundles the challenge timing rules with the animal
//! catalog. It is plain data supplied at startup, either built in code or
//! loaded from JSON; omitted fields take the defaults below.
//!
//! ```
//! use steppet_logic::config::{validate_config, GameConfig};
//!
//! let config = GameConfig::from_json(r#"{ "rules": { "cooldown_duration_days": 7 } }"#).unwrap();
//! assert_eq!(config.rules.cooldown_duration_days, 7);
//! assert_eq!(config.rules.challenge_duration_days, 14);
//! assert!(validate_config(&config).is_empty());
//! ```

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{AnimalCatalog, AnimalKind};

/// Longest challenge or cooldown a config may ask for.
pub const MAX_DURATION_DAYS: i64 = 3650;

/// Timing and banking rules for unlock challenges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionRules {
    /// Days a challenge runs before it fails.
    pub challenge_duration_days: i64,
    /// Days a kind is locked out after a failed or abandoned challenge.
    pub cooldown_duration_days: i64,
    /// Share of progress kept after a failure, in whole percent (truncated).
    pub bank_percent: u64,
    /// Offset from UTC of the player's calendar day, in minutes.
    pub utc_offset_minutes: i32,
}

impl Default for ProgressionRules {
    fn default() -> Self {
        Self {
            challenge_duration_days: 14,
            cooldown_duration_days: 14,
            bank_percent: 10,
            utc_offset_minutes: 0,
        }
    }
}

impl ProgressionRules {
    /// Deadline of a challenge started at `now`, or `None` if it falls
    /// outside the representable time range.
    pub fn challenge_deadline(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        days_after(now, self.challenge_duration_days)
    }

    /// End of the cooldown for a challenge failed at `now`.
    pub fn cooldown_end(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        days_after(now, self.cooldown_duration_days)
    }

    /// Progress kept from an attempt that ended with `progress`.
    pub fn banked_share(&self, progress: u64) -> u64 {
        progress.saturating_mul(self.bank_percent) / 100
    }

    /// Calendar date of `now` in the player's day offset.
    pub fn day_of(&self, now: DateTime<Utc>) -> NaiveDate {
        match FixedOffset::east_opt(self.utc_offset_minutes.saturating_mul(60)) {
            Some(offset) => now.with_timezone(&offset).date_naive(),
            None => now.date_naive(),
        }
    }
}

fn days_after(now: DateTime<Utc>, days: i64) -> Option<DateTime<Utc>> {
    Duration::try_days(days).and_then(|d| now.checked_add_signed(d))
}

/// Everything the progression core needs at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub rules: ProgressionRules,
    pub catalog: AnimalCatalog,
}

impl GameConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        let config: GameConfig = serde_json::from_str(json)?;
        let errors = validate_config(&config);
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(LoadError::Invalid(errors))
        }
    }
}

/// Configuration validation error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("challenge duration must be 1..={max} days, got {0}", max = MAX_DURATION_DAYS)]
    InvalidChallengeDuration(i64),
    #[error("cooldown duration must be 0..={max} days, got {0}", max = MAX_DURATION_DAYS)]
    InvalidCooldownDuration(i64),
    #[error("bank percent must be 0..=100, got {0}")]
    InvalidBankPercent(u64),
    #[error("UTC offset must be within ±24h, got {0} minutes")]
    InvalidUtcOffset(i32),
    #[error("catalog has no entry for {0}")]
    MissingAnimal(AnimalKind),
    #[error("catalog has no starter pet")]
    NoStarterPet,
}

/// Failure to load a [`GameConfig`].
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0:?}")]
    Invalid(Vec<ConfigError>),
}

/// Validate a game configuration, returning all errors found.
pub fn validate_config(config: &GameConfig) -> Vec<ConfigError> {
    let mut errors = Vec::new();
    let rules = &config.rules;

    if !(1..=MAX_DURATION_DAYS).contains(&rules.challenge_duration_days) {
        errors.push(ConfigError::InvalidChallengeDuration(
            rules.challenge_duration_days,
        ));
    }
    if !(0..=MAX_DURATION_DAYS).contains(&rules.cooldown_duration_days) {
        errors.push(ConfigError::InvalidCooldownDuration(
            rules.cooldown_duration_days,
        ));
    }
    if rules.bank_percent > 100 {
        errors.push(ConfigError::InvalidBankPercent(rules.bank_percent));
    }
    if rules.utc_offset_minutes.unsigned_abs() >= 24 * 60 {
        errors.push(ConfigError::InvalidUtcOffset(rules.utc_offset_minutes));
    }

    for kind in config.catalog.missing_kinds() {
        errors.push(ConfigError::MissingAnimal(kind));
    }
    if config.catalog.starters().next().is_none() {
        errors.push(ConfigError::NoStarterPet);
    }

    errors
}
