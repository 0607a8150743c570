//! Lending configuration.
//!
//! Read from the environment once at startup and passed down explicitly;
//! there is no global instance.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use libris_core::Money;

pub const ENV_PER_DIEM_RATE: &str = "LIBRIS_PER_DIEM_RATE";
pub const ENV_MIN_DURATION_DAYS: &str = "LIBRIS_MIN_DURATION_DAYS";
pub const ENV_MAX_DURATION_DAYS: &str = "LIBRIS_MAX_DURATION_DAYS";
pub const ENV_SIGNUP_BALANCE: &str = "LIBRIS_SIGNUP_BALANCE";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key}: cannot parse '{value}': {reason}")]
    Malformed {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("invalid configuration: {0}")]
    Inconsistent(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LendingConfig {
    /// Added to an item's base price for every day of the loan.
    pub per_diem_rate: Money,
    pub min_duration_days: u32,
    pub max_duration_days: u32,
    /// Promotional balance credited to accounts opened through sign-up.
    pub signup_balance: Money,
}

impl Default for LendingConfig {
    fn default() -> Self {
        Self {
            per_diem_rate: Money::from_cents(50),
            min_duration_days: 1,
            max_duration_days: 30,
            signup_balance: Money::ZERO,
        }
    }
}

impl LendingConfig {
    /// Load from `LIBRIS_*` environment variables, defaulting what is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary key lookup (tests inject a map here).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            per_diem_rate: read(&lookup, ENV_PER_DIEM_RATE, defaults.per_diem_rate)?,
            min_duration_days: read(&lookup, ENV_MIN_DURATION_DAYS, defaults.min_duration_days)?,
            max_duration_days: read(&lookup, ENV_MAX_DURATION_DAYS, defaults.max_duration_days)?,
            signup_balance: read(&lookup, ENV_SIGNUP_BALANCE, defaults.signup_balance)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.per_diem_rate.is_negative() {
            return Err(ConfigError::Inconsistent(format!(
                "per-diem rate cannot be negative: {}",
                self.per_diem_rate
            )));
        }
        if self.signup_balance.is_negative() {
            return Err(ConfigError::Inconsistent(format!(
                "signup balance cannot be negative: {}",
                self.signup_balance
            )));
        }
        if self.min_duration_days < 1 {
            return Err(ConfigError::Inconsistent(
                "minimum duration must be at least 1 day".to_string(),
            ));
        }
        if self.min_duration_days > self.max_duration_days {
            return Err(ConfigError::Inconsistent(format!(
                "minimum duration ({}) exceeds maximum ({})",
                self.min_duration_days, self.max_duration_days
            )));
        }
        Ok(())
    }
}

fn read<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: core::str::FromStr + core::fmt::Display,
    T::Err: core::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => {
            tracing::debug!(key, %default, "not set; using default");
            Ok(default)
        }
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Malformed {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}
