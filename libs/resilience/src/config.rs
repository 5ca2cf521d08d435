use std::{str::FromStr, time::Duration};

use serde::Deserialize;
use thiserror::Error;

use crate::policy::{Backoff, DEFAULT_MAX_ATTEMPTS, RetryPolicy};

pub const ENV_MAX_ATTEMPTS: &str = "RETRY_MAX_ATTEMPTS";
pub const ENV_BASE_DELAY_MS: &str = "RETRY_BASE_DELAY_MS";
pub const ENV_BACKOFF: &str = "RETRY_BACKOFF";
pub const ENV_MAX_DELAY_MS: &str = "RETRY_MAX_DELAY_MS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
    #[error("{key} must be at least 1")]
    ZeroAttempts { key: &'static str },
}

/// Retry settings as they appear in configuration sources.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "max_attempts_default")]
    pub max_attempts: u32,
    #[serde(default = "base_delay_ms_default")]
    pub base_delay_ms: u64,
    #[serde(default)]
    pub backoff: Backoff,
    #[serde(default)]
    pub max_delay_ms: Option<u64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: max_attempts_default(),
            base_delay_ms: base_delay_ms_default(),
            backoff: Backoff::default(),
            max_delay_ms: None,
        }
    }
}

impl RetryConfig {
    /// Reads `RETRY_*` variables from the process environment. Unset
    /// variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = parse(&lookup, ENV_MAX_ATTEMPTS)? {
            config.max_attempts = value;
        }
        if let Some(value) = parse(&lookup, ENV_BASE_DELAY_MS)? {
            config.base_delay_ms = value;
        }
        if let Some(value) = parse(&lookup, ENV_BACKOFF)? {
            config.backoff = value;
        }
        config.max_delay_ms = parse(&lookup, ENV_MAX_DELAY_MS)?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::ZeroAttempts {
                key: ENV_MAX_ATTEMPTS,
            });
        }
        Ok(())
    }

    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.base_delay_ms),
            backoff: self.backoff,
            max_delay: self.max_delay_ms.map(Duration::from_millis),
        }
    }
}

fn parse<F, T>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => {
            raw.trim().parse().map(Some).map_err(|_| {
                ConfigError::InvalidValue { key, value: raw }
            })
        }
    }
}

fn max_attempts_default() -> u32 { DEFAULT_MAX_ATTEMPTS }
fn base_delay_ms_default() -> u64 { 1000 }
