use std::{fmt, str::FromStr, time::Duration};

use serde::Deserialize;
use typed_builder::TypedBuilder;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Delay growth between attempts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backoff {
    /// `base`
    Fixed,
    /// `base * attempt`
    #[default]
    Linear,
    /// `base * 2^attempt`
    Exponential,
}

impl Backoff {
    /// Delay before the retry that follows failed attempt number `attempt`
    /// (1-based). Saturates instead of overflowing.
    pub fn delay(&self, base: Duration, attempt: u32) -> Duration {
        match self {
            Self::Fixed => base,
            Self::Linear => base.saturating_mul(attempt),
            Self::Exponential => {
                base.saturating_mul(2u32.saturating_pow(attempt))
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Linear => "linear",
            Self::Exponential => "exponential",
        }
    }
}

impl fmt::Display for Backoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown backoff strategy: {0}")]
pub struct UnknownBackoff(pub String);

impl FromStr for Backoff {
    type Err = UnknownBackoff;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixed" => Ok(Self::Fixed),
            "linear" => Ok(Self::Linear),
            "exponential" => Ok(Self::Exponential),
            other => Err(UnknownBackoff(other.to_string())),
        }
    }
}

/// Bounded retry with backoff.
///
/// `max_attempts` counts every invocation, the first one included, so `3`
/// means one call plus up to two retries. Zero is rejected when executed.
#[derive(Debug, Clone, PartialEq, Eq, TypedBuilder)]
pub struct RetryPolicy {
    #[builder(default = DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: u32,
    #[builder(default = DEFAULT_BASE_DELAY)]
    pub base_delay: Duration,
    #[builder(default)]
    pub backoff: Backoff,
    /// Upper bound applied after the backoff is computed.
    #[builder(default, setter(strip_option))]
    pub max_delay: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self { Self::builder().build() }
}

impl RetryPolicy {
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self.backoff.delay(self.base_delay, attempt);
        match self.max_delay {
            Some(cap) => delay.min(cap),
            None => delay,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }
}
