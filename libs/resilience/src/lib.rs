//! Bounded retry with backoff for async operations.

pub mod config;
pub mod error;
pub mod executor;
pub mod policy;

pub use config::{ConfigError, RetryConfig};
pub use error::RetryError;
pub use executor::ResilienceExecutor;
pub use policy::{Backoff, RetryPolicy, UnknownBackoff};
pub use tokio_util::sync::CancellationToken;
