use thiserror::Error;

#[derive(Debug, Error)]
pub enum RetryError<E> {
    #[error("Retry policy needs at least one attempt, got {max_attempts}")]
    InvalidConfiguration { max_attempts: u32 },
    /// Holds the error of the final attempt only.
    #[error("Operation failed after {attempts} attempts: {source}")]
    Exhausted {
        attempts: u32,
        #[source]
        source: E,
    },
    #[error("Operation cancelled after {attempts} attempts")]
    Cancelled { attempts: u32 },
}

impl<E> RetryError<E> {
    pub fn is_cancelled(&self) -> bool { matches!(self, Self::Cancelled { .. }) }

    pub fn is_exhausted(&self) -> bool { matches!(self, Self::Exhausted { .. }) }

    /// Number of times the operation was invoked.
    pub fn attempts(&self) -> u32 {
        match self {
            Self::InvalidConfiguration { .. } => 0,
            Self::Exhausted { attempts, .. } | Self::Cancelled { attempts } => {
                *attempts
            }
        }
    }

    pub fn last_error(&self) -> Option<&E> {
        match self {
            Self::Exhausted { source, .. } => Some(source),
            _ => None,
        }
    }

    pub fn into_last_error(self) -> Option<E> {
        match self {
            Self::Exhausted { source, .. } => Some(source),
            _ => None,
        }
    }
}
