use resilience::RetryError;
use thiserror::Error;

/// Failures raised by employee storage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DaoError {
    #[error("Storage unavailable: {reason}")]
    Unavailable { reason: String },
}

#[derive(Debug, Error)]
pub enum EmployeeError {
    #[error("Employee not found: {employee_id}")]
    NotFound { employee_id: i64 },
    #[error("Storage error: {0}")]
    Storage(#[source] RetryError<DaoError>),
    #[error("Operation cancelled")]
    Cancelled,
}

impl From<RetryError<DaoError>> for EmployeeError {
    fn from(err: RetryError<DaoError>) -> Self {
        match err {
            RetryError::Cancelled { .. } => EmployeeError::Cancelled,
            other => EmployeeError::Storage(other),
        }
    }
}
