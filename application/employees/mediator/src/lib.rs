//! Wires the employee handlers into a [`Mediator`].

use std::sync::Arc;

use employee_command_handlers::{
    CreateEmployeeHandler, DeleteEmployeeHandler, UpdateEmployeeHandler,
};
use employee_commands::{
    CreateEmployeeCommand, DeleteEmployeeCommand, UpdateEmployeeCommand,
};
use employee_dao::EmployeeDao;
use employee_queries::{GetAllEmployeesQuery, GetEmployeeByIdQuery};
use employee_query_handlers::{
    GetAllEmployeesQueryHandler, GetEmployeeByIdQueryHandler,
};
use mediator::{HandlerRegistry, Mediator, MessageKey, RegistryError};
use resilience::{ConfigError, ResilienceExecutor, RetryConfig};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MediatorConfig {
    #[serde(default)]
    pub retry: RetryConfig,
}

impl MediatorConfig {
    /// Loads `.env` when present, then reads the `RETRY_*` variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            retry: RetryConfig::from_env()?,
        })
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Handler registration failed: {0}")]
    Registry(#[from] RegistryError),
}

/// Every message the employee service must be able to dispatch.
pub fn expected_messages() -> [MessageKey; 5] {
    [
        MessageKey::command::<CreateEmployeeCommand>(),
        MessageKey::command::<UpdateEmployeeCommand>(),
        MessageKey::command::<DeleteEmployeeCommand>(),
        MessageKey::query::<GetAllEmployeesQuery>(),
        MessageKey::query::<GetEmployeeByIdQuery>(),
    ]
}

pub fn build_registry(
    employee_dao: Arc<dyn EmployeeDao>, config: &MediatorConfig,
) -> Result<HandlerRegistry, StartupError> {
    config.retry.validate()?;
    let resilience = ResilienceExecutor::new(config.retry.policy());

    let registry = HandlerRegistry::builder()
        .command::<CreateEmployeeCommand, _>(CreateEmployeeHandler::new(
            employee_dao.clone(),
            resilience.clone(),
        ))?
        .command::<UpdateEmployeeCommand, _>(UpdateEmployeeHandler::new(
            employee_dao.clone(),
            resilience.clone(),
        ))?
        .command::<DeleteEmployeeCommand, _>(DeleteEmployeeHandler::new(
            employee_dao.clone(),
            resilience.clone(),
        ))?
        .query::<GetAllEmployeesQuery, _>(GetAllEmployeesQueryHandler::new(
            employee_dao.clone(),
            resilience.clone(),
        ))?
        .query::<GetEmployeeByIdQuery, _>(GetEmployeeByIdQueryHandler::new(
            employee_dao,
            resilience,
        ))?
        .build();

    registry.ensure_registered(&expected_messages())?;

    for registration in registry.registrations() {
        info!(
            message.kind = %registration.kind,
            message.name = registration.message_type,
            result = registration.result_type,
            "Registered handler"
        );
    }

    Ok(registry)
}

pub fn build_mediator(
    employee_dao: Arc<dyn EmployeeDao>, config: &MediatorConfig,
) -> Result<Mediator, StartupError> {
    let registry = build_registry(employee_dao, config)?;
    Ok(Mediator::new(registry))
}

#[cfg(test)]
mod tests {
    use employee_dao::InMemoryEmployeeDao;
    use resilience::Backoff;

    use super::*;

    #[test]
    fn test_registry_covers_every_message() {
        let registry = build_registry(
            Arc::new(InMemoryEmployeeDao::new()),
            &MediatorConfig::default(),
        )
        .unwrap();

        assert_eq!(registry.len(), 5);
        for key in expected_messages() {
            assert!(registry.contains(&key), "missing {key}");
        }
    }

    #[test]
    fn test_zero_attempts_rejected_at_startup() {
        let config = MediatorConfig {
            retry: RetryConfig {
                max_attempts: 0,
                ..Default::default()
            },
        };

        let err =
            build_mediator(Arc::new(InMemoryEmployeeDao::new()), &config)
                .unwrap_err();

        assert!(matches!(err, StartupError::Config(_)));
    }

    #[test]
    fn test_config_deserializes_nested_retry() {
        let config: MediatorConfig = serde_json::from_str(
            r#"{ "retry": { "max_attempts": 5, "backoff": "exponential" } }"#,
        )
        .unwrap();

        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.base_delay_ms, 1000);
        assert_eq!(config.retry.backoff, Backoff::Exponential);
    }
}
