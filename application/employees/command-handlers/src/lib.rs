use std::sync::Arc;

use async_trait::async_trait;
use employee_commands::{
    CreateEmployeeCommand, DeleteEmployeeCommand, UpdateEmployeeCommand,
};
use employee_dao::EmployeeDao;
use employee_errors::EmployeeError;
use employee_models::Employee;
use mediator::{CancellationToken, Handler};
use resilience::ResilienceExecutor;
use tracing::{info, instrument, warn};

#[derive(Clone)]
pub struct CreateEmployeeHandler {
    employee_dao: Arc<dyn EmployeeDao>,
    resilience: ResilienceExecutor,
}

impl CreateEmployeeHandler {
    pub fn new(
        employee_dao: Arc<dyn EmployeeDao>, resilience: ResilienceExecutor,
    ) -> Self {
        Self {
            employee_dao,
            resilience,
        }
    }

    #[instrument(skip(self, command, cancel), fields(email = %command.email))]
    pub async fn execute(
        &self, command: CreateEmployeeCommand, cancel: &CancellationToken,
    ) -> Result<Employee, EmployeeError> {
        info!("Creating employee: {}", command.email);

        let employee = self
            .resilience
            .execute(cancel, |_| self.employee_dao.create(command.clone()))
            .await?;

        info!("Employee created with ID: {}", employee.id);
        Ok(employee)
    }
}

#[async_trait]
impl Handler<CreateEmployeeCommand> for CreateEmployeeHandler {
    async fn handle(
        &self, message: CreateEmployeeCommand, cancel: &CancellationToken,
    ) -> Result<Employee, EmployeeError> {
        self.execute(message, cancel).await
    }
}

#[derive(Clone)]
pub struct UpdateEmployeeHandler {
    employee_dao: Arc<dyn EmployeeDao>,
    resilience: ResilienceExecutor,
}

impl UpdateEmployeeHandler {
    pub fn new(
        employee_dao: Arc<dyn EmployeeDao>, resilience: ResilienceExecutor,
    ) -> Self {
        Self {
            employee_dao,
            resilience,
        }
    }

    #[instrument(skip(self, cancel))]
    pub async fn execute(
        &self, command: UpdateEmployeeCommand, cancel: &CancellationToken,
    ) -> Result<Employee, EmployeeError> {
        let employee_id = command.employee_id;
        info!("Updating employee: {employee_id}");

        let updated = self
            .resilience
            .execute(cancel, |_| {
                self.employee_dao.update(employee_id, command.clone())
            })
            .await?;

        match updated {
            Some(employee) => {
                info!("Employee updated: {employee_id}");
                Ok(employee)
            }
            None => {
                warn!("Employee not found: {employee_id}");
                Err(EmployeeError::NotFound { employee_id })
            }
        }
    }
}

#[async_trait]
impl Handler<UpdateEmployeeCommand> for UpdateEmployeeHandler {
    async fn handle(
        &self, message: UpdateEmployeeCommand, cancel: &CancellationToken,
    ) -> Result<Employee, EmployeeError> {
        self.execute(message, cancel).await
    }
}

#[derive(Clone)]
pub struct DeleteEmployeeHandler {
    employee_dao: Arc<dyn EmployeeDao>,
    resilience: ResilienceExecutor,
}

impl DeleteEmployeeHandler {
    pub fn new(
        employee_dao: Arc<dyn EmployeeDao>, resilience: ResilienceExecutor,
    ) -> Self {
        Self {
            employee_dao,
            resilience,
        }
    }

    #[instrument(skip(self, cancel))]
    pub async fn execute(
        &self, command: DeleteEmployeeCommand, cancel: &CancellationToken,
    ) -> Result<bool, EmployeeError> {
        let employee_id = command.employee_id;
        info!("Deleting employee: {employee_id}");

        let deleted = self
            .resilience
            .execute(cancel, |_| self.employee_dao.delete(employee_id))
            .await?;

        if deleted {
            info!("Employee deleted: {employee_id}");
        }
        else {
            warn!("Employee not found: {employee_id}");
        }
        Ok(deleted)
    }
}

#[async_trait]
impl Handler<DeleteEmployeeCommand> for DeleteEmployeeHandler {
    async fn handle(
        &self, message: DeleteEmployeeCommand, cancel: &CancellationToken,
    ) -> Result<bool, EmployeeError> {
        self.execute(message, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::{TimeZone, Utc};
    use employee_dao::InMemoryEmployeeDao;
    use resilience::RetryPolicy;
    use test_utils::init_test_tracing;

    use super::*;

    struct Handlers {
        dao: Arc<InMemoryEmployeeDao>,
        create: CreateEmployeeHandler,
        update: UpdateEmployeeHandler,
        delete: DeleteEmployeeHandler,
    }

    fn setup_test_handlers() -> Handlers {
        init_test_tracing();
        let dao = Arc::new(InMemoryEmployeeDao::new());
        let resilience = ResilienceExecutor::new(
            RetryPolicy::builder()
                .base_delay(Duration::from_millis(10))
                .build(),
        );
        let shared: Arc<dyn EmployeeDao> = dao.clone();

        Handlers {
            dao,
            create: CreateEmployeeHandler::new(
                shared.clone(),
                resilience.clone(),
            ),
            update: UpdateEmployeeHandler::new(
                shared.clone(),
                resilience.clone(),
            ),
            delete: DeleteEmployeeHandler::new(shared, resilience),
        }
    }

    fn create_command() -> CreateEmployeeCommand {
        CreateEmployeeCommand {
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            email: "john.doe@example.com".to_string(),
            department_id: 1,
            hire_date: Utc.with_ymd_and_hms(2020, 1, 15, 0, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_create_employee_handler() -> anyhow::Result<()> {
        let handlers = setup_test_handlers();
        let cancel = CancellationToken::new();

        let employee =
            handlers.create.execute(create_command(), &cancel).await?;

        assert_eq!(employee.email, "john.doe@example.com");
        assert!(employee.is_active);
        assert_eq!(handlers.dao.len().await, 1);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_retries_transient_storage_failures()
    -> anyhow::Result<()> {
        let handlers = setup_test_handlers();
        let cancel = CancellationToken::new();
        handlers.dao.fail_next(2);

        let employee =
            handlers.create.execute(create_command(), &cancel).await?;

        assert_eq!(employee.id, 1);
        assert_eq!(handlers.dao.len().await, 1);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_surfaces_exhausted_retries() {
        let handlers = setup_test_handlers();
        let cancel = CancellationToken::new();
        handlers.dao.fail_next(3);

        let err = handlers
            .create
            .execute(create_command(), &cancel)
            .await
            .unwrap_err();

        let EmployeeError::Storage(retry) = err
        else {
            panic!("expected storage error");
        };
        assert!(retry.is_exhausted());
        assert_eq!(retry.attempts(), 3);
        assert!(handlers.dao.is_empty().await);
    }

    #[tokio::test]
    async fn test_update_employee_handler() -> anyhow::Result<()> {
        let handlers = setup_test_handlers();
        let cancel = CancellationToken::new();
        let created =
            handlers.create.execute(create_command(), &cancel).await?;

        let updated = handlers
            .update
            .execute(
                UpdateEmployeeCommand {
                    employee_id: created.id,
                    first_name: Some("Johnny".to_string()),
                    last_name: Some(String::new()),
                    ..Default::default()
                },
                &cancel,
            )
            .await?;

        assert_eq!(updated.first_name, "Johnny");
        assert_eq!(updated.last_name, "Doe");
        Ok(())
    }

    #[tokio::test]
    async fn test_update_missing_employee_is_not_found() {
        let handlers = setup_test_handlers();
        let cancel = CancellationToken::new();

        let err = handlers
            .update
            .execute(
                UpdateEmployeeCommand {
                    employee_id: 404,
                    ..Default::default()
                },
                &cancel,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, EmployeeError::NotFound { employee_id: 404 }));
    }

    #[tokio::test]
    async fn test_delete_employee_handler() -> anyhow::Result<()> {
        let handlers = setup_test_handlers();
        let cancel = CancellationToken::new();
        let created =
            handlers.create.execute(create_command(), &cancel).await?;
        let command = DeleteEmployeeCommand {
            employee_id: created.id,
        };

        assert!(handlers.delete.execute(command.clone(), &cancel).await?);
        assert!(!handlers.delete.execute(command, &cancel).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_cancelled_before_storage_call() {
        let handlers = setup_test_handlers();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = handlers
            .create
            .execute(create_command(), &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, EmployeeError::Cancelled));
        assert!(handlers.dao.is_empty().await);
    }
}
