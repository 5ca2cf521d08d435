use std::sync::Arc;

use async_trait::async_trait;
use employee_dao::EmployeeDao;
use employee_errors::EmployeeError;
use employee_models::Employee;
use employee_queries::{GetAllEmployeesQuery, GetEmployeeByIdQuery};
use mediator::{CancellationToken, Handler};
use resilience::ResilienceExecutor;
use tracing::{info, instrument, warn};

#[derive(Clone)]
pub struct GetAllEmployeesQueryHandler {
    employee_dao: Arc<dyn EmployeeDao>,
    resilience: ResilienceExecutor,
}

impl GetAllEmployeesQueryHandler {
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
        &self, _query: GetAllEmployeesQuery, cancel: &CancellationToken,
    ) -> Result<Vec<Employee>, EmployeeError> {
        info!("Fetching all employees");

        let employees = self
            .resilience
            .execute(cancel, |_| self.employee_dao.all())
            .await?;

        Ok(employees)
    }
}

#[async_trait]
impl Handler<GetAllEmployeesQuery> for GetAllEmployeesQueryHandler {
    async fn handle(
        &self, message: GetAllEmployeesQuery, cancel: &CancellationToken,
    ) -> Result<Vec<Employee>, EmployeeError> {
        self.execute(message, cancel).await
    }
}

#[derive(Clone)]
pub struct GetEmployeeByIdQueryHandler {
    employee_dao: Arc<dyn EmployeeDao>,
    resilience: ResilienceExecutor,
}

impl GetEmployeeByIdQueryHandler {
    pub fn new(
        employee_dao: Arc<dyn EmployeeDao>, resilience: ResilienceExecutor,
    ) -> Self {
        Self {
            employee_dao,
            resilience,
        }
    }

    /// A missing employee is `Ok(None)`, not an error.
    #[instrument(skip(self, cancel))]
    pub async fn execute(
        &self, query: GetEmployeeByIdQuery, cancel: &CancellationToken,
    ) -> Result<Option<Employee>, EmployeeError> {
        let employee_id = query.employee_id;
        info!("Fetching employee: {employee_id}");

        let employee = self
            .resilience
            .execute(cancel, |_| self.employee_dao.find_by_id(employee_id))
            .await?;

        if employee.is_none() {
            warn!("Employee not found: {employee_id}");
        }
        Ok(employee)
    }
}

#[async_trait]
impl Handler<GetEmployeeByIdQuery> for GetEmployeeByIdQueryHandler {
    async fn handle(
        &self, message: GetEmployeeByIdQuery, cancel: &CancellationToken,
    ) -> Result<Option<Employee>, EmployeeError> {
        self.execute(message, cancel).await
    }
}
