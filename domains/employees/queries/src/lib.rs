use employee_errors::EmployeeError;
use employee_models::Employee;
use mediator::{Message, Query};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetAllEmployeesQuery;

impl Message for GetAllEmployeesQuery {
    type Error = EmployeeError;
    type Output = Vec<Employee>;
}

impl Query for GetAllEmployeesQuery {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetEmployeeByIdQuery {
    pub employee_id: i64,
}

impl Message for GetEmployeeByIdQuery {
    type Error = EmployeeError;
    type Output = Option<Employee>;
}

impl Query for GetEmployeeByIdQuery {}
