use chrono::{DateTime, Utc};
use employee_errors::EmployeeError;
use employee_models::Employee;
use mediator::{Command, Message};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEmployeeCommand {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub department_id: i64,
    pub hire_date: DateTime<Utc>,
}

impl Message for CreateEmployeeCommand {
    type Error = EmployeeError;
    type Output = Employee;
}

impl Command for CreateEmployeeCommand {}

/// Partial update. Empty strings and `None` leave the stored value as is.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateEmployeeCommand {
    #[serde(skip)]
    pub employee_id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub department_id: Option<i64>,
    pub hire_date: Option<DateTime<Utc>>,
}

impl UpdateEmployeeCommand {
    pub fn apply(&self, employee: &mut Employee) {
        if let Some(first_name) = non_empty(&self.first_name) {
            employee.first_name = first_name.to_string();
        }
        if let Some(last_name) = non_empty(&self.last_name) {
            employee.last_name = last_name.to_string();
        }
        if let Some(email) = non_empty(&self.email) {
            employee.email = email.to_string();
        }
        if let Some(department_id) = self.department_id {
            employee.department_id = department_id;
        }
        if let Some(hire_date) = self.hire_date {
            employee.hire_date = hire_date;
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.is_empty())
}

impl Message for UpdateEmployeeCommand {
    type Error = EmployeeError;
    type Output = Employee;
}

impl Command for UpdateEmployeeCommand {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteEmployeeCommand {
    pub employee_id: i64,
}

impl Message for DeleteEmployeeCommand {
    type Error = EmployeeError;
    type Output = bool;
}

impl Command for DeleteEmployeeCommand {}
