use std::{
    collections::BTreeMap,
    sync::atomic::{AtomicI64, AtomicU32, Ordering},
};

use async_trait::async_trait;
use chrono::Utc;
use employee_commands::{CreateEmployeeCommand, UpdateEmployeeCommand};
use employee_errors::DaoError;
use employee_models::Employee;
use tokio::sync::RwLock;
use tracing::{instrument, warn};

/// Employee storage.
///
/// Lookups of a missing id are not errors: `find_by_id` and `update` return
/// `None`, `delete` returns `false`. `Err` means the store itself failed and
/// the call may succeed if repeated.
#[async_trait]
pub trait EmployeeDao: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Employee>, DaoError>;

    async fn all(&self) -> Result<Vec<Employee>, DaoError>;

    async fn create(
        &self, req: CreateEmployeeCommand,
    ) -> Result<Employee, DaoError>;

    async fn update(
        &self, id: i64, req: UpdateEmployeeCommand,
    ) -> Result<Option<Employee>, DaoError>;

    async fn delete(&self, id: i64) -> Result<bool, DaoError>;
}

/// Process-local store ordered by id.
#[derive(Debug)]
pub struct InMemoryEmployeeDao {
    rows: RwLock<BTreeMap<i64, Employee>>,
    next_id: AtomicI64,
    pending_failures: AtomicU32,
}

impl Default for InMemoryEmployeeDao {
    fn default() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
            pending_failures: AtomicU32::new(0),
        }
    }
}

impl InMemoryEmployeeDao {
    pub fn new() -> Self { Self::default() }

    /// Makes the next `calls` operations fail with
    /// [`DaoError::Unavailable`], as a dropped database connection would.
    pub fn fail_next(&self, calls: u32) {
        self.pending_failures.store(calls, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize { self.rows.read().await.len() }

    pub async fn is_empty(&self) -> bool { self.rows.read().await.is_empty() }

    fn check_available(&self, operation: &'static str) -> Result<(), DaoError> {
        let outage = self
            .pending_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| {
                left.checked_sub(1)
            })
            .is_ok();

        if outage {
            warn!(operation, "Simulated storage outage");
            return Err(DaoError::Unavailable {
                reason: format!("{operation} failed: connection refused"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl EmployeeDao for InMemoryEmployeeDao {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i64) -> Result<Option<Employee>, DaoError> {
        self.check_available("find_by_id")?;
        Ok(self.rows.read().await.get(&id).cloned())
    }

    #[instrument(skip(self))]
    async fn all(&self) -> Result<Vec<Employee>, DaoError> {
        self.check_available("all")?;
        Ok(self.rows.read().await.values().cloned().collect())
    }

    #[instrument(skip(self, req), fields(email = %req.email))]
    async fn create(
        &self, req: CreateEmployeeCommand,
    ) -> Result<Employee, DaoError> {
        self.check_available("create")?;

        let employee = Employee {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            department_id: req.department_id,
            hire_date: req.hire_date,
            is_active: true,
            created_at: Utc::now(),
        };

        self.rows.write().await.insert(employee.id, employee.clone());
        Ok(employee)
    }

    #[instrument(skip(self, req))]
    async fn update(
        &self, id: i64, req: UpdateEmployeeCommand,
    ) -> Result<Option<Employee>, DaoError> {
        self.check_available("update")?;

        let mut rows = self.rows.write().await;
        let Some(employee) = rows.get_mut(&id)
        else {
            return Ok(None);
        };

        req.apply(employee);
        Ok(Some(employee.clone()))
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i64) -> Result<bool, DaoError> {
        self.check_available("delete")?;
        Ok(self.rows.write().await.remove(&id).is_some())
    }
}
