//! In-memory `HrmsApi` double for tests.
//!
//! Behaves like a tiny HRMS backend: employees and attendance records live
//! in memory, every call bumps a counter, and individual operations can be
//! made to fail or stall to exercise error and in-flight paths.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::{ApiError, HrmsApi};
use crate::models::{AttendanceInput, AttendanceRecord, Employee, EmployeeInput};

#[derive(Default)]
pub(crate) struct FakeApi {
    pub employees: Mutex<Vec<Employee>>,
    pub attendance: Mutex<Vec<AttendanceRecord>>,
    pub list_employee_calls: AtomicUsize,
    pub create_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
    pub mark_calls: AtomicUsize,
    pub last_attendance_input: Mutex<Option<AttendanceInput>>,
    /// When set, `create_employee` fails with this `detail` message.
    pub reject_create: Mutex<Option<String>>,
    /// Artificial latency applied to mutations, for in-flight tests.
    pub mutation_delay: Mutex<Duration>,
}

impl FakeApi {
    pub fn with_employees(employees: Vec<Employee>) -> Self {
        Self {
            employees: Mutex::new(employees),
            ..Self::default()
        }
    }

    pub fn employee(id: &str, name: &str) -> Employee {
        Employee {
            employee_id: id.to_string(),
            name: name.to_string(),
            email: format!("{}@co.com", name.to_lowercase()),
            department: "Eng".to_string(),
            total_present_days: 0,
        }
    }

    async fn stall(&self) {
        let delay = *self.mutation_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait::async_trait]
impl HrmsApi for FakeApi {
    async fn list_employees(&self) -> Result<Vec<Employee>, ApiError> {
        self.list_employee_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.employees.lock().unwrap().clone())
    }

    async fn create_employee(&self, input: &EmployeeInput) -> Result<Employee, ApiError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.stall().await;
        if let Some(detail) = self.reject_create.lock().unwrap().clone() {
            return Err(ApiError::Validation {
                message: detail,
                status: 400,
            });
        }
        let employee = Employee {
            employee_id: input.employee_id.clone(),
            name: input.name.clone(),
            email: input.email.clone(),
            department: input.department.clone(),
            total_present_days: 0,
        };
        self.employees.lock().unwrap().push(employee.clone());
        Ok(employee)
    }

    async fn delete_employee(&self, employee_id: &str) -> Result<(), ApiError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.stall().await;
        let mut employees = self.employees.lock().unwrap();
        let before = employees.len();
        employees.retain(|e| e.employee_id != employee_id);
        if employees.len() == before {
            return Err(ApiError::network("Failed to delete employee", 404));
        }
        Ok(())
    }

    async fn list_attendance(&self, date: Option<&str>) -> Result<Vec<AttendanceRecord>, ApiError> {
        let records = self.attendance.lock().unwrap();
        match date.map(str::trim).filter(|d| !d.is_empty()) {
            Some(d) => Ok(records.iter().filter(|r| r.date == d).cloned().collect()),
            None => Ok(records.clone()),
        }
    }

    async fn mark_attendance(&self, input: &AttendanceInput) -> Result<AttendanceRecord, ApiError> {
        self.mark_calls.fetch_add(1, Ordering::SeqCst);
        self.stall().await;
        *self.last_attendance_input.lock().unwrap() = Some(input.clone());
        let record = AttendanceRecord {
            employee_id: input.employee_id.clone(),
            date: input.date.clone(),
            status: input.status,
            name: input.name.clone(),
        };
        self.attendance.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn list_employee_attendance(
        &self,
        employee_id: &str,
    ) -> Result<Vec<AttendanceRecord>, ApiError> {
        let records = self.attendance.lock().unwrap();
        Ok(records
            .iter()
            .filter(|r| r.employee_id == employee_id)
            .cloned()
            .collect())
    }
}
