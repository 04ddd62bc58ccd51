//! REST API client module for the HRMS backend.
//!
//! This module provides the `ApiClient` for communicating with the
//! employee and attendance endpoints over HTTP+JSON, and the `HrmsApi`
//! trait that the cache, forms, and app layers depend on so alternate
//! transports can be substituted.

pub mod client;
pub mod error;

#[cfg(test)]
pub(crate) mod fake;

pub use client::ApiClient;
pub use error::ApiError;

use crate::models::{AttendanceInput, AttendanceRecord, Employee, EmployeeInput};

/// The remote operations exposed by the HRMS API.
///
/// Each operation either resolves with the parsed payload or fails with a
/// typed `ApiError`; no operation retries automatically.
#[async_trait::async_trait]
pub trait HrmsApi: Send + Sync {
    async fn list_employees(&self) -> Result<Vec<Employee>, ApiError>;

    async fn create_employee(&self, input: &EmployeeInput) -> Result<Employee, ApiError>;

    async fn delete_employee(&self, employee_id: &str) -> Result<(), ApiError>;

    /// List attendance records, optionally filtered server-side by exact
    /// date match. Absent or empty means "all dates".
    async fn list_attendance(&self, date: Option<&str>) -> Result<Vec<AttendanceRecord>, ApiError>;

    async fn mark_attendance(&self, input: &AttendanceInput) -> Result<AttendanceRecord, ApiError>;

    async fn list_employee_attendance(
        &self,
        employee_id: &str,
    ) -> Result<Vec<AttendanceRecord>, ApiError>;
}
