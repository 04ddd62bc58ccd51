//! Application wiring for the HRMS client.
//!
//! One `HrmsApp` is constructed at startup and owns the shared query cache
//! and the API client; every consumer works through it. Listing helpers
//! observe the cache with the staleness policy each view uses, and the
//! delete flow applies the local confirmation gate before any request is
//! made.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::info;

use crate::api::{ApiClient, HrmsApi};
use crate::cache::{QueryCache, QueryHandle, QueryKey, ResourceKind};
use crate::config::Config;
use crate::forms::{AttendanceForm, EmployeeForm, Notice};
use crate::models::{AttendanceRecord, Employee};

/// Always refetch on observation.
const REFETCH_ON_OBSERVE: Duration = Duration::ZERO;

/// The attendance form's employee picker tolerates a slightly stale list;
/// 5 minutes avoids refetching on every dropdown open.
const EMPLOYEE_PICKER_STALE: Duration = Duration::from_secs(5 * 60);

/// Operator's answer to the "delete this employee?" prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteConfirmation {
    Confirmed,
    Declined,
}

pub struct HrmsApp {
    api: Arc<dyn HrmsApi>,
    cache: QueryCache,
}

impl HrmsApp {
    pub fn new(config: &Config) -> Result<Self> {
        info!(origin = %config.api_base_url, "HRMS client starting");
        Ok(Self::with_api(Arc::new(ApiClient::new(config)?)))
    }

    /// Wire the app over any `HrmsApi` transport.
    pub fn with_api(api: Arc<dyn HrmsApi>) -> Self {
        Self {
            api,
            cache: QueryCache::new(),
        }
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Employee listing for the main table; always refetched on observation.
    pub async fn employees(&self) -> QueryHandle<Vec<Employee>> {
        self.observe_employees(REFETCH_ON_OBSERVE).await
    }

    /// Employee list for the attendance picker, cached for a few minutes.
    pub async fn employees_for_picker(&self) -> QueryHandle<Vec<Employee>> {
        self.observe_employees(EMPLOYEE_PICKER_STALE).await
    }

    async fn observe_employees(&self, stale_time: Duration) -> QueryHandle<Vec<Employee>> {
        let api = Arc::clone(&self.api);
        self.cache
            .observe(QueryKey::Employees, stale_time, move || {
                let api = Arc::clone(&api);
                async move { api.list_employees().await }
            })
            .await
    }

    /// Attendance listing, optionally filtered to one date.
    pub async fn attendance(&self, date: Option<String>) -> QueryHandle<Vec<AttendanceRecord>> {
        let api = Arc::clone(&self.api);
        let filter = date.clone();
        self.cache
            .observe(
                QueryKey::Attendance { date },
                REFETCH_ON_OBSERVE,
                move || {
                    let api = Arc::clone(&api);
                    let filter = filter.clone();
                    async move { api.list_attendance(filter.as_deref()).await }
                },
            )
            .await
    }

    /// Attendance history for one employee.
    pub async fn employee_attendance(
        &self,
        employee_id: String,
    ) -> QueryHandle<Vec<AttendanceRecord>> {
        let api = Arc::clone(&self.api);
        let id = employee_id.clone();
        self.cache
            .observe(
                QueryKey::EmployeeAttendance { employee_id },
                REFETCH_ON_OBSERVE,
                move || {
                    let api = Arc::clone(&api);
                    let id = id.clone();
                    async move { api.list_employee_attendance(&id).await }
                },
            )
            .await
    }

    /// Delete an employee after the local confirmation gate.
    ///
    /// Declining issues no request and produces no notice. On success the
    /// employees cache family is invalidated; a failed delete leaves the
    /// cache untouched so listings keep their last-known-good data.
    pub async fn delete_employee(
        &self,
        employee_id: &str,
        confirmation: DeleteConfirmation,
    ) -> Option<Notice> {
        if confirmation == DeleteConfirmation::Declined {
            return None;
        }
        match self.api.delete_employee(employee_id).await {
            Ok(()) => {
                info!(employee_id, "employee deleted");
                self.cache.invalidate_kind(ResourceKind::Employees).await;
                Some(Notice::success("Employee deleted successfully!"))
            }
            Err(err) => Some(Notice::failure(err)),
        }
    }

    pub fn employee_form(&self) -> EmployeeForm {
        EmployeeForm::new(Arc::clone(&self.api), self.cache.clone())
    }

    pub fn attendance_form(&self) -> AttendanceForm {
        AttendanceForm::new(Arc::clone(&self.api), self.cache.clone())
    }
}
