//! HRMS client core.
//!
//! Client-side data synchronization and form validation for an HRMS
//! backend spoken to over HTTP+JSON. Three cooperating layers share one
//! query cache:
//!
//! - [`api`]: typed async wrappers over the employee and attendance
//!   endpoints, normalizing failures into [`api::ApiError`]
//! - [`cache`]: keyed query cache with staleness windows, single-flight
//!   fetch deduplication, and mutation-driven invalidation
//! - [`forms`]: per-form field state, schema validation, and gated
//!   submission with cache invalidation on success
//!
//! [`app::HrmsApp`] wires the layers together around a single shared
//! cache instance.

pub mod api;
pub mod app;
pub mod cache;
pub mod config;
pub mod forms;
pub mod models;

pub use api::{ApiClient, ApiError, HrmsApi};
pub use app::{DeleteConfirmation, HrmsApp};
pub use cache::{QueryCache, QueryHandle, QueryKey, QueryStatus, ResourceKind};
pub use config::Config;
pub use forms::{AttendanceForm, EmployeeForm, Notice, Severity, SubmitOutcome};
pub use models::{AttendanceInput, AttendanceRecord, AttendanceStatus, Employee, EmployeeInput};
