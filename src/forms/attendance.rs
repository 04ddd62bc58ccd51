//! Mark Attendance form.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::api::HrmsApi;
use crate::cache::{QueryCache, QueryKey, ResourceKind};
use crate::models::{AttendanceInput, AttendanceStatus, Employee};

use super::schema::{FieldCheck, FormSchema, Rule, ValidationOutcome};
use super::{FormState, Notice, SubmitOutcome};

const SCHEMA: FormSchema = FormSchema::new(&[
    FieldCheck {
        field: "employee_id",
        rule: Rule::Required,
        message: "Employee is required",
    },
    FieldCheck {
        field: "date",
        rule: Rule::Required,
        message: "Date is required",
    },
    FieldCheck {
        field: "date",
        rule: Rule::Date,
        message: "Invalid date format",
    },
    FieldCheck {
        field: "status",
        rule: Rule::Required,
        message: "Status is required",
    },
    FieldCheck {
        field: "status",
        rule: Rule::OneOf(AttendanceStatus::ALLOWED),
        message: "Invalid status",
    },
]);

fn parse_status(value: &str) -> Option<AttendanceStatus> {
    match value {
        "Present" => Some(AttendanceStatus::Present),
        "Absent" => Some(AttendanceStatus::Absent),
        _ => None,
    }
}

/// Controller for the Mark Attendance form.
///
/// At submit time the selected employee's name is looked up in the cached
/// employee list and attached as the denormalized display copy; an unknown
/// `employee_id` simply omits the name rather than failing.
pub struct AttendanceForm {
    api: Arc<dyn HrmsApi>,
    cache: QueryCache,
    state: Mutex<FormState>,
}

impl AttendanceForm {
    pub fn new(api: Arc<dyn HrmsApi>, cache: QueryCache) -> Self {
        Self {
            api,
            cache,
            state: Mutex::new(FormState::with_values(Self::defaults())),
        }
    }

    /// Defaults: today's date (UTC) and Present, employee unselected.
    fn defaults() -> BTreeMap<&'static str, String> {
        BTreeMap::from([
            ("employee_id", String::new()),
            ("date", Utc::now().date_naive().to_string()),
            ("status", "Present".to_string()),
        ])
    }

    /// Update one field. Only the edited field is re-validated.
    pub async fn set_field(&self, field: &'static str, value: impl Into<String>) {
        let value = value.into();
        let mut state = self.state.lock().await;
        match SCHEMA.validate_field(field, &value) {
            Some(message) if state.errors.contains_key(field) => {
                state.errors.insert(field, message);
            }
            _ => {
                state.errors.remove(field);
            }
        }
        state.values.insert(field, value);
    }

    pub async fn field(&self, field: &str) -> String {
        self.state.lock().await.value(field)
    }

    pub async fn field_error(&self, field: &str) -> Option<&'static str> {
        self.state.lock().await.errors.get(field).copied()
    }

    pub async fn is_submitting(&self) -> bool {
        self.state.lock().await.in_flight
    }

    /// Run every field's rule and record the per-field errors.
    pub async fn validate_all(&self) -> ValidationOutcome {
        let mut state = self.state.lock().await;
        let outcome = SCHEMA.validate_all(&state.values);
        state.errors = outcome.errors();
        outcome
    }

    /// Validate and, if clean, mark attendance.
    ///
    /// A second call while one submission is in flight is a no-op. Failure
    /// leaves the field values intact for correction.
    pub async fn submit(&self) -> SubmitOutcome {
        let mut input = {
            let mut state = self.state.lock().await;
            if state.in_flight {
                return SubmitOutcome::InFlight;
            }
            let outcome = SCHEMA.validate_all(&state.values);
            if !outcome.is_valid() {
                state.errors = outcome.errors();
                return SubmitOutcome::Invalid(outcome.errors());
            }
            let Some(status) = parse_status(&state.value("status")) else {
                state.errors.insert("status", "Invalid status");
                return SubmitOutcome::Invalid(state.errors.clone());
            };
            state.errors.clear();
            state.in_flight = true;
            AttendanceInput {
                employee_id: state.value("employee_id"),
                date: state.value("date"),
                status,
                name: None,
            }
        };

        input.name = self.lookup_name(&input.employee_id).await;
        let result = self.api.mark_attendance(&input).await;

        let mut state = self.state.lock().await;
        state.in_flight = false;
        match result {
            Ok(record) => {
                debug!(employee_id = %record.employee_id, date = %record.date, "attendance marked");
                state.reset(Self::defaults());
                drop(state);
                self.cache.invalidate_kind(ResourceKind::Attendance).await;
                SubmitOutcome::Done(Notice::success("Attendance marked successfully!"))
            }
            Err(err) => SubmitOutcome::Done(Notice::failure(err)),
        }
    }

    /// Denormalized display name from the cached employee list; an unknown
    /// id is not an error, the name is simply omitted.
    async fn lookup_name(&self, employee_id: &str) -> Option<String> {
        let employees = self.cache.peek::<Vec<Employee>>(&QueryKey::Employees).await?;
        employees
            .iter()
            .find(|e| e.employee_id == employee_id)
            .map(|e| e.name.clone())
    }
}
