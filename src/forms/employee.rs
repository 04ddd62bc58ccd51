//! Add Employee form.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::api::HrmsApi;
use crate::cache::{QueryCache, ResourceKind};
use crate::models::EmployeeInput;

use super::schema::{FieldCheck, FormSchema, Rule, ValidationOutcome};
use super::{FormState, Notice, SubmitOutcome};

const SCHEMA: FormSchema = FormSchema::new(&[
    FieldCheck {
        field: "employee_id",
        rule: Rule::Required,
        message: "Employee ID is required",
    },
    FieldCheck {
        field: "name",
        rule: Rule::Required,
        message: "Full Name is required",
    },
    FieldCheck {
        field: "email",
        rule: Rule::Required,
        message: "Email is required",
    },
    FieldCheck {
        field: "email",
        rule: Rule::Email,
        message: "Invalid email format",
    },
    FieldCheck {
        field: "department",
        rule: Rule::Required,
        message: "Department is required",
    },
]);

/// Controller for the Add Employee dialog.
///
/// On successful submission the form resets to defaults and the employees
/// cache family is invalidated so open listings refetch.
pub struct EmployeeForm {
    api: Arc<dyn HrmsApi>,
    cache: QueryCache,
    state: Mutex<FormState>,
}

impl EmployeeForm {
    pub fn new(api: Arc<dyn HrmsApi>, cache: QueryCache) -> Self {
        Self {
            api,
            cache,
            state: Mutex::new(FormState::with_values(Self::defaults())),
        }
    }

    fn defaults() -> BTreeMap<&'static str, String> {
        ["employee_id", "name", "email", "department"]
            .into_iter()
            .map(|field| (field, String::new()))
            .collect()
    }

    /// Update one field. Only the edited field is re-validated; others keep
    /// their recorded errors until the next full validation.
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

    /// Validate and, if clean, create the employee.
    ///
    /// A second call while one submission is in flight is a no-op. Failure
    /// leaves the field values intact for correction.
    pub async fn submit(&self) -> SubmitOutcome {
        let input = {
            let mut state = self.state.lock().await;
            if state.in_flight {
                return SubmitOutcome::InFlight;
            }
            let outcome = SCHEMA.validate_all(&state.values);
            if !outcome.is_valid() {
                state.errors = outcome.errors();
                return SubmitOutcome::Invalid(outcome.errors());
            }
            state.errors.clear();
            state.in_flight = true;
            EmployeeInput {
                employee_id: state.value("employee_id"),
                name: state.value("name"),
                email: state.value("email"),
                department: state.value("department"),
            }
        };

        let result = self.api.create_employee(&input).await;

        let mut state = self.state.lock().await;
        state.in_flight = false;
        match result {
            Ok(employee) => {
                debug!(employee_id = %employee.employee_id, "employee created");
                state.reset(Self::defaults());
                drop(state);
                self.cache.invalidate_kind(ResourceKind::Employees).await;
                SubmitOutcome::Done(Notice::success("Employee added successfully!"))
            }
            Err(err) => SubmitOutcome::Done(Notice::failure(err)),
        }
    }
}
