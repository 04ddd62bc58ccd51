//! Form validation and submission controllers.
//!
//! Each form holds its own field values, validates them against a
//! declarative schema before any network contact, and sequences
//! submission: gate on in-flight state, call the remote operation,
//! then on success reset the form and invalidate the affected cache
//! entries. Field values survive a failed submission so the operator can
//! correct and retry.

pub mod attendance;
pub mod employee;
pub mod schema;

pub use attendance::AttendanceForm;
pub use employee::EmployeeForm;
pub use schema::{FieldCheck, FormSchema, Rule, ValidationOutcome};

use std::collections::BTreeMap;

/// User-facing feedback emitted after a submission attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Success,
            message: message.into(),
        }
    }

    pub fn failure(err: impl std::fmt::Display) -> Self {
        Self {
            severity: Severity::Error,
            message: format!("Error: {err}"),
        }
    }
}

/// Result of a `submit` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Field validation failed; per-field errors are recorded on the form
    /// and no request was sent.
    Invalid(BTreeMap<&'static str, &'static str>),
    /// A submission is already in flight; this call was a no-op.
    InFlight,
    /// The request completed; the notice describes success or failure.
    Done(Notice),
}

/// Mutable state shared by the form controllers.
pub(crate) struct FormState {
    pub values: BTreeMap<&'static str, String>,
    pub errors: BTreeMap<&'static str, &'static str>,
    pub in_flight: bool,
}

impl FormState {
    pub fn with_values(values: BTreeMap<&'static str, String>) -> Self {
        Self {
            values,
            errors: BTreeMap::new(),
            in_flight: false,
        }
    }

    pub fn value(&self, field: &str) -> String {
        self.values.get(field).cloned().unwrap_or_default()
    }

    pub fn reset(&mut self, defaults: BTreeMap<&'static str, String>) {
        self.values = defaults;
        self.errors.clear();
    }
}
