use serde::{Deserialize, Serialize};

/// An employee record as returned by the server.
///
/// `employee_id` is user-supplied at creation and immutable afterwards;
/// `total_present_days` is computed server-side and never written by this
/// client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub employee_id: String,
    pub name: String,
    pub email: String,
    pub department: String,
    #[serde(default)]
    pub total_present_days: i64,
}

/// Payload for creating a new employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeInput {
    pub employee_id: String,
    pub name: String,
    pub email: String,
    pub department: String,
}
