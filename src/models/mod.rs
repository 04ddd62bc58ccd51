//! Data models for HRMS entities.
//!
//! This module contains the wire-level data structures exchanged with
//! the HRMS API:
//!
//! - `Employee`, `EmployeeInput`: employee records and creation payloads
//! - `AttendanceRecord`, `AttendanceInput`, `AttendanceStatus`: daily
//!   attendance entries
//!
//! All types serialize to the JSON shapes the server expects; dates travel
//! as ISO `YYYY-MM-DD` strings and are shape-checked at the form layer.

pub mod attendance;
pub mod employee;

pub use attendance::{AttendanceInput, AttendanceRecord, AttendanceStatus};
pub use employee::{Employee, EmployeeInput};
