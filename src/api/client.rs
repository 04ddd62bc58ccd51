//! HTTP client for the HRMS REST API.
//!
//! This module provides the `ApiClient` struct wrapping the employee and
//! attendance endpoints. Every operation returns either the parsed JSON
//! payload or a typed `ApiError`; nothing is retried here — retry policy
//! belongs to the caller.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::config::Config;
use crate::models::{AttendanceInput, AttendanceRecord, Employee, EmployeeInput};

use super::{ApiError, HrmsApi};

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// API client for the HRMS backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client for the configured origin.
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.api_base_url.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET a JSON collection. Non-success statuses become `ApiError::Network`
    /// with the operation's generic message.
    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        what: &str,
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!(url = %url, "GET");

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "GET request failed");
                ApiError::transport(format!("Failed to fetch {what}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = %status, "GET returned non-success");
            return Err(ApiError::network(
                format!("Failed to fetch {what}"),
                status.as_u16(),
            ));
        }

        response
            .json()
            .await
            .map_err(|_| ApiError::transport(format!("Failed to fetch {what}")))
    }

    /// POST a JSON body. Rejections carry the response body's `detail`
    /// message when the server provides one.
    async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
        fallback: &str,
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!(url = %url, "POST");

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "POST request failed");
                ApiError::transport(fallback)
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(url = %url, status = %status, "POST rejected");
            return Err(ApiError::rejection(status.as_u16(), &text, fallback));
        }

        response
            .json()
            .await
            .map_err(|_| ApiError::transport(fallback))
    }
}

#[async_trait::async_trait]
impl HrmsApi for ApiClient {
    async fn list_employees(&self) -> Result<Vec<Employee>, ApiError> {
        self.get("/employees", &[], "employees").await
    }

    async fn create_employee(&self, input: &EmployeeInput) -> Result<Employee, ApiError> {
        self.post("/employees", input, "Failed to add employee").await
    }

    async fn delete_employee(&self, employee_id: &str) -> Result<(), ApiError> {
        let url = self.url(&format!("/employees/{employee_id}"));
        debug!(url = %url, "DELETE");

        let response = self.client.delete(&url).send().await.map_err(|e| {
            warn!(url = %url, error = %e, "DELETE request failed");
            ApiError::transport("Failed to delete employee")
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = %status, "DELETE returned non-success");
            return Err(ApiError::network(
                "Failed to delete employee",
                status.as_u16(),
            ));
        }

        // Success is a 204 No Content; nothing to parse.
        Ok(())
    }

    async fn list_attendance(&self, date: Option<&str>) -> Result<Vec<AttendanceRecord>, ApiError> {
        // An absent or empty filter means "all dates".
        match date.map(str::trim).filter(|d| !d.is_empty()) {
            Some(d) => {
                self.get("/attendance", &[("attendance_date", d)], "attendance")
                    .await
            }
            None => self.get("/attendance", &[], "attendance").await,
        }
    }

    async fn mark_attendance(&self, input: &AttendanceInput) -> Result<AttendanceRecord, ApiError> {
        self.post("/attendance", input, "Failed to mark attendance")
            .await
    }

    async fn list_employee_attendance(
        &self,
        employee_id: &str,
    ) -> Result<Vec<AttendanceRecord>, ApiError> {
        self.get(
            &format!("/employees/{employee_id}/attendance"),
            &[],
            &format!("attendance for employee {employee_id}"),
        )
        .await
    }
}
