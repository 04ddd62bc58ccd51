//! Application configuration.
//!
//! The only configurable value is the API origin. It defaults to the local
//! development server and can be overridden with the `HRMS_API_URL`
//! environment variable.

/// Default API origin for a local HRMS backend.
const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// Environment variable that overrides the API origin.
const API_BASE_URL_ENV: &str = "HRMS_API_URL";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE_URL)
    }
}

impl Config {
    pub fn new(api_base_url: impl Into<String>) -> Self {
        let mut url: String = api_base_url.into();
        // Normalize so path joins never produce "//"
        while url.ends_with('/') {
            url.pop();
        }
        Self { api_base_url: url }
    }

    /// Load the configuration, honoring `HRMS_API_URL` when set and
    /// non-empty.
    pub fn from_env() -> Self {
        match std::env::var(API_BASE_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => Self::new(url),
            _ => Self::default(),
        }
    }
}
