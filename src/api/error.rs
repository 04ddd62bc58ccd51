use serde::Deserialize;
use thiserror::Error;

/// Errors surfaced by remote API operations.
///
/// Every client operation either resolves with the parsed payload or fails
/// with one of these variants carrying a human-readable message and, where
/// available, the HTTP status code. The client never recovers errors itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Transport failure, or a non-success status with no usable error body.
    #[error("{message}")]
    Network {
        message: String,
        status: Option<u16>,
    },

    /// The server rejected the submitted input; message taken from the
    /// response body's `detail` field.
    #[error("{message}")]
    Validation { message: String, status: u16 },
}

/// Error body shape returned by the server on rejected mutations.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

impl ApiError {
    /// A transport-level or generic fetch failure with no status.
    pub fn transport(message: impl Into<String>) -> Self {
        ApiError::Network {
            message: message.into(),
            status: None,
        }
    }

    /// A non-success status on a read or delete; no `detail` extraction.
    pub fn network(message: impl Into<String>, status: u16) -> Self {
        ApiError::Network {
            message: message.into(),
            status: Some(status),
        }
    }

    /// A rejected mutation. Uses the body's `detail` field when parseable,
    /// falling back to the operation's generic message.
    pub fn rejection(status: u16, body: &str, fallback: &str) -> Self {
        ApiError::Validation {
            message: extract_detail(body).unwrap_or_else(|| fallback.to_string()),
            status,
        }
    }

    /// HTTP status associated with this error, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Network { status, .. } => *status,
            ApiError::Validation { status, .. } => Some(*status),
        }
    }
}

/// Pull the `detail` string out of an error response body, if present.
fn extract_detail(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.detail)
        .filter(|d| !d.is_empty())
}
