//! Error types for Prism Central operations.
//!
//! This module provides the error taxonomy shared by every crate in the workspace,
//! including HTTP status code mapping and extraction of server-provided reasons.

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Main error type for Prism Central operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Missing or contradictory transport configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The typed client for a service is not registered
    #[error("SDK unavailable: {0}")]
    SdkUnavailable(String),

    /// Declarative input does not fit the argument schema
    #[error("Schema violation: {0}")]
    SchemaViolation(String),

    /// The remote service answered with a 4xx/5xx status
    #[error("Remote error {status} {reason}: {message}")]
    Remote {
        /// HTTP status code
        status: u16,
        /// Canonical reason phrase for the status
        reason: String,
        /// Server-provided error message(s)
        message: String,
        /// Parsed response body, when it was JSON
        body: Option<Value>,
    },

    /// A read-modify-write cycle could not obtain an ETag
    #[error("Precondition unavailable: {0}")]
    PreconditionUnavailable(String),

    /// A task did not reach a terminal state in time
    #[error("Task {task_ext_id} did not reach a terminal state within {waited_secs}s")]
    TaskTimeout {
        /// Task external identifier
        task_ext_id: String,
        /// Seconds waited before giving up
        waited_secs: u64,
        /// Last task record observed while polling
        last_observed: Option<Value>,
    },

    /// A task reached FAILED or CANCELED
    #[error("Task {task_ext_id} finished with status {status}: {}", .messages.join("; "))]
    TaskFailed {
        /// Task external identifier
        task_ext_id: String,
        /// Terminal status reported by the server
        status: String,
        /// Error messages attached to the task record
        messages: Vec<String>,
    },

    /// Full enumeration aborted on a page error
    #[error("Failed to fetch page {page}: {source}")]
    PageFetchFailed {
        /// Zero-based page index that failed
        page: u32,
        /// Underlying error
        source: Box<Error>,
    },

    /// Inventory template or filter evaluation failed
    #[error("Template error: {0}")]
    TemplateError(String),

    /// HTTP request failed before a response was received
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Request timed out
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Failed to parse a response body
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Invalid endpoint or path
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

/// Specialized result type for Prism Central operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::SdkUnavailable(_) => "SDK_UNAVAILABLE",
            Self::SchemaViolation(_) => "SCHEMA_VIOLATION",
            Self::Remote { .. } => "REMOTE_ERROR",
            Self::PreconditionUnavailable(_) => "PRECONDITION_UNAVAILABLE",
            Self::TaskTimeout { .. } => "TASK_TIMEOUT",
            Self::TaskFailed { .. } => "TASK_FAILED",
            Self::PageFetchFailed { .. } => "PAGE_FETCH_FAILED",
            Self::TemplateError(_) => "TEMPLATE_ERROR",
            Self::HttpError(_) => "HTTP_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::ParseError(_) => "PARSE_ERROR",
            Self::InvalidEndpoint(_) => "INVALID_ENDPOINT",
        }
    }

    /// Builds a [`Error::Remote`] from a failed HTTP exchange.
    ///
    /// The server reason is taken from the v4 error envelope
    /// (`data.error[].message`) when present, otherwise the raw body text.
    #[must_use]
    pub fn from_status(status: StatusCode, text: &str) -> Self {
        let body = serde_json::from_str::<Value>(text).ok();
        let message = body
            .as_ref()
            .and_then(extract_error_messages)
            .unwrap_or_else(|| text.trim().to_string());

        Self::Remote {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            message,
            body,
        }
    }

    /// HTTP status carried by the error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Remote { status, .. } => Some(*status),
            Self::PageFetchFailed { source, .. } => source.status(),
            _ => None,
        }
    }

    /// Returns true for 404-class remote errors.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND.as_u16())
    }

    /// Returns true if this error should be logged as a serious error.
    #[must_use]
    pub const fn should_log(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfig(_) | Self::SdkUnavailable(_) | Self::TaskTimeout { .. }
        )
    }
}

fn extract_error_messages(body: &Value) -> Option<String> {
    let errors = body
        .pointer("/data/error")
        .or_else(|| body.get("error"))?
        .as_array()?;

    let messages: Vec<&str> = errors
        .iter()
        .filter_map(|entry| entry.get("message").and_then(Value::as_str))
        .collect();

    if messages.is_empty() {
        None
    } else {
        Some(messages.join("; "))
    }
}

// Conversions from external error types
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if let Some(status) = err.status() {
            Self::from_status(status, &err.to_string())
        } else {
            Self::HttpError(err.to_string())
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidEndpoint(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::InvalidConfig(err.to_string())
    }
}
