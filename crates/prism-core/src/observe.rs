//! Request/response logging for Prism Central calls.
//!
//! The [`Interceptor`] wraps [`ServiceClient::execute`](crate::client::ServiceClient::execute).
//! When enabled it records each exchange as `tracing` events, appends the same
//! lines to an optional log file and echoes them to stderr. Sensitive header
//! values are replaced with [`REDACTED`]; bodies are logged as-is.

use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::TransportConfig;
use crate::error::Error;

/// Replacement text for sensitive header values
pub const REDACTED: &str = "********";

const SENSITIVE_HEADER_MARKERS: &[&str] = &[
    "authorization",
    "password",
    "token",
    "api-key",
    "api_key",
    "secret",
];

/// Returns true if the header value must not be logged.
#[must_use]
pub fn is_sensitive_header(name: &str) -> bool {
    let lower = name.to_lowercase();
    SENSITIVE_HEADER_MARKERS
        .iter()
        .any(|marker| lower.contains(marker))
}

/// Renders headers as `name: value` pairs with sensitive values redacted.
#[must_use]
pub fn redact_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let rendered = if is_sensitive_header(name.as_str()) {
                REDACTED.to_string()
            } else {
                String::from_utf8_lossy(value.as_bytes()).into_owned()
            };
            (name.as_str().to_string(), rendered)
        })
        .collect()
}

/// One-line summary for task references and task records.
#[must_use]
pub fn task_summary(body: &Value) -> Option<String> {
    let data = body.get("data").unwrap_or(body);
    let object_type = data.get("$objectType").and_then(Value::as_str).unwrap_or("");
    let ext_id = data.get("extId").and_then(Value::as_str)?;

    if object_type.ends_with("TaskReference") {
        return Some(format!("task {ext_id} submitted"));
    }

    let status = data.get("status").and_then(Value::as_str)?;
    if object_type.ends_with(".Task") || data.get("progressPercentage").is_some() {
        let progress = data
            .get("progressPercentage")
            .and_then(Value::as_u64)
            .unwrap_or(0);
        let operation = data.get("operation").and_then(Value::as_str).unwrap_or("-");
        return Some(format!(
            "task {ext_id} {operation} status={status} progress={progress}%"
        ));
    }
    None
}

/// Debug interceptor attached to every service client.
#[derive(Debug, Clone, Default)]
pub struct Interceptor {
    enabled: bool,
    log_file: Option<PathBuf>,
    default_headers: HeaderMap,
}

impl Interceptor {
    /// Create an interceptor.
    #[must_use]
    pub fn new(enabled: bool, log_file: Option<PathBuf>) -> Self {
        Self {
            enabled,
            log_file,
            default_headers: HeaderMap::new(),
        }
    }

    /// An interceptor that records nothing.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(false, None)
    }

    /// Headers the HTTP client adds to every request (authentication).
    ///
    /// They are not visible on a built `reqwest::Request`, so the client
    /// hands them over here and [`Interceptor::on_request`] logs them
    /// redacted alongside the request's own headers.
    #[must_use]
    pub fn with_default_headers(mut self, headers: HeaderMap) -> Self {
        self.default_headers = headers;
        self
    }

    /// Builds an interceptor from the transport debug settings.
    #[must_use]
    pub fn from_config(config: &TransportConfig) -> Self {
        Self::new(config.debug, config.log_file.clone())
    }

    /// Returns true if the interceptor records exchanges.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Records an outgoing request.
    pub fn on_request(&self, request: &reqwest::Request) {
        if !self.enabled {
            return;
        }

        let url = request.url();
        let mut merged = self.default_headers.clone();
        for (name, value) in request.headers() {
            merged.insert(name.clone(), value.clone());
        }
        let headers = redact_headers(&merged)
            .into_iter()
            .map(|(k, v)| format!("{k}: {v}"))
            .collect::<Vec<_>>()
            .join(", ");
        let body = request
            .body()
            .and_then(reqwest::Body::as_bytes)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .unwrap_or_default();

        debug!(
            target: "prism_core::observe",
            method = %request.method(),
            url = %url,
            query = url.query().unwrap_or(""),
            "request"
        );
        self.emit(&format!(
            "REQUEST {} {} headers=[{headers}] body={body}",
            request.method(),
            url
        ));
    }

    /// Records a successful response.
    pub fn on_response(
        &self,
        method: &Method,
        url: &str,
        status: StatusCode,
        elapsed: Duration,
        body: &Value,
    ) {
        if !self.enabled {
            return;
        }

        let elapsed_ms = elapsed.as_millis();
        debug!(
            target: "prism_core::observe",
            %method,
            url,
            status = status.as_u16(),
            elapsed_ms,
            "response"
        );
        self.emit(&format!(
            "RESPONSE {method} {url} status={} elapsed_ms={elapsed_ms} body={body}",
            status.as_u16()
        ));
        if let Some(summary) = task_summary(body) {
            debug!(target: "prism_core::observe", "{summary}");
            self.emit(&format!("TASK {summary}"));
        }
    }

    /// Records a failed exchange. The error itself is left untouched.
    pub fn on_error(&self, method: &Method, url: &str, err: &Error, elapsed: Duration) {
        if !self.enabled {
            return;
        }

        let elapsed_ms = elapsed.as_millis();
        let line = match err {
            Error::Remote {
                status,
                reason,
                body,
                ..
            } => format!(
                "ERROR {method} {url} class={} status={status} reason={reason} elapsed_ms={elapsed_ms} body={}",
                err.error_code(),
                body.as_ref().map(ToString::to_string).unwrap_or_default()
            ),
            other => format!(
                "ERROR {method} {url} class={} elapsed_ms={elapsed_ms} detail={other}",
                other.error_code()
            ),
        };
        debug!(
            target: "prism_core::observe",
            %method,
            url,
            class = err.error_code(),
            elapsed_ms,
            "request failed"
        );
        self.emit(&line);
    }

    fn emit(&self, line: &str) {
        if let Some(path) = &self.log_file {
            let written = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .and_then(|mut file| writeln!(file, "{line}"));
            if let Err(e) = written {
                warn!(path = %path.display(), error = %e, "failed to write debug log file");
            }
        }
        let _ = writeln!(std::io::stderr(), "{line}");
    }
}
