//! Operation outcome reported back to the automation runtime.

use prism_core::case::snake_case_keys;
use prism_core::shaper::ResultShaper;
use prism_core::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Desired state of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum State {
    /// The resource exists with the given attributes
    #[default]
    Present,
    /// The resource does not exist
    Absent,
}

impl FromStr for State {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "present" => Ok(Self::Present),
            "absent" => Ok(Self::Absent),
            other => Err(Error::SchemaViolation(format!(
                "`state` must be present or absent, got `{other}`"
            ))),
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Present => write!(f, "present"),
            Self::Absent => write!(f, "absent"),
        }
    }
}

/// Result of one module invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationResult {
    /// Whether the remote state was (or would be) modified
    pub changed: bool,
    /// Whether the operation failed
    pub failed: bool,
    /// Shaped entity, listing or task record; always emitted
    #[serde(default)]
    pub response: Option<Value>,
    /// External identifier of the affected entity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext_id: Option<String>,
    /// External identifier of the task that carried the change
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_ext_id: Option<String>,
    /// `CODE: message` when failed; always emitted
    #[serde(default)]
    pub error: Option<String>,
    /// Set when the idempotency check found nothing to change
    #[serde(default)]
    pub skipped: bool,
    /// Human readable summary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    /// Server-reported total of a listing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_available_results: Option<u64>,
}

impl OperationResult {
    /// A successful result with `changed` set as given.
    #[must_use]
    pub fn new(changed: bool) -> Self {
        Self {
            changed,
            ..Self::default()
        }
    }

    /// The failed result for `err`.
    #[must_use]
    pub fn failure(err: &Error) -> Self {
        Self {
            failed: true,
            error: Some(format!("{}: {err}", err.error_code())),
            msg: Some(err.to_string()),
            ..Self::default()
        }
    }

    /// Collapses an outcome into a result. This is the only place errors are
    /// turned into `failed=true`.
    #[must_use]
    pub fn finish(outcome: Result<Self>) -> Self {
        match outcome {
            Ok(result) => result,
            Err(err) => {
                if err.should_log() {
                    tracing::warn!(code = err.error_code(), error = %err, "operation failed");
                } else {
                    tracing::debug!(code = err.error_code(), error = %err, "operation failed");
                }
                Self::failure(&err)
            }
        }
    }

    /// Set the response.
    #[must_use]
    pub fn with_response(mut self, response: Value) -> Self {
        self.response = Some(response);
        self
    }

    /// Set the entity identifier.
    #[must_use]
    pub fn with_ext_id(mut self, ext_id: impl Into<String>) -> Self {
        self.ext_id = Some(ext_id.into());
        self
    }

    /// Set the task identifier.
    #[must_use]
    pub fn with_task_ext_id(mut self, task_ext_id: impl Into<String>) -> Self {
        self.task_ext_id = Some(task_ext_id.into());
        self
    }

    /// Set the message.
    #[must_use]
    pub fn with_msg(mut self, msg: impl Into<String>) -> Self {
        self.msg = Some(msg.into());
        self
    }

    /// Mark as skipped by the idempotency check.
    #[must_use]
    pub fn skipped(mut self) -> Self {
        self.skipped = true;
        self.changed = false;
        self
    }
}

/// Strips internal keys (except `preserve`), prunes empty values and converts
/// keys to snake_case.
#[must_use]
pub fn shape_response(value: &Value, preserve: &[String]) -> Value {
    let shaper = preserve
        .iter()
        .fold(ResultShaper::new(), |shaper, key| shaper.preserving(key.clone()));
    snake_case_keys(&shaper.shape(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_state_parse() {
        assert_eq!("absent".parse::<State>().unwrap(), State::Absent);
        assert_eq!(State::default(), State::Present);
        assert_eq!(
            "gone".parse::<State>().unwrap_err().error_code(),
            "SCHEMA_VIOLATION"
        );
    }

    #[test]
    fn test_failure_carries_code() {
        let result = OperationResult::finish(Err(Error::PreconditionUnavailable(
            "volume group VG-1".to_string(),
        )));
        assert!(result.failed);
        assert!(!result.changed);
        assert!(result
            .error
            .as_deref()
            .unwrap()
            .starts_with("PRECONDITION_UNAVAILABLE: "));
    }

    #[test]
    fn test_response_and_error_always_serialized() {
        let value = serde_json::to_value(OperationResult::new(true).with_ext_id("X")).unwrap();
        assert_eq!(
            value,
            json!({
                "changed": true,
                "failed": false,
                "response": null,
                "ext_id": "X",
                "error": null,
                "skipped": false
            })
        );

        let failed = OperationResult::failure(&Error::SchemaViolation("bad".into()));
        let value = serde_json::to_value(failed).unwrap();
        assert_eq!(value["response"], Value::Null);
        assert!(value.as_object().unwrap().contains_key("response"));
        assert!(value["error"].as_str().unwrap().starts_with("SCHEMA_VIOLATION: "));
        assert!(value.get("task_ext_id").is_none());
    }

    #[test]
    fn test_shape_response() {
        let shaped = shape_response(
            &json!({
                "displayName": "acp1",
                "$objectType": "iam.v4.authz.AuthorizationPolicy",
                "identities": [{"$reserved": {"user": "U-1"}}],
                "description": ""
            }),
            &["$reserved".to_string()],
        );
        assert_eq!(
            shaped,
            json!({"display_name": "acp1", "identities": [{"$reserved": {"user": "U-1"}}]})
        );
    }
}
