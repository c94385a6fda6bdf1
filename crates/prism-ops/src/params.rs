//! Typed access to module parameters.

use prism_core::{Error, Result};
use serde_json::{Map, Value};

use crate::envelope::State;

/// Module parameters as handed over by the automation runtime.
pub type Params = Map<String, Value>;

/// Optional string parameter; null counts as absent.
///
/// # Errors
///
/// Returns [`Error::SchemaViolation`] when the value is not a string.
pub fn optional_str<'a>(params: &'a Params, key: &str) -> Result<Option<&'a str>> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(Error::SchemaViolation(format!(
            "`{key}` must be a string, got {other}"
        ))),
    }
}

/// Required string parameter.
///
/// # Errors
///
/// Returns [`Error::SchemaViolation`] when missing or not a string.
pub fn required_str<'a>(params: &'a Params, key: &str) -> Result<&'a str> {
    optional_str(params, key)?
        .ok_or_else(|| Error::SchemaViolation(format!("missing required parameter `{key}`")))
}

/// Boolean parameter with a default.
///
/// # Errors
///
/// Returns [`Error::SchemaViolation`] when the value is not a boolean.
pub fn flag(params: &Params, key: &str, default: bool) -> Result<bool> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::Bool(b)) => Ok(*b),
        Some(other) => Err(Error::SchemaViolation(format!(
            "`{key}` must be a boolean, got {other}"
        ))),
    }
}

/// The `state` parameter, `present` when absent.
///
/// # Errors
///
/// Returns [`Error::SchemaViolation`] for anything but `present` or `absent`.
pub fn state(params: &Params) -> Result<State> {
    optional_str(params, "state")?.map_or(Ok(State::Present), str::parse)
}
