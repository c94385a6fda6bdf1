//! Optimistic concurrency helpers.
//!
//! Prism Central versions every mutable entity. A read returns the version in
//! the `ETag` header; the following update or delete must echo it back in
//! `If-Match` or the server rejects the write.

use reqwest::header::IF_MATCH;
use reqwest::RequestBuilder;
use serde_json::Value;

use crate::client::ApiResponse;
use crate::error::{Error, Result};

/// Opaque entity version token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ETag(String);

impl ETag {
    /// Wraps a raw token.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the raw token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ETag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extracts the version token from a read response.
///
/// The `ETag` header wins; otherwise the `ETag` entry of the entity's
/// `$reserved` blob is used.
#[must_use]
pub fn extract(response: &ApiResponse) -> Option<ETag> {
    if let Some(tag) = response.etag.as_deref().filter(|t| !t.is_empty()) {
        return Some(ETag::new(tag));
    }
    from_reserved(response.data())
}

/// Reads the token from an entity's `$reserved` blob.
#[must_use]
pub fn from_reserved(entity: &Value) -> Option<ETag> {
    entity
        .get("$reserved")
        .and_then(|reserved| reserved.get("ETag"))
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .map(ETag::new)
}

/// Sets `If-Match` on a write request.
#[must_use]
pub fn attach(etag: &ETag, builder: RequestBuilder) -> RequestBuilder {
    builder.header(IF_MATCH, etag.as_str())
}

/// Fails with [`Error::PreconditionUnavailable`] when the read produced no token.
///
/// # Errors
///
/// Returns an error naming `what` when `etag` is `None`.
pub fn require(etag: Option<ETag>, what: &str) -> Result<ETag> {
    etag.ok_or_else(|| {
        Error::PreconditionUnavailable(format!("no ETag returned when reading {what}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(etag: Option<&str>, body: Value) -> ApiResponse {
        ApiResponse {
            status: 200,
            etag: etag.map(str::to_string),
            body,
        }
    }

    #[test]
    fn test_extract_prefers_header() {
        let resp = response(
            Some("E-1"),
            json!({"data": {"$reserved": {"ETag": "E-old"}}}),
        );
        assert_eq!(extract(&resp), Some(ETag::new("E-1")));
    }

    #[test]
    fn test_extract_falls_back_to_reserved() {
        let resp = response(None, json!({"data": {"extId": "VG-1", "$reserved": {"ETag": "E-2"}}}));
        assert_eq!(extract(&resp).as_ref().map(ETag::as_str), Some("E-2"));
    }

    #[test]
    fn test_extract_missing() {
        let resp = response(Some(""), json!({"data": {"extId": "VG-1"}}));
        assert!(extract(&resp).is_none());
    }

    #[test]
    fn test_require() {
        assert_eq!(
            require(Some(ETag::new("E-1")), "volume group").unwrap(),
            ETag::new("E-1")
        );
        let err = require(None, "volume group VG-1").unwrap_err();
        assert_eq!(err.error_code(), "PRECONDITION_UNAVAILABLE");
        assert!(err.to_string().contains("volume group VG-1"));
    }

    #[test]
    fn test_attach_sets_if_match() {
        let request = attach(
            &ETag::new("E-9"),
            reqwest::Client::new().delete("https://pc/api/volumes/v4.0/config/volume-groups/VG-1"),
        )
        .build()
        .unwrap();
        assert_eq!(request.headers().get(IF_MATCH).unwrap(), "E-9");
    }
}
