//! Listing queries from info-module parameters.

use prism_core::{Error, ListQuery, Result};
use serde_json::{Map, Value};

/// Builds a [`ListQuery`] from `filter`, `orderby`, `select`, `expand`, `page`,
/// `limit` and any caller-named `extras`. Absent or null keys are omitted.
///
/// # Errors
///
/// Returns [`Error::SchemaViolation`] when `page` or `limit` is not a
/// non-negative integer, or a text parameter is not a string.
pub fn info_query(params: &Map<String, Value>, extras: &[&str]) -> Result<ListQuery> {
    let mut query = ListQuery::new();
    if let Some(filter) = text(params, "filter")? {
        query = query.with_filter(filter);
    }
    if let Some(orderby) = text(params, "orderby")? {
        query = query.with_orderby(orderby);
    }
    if let Some(select) = text(params, "select")? {
        query = query.with_select(select);
    }
    if let Some(expand) = text(params, "expand")? {
        query = query.with_expand(expand);
    }
    if let Some(page) = integer(params, "page")? {
        query = query.with_page(page);
    }
    if let Some(limit) = integer(params, "limit")? {
        query = query.with_limit(limit);
    }
    for key in extras {
        match params.get(*key) {
            None | Some(Value::Null) => {}
            Some(Value::String(s)) => query = query.with_extra(*key, s.clone()),
            Some(other) => query = query.with_extra(*key, other.to_string()),
        }
    }
    Ok(query)
}

fn text(params: &Map<String, Value>, key: &str) -> Result<Option<String>> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(Error::SchemaViolation(format!(
            "`{key}` must be a string, got {other}"
        ))),
    }
}

fn integer(params: &Map<String, Value>, key: &str) -> Result<Option<u32>> {
    let parsed = match params.get(key) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Some(Value::String(s)) => s.trim().parse::<u32>().ok(),
        Some(_) => None,
    };
    parsed.map(Some).ok_or_else(|| {
        Error::SchemaViolation(format!("`{key}` must be a non-negative integer"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_present_keys_only() {
        let query = info_query(
            &params(json!({"filter": "name eq 'a'", "page": 0, "limit": "1", "orderby": null})),
            &[],
        )
        .unwrap();
        let pairs = query.to_pairs();
        assert!(pairs.contains(&("$filter".to_string(), "name eq 'a'".to_string())));
        assert!(pairs.contains(&("$page".to_string(), "0".to_string())));
        assert!(pairs.contains(&("$limit".to_string(), "1".to_string())));
        assert!(!pairs.iter().any(|(k, _)| k == "$orderby"));
    }

    #[test]
    fn test_extras_forwarded() {
        let query = info_query(
            &params(json!({"cluster_ext_id": "C-1", "verbose": true, "ignored": 1})),
            &["cluster_ext_id", "verbose"],
        )
        .unwrap();
        let pairs = query.to_pairs();
        assert!(pairs.contains(&("cluster_ext_id".to_string(), "C-1".to_string())));
        assert!(pairs.contains(&("verbose".to_string(), "true".to_string())));
        assert!(!pairs.iter().any(|(k, _)| k == "ignored"));
    }

    #[test]
    fn test_bad_integers_rejected() {
        for bad in [json!(-1), json!("x"), json!(1.5), json!([1])] {
            let err = info_query(&params(json!({ "limit": bad })), &[]).unwrap_err();
            assert_eq!(err.error_code(), "SCHEMA_VIOLATION");
        }
        assert!(info_query(&params(json!({"filter": 3})), &[]).is_err());
    }
}
