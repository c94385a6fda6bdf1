//! Shaping of response trees before they are returned to callers.
//!
//! Server payloads carry bookkeeping keys (`$objectType`, `$reserved`, …) that
//! callers must not see. [`ResultShaper`] returns a new tree without them and,
//! by default, without empty strings, empty collections and nulls.

use serde_json::{Map, Value};

/// Bookkeeping keys stripped from shaped trees, in wire and SDK spellings.
pub const INTERNAL_KEYS: &[&str] = &[
    "$objectType",
    "$reserved",
    "$unknownFields",
    "$dataItemDiscriminator",
    "_object_type",
    "_reserved",
    "_unknown_fields",
    "_data_item_discriminator",
];

/// Returns true for internal bookkeeping keys.
#[must_use]
pub fn is_internal_key(key: &str) -> bool {
    INTERNAL_KEYS.contains(&key)
}

/// Returns true for null, empty strings and empty arrays or objects.
#[must_use]
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Response tree shaper.
#[derive(Debug, Clone)]
pub struct ResultShaper {
    preserve: Vec<String>,
    prune_empty: bool,
}

impl Default for ResultShaper {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultShaper {
    /// Strips every internal key and prunes empty values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            preserve: Vec::new(),
            prune_empty: true,
        }
    }

    /// Keeps `key` (and its subtree, untouched) wherever it appears.
    #[must_use]
    pub fn preserving(mut self, key: impl Into<String>) -> Self {
        self.preserve.push(key.into());
        self
    }

    /// Keeps empty values.
    #[must_use]
    pub const fn without_pruning(mut self) -> Self {
        self.prune_empty = false;
        self
    }

    /// Returns the shaped copy of `value`.
    #[must_use]
    pub fn shape(&self, value: &Value) -> Value {
        match value {
            Value::Object(map) => Value::Object(self.shape_map(map)),
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.shape(item))
                    .filter(|item| !(self.prune_empty && is_empty_value(item)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    fn shape_map(&self, map: &Map<String, Value>) -> Map<String, Value> {
        let mut out = Map::with_capacity(map.len());
        for (key, value) in map {
            if self.preserve.iter().any(|p| p == key) {
                out.insert(key.clone(), value.clone());
                continue;
            }
            if is_internal_key(key) {
                continue;
            }
            let shaped = self.shape(value);
            if self.prune_empty && is_empty_value(&shaped) {
                continue;
            }
            out.insert(key.clone(), shaped);
        }
        out
    }
}

/// Normalizes a list payload: absent or null becomes `[]`, a lone entity a
/// one-element list.
#[must_use]
pub fn normalize_list(payload: Option<&Value>) -> Vec<Value> {
    match payload {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.clone(),
        Some(other) => vec![other.clone()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strips_internal_keys_recursively() {
        let input = json!({
            "$objectType": "iam.v4.authz.Role",
            "$reserved": {"ETag": "E-1"},
            "extId": "R-1",
            "operations": [
                {"$objectType": "x", "value": "op-1", "_unknown_fields": {}}
            ],
            "nested": {"_object_type": "y", "name": "n"}
        });

        let shaped = ResultShaper::new().shape(&input);
        assert_eq!(
            shaped,
            json!({
                "extId": "R-1",
                "operations": [{"value": "op-1"}],
                "nested": {"name": "n"}
            })
        );
    }

    #[test]
    fn test_preserve_keeps_reserved_blob() {
        let input = json!({
            "identityFilter": {"$reserved": {"categories": ["a"]}, "$objectType": "f"}
        });
        let shaped = ResultShaper::new().preserving("$reserved").shape(&input);
        assert_eq!(
            shaped,
            json!({"identityFilter": {"$reserved": {"categories": ["a"]}}})
        );
    }

    #[test]
    fn test_prunes_empty_values() {
        let input = json!({
            "name": "vg",
            "description": "",
            "disks": [],
            "meta": {"$objectType": "only"},
            "count": 0,
            "enabled": false,
            "owner": null
        });
        let shaped = ResultShaper::new().shape(&input);
        assert_eq!(shaped, json!({"name": "vg", "count": 0, "enabled": false}));
    }

    #[test]
    fn test_without_pruning_keeps_empties() {
        let input = json!({"description": "", "tags": [], "$reserved": {}});
        let shaped = ResultShaper::new().without_pruning().shape(&input);
        assert_eq!(shaped, json!({"description": "", "tags": []}));
    }

    #[test]
    fn test_no_internal_keys_survive() {
        let input = json!([{"a": {"b": [{"$dataItemDiscriminator": 1, "c": 2}]}}]);
        let shaped = ResultShaper::new().shape(&input).to_string();
        for key in INTERNAL_KEYS {
            assert!(!shaped.contains(key));
        }
    }

    #[test]
    fn test_normalize_list() {
        assert!(normalize_list(None).is_empty());
        assert!(normalize_list(Some(&Value::Null)).is_empty());
        assert_eq!(normalize_list(Some(&json!([1, 2]))).len(), 2);
        assert_eq!(normalize_list(Some(&json!({"extId": "x"}))).len(), 1);
    }
}
