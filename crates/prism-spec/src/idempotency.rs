//! Deciding whether a write is needed.
//!
//! The proposed body and the current entity are both shaped (internal keys
//! removed, empty values pruned) and compared. Maps compare without regard to
//! key order; lists compare element by element unless the schema marks them
//! unordered, in which case they compare as multisets.

use prism_core::shaper::ResultShaper;
use serde_json::{Map, Value};

use crate::schema::{FieldKind, Schema};

/// Outcome of an idempotency check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Proposed state equals the current one; no write is issued
    Skip,
    /// Proposed state differs
    Changed,
    /// Secret fields were supplied; the server never returns them, so a write
    /// is always issued
    Bypassed {
        /// Parameter paths of the supplied secret fields
        fields: Vec<String>,
    },
}

impl Decision {
    /// Returns true when a write must be issued.
    #[must_use]
    pub const fn needs_write(&self) -> bool {
        !matches!(self, Self::Skip)
    }
}

/// Paths of secret fields present (and non-null) in `params`.
#[must_use]
pub fn supplied_secrets(schema: &Schema, params: &Map<String, Value>) -> Vec<String> {
    let mut found = Vec::new();
    collect_secrets(schema, params, "", &mut found);
    found
}

fn collect_secrets(schema: &Schema, params: &Map<String, Value>, path: &str, found: &mut Vec<String>) {
    for field in schema.fields() {
        let Some(value) = params.get(&field.name).filter(|v| !v.is_null()) else {
            continue;
        };
        let field_path = if path.is_empty() {
            field.name.clone()
        } else {
            format!("{path}.{}", field.name)
        };
        if field.secret {
            found.push(field_path);
            continue;
        }
        if let (FieldKind::Object(nested), Value::Object(map)) = (&field.kind, value) {
            collect_secrets(nested, map, &field_path, found);
        }
    }
}

/// Compares the proposed body against the current entity.
#[must_use]
pub fn check(
    schema: &Schema,
    current: &Value,
    proposed: &Value,
    params: &Map<String, Value>,
) -> Decision {
    let secrets = supplied_secrets(schema, params);
    if !secrets.is_empty() {
        tracing::debug!(fields = ?secrets, "secret fields supplied, skipping idempotency check");
        return Decision::Bypassed { fields: secrets };
    }

    let shaper = schema
        .preserved_keys()
        .iter()
        .fold(ResultShaper::new(), |shaper, key| shaper.preserving(key.clone()));
    let current = shaper.shape(current);
    let proposed = shaper.shape(proposed);

    if equivalent_object(Some(schema), &current, &proposed) {
        Decision::Skip
    } else {
        Decision::Changed
    }
}

/// Schema-aware equality of two shaped trees.
#[must_use]
pub fn equivalent(kind: Option<&FieldKind>, left: &Value, right: &Value) -> bool {
    match kind {
        Some(FieldKind::Object(schema)) => equivalent_object(Some(schema), left, right),
        Some(FieldKind::List { item, unordered }) => {
            let (Value::Array(l), Value::Array(r)) = (left, right) else {
                return left == right;
            };
            if l.len() != r.len() {
                return false;
            }
            if *unordered {
                multiset_eq(item, l, r)
            } else {
                l.iter().zip(r).all(|(a, b)| equivalent(Some(item), a, b))
            }
        }
        Some(FieldKind::Scalar | FieldKind::OneOf(_) | FieldKind::Opaque { .. }) | None => {
            left == right
        }
    }
}

fn equivalent_object(schema: Option<&Schema>, left: &Value, right: &Value) -> bool {
    let (Value::Object(l), Value::Object(r)) = (left, right) else {
        return left == right;
    };
    if l.len() != r.len() {
        return false;
    }
    l.iter().all(|(key, lv)| {
        r.get(key).is_some_and(|rv| {
            let kind = schema.and_then(|s| s.by_wire(key)).map(|f| &f.kind);
            equivalent(kind, lv, rv)
        })
    })
}

fn multiset_eq(item: &FieldKind, left: &[Value], right: &[Value]) -> bool {
    let mut used = vec![false; right.len()];
    left.iter().all(|a| {
        let slot = right
            .iter()
            .enumerate()
            .find(|(i, b)| !used[*i] && equivalent(Some(item), a, b))
            .map(|(i, _)| i);
        match slot {
            Some(i) => {
                used[i] = true;
                true
            }
            None => false,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::build_spec;
    use crate::schema::Field;
    use serde_json::json;

    fn role_schema() -> Schema {
        Schema::new()
            .field(Field::scalar("display_name"))
            .field(Field::scalar("description"))
            .field(Field::unordered_list("operations", FieldKind::Scalar))
    }

    fn params(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_reordered_operations_skip() {
        let current = json!({
            "extId": "R-1",
            "displayName": "ops",
            "operations": ["op-a", "op-b"],
            "$reserved": {"ETag": "abc"},
            "$objectType": "iam.v4.authz.Role",
            "description": ""
        });
        let params = params(json!({"display_name": "ops", "operations": ["op-b", "op-a"]}));
        let proposed = build_spec(&role_schema(), &current, &params).unwrap();

        assert_eq!(check(&role_schema(), &current, &proposed, &params), Decision::Skip);
    }

    #[test]
    fn test_changed_operations_detected() {
        let current = json!({"displayName": "ops", "operations": ["op-a", "op-b"]});
        let params = params(json!({"operations": ["op-a", "op-a"]}));
        let proposed = build_spec(&role_schema(), &current, &params).unwrap();

        let decision = check(&role_schema(), &current, &proposed, &params);
        assert_eq!(decision, Decision::Changed);
        assert!(decision.needs_write());
    }

    #[test]
    fn test_ordered_lists_respect_order() {
        let schema = Schema::new().field(Field::list("members", FieldKind::Scalar));
        let current = json!({"members": [1, 2]});
        let params = params(json!({"members": [2, 1]}));
        let proposed = build_spec(&schema, &current, &params).unwrap();

        assert_eq!(check(&schema, &current, &proposed, &params), Decision::Changed);
    }

    #[test]
    fn test_secret_field_bypasses() {
        let schema = Schema::new()
            .field(Field::scalar("username"))
            .field(Field::object(
                "credentials",
                Schema::new().field(Field::scalar("password").secret()),
            ));
        let current = json!({"username": "svc"});
        let params = params(json!({"username": "svc", "credentials": {"password": "pw"}}));
        let proposed = build_spec(&schema, &current, &params).unwrap();

        assert_eq!(
            check(&schema, &current, &proposed, &params),
            Decision::Bypassed {
                fields: vec!["credentials.password".to_string()]
            }
        );
    }

    #[test]
    fn test_preserved_reserved_blob_is_compared() {
        let schema = Schema::new()
            .field(Field::list("identities", FieldKind::reserved()))
            .preserving("$reserved");
        let current = json!({"identities": [{"$reserved": {"user": {"uuid": {"anyof": ["U-1"]}}}}]});

        let same = params(json!({"identities": [{"user": {"uuid": {"anyof": ["U-1"]}}}]}));
        let proposed = build_spec(&schema, &current, &same).unwrap();
        assert_eq!(check(&schema, &current, &proposed, &same), Decision::Skip);

        let other = params(json!({"identities": [{"user": {"uuid": {"anyof": ["U-2"]}}}]}));
        let proposed = build_spec(&schema, &current, &other).unwrap();
        assert_eq!(check(&schema, &current, &proposed, &other), Decision::Changed);
    }

    #[test]
    fn test_unordered_lists_of_objects() {
        let kind = FieldKind::List {
            item: Box::new(FieldKind::Object(Schema::new())),
            unordered: true,
        };
        assert!(equivalent(
            Some(&kind),
            &json!([{"a": 1}, {"b": 2}]),
            &json!([{"b": 2}, {"a": 1}])
        ));
        assert!(!equivalent(
            Some(&kind),
            &json!([{"a": 1}, {"a": 1}]),
            &json!([{"a": 1}, {"b": 2}])
        ));
    }
}
