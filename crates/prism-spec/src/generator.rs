//! Merging declarative parameters into a request body.
//!
//! The base tree is either a default object (create) or the currently
//! observed entity (update). Only fields named by the schema are considered;
//! null parameters count as absent.

use prism_core::{Error, Result};
use serde_json::{Map, Value};

use crate::schema::{FieldKind, Schema, Variant};

/// Returns `base` with `params` merged in according to `schema`.
///
/// # Errors
///
/// Returns [`Error::SchemaViolation`] when a value has the wrong shape or more
/// than one variant of a one-of field is supplied.
pub fn build_spec(schema: &Schema, base: &Value, params: &Map<String, Value>) -> Result<Value> {
    let base = match base {
        Value::Object(map) => map.clone(),
        Value::Null => Map::new(),
        other => {
            return Err(Error::SchemaViolation(format!(
                "base spec must be an object, got {other}"
            )))
        }
    };
    merge_object(schema, base, params, "").map(Value::Object)
}

fn merge_object(
    schema: &Schema,
    mut out: Map<String, Value>,
    params: &Map<String, Value>,
    path: &str,
) -> Result<Map<String, Value>> {
    for field in schema.fields() {
        let Some(value) = params.get(&field.name).filter(|v| !v.is_null()) else {
            continue;
        };
        let field_path = join(path, &field.name);
        let merged = convert(&field.kind, out.get(&field.wire), value, &field_path)?;
        out.insert(field.wire.clone(), merged);
    }
    Ok(out)
}

fn convert(kind: &FieldKind, current: Option<&Value>, param: &Value, path: &str) -> Result<Value> {
    match kind {
        FieldKind::Scalar => Ok(param.clone()),
        FieldKind::Object(schema) => {
            let params = expect_object(param, path)?;
            let base = current
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default();
            merge_object(schema, base, params, path).map(Value::Object)
        }
        FieldKind::List { item, .. } => {
            let Value::Array(items) = param else {
                return Err(Error::SchemaViolation(format!(
                    "`{path}` must be a list"
                )));
            };
            items
                .iter()
                .enumerate()
                .map(|(i, element)| convert(item, None, element, &format!("{path}[{i}]")))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array)
        }
        FieldKind::OneOf(variants) => convert_one_of(variants, current, param, path),
        FieldKind::Opaque { wrap } => Ok(match wrap {
            Some(key) => {
                let mut wrapped = Map::new();
                wrapped.insert(key.clone(), param.clone());
                Value::Object(wrapped)
            }
            None => param.clone(),
        }),
    }
}

fn convert_one_of(
    variants: &[Variant],
    current: Option<&Value>,
    param: &Value,
    path: &str,
) -> Result<Value> {
    let params = expect_object(param, path)?;
    let present: Vec<&Variant> = variants
        .iter()
        .filter(|v| params.get(&v.key).is_some_and(|p| !p.is_null()))
        .collect();

    let variant = match present.as_slice() {
        [single] => *single,
        [] => {
            let keys: Vec<&str> = variants.iter().map(|v| v.key.as_str()).collect();
            return Err(Error::SchemaViolation(format!(
                "`{path}` needs one of: {}",
                keys.join(", ")
            )));
        }
        many => {
            let keys: Vec<&str> = many.iter().map(|v| v.key.as_str()).collect();
            return Err(Error::SchemaViolation(format!(
                "`{path}` accepts only one of {}, got {}",
                variants
                    .iter()
                    .map(|v| v.key.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
                keys.join(" and ")
            )));
        }
    };

    let variant_params = expect_object(&params[&variant.key], &join(path, &variant.key))?;
    let base = current
        .and_then(Value::as_object)
        .filter(|obj| {
            obj.get("$objectType").and_then(Value::as_str) == Some(variant.object_type.as_str())
        })
        .cloned()
        .unwrap_or_default();

    let mut merged = merge_object(&variant.schema, base, variant_params, &join(path, &variant.key))?;
    merged.insert(
        "$objectType".to_string(),
        Value::String(variant.object_type.clone()),
    );
    Ok(Value::Object(merged))
}

fn expect_object<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| Error::SchemaViolation(format!("`{path}` must be a mapping")))
}

fn join(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{path}.{name}")
    }
}
