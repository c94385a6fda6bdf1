//! `compose`, `groups` and `keyed_groups` processing.
//!
//! Follows the constructed-inventory rules: in non-strict mode an expression
//! that fails to evaluate is skipped for that host; in strict mode it aborts
//! the run.

use std::collections::BTreeMap;

use prism_core::{Error, Result};
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::KeyedGroup;
use crate::evaluator::{truthy, ExpressionEvaluator};
use crate::inventory::Inventory;

/// Replaces every character outside `[A-Za-z0-9_]` with `_`.
#[must_use]
pub fn sanitize_group_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Applies constructed-inventory options to hosts.
pub struct Composer<'a> {
    evaluator: &'a dyn ExpressionEvaluator,
    strict: bool,
}

impl<'a> Composer<'a> {
    /// Create a composer.
    #[must_use]
    pub fn new(evaluator: &'a dyn ExpressionEvaluator, strict: bool) -> Self {
        Self { evaluator, strict }
    }

    fn tolerate(&self, host: &str, what: &str, err: Error) -> Result<()> {
        if self.strict {
            return Err(err);
        }
        debug!(host, what, error = %err, "skipping expression");
        Ok(())
    }

    /// Sets each `compose` variable on the host.
    ///
    /// # Errors
    ///
    /// Returns the evaluation error in strict mode.
    pub fn compose(
        &self,
        host: &str,
        vars: &mut Map<String, Value>,
        compose: &BTreeMap<String, String>,
    ) -> Result<()> {
        for (name, expr) in compose {
            match self.evaluator.evaluate(expr, vars) {
                Ok(value) => {
                    vars.insert(name.clone(), value);
                }
                Err(err) => self.tolerate(host, name, err)?,
            }
        }
        Ok(())
    }

    /// Adds the host to every group whose expression is true.
    ///
    /// # Errors
    ///
    /// Returns the evaluation error in strict mode.
    pub fn conditional_groups(
        &self,
        host: &str,
        vars: &Map<String, Value>,
        groups: &BTreeMap<String, String>,
        inventory: &mut Inventory,
    ) -> Result<()> {
        for (group, expr) in groups {
            match self.evaluator.is_true(expr, vars) {
                Ok(true) => inventory.add_host_to_group(&sanitize_group_name(group), host),
                Ok(false) => {}
                Err(err) => self.tolerate(host, group, err)?,
            }
        }
        Ok(())
    }

    /// Adds the host to the groups named by each keyed group's value.
    ///
    /// # Errors
    ///
    /// Returns the evaluation error, or an unusable key value, in strict mode.
    pub fn keyed_groups(
        &self,
        host: &str,
        vars: &Map<String, Value>,
        keyed: &[KeyedGroup],
        inventory: &mut Inventory,
    ) -> Result<()> {
        for entry in keyed {
            let value = match self.evaluator.evaluate(&entry.key, vars) {
                Ok(value) => value,
                Err(err) => {
                    self.tolerate(host, &entry.key, err)?;
                    continue;
                }
            };

            let usable = truthy(&value)
                || (value.as_str() == Some("") && entry.default_value.is_some());
            if !usable {
                self.tolerate(
                    host,
                    &entry.key,
                    Error::TemplateError(format!(
                        "keyed group `{}` resolved to an empty value for host {host}",
                        entry.key
                    )),
                )?;
                continue;
            }

            let names = match bare_names(&value, entry) {
                Ok(names) => names,
                Err(err) => {
                    self.tolerate(host, &entry.key, err)?;
                    continue;
                }
            };

            let separator = if entry.prefix.is_empty() && !entry.leading_separator {
                ""
            } else {
                entry.separator.as_str()
            };
            let parent = entry.parent_group.as_deref().map(sanitize_group_name);

            for bare in names {
                let group = sanitize_group_name(&format!("{}{separator}{bare}", entry.prefix));
                inventory.add_host_to_group(&group, host);
                if let Some(parent) = &parent {
                    inventory.add_child(parent, &group);
                }
            }
        }
        Ok(())
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn bare_names(value: &Value, entry: &KeyedGroup) -> Result<Vec<String>> {
    let or_default = |name: String| match (&entry.default_value, name.is_empty()) {
        (Some(default), true) => default.clone(),
        _ => name,
    };

    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| {
                scalar_text(item).map(or_default).ok_or_else(|| {
                    Error::TemplateError(format!(
                        "keyed group `{}` list holds a non-scalar value",
                        entry.key
                    ))
                })
            })
            .collect(),
        Value::Object(map) => Ok(map
            .iter()
            .map(|(name, val)| {
                let text = scalar_text(val).unwrap_or_else(|| val.to_string());
                match (&entry.default_value, text.is_empty()) {
                    (Some(default), true) => format!("{name}{}{default}", entry.separator),
                    (None, true) if !entry.trailing_separator => name.clone(),
                    _ => format!("{name}{}{text}", entry.separator),
                }
            })
            .collect()),
        other => scalar_text(other).map(|s| vec![or_default(s)]).ok_or_else(|| {
            Error::TemplateError(format!(
                "keyed group `{}` must be a string, a list or a mapping",
                entry.key
            ))
        }),
    }
}
