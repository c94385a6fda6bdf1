//! Expression evaluation over host variables.

use minijinja::{Environment, UndefinedBehavior};
use prism_core::{Error, Result};
use serde_json::{Map, Value};

/// Evaluates template expressions against a host variable map.
///
/// Referencing a variable that is not defined is an error.
pub trait ExpressionEvaluator: Send + Sync {
    /// Evaluates `expr` and returns its value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TemplateError`] on syntax errors, undefined variables
    /// or evaluation failures.
    fn evaluate(&self, expr: &str, vars: &Map<String, Value>) -> Result<Value>;

    /// Evaluates `expr` for truthiness.
    ///
    /// # Errors
    ///
    /// See [`ExpressionEvaluator::evaluate`].
    fn is_true(&self, expr: &str, vars: &Map<String, Value>) -> Result<bool> {
        Ok(truthy(&self.evaluate(expr, vars)?))
    }
}

/// Jinja truthiness of a JSON value.
#[must_use]
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// [`ExpressionEvaluator`] backed by minijinja with strict undefined handling.
#[derive(Debug)]
pub struct JinjaEvaluator {
    env: Environment<'static>,
}

impl Default for JinjaEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl JinjaEvaluator {
    /// Create an evaluator.
    #[must_use]
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        Self { env }
    }
}

fn template_error(expr: &str, err: &minijinja::Error) -> Error {
    Error::TemplateError(format!("`{expr}`: {err}"))
}

fn undefined(expr: &str) -> Error {
    Error::TemplateError(format!("`{expr}` is undefined"))
}

impl ExpressionEvaluator for JinjaEvaluator {
    fn evaluate(&self, expr: &str, vars: &Map<String, Value>) -> Result<Value> {
        let compiled = self
            .env
            .compile_expression(expr)
            .map_err(|e| template_error(expr, &e))?;
        let value = compiled.eval(vars).map_err(|e| template_error(expr, &e))?;
        if value.is_undefined() {
            return Err(undefined(expr));
        }
        serde_json::to_value(&value)
            .map_err(|e| Error::TemplateError(format!("`{expr}` produced an unusable value: {e}")))
    }

    fn is_true(&self, expr: &str, vars: &Map<String, Value>) -> Result<bool> {
        let compiled = self
            .env
            .compile_expression(expr)
            .map_err(|e| template_error(expr, &e))?;
        let value = compiled.eval(vars).map_err(|e| template_error(expr, &e))?;
        if value.is_undefined() {
            return Err(undefined(expr));
        }
        Ok(value.is_true())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vars() -> Map<String, Value> {
        json!({
            "name": "web01",
            "power_state": "ON",
            "categories": ["cat-1", "cat-2"],
            "cluster": {"ext_id": "C-1"},
            "num_sockets": 2
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    #[test]
    fn test_equality_and_combinators() {
        let eval = JinjaEvaluator::new();
        assert!(eval.is_true("power_state == 'ON'", &vars()).unwrap());
        assert!(!eval.is_true("power_state == 'OFF'", &vars()).unwrap());
        assert!(eval
            .is_true("power_state == 'ON' and num_sockets > 1", &vars())
            .unwrap());
        assert!(eval.is_true("not (name == 'db01')", &vars()).unwrap());
    }

    #[test]
    fn test_membership_and_attributes() {
        let eval = JinjaEvaluator::new();
        assert!(eval.is_true("'cat-2' in categories", &vars()).unwrap());
        assert!(eval.is_true("cluster.ext_id == 'C-1'", &vars()).unwrap());
        assert_eq!(
            eval.evaluate("name ~ '-' ~ cluster.ext_id", &vars()).unwrap(),
            json!("web01-C-1")
        );
    }

    #[test]
    fn test_undefined_variable_is_error() {
        let eval = JinjaEvaluator::new();
        let err = eval.is_true("missing.attr == 'x'", &vars()).unwrap_err();
        assert_eq!(err.error_code(), "TEMPLATE_ERROR");
        assert!(eval.is_true("name ==", &vars()).is_err());
    }

    #[test]
    fn test_truthy() {
        assert!(!truthy(&json!("")));
        assert!(!truthy(&json!(0)));
        assert!(truthy(&json!([1])));
    }
}
