//! `{placeholder}` substitution for custom `ansible_host` values.

use std::collections::HashMap;
use std::sync::OnceLock;

use prism_core::{Error, Result};
use regex::Regex;

/// Placeholders available to VM inventories.
pub const VM_PLACEHOLDERS: &[&str] = &[
    "vm_name",
    "vm_ext_id",
    "vm_description",
    "cluster_name",
    "cluster_ext_id",
];

/// Placeholders available to host inventories.
pub const HOST_PLACEHOLDERS: &[&str] = &["host_name", "host_ext_id", "cluster_name", "cluster_ext_id"];

const PLACEHOLDER: &str = r"\{([^{}]*)\}";

static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();

/// The placeholder pattern, compiled on first use.
fn placeholder_pattern() -> Result<&'static Regex> {
    PATTERN
        .get_or_init(|| Regex::new(PLACEHOLDER).ok())
        .as_ref()
        .ok_or_else(|| Error::TemplateError("invalid placeholder pattern".to_string()))
}

/// Substitutes every `{name}` of `template` from `values`.
///
/// Returns `Ok(None)` when a referenced placeholder has no value or the result
/// is blank.
///
/// # Errors
///
/// Returns [`Error::TemplateError`] when the template references a name not in
/// `allowed`.
pub fn render(
    template: &str,
    allowed: &[&str],
    values: &HashMap<&str, String>,
) -> Result<Option<String>> {
    let pattern = placeholder_pattern()?;

    for caps in pattern.captures_iter(template) {
        let name = &caps[1];
        if !allowed.contains(&name) {
            return Err(Error::TemplateError(format!(
                "unknown placeholder `{{{name}}}` in `{template}`, allowed: {}",
                allowed.join(", ")
            )));
        }
    }

    let mut missing = false;
    let rendered = pattern.replace_all(template, |caps: &regex::Captures<'_>| {
        match values.get(&caps[1]).filter(|v| !v.is_empty()) {
            Some(value) => value.clone(),
            None => {
                missing = true;
                String::new()
            }
        }
    });

    if missing || rendered.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(rendered.into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values() -> HashMap<&'static str, String> {
        HashMap::from([
            ("vm_name", "web01".to_string()),
            ("cluster_name", "c1".to_string()),
            ("vm_description", String::new()),
        ])
    }

    #[test]
    fn test_render_substitutes_all() {
        let out = render("{vm_name}.{cluster_name}.example", VM_PLACEHOLDERS, &values()).unwrap();
        assert_eq!(out.as_deref(), Some("web01.c1.example"));
    }

    #[test]
    fn test_unknown_placeholder_is_error() {
        let err = render("{vm_name}.{zone}", VM_PLACEHOLDERS, &values()).unwrap_err();
        assert_eq!(err.error_code(), "TEMPLATE_ERROR");
        assert!(render("{vm_name}", HOST_PLACEHOLDERS, &values()).is_err());
    }

    #[test]
    fn test_empty_resolution() {
        assert_eq!(render("{vm_description}", VM_PLACEHOLDERS, &values()).unwrap(), None);
        assert_eq!(render("{cluster_ext_id}.lab", VM_PLACEHOLDERS, &values()).unwrap(), None);
        assert_eq!(
            render("static.example", VM_PLACEHOLDERS, &values()).unwrap().as_deref(),
            Some("static.example")
        );
    }

    #[test]
    fn test_pattern_compiled_once() {
        let first = placeholder_pattern().unwrap();
        let second = placeholder_pattern().unwrap();
        assert!(std::ptr::eq(first, second));
        assert_eq!(first.captures_iter("{a}-{b}").count(), 2);
    }
}
