//! Key spelling conversion between wire (camelCase) and parameter (snake_case) forms.

use serde_json::{Map, Value};

/// Converts a snake_case identifier into camelCase.
///
/// Leading underscores are kept so SDK-internal spellings such as
/// `_object_type` survive a round trip.
#[must_use]
pub fn to_camel(input: &str) -> String {
    let trimmed = input.trim_start_matches('_');
    let leading = &input[..input.len() - trimmed.len()];

    let mut out = String::with_capacity(input.len());
    out.push_str(leading);
    let mut upper_next = false;
    for c in trimmed.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Converts a camelCase identifier into snake_case.
///
/// Runs of capitals are treated as one word (`ipv4Info` → `ipv4_info`,
/// `HTTPProxy` → `http_proxy`). Keys starting with `$` are returned unchanged.
#[must_use]
pub fn to_snake(input: &str) -> String {
    if input.starts_with('$') {
        return input.to_string();
    }

    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next.is_some_and(char::is_lowercase),
                _ => false,
            };
            if boundary && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Returns a copy of the tree with every object key converted to snake_case.
#[must_use]
pub fn snake_case_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (to_snake(k), snake_case_keys(v)))
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(snake_case_keys).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_to_camel() {
        assert_eq!(to_camel("ext_id"), "extId");
        assert_eq!(to_camel("identity_filter"), "identityFilter");
        assert_eq!(to_camel("name"), "name");
        assert_eq!(to_camel("_object_type"), "_objectType");
    }

    #[test]
    fn test_to_snake() {
        assert_eq!(to_snake("extId"), "ext_id");
        assert_eq!(to_snake("numVcpusPerSocket"), "num_vcpus_per_socket");
        assert_eq!(to_snake("ipv4Info"), "ipv4_info");
        assert_eq!(to_snake("HTTPProxy"), "http_proxy");
        assert_eq!(to_snake("name"), "name");
        assert_eq!(to_snake("$objectType"), "$objectType");
    }

    #[test]
    fn test_snake_case_keys_recurses() {
        let input = json!({
            "extId": "V-1",
            "nics": [{"networkInfo": {"nicType": "NORMAL_NIC"}}]
        });
        let out = snake_case_keys(&input);
        assert_eq!(
            out,
            json!({
                "ext_id": "V-1",
                "nics": [{"network_info": {"nic_type": "NORMAL_NIC"}}]
            })
        );
    }
}
