//! OAuth scope coercion.

use serde_json::Value;

/// Split a space- or comma-delimited scope string.
pub fn split_scopes(raw: &str) -> Vec<String> {
    raw.split([' ', ','])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Coerce a JSON scope value (string or array of strings) into a list.
///
/// Anything else yields an empty list.
pub fn coerce_scopes(value: &Value) -> Vec<String> {
    match value {
        Value::String(raw) => split_scopes(raw),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn string_and_array_normalize_identically() {
        let expected = vec!["identify".to_string(), "guilds".to_string()];
        assert_eq!(coerce_scopes(&json!("identify guilds")), expected);
        assert_eq!(coerce_scopes(&json!(["identify", "guilds"])), expected);
    }

    #[test]
    fn commas_and_extra_whitespace() {
        assert_eq!(
            split_scopes(" identify,guilds  email ,"),
            vec!["identify", "guilds", "email"]
        );
    }

    #[test]
    fn non_string_values_are_empty() {
        assert!(coerce_scopes(&json!(null)).is_empty());
        assert!(coerce_scopes(&json!(42)).is_empty());
        assert_eq!(coerce_scopes(&json!(["identify", 7, ""])), vec!["identify"]);
    }
}
