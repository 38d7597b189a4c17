// Copyright (c) 2024 Jens Obermayer <jens@ds-intg.dev>
// SPDX-License-Identifier: MPL-2.0

//! Helpers for defensive access to serde_json values.

use serde_json::Value;

/// Get a string entry from a JSON object.
pub fn str_value<'a>(obj: &'a Value, key: &str) -> Option<&'a str> {
    obj.get(key).and_then(Value::as_str)
}

/// Get a non-empty string entry from a JSON object.
///
/// Empty strings are treated as absent. The dSS structure endpoint pads
/// unknown fields with `""` instead of omitting them.
pub fn non_empty_str(obj: &Value, key: &str) -> Option<String> {
    match str_value(obj, key) {
        Some(v) if !v.is_empty() => Some(v.to_string()),
        _ => None,
    }
}

/// Get a numeric entry from a JSON object as f64.
pub fn f64_value(obj: &Value, key: &str) -> Option<f64> {
    obj.get(key).and_then(Value::as_f64)
}

/// Get a boolean entry from a JSON object, `false` if absent or not a boolean.
pub fn bool_value(obj: &Value, key: &str) -> bool {
    obj.get(key).and_then(Value::as_bool).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn non_empty_str_with_missing_key_returns_none() {
        assert_eq!(None, non_empty_str(&json!({}), "name"));
    }

    #[test]
    fn non_empty_str_with_empty_value_returns_none() {
        assert_eq!(None, non_empty_str(&json!({ "name": "" }), "name"));
    }

    #[test]
    fn non_empty_str_with_value_returns_owned_string() {
        assert_eq!(
            Some("dSM12".to_string()),
            non_empty_str(&json!({ "name": "dSM12" }), "name")
        );
    }

    #[test]
    fn f64_value_accepts_integers_and_floats() {
        assert_eq!(Some(3.0), f64_value(&json!({ "v": 3 }), "v"));
        assert_eq!(Some(3.5), f64_value(&json!({ "v": 3.5 }), "v"));
        assert_eq!(None, f64_value(&json!({ "v": "3.5" }), "v"));
    }

    #[test]
    fn bool_value_defaults_to_false() {
        assert!(!bool_value(&json!({}), "isGlobal"));
        assert!(bool_value(&json!({ "isGlobal": true }), "isGlobal"));
    }
}
