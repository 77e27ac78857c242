//! Lenient scalar coercion.
//!
//! Every function returns `None` instead of failing; callers decide whether a
//! missing value is an error.

use serde_json::Value;

use super::lookup::field;

/// Strings are trimmed (empty becomes `None`); numbers and booleans are
/// stringified.
pub fn as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let t = s.trim();
            (!t.is_empty()).then(|| t.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Numbers, or numeric strings carrying thousands separators or a currency
/// symbol ("₹1,25,000.50", "$ 900").
pub fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => parse_amount(s),
        _ => None,
    }
}

fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches(|c: char| matches!(c, '₹' | '$' | '€' | '£'))
        .chars()
        .filter(|c| !matches!(c, ',' | '_' | ' ' | '\u{a0}'))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Integral numbers or integral numeric strings.
pub fn as_i64(value: &Value) -> Option<i64> {
    if let Some(i) = value.as_i64() {
        return Some(i);
    }
    let f = as_f64(value)?;
    (f.fract() == 0.0 && f.abs() < i64::MAX as f64).then_some(f as i64)
}

/// Booleans, 0/1, and common yes/no spellings.
pub fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "y" | "1" | "active" | "enabled" => Some(true),
            "false" | "no" | "n" | "0" | "inactive" | "disabled" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Array of strings, array of `{url}` objects, or a comma separated string.
pub fn as_string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::Object(o) => {
                    field(o, "url", &["path", "file_url", "image_url", "src"]).and_then(as_string)
                }
                other => as_string(other),
            })
            .collect(),
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Round a currency amount to two decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_as_string() {
        assert_eq!(as_string(&json!("  Maruti ")), Some("Maruti".into()));
        assert_eq!(as_string(&json!("   ")), None);
        assert_eq!(as_string(&json!(42)), Some("42".into()));
        assert_eq!(as_string(&json!(null)), None);
        assert_eq!(as_string(&json!({"a": 1})), None);
    }

    #[test]
    fn test_as_f64_accepts_formatted_amounts() {
        assert_eq!(as_f64(&json!(1500.5)), Some(1500.5));
        assert_eq!(as_f64(&json!("₹1,25,000.50")), Some(125000.5));
        assert_eq!(as_f64(&json!("$ 900")), Some(900.0));
        assert_eq!(as_f64(&json!("abc")), None);
        assert_eq!(as_f64(&json!("")), None);
        assert_eq!(as_f64(&json!(true)), None);
    }

    #[test]
    fn test_as_i64() {
        assert_eq!(as_i64(&json!(2019)), Some(2019));
        assert_eq!(as_i64(&json!("2019")), Some(2019));
        assert_eq!(as_i64(&json!(2019.0)), Some(2019));
        assert_eq!(as_i64(&json!(2019.5)), None);
    }

    #[test]
    fn test_as_bool() {
        assert_eq!(as_bool(&json!(true)), Some(true));
        assert_eq!(as_bool(&json!(0)), Some(false));
        assert_eq!(as_bool(&json!("Active")), Some(true));
        assert_eq!(as_bool(&json!("no")), Some(false));
        assert_eq!(as_bool(&json!("maybe")), None);
    }

    #[test]
    fn test_as_string_list() {
        assert_eq!(
            as_string_list(&json!(["a.jpg", {"Url": "b.jpg"}, null])),
            vec!["a.jpg", "b.jpg"]
        );
        assert_eq!(as_string_list(&json!("a.jpg, b.jpg,")), vec!["a.jpg", "b.jpg"]);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(12.345678), 12.35);
        assert_eq!(round2(99.999), 100.0);
    }
}
