//! Response envelope unwrapping.
//!
//! Lists arrive bare, under `data`/`items`/`results`/`$values`, or nested one
//! more level (`{"data": {"items": [...], "total": 3}}`).

use serde_json::{Map, Value};

use super::lookup::field;
use super::NormalizeError;

const LIST_KEYS: &[&str] = &["data", "items", "results", "records", "rows", "value", "$values", "list"];
const ITEM_KEYS: &[&str] = &["data", "result", "item", "value"];

fn list_field(obj: &Map<String, Value>) -> Option<&Value> {
    LIST_KEYS.iter().find_map(|k| {
        obj.get(*k).or_else(|| field(obj, k.trim_start_matches('$'), &[]))
    })
}

/// Extract the list of records from a list response.
pub fn unwrap_list(value: Value) -> Result<Vec<Value>, NormalizeError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => Ok(items),
        Value::Object(obj) => match list_field(&obj) {
            Some(Value::Array(items)) => Ok(items.clone()),
            Some(Value::Object(inner)) => match list_field(inner) {
                Some(Value::Array(items)) => Ok(items.clone()),
                Some(Value::Null) => Ok(Vec::new()),
                _ => Err(NormalizeError::Shape("list envelope without an array".into())),
            },
            Some(Value::Null) => Ok(Vec::new()),
            _ => Err(NormalizeError::Shape("expected a list of records".into())),
        },
        other => Err(NormalizeError::Shape(format!(
            "expected a list of records, got {}",
            kind(&other)
        ))),
    }
}

fn has_identity(obj: &Map<String, Value>) -> bool {
    field(obj, "id", &[]).is_some()
}

/// Extract a single record from an item response.
pub fn unwrap_item(value: &Value) -> Result<&Map<String, Value>, NormalizeError> {
    let obj = value
        .as_object()
        .ok_or_else(|| NormalizeError::Shape(format!("expected an object, got {}", kind(value))))?;
    if has_identity(obj) {
        return Ok(obj);
    }
    for key in ITEM_KEYS {
        if let Some(Value::Object(inner)) = field(obj, key, &[]) {
            return Ok(inner);
        }
    }
    Ok(obj)
}

/// A bare string or number under an item key, as in `{"success": true, "data": 42}`.
pub(crate) fn enveloped_scalar(obj: &Map<String, Value>) -> Option<&Value> {
    ITEM_KEYS
        .iter()
        .filter_map(|key| field(obj, key, &[]))
        .find(|v| matches!(v, Value::String(_) | Value::Number(_)))
}

pub(crate) fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
