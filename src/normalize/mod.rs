//! Upstream normalization subsystem.
//!
//! # Data Flow
//! ```text
//! upstream JSON (any casing, numeric or string enums, enveloped or bare)
//!     → envelope.rs (unwrap list/item envelopes)
//!     → lookup.rs (alias lookup: snake/camel/Pascal + explicit aliases)
//!     → coerce.rs (string/number/bool coercion with fallback)
//!     → FromUpstream impls in models/ (canonical DTOs)
//! ```
//!
//! # Design Decisions
//! - Stateless pure functions; no I/O
//! - A record without identity is malformed (502), other gaps become defaults
//! - Malformed records inside a list are skipped and logged

pub mod coerce;
pub mod de;
pub mod envelope;
pub mod lookup;

use serde_json::{Map, Value};
use thiserror::Error;

pub use coerce::{as_bool, as_f64, as_i64, as_string, as_string_list, round2};
pub use envelope::{unwrap_item, unwrap_list};
pub use lookup::{field, key_variants, pick};

/// Upstream data that cannot be mapped onto the canonical schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("unexpected response shape: {0}")]
    Shape(String),

    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("invalid value for '{field}': {message}")]
    InvalidValue { field: &'static str, message: String },
}

/// Conversion from a raw upstream record into a canonical DTO.
pub trait FromUpstream: Sized {
    /// Human-readable entity name for logs.
    const ENTITY: &'static str;

    fn from_upstream(record: &Fields<'_>) -> Result<Self, NormalizeError>;
}

/// Normalize a single-record response.
pub fn normalize_one<T: FromUpstream>(value: &Value) -> Result<T, NormalizeError> {
    let obj = unwrap_item(value)?;
    T::from_upstream(&Fields::new(obj))
}

/// Normalize a list response. Records that fail normalization are dropped.
pub fn normalize_many<T: FromUpstream>(value: Value) -> Result<Vec<T>, NormalizeError> {
    let records = unwrap_list(value)?;
    let total = records.len();
    let items: Vec<T> = records
        .iter()
        .filter_map(|record| {
            let result = record
                .as_object()
                .ok_or_else(|| NormalizeError::Shape(format!("record is {}", envelope::kind(record))))
                .and_then(|obj| T::from_upstream(&Fields::new(obj)));
            match result {
                Ok(item) => Some(item),
                Err(e) => {
                    tracing::warn!(entity = T::ENTITY, error = %e, "Skipping malformed upstream record");
                    None
                }
            }
        })
        .collect();
    if items.len() < total {
        tracing::debug!(entity = T::ENTITY, kept = items.len(), total, "Normalized list with drops");
    }
    Ok(items)
}

/// Identifier out of a create/update response: a bare id, `{id}`, an
/// enveloped record, or an enveloped bare id.
pub fn extract_id(value: &Value) -> Option<String> {
    match value {
        Value::String(_) | Value::Number(_) => as_string(value),
        Value::Object(outer) => {
            let obj = unwrap_item(value).ok()?;
            field(obj, "id", &[])
                .or_else(|| envelope::enveloped_scalar(outer))
                .and_then(as_string)
        }
        _ => None,
    }
}

/// Borrowed view over an upstream record with typed alias lookups.
#[derive(Debug, Clone, Copy)]
pub struct Fields<'a> {
    obj: &'a Map<String, Value>,
}

impl<'a> Fields<'a> {
    pub fn new(obj: &'a Map<String, Value>) -> Self {
        Self { obj }
    }

    pub fn raw(&self, name: &str, aliases: &[&str]) -> Option<&'a Value> {
        field(self.obj, name, aliases)
    }

    pub fn string(&self, name: &str, aliases: &[&str]) -> Option<String> {
        self.raw(name, aliases).and_then(as_string)
    }

    pub fn f64(&self, name: &str, aliases: &[&str]) -> Option<f64> {
        self.raw(name, aliases).and_then(as_f64)
    }

    pub fn i64(&self, name: &str, aliases: &[&str]) -> Option<i64> {
        self.raw(name, aliases).and_then(as_i64)
    }

    pub fn bool(&self, name: &str, aliases: &[&str]) -> Option<bool> {
        self.raw(name, aliases).and_then(as_bool)
    }

    pub fn list(&self, name: &str, aliases: &[&str]) -> Vec<String> {
        self.raw(name, aliases).map(as_string_list).unwrap_or_default()
    }

    /// Nested object under `name`.
    pub fn object(&self, name: &str, aliases: &[&str]) -> Option<Fields<'a>> {
        self.raw(name, aliases)
            .and_then(Value::as_object)
            .map(Fields::new)
    }

    /// Records of a nested array, skipping non-objects.
    pub fn objects(&self, name: &str, aliases: &[&str]) -> Vec<Fields<'a>> {
        match self.raw(name, aliases) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_object)
                .map(Fields::new)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// The record identity (`id`, `Id`, `<entity>_id`, ...).
    pub fn id(&self, aliases: &[&str]) -> Result<String, NormalizeError> {
        self.string("id", aliases).ok_or(NormalizeError::MissingField("id"))
    }

    pub fn require_string(
        &self,
        name: &'static str,
        aliases: &[&str],
    ) -> Result<String, NormalizeError> {
        self.string(name, aliases).ok_or(NormalizeError::MissingField(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, PartialEq)]
    struct Named {
        id: String,
        name: String,
    }

    impl FromUpstream for Named {
        const ENTITY: &'static str = "named";

        fn from_upstream(record: &Fields<'_>) -> Result<Self, NormalizeError> {
            Ok(Self {
                id: record.id(&[])?,
                name: record.string("name", &[]).unwrap_or_default(),
            })
        }
    }

    #[test]
    fn test_normalize_many_skips_bad_records() {
        let items: Vec<Named> = normalize_many(json!({
            "data": [{"Id": 1, "Name": "a"}, {"name": "no id"}, "junk", {"id": "x"}]
        }))
        .unwrap();
        assert_eq!(
            items,
            vec![
                Named { id: "1".into(), name: "a".into() },
                Named { id: "x".into(), name: String::new() },
            ]
        );
    }

    #[test]
    fn test_normalize_one_requires_identity() {
        let err = normalize_one::<Named>(&json!({"name": "x"})).unwrap_err();
        assert_eq!(err, NormalizeError::MissingField("id"));
    }

    #[test]
    fn test_extract_id() {
        assert_eq!(extract_id(&json!(17)), Some("17".into()));
        assert_eq!(extract_id(&json!({"data": {"saleId": 5, "Id": 5}})), Some("5".into()));
        assert_eq!(extract_id(&json!({"ID": "ab-1"})), Some("ab-1".into()));
        assert_eq!(extract_id(&json!(null)), None);
        assert_eq!(extract_id(&json!({"success": true, "data": 42})), Some("42".into()));
        assert_eq!(extract_id(&json!({"Result": "c-9"})), Some("c-9".into()));
        assert_eq!(extract_id(&json!({"success": true})), None);
    }
}
