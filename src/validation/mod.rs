//! Input validation for browser submissions.
//!
//! Validation collects every problem in one pass so the form can show all
//! of them at once. Entity-specific rules live next to each input type in
//! `models/`.

pub mod phone;

use chrono::NaiveDate;
use serde::Serialize;

pub use phone::{normalize_phone, PhoneError};

/// One failed rule, addressed by a form field path such as `items[2].quantity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Settings that influence validation.
#[derive(Debug, Clone)]
pub struct ValidationContext {
    pub default_country_code: String,
}

impl Default for ValidationContext {
    fn default() -> Self {
        Self {
            default_country_code: "91".to_string(),
        }
    }
}

/// Accumulator for [`FieldError`]s.
#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: Vec<FieldError>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Trimmed non-empty text, or an error recorded under `field`.
    pub fn required_text(&mut self, field: &str, value: Option<&str>) -> String {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(v) => v.to_string(),
            None => {
                self.push(field, "is required");
                String::new()
            }
        }
    }

    /// Trimmed text or `None` when blank.
    pub fn optional_text(value: Option<&str>) -> Option<String> {
        value
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    pub fn required_amount(&mut self, field: &str, value: Option<f64>, allow_zero: bool) -> f64 {
        match value {
            None => {
                self.push(field, "is required");
                0.0
            }
            Some(v) if v < 0.0 || (!allow_zero && v == 0.0) => {
                let rule = if allow_zero { "must not be negative" } else { "must be greater than 0" };
                self.push(field, rule);
                0.0
            }
            Some(v) => v,
        }
    }

    pub fn optional_phone(&mut self, field: &str, value: Option<&str>, ctx: &ValidationContext) -> Option<String> {
        let raw = Self::optional_text(value)?;
        match normalize_phone(&raw, &ctx.default_country_code) {
            Ok(phone) => Some(phone),
            Err(e) => {
                self.push(field, e.to_string());
                None
            }
        }
    }

    pub fn required_phone(&mut self, field: &str, value: Option<&str>, ctx: &ValidationContext) -> String {
        if Self::optional_text(value).is_none() {
            self.push(field, "is required");
            return String::new();
        }
        self.optional_phone(field, value, ctx).unwrap_or_default()
    }

    pub fn optional_email(&mut self, field: &str, value: Option<&str>) -> Option<String> {
        let raw = Self::optional_text(value)?;
        if is_valid_email(&raw) {
            Some(raw.to_ascii_lowercase())
        } else {
            self.push(field, "is not a valid e-mail address");
            None
        }
    }

    pub fn optional_date(&mut self, field: &str, value: Option<&str>) -> Option<NaiveDate> {
        let raw = Self::optional_text(value)?;
        match parse_date(&raw) {
            Some(d) => Some(d),
            None => {
                self.push(field, "must be a date (YYYY-MM-DD)");
                None
            }
        }
    }

    pub fn finish<T>(self, value: T) -> Result<T, Vec<FieldError>> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(self.errors)
        }
    }
}

/// `YYYY-MM-DD`, or the date part of an RFC 3339 timestamp.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let date_part = raw.get(..10).unwrap_or(raw);
    if raw.len() > 10 && !matches!(raw.as_bytes()[10], b'T' | b' ') {
        return None;
    }
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

pub fn is_valid_email(raw: &str) -> bool {
    let Some((local, domain)) = raw.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !raw.chars().any(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2024-03-09"), NaiveDate::from_ymd_opt(2024, 3, 9));
        assert_eq!(
            parse_date("2024-03-09T10:15:00Z"),
            NaiveDate::from_ymd_opt(2024, 3, 9)
        );
        assert_eq!(parse_date("09/03/2024"), None);
        assert_eq!(parse_date("2024-02-30"), None);
        assert_eq!(parse_date("2024-03-091"), None);
    }

    #[test]
    fn test_email() {
        assert!(is_valid_email("sales@dealer.example"));
        assert!(!is_valid_email("sales@dealer"));
        assert!(!is_valid_email("@dealer.example"));
        assert!(!is_valid_email("a b@dealer.example"));
        assert!(!is_valid_email("a@b@dealer.example"));
    }

    #[test]
    fn test_collects_all_errors() {
        let ctx = ValidationContext::default();
        let mut errors = FieldErrors::new();
        errors.required_text("name", Some("  "));
        errors.required_amount("price", Some(0.0), false);
        errors.optional_phone("phone", Some("123"), &ctx);
        let result = errors.finish(());
        let fields: Vec<_> = result.unwrap_err().into_iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["name", "price", "phone"]);
    }
}
