//! Upstream failure classification.

use axum::http::StatusCode;
use serde_json::Value;
use thiserror::Error;

use crate::normalize::{as_string, field, NormalizeError};

/// Errors that can occur while talking to the dealership API.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Connection refused, DNS failure, reset.
    #[error("Dealership service is unreachable: {0}")]
    Unreachable(String),

    /// No response within the configured timeout.
    #[error("Dealership service did not respond within {0} seconds")]
    Timeout(u64),

    /// 2xx response whose body cannot be used.
    #[error("Dealership service returned an unexpected response: {0}")]
    Malformed(String),

    /// Non-2xx response; the status is passed through.
    #[error("{message}")]
    Status { status: StatusCode, message: String },

    #[error("Invalid upstream URL: {0}")]
    InvalidUrl(String),
}

impl UpstreamError {
    /// Status presented to the browser.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unreachable(_) | Self::Timeout(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Malformed(_) => StatusCode::BAD_GATEWAY,
            Self::Status { status, .. } => *status,
            Self::InvalidUrl(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The upstream refused the request body itself.
    pub fn is_payload_rejection(&self) -> bool {
        matches!(
            self,
            Self::Status { status, .. }
                if *status == StatusCode::BAD_REQUEST || *status == StatusCode::UNPROCESSABLE_ENTITY
        )
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Status { status, .. } if *status == StatusCode::UNAUTHORIZED)
    }

    pub fn from_reqwest(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout_secs)
        } else if err.is_decode() {
            Self::Malformed(err.to_string())
        } else {
            Self::Unreachable(err.without_url().to_string())
        }
    }
}

impl From<NormalizeError> for UpstreamError {
    fn from(err: NormalizeError) -> Self {
        Self::Malformed(err.to_string())
    }
}

const MAX_MESSAGE_LEN: usize = 300;

fn validation_messages(errors: &Value) -> Option<String> {
    let mut messages = Vec::new();
    match errors {
        Value::Object(map) => {
            for (name, value) in map {
                let texts: Vec<String> = match value {
                    Value::Array(items) => items.iter().filter_map(as_string).collect(),
                    other => as_string(other).into_iter().collect(),
                };
                for text in texts {
                    if name.is_empty() || name == "$" || text.contains(name.as_str()) {
                        messages.push(text);
                    } else {
                        messages.push(format!("{name}: {text}"));
                    }
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                match item {
                    Value::Object(o) => messages.extend(
                        field(o, "message", &["error_message", "description"]).and_then(as_string),
                    ),
                    other => messages.extend(as_string(other)),
                }
            }
        }
        other => messages.extend(as_string(other)),
    }
    (!messages.is_empty()).then(|| messages.join("; "))
}

/// Human-readable message for a failed upstream call.
///
/// Reads `message`/`error`/`title`/`detail` in any casing, then flattens
/// validation `errors` maps or arrays. Non-JSON bodies are used verbatim
/// unless they look like HTML.
pub fn extract_message(status: StatusCode, body: &[u8]) -> String {
    let fallback = || {
        format!(
            "Dealership service request failed ({})",
            status.canonical_reason().unwrap_or("unexpected status")
        )
    };

    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(obj)) => {
            let headline = field(&obj, "message", &["error_message", "error_description", "detail", "title"])
                .and_then(as_string)
                .or_else(|| match field(&obj, "error", &[]) {
                    Some(Value::Object(inner)) => field(inner, "message", &[]).and_then(as_string),
                    Some(other) => as_string(other),
                    None => None,
                });
            let details = field(&obj, "errors", &["validation_errors"]).and_then(validation_messages);
            let message = match (headline, details) {
                (Some(h), Some(d)) if !h.contains(&d) => format!("{h}: {d}"),
                (Some(h), _) => h,
                (None, Some(d)) => d,
                (None, None) => fallback(),
            };
            truncate(message)
        }
        Ok(Value::String(s)) if !s.trim().is_empty() => truncate(s.trim().to_string()),
        Ok(_) => fallback(),
        Err(_) => {
            let text = String::from_utf8_lossy(body);
            let text = text.trim();
            if text.is_empty() || text.starts_with('<') {
                fallback()
            } else {
                truncate(text.to_string())
            }
        }
    }
}

fn truncate(mut message: String) -> String {
    if message.chars().count() > MAX_MESSAGE_LEN {
        message = message.chars().take(MAX_MESSAGE_LEN).collect();
        message.push('…');
    }
    message
}
