//! Configuration validation.
//!
//! Serde handles syntax; this module checks values that parse but cannot
//! work: unusable URLs, zero timeouts, empty cookie names. All errors are
//! collected, not just the first.

use thiserror::Error;
use url::Url;

use crate::config::schema::{AppConfig, PLACEHOLDER_ADMIN_KEY};

/// A single semantic configuration problem.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

fn check_http_url(field: &'static str, raw: &str, errors: &mut Vec<ValidationError>) {
    match Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.host().is_some() => {}
        Ok(url) => errors.push(ValidationError::new(
            field,
            format!("unsupported URL '{}' (scheme {})", raw, url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new(field, format!("invalid URL '{}': {}", raw, e))),
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<std::net::SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }
    check_http_url("listener.public_url", &config.listener.public_url, &mut errors);
    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError::new("listener.request_timeout_secs", "must be greater than 0"));
    }

    check_http_url("upstream.base_url", &config.upstream.base_url, &mut errors);
    if config.upstream.timeout_secs == 0 {
        errors.push(ValidationError::new("upstream.timeout_secs", "must be greater than 0"));
    }
    if config.upstream.connect_timeout_secs == 0 {
        errors.push(ValidationError::new("upstream.connect_timeout_secs", "must be greater than 0"));
    }

    if let Some(base) = &config.auth.base_url {
        check_http_url("auth.base_url", base, &mut errors);
    }
    let cookie = &config.auth.cookie_name;
    if cookie.is_empty()
        || !cookie
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        errors.push(ValidationError::new(
            "auth.cookie_name",
            "must be non-empty and contain only letters, digits, '_' or '-'",
        ));
    }

    if config.uploads.max_bytes == 0 {
        errors.push(ValidationError::new("uploads.max_bytes", "must be greater than 0"));
    }
    if config.uploads.allowed_content_types.is_empty() {
        errors.push(ValidationError::new("uploads.allowed_content_types", "must not be empty"));
    }

    if config.storefront.enabled && config.storefront.requests_per_second == 0 {
        errors.push(ValidationError::new(
            "storefront.requests_per_second",
            "must be greater than 0 when the storefront is enabled",
        ));
    }

    let cc = &config.validation.default_country_code;
    if cc.is_empty() || cc.len() > 3 || !cc.chars().all(|c| c.is_ascii_digit()) {
        errors.push(ValidationError::new(
            "validation.default_country_code",
            "must be 1 to 3 digits",
        ));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<std::net::SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            "is not a socket address",
        ));
    }

    if config.admin.enabled
        && (config.admin.api_key.is_empty() || config.admin.api_key == PLACEHOLDER_ADMIN_KEY)
    {
        errors.push(ValidationError::new(
            "admin.api_key",
            "must be set when the admin routes are enabled",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
