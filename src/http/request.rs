//! Request handling and extraction.
//!
//! # Responsibilities
//! - Expose the request ID assigned at the edge
//! - Resolve the public base URL for absolute links
//! - Parse JSON bodies with `{message}` rejections
//! - Validate path identifiers before they reach an upstream URL
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Path ids are restricted to a URL-safe alphabet

use std::convert::Infallible;

use axum::{
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts},
    http::{request::Parts, HeaderName},
};

use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::upstream::resolve_base_url;

/// Standard request ID header name.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Per-request values every handler needs for upstream calls and links.
#[derive(Debug, Clone)]
pub struct RequestMeta {
    pub request_id: Option<String>,
    pub base_url: String,
}

impl RequestMeta {
    pub fn from_parts(parts: &Parts, public_url: &str) -> Self {
        Self {
            request_id: parts
                .headers
                .get(X_REQUEST_ID)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            base_url: resolve_base_url(&parts.headers, public_url),
        }
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// Absolute URL of a path on this service.
    pub fn link(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl FromRequestParts<AppState> for RequestMeta {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let runtime = state.snapshot();
        Ok(Self::from_parts(parts, &runtime.config.listener.public_url))
    }
}

/// JSON body extractor whose rejection is an [`ApiError`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Check a path identifier before splicing it into an upstream path.
pub fn resource_id(raw: &str) -> Result<&str, ApiError> {
    let valid = !raw.is_empty()
        && raw.len() <= 64
        && raw.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(raw)
    } else {
        Err(ApiError::BadRequest(format!("Invalid identifier '{raw}'")))
    }
}
