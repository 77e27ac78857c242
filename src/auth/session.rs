//! Session extraction.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};

use crate::auth::cookie::read_cookie;
use crate::http::error::ApiError;
use crate::http::request::RequestMeta;
use crate::http::server::AppState;

/// An authenticated browser request: the bearer token to forward plus the
/// request metadata.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub meta: RequestMeta,
}

impl Session {
    pub fn token(&self) -> Option<&str> {
        Some(self.token.as_str())
    }

    pub fn request_id(&self) -> Option<&str> {
        self.meta.request_id()
    }
}

/// Token from the session cookie, falling back to `Authorization: Bearer`.
pub fn token_from_headers(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    read_cookie(headers, cookie_name).or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| {
                v.strip_prefix("Bearer ")
                    .or_else(|| v.strip_prefix("bearer "))
            })
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    })
}

impl FromRequestParts<AppState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let runtime = state.snapshot();
        let token = token_from_headers(&parts.headers, &runtime.config.auth.cookie_name)
            .ok_or(ApiError::Unauthorized)?;
        Ok(Self {
            token,
            meta: RequestMeta::from_parts(parts, &runtime.config.listener.public_url),
        })
    }
}
