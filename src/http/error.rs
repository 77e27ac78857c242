//! Browser-facing error type.
//!
//! Every failure leaves the service as JSON `{message}`; validation failures
//! add `errors: {field: [messages]}`.

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::normalize::NormalizeError;
use crate::upstream::UpstreamError;
use crate::validation::FieldError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Some fields are missing or invalid")]
    Validation(Vec<FieldError>),

    #[error("{0}")]
    BadRequest(String),

    #[error("Not signed in")]
    Unauthorized,

    #[error("{0} not found")]
    NotFound(String),

    #[error("File is larger than the {0} byte limit")]
    PayloadTooLarge(usize),

    #[error("Unsupported file type: {0}")]
    UnsupportedMediaType(String),

    #[error("Too many requests, slow down")]
    RateLimited,

    #[error("Request took too long to complete")]
    Timeout,

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Timeout => StatusCode::REQUEST_TIMEOUT,
            Self::Upstream(e) => e.status_code(),
        }
    }
}

impl From<NormalizeError> for ApiError {
    fn from(err: NormalizeError) -> Self {
        Self::Upstream(err.into())
    }
}

impl From<Vec<FieldError>> for ApiError {
    fn from(errors: Vec<FieldError>) -> Self {
        Self::Validation(errors)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<BTreeMap<String, Vec<String>>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "Request rejected");
        }

        let errors = match &self {
            Self::Validation(list) => {
                let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
                for e in list {
                    grouped.entry(e.field.clone()).or_default().push(e.message.clone());
                }
                Some(grouped)
            }
            _ => None,
        };
        let body = ErrorBody {
            message: self.to_string(),
            errors,
        };
        (status, Json(body)).into_response()
    }
}
