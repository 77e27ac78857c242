//! File uploads forwarded to the upstream file store.

use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use serde_json::Value;

use crate::auth::Session;
use crate::config::AppConfig;
use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::normalize::{as_string, field, unwrap_item};
use crate::upstream::{Call, UpstreamClient, UpstreamError};

/// Multipart framing allowance on top of the file size limit.
const FORM_OVERHEAD: usize = 64 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub url: String,
    pub file_name: String,
    pub content_type: String,
    pub size: usize,
}

/// Content type implied by the leading bytes, for the formats we accept.
pub fn sniff_content_type(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"%PDF-") {
        Some("application/pdf")
    } else if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("image/png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else {
        None
    }
}

/// Strip directories and unsafe characters from a client-supplied name.
pub fn sanitize_file_name(raw: Option<&str>, content_type: &str) -> String {
    let base = raw
        .and_then(|n| n.rsplit(['/', '\\']).next())
        .unwrap_or("")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | ' '))
        .collect::<String>();
    let base = base.trim().trim_start_matches('.').to_string();
    if base.is_empty() {
        let ext = content_type.rsplit('/').next().unwrap_or("bin");
        format!("upload.{ext}")
    } else {
        base
    }
}

/// `{url, fileName}` out of whatever the file store answered.
pub fn normalize_upload_response(
    client: &UpstreamClient,
    body: &Value,
    fallback_name: &str,
) -> Result<(String, String), UpstreamError> {
    let (url, name) = match body {
        Value::String(url) if !url.trim().is_empty() => (Some(url.trim().to_string()), None),
        Value::Object(_) => {
            let obj = unwrap_item(body)?;
            (
                field(obj, "url", &["file_url", "location", "path", "file_path", "secure_url", "link"])
                    .and_then(as_string),
                field(obj, "file_name", &["name", "original_name", "filename"]).and_then(as_string),
            )
        }
        _ => (None, None),
    };
    let url = url.ok_or_else(|| UpstreamError::Malformed("upload response carried no file URL".into()))?;
    Ok((client.absolute(&url), name.unwrap_or_else(|| fallback_name.to_string())))
}

pub async fn upload(
    State(state): State<AppState>,
    session: Session,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let runtime = state.snapshot();
    let limits = &runtime.config.uploads;
    let mut multipart = multipart.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let mut file = None;
    while let Some(mut part) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        if part.name() != Some("file") {
            continue;
        }
        let declared = part.content_type().map(str::to_string);
        let raw_name = part.file_name().map(str::to_string);
        let mut bytes = Vec::new();
        while let Some(chunk) = part
            .chunk()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?
        {
            if bytes.len() + chunk.len() > limits.max_bytes {
                return Err(ApiError::PayloadTooLarge(limits.max_bytes));
            }
            bytes.extend_from_slice(&chunk);
        }
        file = Some((declared, raw_name, bytes));
        break;
    }

    let (declared, raw_name, bytes) =
        file.ok_or_else(|| ApiError::BadRequest("Missing multipart field 'file'".into()))?;
    if bytes.is_empty() {
        return Err(ApiError::BadRequest("Uploaded file is empty".into()));
    }

    let content_type = sniff_content_type(&bytes)
        .filter(|ct| limits.allowed_content_types.iter().any(|a| a.eq_ignore_ascii_case(ct)))
        .ok_or_else(|| {
            ApiError::UnsupportedMediaType(declared.clone().unwrap_or_else(|| "unknown".into()))
        })?;
    if let Some(declared) = declared.as_deref() {
        if declared != content_type && declared != "application/octet-stream" {
            tracing::debug!(declared, sniffed = content_type, "Declared upload type differs from content");
        }
    }

    let file_name = sanitize_file_name(raw_name.as_deref(), content_type);
    let size = bytes.len();
    let part = Part::bytes(bytes)
        .file_name(file_name.clone())
        .mime_str(content_type)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let form = Form::new().part("file", part);

    let call = Call::new(axum::http::Method::POST, &limits.upstream_path)
        .token(session.token())
        .request_id(session.request_id());
    let response = runtime.upstream.post_multipart(call, form).await?;
    let (url, file_name) = normalize_upload_response(&runtime.upstream, &response.body, &file_name)?;

    tracing::info!(file_name = %file_name, size, content_type, "File uploaded");
    Ok((
        StatusCode::CREATED,
        Json(UploadedFile {
            url,
            file_name,
            content_type: content_type.to_string(),
            size,
        }),
    )
        .into_response())
}

pub fn routes(config: &AppConfig) -> Router<AppState> {
    Router::new().route(
        "/api/uploads",
        post(upload).layer(DefaultBodyLimit::max(config.uploads.max_bytes + FORM_OVERHEAD)),
    )
}
