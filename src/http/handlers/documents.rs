//! PDF passthrough and invoice delivery.

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::auth::Session;
use crate::http::error::ApiError;
use crate::http::request::{resource_id, ApiJson};
use crate::http::server::AppState;
use crate::normalize::{as_string, de, field};
use crate::upstream::{Call, UpstreamError};
use crate::validation::FieldErrors;

#[derive(Debug, Default, Deserialize)]
pub struct PdfQuery {
    #[serde(default)]
    pub download: Option<String>,
}

impl PdfQuery {
    fn as_attachment(&self) -> bool {
        matches!(
            self.download.as_deref().map(str::trim),
            Some("1" | "true" | "yes" | "")
        )
    }
}

/// Which document a route serves.
#[derive(Debug, Clone, Copy)]
enum Document {
    Invoice,
    DeliveryNote,
    ManualBill,
}

impl Document {
    fn upstream_path(self, id: &str) -> String {
        match self {
            Self::Invoice => format!("/sales/{id}/invoice/pdf"),
            Self::DeliveryNote => format!("/sales/{id}/delivery-note/pdf"),
            Self::ManualBill => format!("/manual-bills/{id}/pdf"),
        }
    }

    fn file_name(self, id: &str) -> String {
        match self {
            Self::Invoice => format!("invoice-{id}.pdf"),
            Self::DeliveryNote => format!("delivery-note-{id}.pdf"),
            Self::ManualBill => format!("bill-{id}.pdf"),
        }
    }
}

/// Content types a PDF may arrive under.
pub fn is_pdf_content_type(value: Option<&str>) -> bool {
    value
        .map(|v| v.split(';').next().unwrap_or("").trim().to_ascii_lowercase())
        .is_some_and(|v| v == "application/pdf" || v == "application/octet-stream")
}

pub fn content_disposition(file_name: &str, attachment: bool) -> String {
    let kind = if attachment { "attachment" } else { "inline" };
    format!("{kind}; filename=\"{file_name}\"")
}

async fn stream_pdf(
    state: AppState,
    session: Session,
    id: String,
    query: PdfQuery,
    document: Document,
) -> Result<Response, ApiError> {
    let id = resource_id(&id)?;
    let runtime = state.snapshot();
    let path = document.upstream_path(id);
    let upstream = runtime
        .upstream
        .get_bytes(Call::get(&path).token(session.token()).request_id(session.request_id()))
        .await?;

    let content_type = upstream
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    if !is_pdf_content_type(content_type.as_deref()) {
        tracing::warn!(
            request_id = session.request_id().unwrap_or("-"),
            path = %path,
            content_type = content_type.as_deref().unwrap_or("none"),
            "Upstream document is not a PDF"
        );
        return Err(UpstreamError::Malformed(format!(
            "expected a PDF, got {}",
            content_type.as_deref().unwrap_or("no content type")
        ))
        .into());
    }
    let length = upstream.headers().get(header::CONTENT_LENGTH).cloned();

    let disposition = content_disposition(&document.file_name(id), query.as_attachment());
    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/pdf"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("private, no-store"));
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    if let Some(length) = length {
        headers.insert(header::CONTENT_LENGTH, length);
    }
    Ok(response)
}

pub async fn invoice_pdf(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Query(query): Query<PdfQuery>,
) -> Result<Response, ApiError> {
    stream_pdf(state, session, id, query, Document::Invoice).await
}

pub async fn delivery_note_pdf(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Query(query): Query<PdfQuery>,
) -> Result<Response, ApiError> {
    stream_pdf(state, session, id, query, Document::DeliveryNote).await
}

pub async fn manual_bill_pdf(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Query(query): Query<PdfQuery>,
) -> Result<Response, ApiError> {
    stream_pdf(state, session, id, query, Document::ManualBill).await
}

#[derive(Debug, Default, Deserialize)]
pub struct SendInvoiceInput {
    #[serde(default, deserialize_with = "de::opt_string")]
    pub email: Option<String>,
}

/// Ask the upstream to e-mail the invoice, with a link back to this service.
pub async fn send_invoice(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<SendInvoiceInput>,
) -> Result<Response, ApiError> {
    let id = resource_id(&id)?;
    let mut errors = FieldErrors::new();
    let email = match errors.optional_email("email", input.email.as_deref()) {
        Some(email) => email,
        None => {
            if errors.is_empty() {
                errors.push("email", "is required");
            }
            String::new()
        }
    };
    errors.finish(())?;

    let runtime = state.snapshot();
    let download_url = session
        .meta
        .link(&format!("/api/sales/{id}/invoice/pdf?download=true"));
    let body = json!({ "email": email, "downloadUrl": download_url });
    let path = format!("/sales/{id}/invoice/send");
    let response = runtime
        .upstream
        .send_json(Call::post(&path, &body).token(session.token()).request_id(session.request_id()))
        .await?;

    let message = response
        .body
        .as_object()
        .and_then(|o| field(o, "message", &[]))
        .and_then(as_string)
        .unwrap_or_else(|| format!("Invoice sent to {email}"));
    tracing::info!(sale_id = id, "Invoice delivery requested");
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "sent": true, "message": message, "downloadUrl": download_url })),
    )
        .into_response())
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/sales/{id}/invoice/pdf", get(invoice_pdf))
        .route("/api/sales/{id}/delivery-note/pdf", get(delivery_note_pdf))
        .route("/api/sales/{id}/invoice/send", post(send_invoice))
        .route("/api/manual-bills/{id}/pdf", get(manual_bill_pdf))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_content_types() {
        assert!(is_pdf_content_type(Some("application/pdf")));
        assert!(is_pdf_content_type(Some("Application/PDF; charset=binary")));
        assert!(is_pdf_content_type(Some("application/octet-stream")));
        assert!(!is_pdf_content_type(Some("application/json")));
        assert!(!is_pdf_content_type(Some("text/html")));
        assert!(!is_pdf_content_type(None));
    }

    #[test]
    fn test_disposition() {
        assert_eq!(content_disposition("invoice-4.pdf", false), "inline; filename=\"invoice-4.pdf\"");
        assert_eq!(content_disposition("bill-2.pdf", true), "attachment; filename=\"bill-2.pdf\"");
        assert!(PdfQuery { download: Some("true".into()) }.as_attachment());
        assert!(!PdfQuery { download: Some("false".into()) }.as_attachment());
        assert!(!PdfQuery::default().as_attachment());
    }
}
