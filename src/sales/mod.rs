//! Sale creation against an upstream of unknown vintage.
//!
//! # Data Flow
//! ```text
//! SaleInput → validate → SaleDraft
//!     → candidates.rs (ordered payload shapes)
//!     → POST /sales, one shape at a time
//!         400/422   → record, next shape
//!         2xx       → normalize (or re-read by id) → Sale
//!         2xx, empty → accepted, nothing to show yet
//!         otherwise → fail immediately
//!     → all shapes rejected → 400 with the last upstream message
//! ```
//!
//! # Design Decisions
//! - Only payload rejections move on to the next shape; auth, conflict and
//!   transport failures are final
//! - Validation happens once, before any upstream call

pub mod candidates;

use serde_json::Value;

use crate::http::error::ApiError;
use crate::models::{Sale, SaleDraft};
use crate::normalize::{extract_id, normalize_one};
use crate::observability::metrics;
use crate::upstream::{Call, UpstreamClient, UpstreamError};

pub use candidates::{build_candidates, SaleCandidate, SHAPE_COUNT};

pub const SALES_PATH: &str = "/sales";

/// Create a sale, trying each payload shape until one is accepted.
///
/// `Ok(None)` means the upstream accepted the sale without describing it.
pub async fn create_sale(
    client: &UpstreamClient,
    token: &str,
    request_id: Option<&str>,
    draft: &SaleDraft,
) -> Result<Option<Sale>, ApiError> {
    let candidates = build_candidates(draft);
    let attempts = candidates.len();
    let mut last_rejection = None;

    for candidate in &candidates {
        let call = Call::post(SALES_PATH, &candidate.body)
            .token(Some(token))
            .request_id(request_id);
        match client.send_json(call).await {
            Ok(response) => {
                metrics::record_sale_candidate(candidate.label, "accepted");
                tracing::info!(
                    request_id = request_id.unwrap_or("-"),
                    shape = candidate.label,
                    vehicle_id = %draft.vehicle_id,
                    "Sale created"
                );
                return created_sale(client, token, request_id, response.body).await;
            }
            Err(e) if e.is_payload_rejection() => {
                metrics::record_sale_candidate(candidate.label, "rejected");
                tracing::debug!(
                    request_id = request_id.unwrap_or("-"),
                    shape = candidate.label,
                    error = %e,
                    "Sale payload shape rejected"
                );
                last_rejection = Some(e);
            }
            Err(e) => {
                metrics::record_sale_candidate(candidate.label, "failed");
                return Err(e.into());
            }
        }
    }

    let detail = last_rejection
        .map(|e| e.to_string())
        .unwrap_or_else(|| "no response".to_string());
    tracing::warn!(
        request_id = request_id.unwrap_or("-"),
        attempts,
        last = %detail,
        "Every sale payload shape was rejected"
    );
    Err(ApiError::BadRequest(format!(
        "Dealership service rejected the sale after {attempts} attempts: {detail}"
    )))
}

async fn created_sale(
    client: &UpstreamClient,
    token: &str,
    request_id: Option<&str>,
    body: Value,
) -> Result<Option<Sale>, ApiError> {
    if body.is_null() {
        return Ok(None);
    }
    if let Ok(sale) = normalize_one::<Sale>(&body) {
        return Ok(Some(sale));
    }
    let id = extract_id(&body).ok_or_else(|| {
        UpstreamError::Malformed("sale create response carried no identifier".into())
    })?;
    let path = format!("{SALES_PATH}/{id}");
    let response = client
        .send_json(Call::get(&path).token(Some(token)).request_id(request_id))
        .await?;
    Ok(Some(normalize_one::<Sale>(&response.body)?))
}
