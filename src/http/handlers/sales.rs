//! Sale routes: reads and deletes forward as usual, creation goes through
//! the payload-shape fallback.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Local;
use serde_json::json;

use crate::auth::Session;
use crate::http::error::ApiError;
use crate::http::handlers::resources::{created, get_one, list, remove, written};
use crate::http::request::{resource_id, ApiJson};
use crate::http::server::AppState;
use crate::models::{Sale, SaleInput};
use crate::sales::{create_sale, SALES_PATH};
use crate::upstream::Call;

pub async fn create(
    State(state): State<AppState>,
    session: Session,
    ApiJson(input): ApiJson<SaleInput>,
) -> Result<Response, ApiError> {
    let draft = input.validate(Local::now().date_naive())?;
    let runtime = state.snapshot();
    match create_sale(&runtime.upstream, &session.token, session.request_id(), &draft).await? {
        Some(sale) => Ok(created(&session, sale)),
        None => {
            tracing::info!(vehicle_id = %draft.vehicle_id, "Upstream accepted sale without a body");
            Ok((StatusCode::ACCEPTED, Json(json!({ "accepted": true }))).into_response())
        }
    }
}

pub async fn cancel(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Json<Sale>, ApiError> {
    let id = resource_id(&id)?;
    let runtime = state.snapshot();
    let path = format!("{SALES_PATH}/{id}/cancel");
    let body = json!({});
    let response = runtime
        .upstream
        .send_json(Call::post(&path, &body).token(session.token()).request_id(session.request_id()))
        .await?;
    tracing::info!(sale_id = id, "Sale cancelled");
    Ok(Json(written::<Sale>(&runtime.upstream, &session, &response.body, Some(id)).await?))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/sales", get(list::<Sale>).post(create))
        .route("/api/sales/{id}", get(get_one::<Sale>).delete(remove::<Sale>))
        .route("/api/sales/{id}/cancel", post(cancel))
}
