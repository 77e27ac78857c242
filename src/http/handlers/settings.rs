//! Delivery-note settings (a singleton).

use axum::{extract::State, routing::get, Json, Router};

use crate::auth::Session;
use crate::http::error::ApiError;
use crate::http::request::ApiJson;
use crate::http::server::AppState;
use crate::models::{DeliveryNoteSettings, DeliveryNoteSettingsInput};
use crate::upstream::Call;

pub const SETTINGS_PATH: &str = "/settings/delivery-note";

pub async fn get_settings(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<DeliveryNoteSettings>, ApiError> {
    let runtime = state.snapshot();
    let response = runtime
        .upstream
        .send_json(Call::get(SETTINGS_PATH).token(session.token()).request_id(session.request_id()))
        .await?;
    Ok(Json(DeliveryNoteSettings::from_response(&response.body)?))
}

pub async fn put_settings(
    State(state): State<AppState>,
    session: Session,
    ApiJson(input): ApiJson<DeliveryNoteSettingsInput>,
) -> Result<Json<DeliveryNoteSettings>, ApiError> {
    let runtime = state.snapshot();
    let body = input.into_upstream(&runtime.validation)?;
    let response = runtime
        .upstream
        .send_json(Call::put(SETTINGS_PATH, &body).token(session.token()).request_id(session.request_id()))
        .await?;
    // Some deployments answer 204; echo what was saved.
    let saved = if response.body.is_null() { &body } else { &response.body };
    Ok(Json(DeliveryNoteSettings::from_response(saved)?))
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/settings/delivery-note", get(get_settings).put(put_settings))
}
