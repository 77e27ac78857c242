//! Public storefront: unauthenticated, available vehicles only.

use axum::{
    extract::{Path, RawQuery, State},
    middleware,
    routing::get,
    Json, Router,
};

use crate::http::error::ApiError;
use crate::http::request::{resource_id, RequestMeta};
use crate::http::server::AppState;
use crate::models::{PublicVehicle, Vehicle};
use crate::normalize::{normalize_many, normalize_one};
use crate::security::rate_limit_middleware;
use crate::upstream::{Call, UpstreamError};

pub async fn list_vehicles(
    State(state): State<AppState>,
    meta: RequestMeta,
    RawQuery(query): RawQuery,
) -> Result<Json<Vec<PublicVehicle>>, ApiError> {
    let runtime = state.snapshot();
    let storefront = &runtime.config.storefront;
    let call = Call::get(&storefront.upstream_path)
        .query(query.as_deref())
        .token(storefront.service_token.as_deref())
        .request_id(meta.request_id());
    let response = runtime.upstream.send_json(call).await?;
    let vehicles: Vec<Vehicle> = normalize_many(response.body)?;
    Ok(Json(vehicles.into_iter().filter_map(PublicVehicle::publish).collect()))
}

pub async fn get_vehicle(
    State(state): State<AppState>,
    meta: RequestMeta,
    Path(id): Path<String>,
) -> Result<Json<PublicVehicle>, ApiError> {
    let id = resource_id(&id)?;
    let runtime = state.snapshot();
    let storefront = &runtime.config.storefront;
    let path = format!("{}/{}", storefront.upstream_path.trim_end_matches('/'), id);
    let call = Call::get(&path)
        .token(storefront.service_token.as_deref())
        .request_id(meta.request_id());
    let response = match runtime.upstream.send_json(call).await {
        Ok(r) => r,
        // The public never learns whether an unlisted vehicle exists.
        Err(UpstreamError::Status { status, .. }) if status.is_client_error() => {
            return Err(ApiError::NotFound("Vehicle".into()))
        }
        Err(e) => return Err(e.into()),
    };
    if response.body.is_null() {
        return Err(ApiError::NotFound("Vehicle".into()));
    }
    let vehicle: Vehicle = normalize_one(&response.body)?;
    PublicVehicle::publish(vehicle)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Vehicle".into()))
}

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/public/vehicles", get(list_vehicles))
        .route("/api/public/vehicles/{id}", get(get_vehicle))
        .route_layer(middleware::from_fn_with_state(state, rate_limit_middleware))
}
