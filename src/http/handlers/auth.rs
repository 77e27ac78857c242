//! Login, logout and session probing.

use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::auth::{
    clear_cookie, extract_expires_in, extract_token, session_cookie, token_from_headers, SessionUser,
};
use crate::http::error::ApiError;
use crate::http::request::{ApiJson, RequestMeta};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::upstream::{Call, UpstreamError};

pub async fn login(
    State(state): State<AppState>,
    meta: RequestMeta,
    ApiJson(credentials): ApiJson<Value>,
) -> Result<Response, ApiError> {
    if !credentials.is_object() {
        return Err(ApiError::BadRequest("Credentials must be a JSON object".into()));
    }
    let runtime = state.snapshot();
    let auth = &runtime.config.auth;
    let response = runtime
        .auth
        .send_json(Call::post(&auth.login_path, &credentials).request_id(meta.request_id()))
        .await?;

    let token = extract_token(&response.body)
        .ok_or_else(|| UpstreamError::Malformed("login response carried no token".into()))?;
    let max_age = extract_expires_in(&response.body).unwrap_or(auth.session_max_age_secs);
    let cookie = session_cookie(auth, &token, max_age)
        .ok_or_else(|| UpstreamError::Malformed("login token is not cookie-safe".into()))?;
    let user = SessionUser::from_response(&response.body);

    tracing::info!(
        request_id = meta.request_id().unwrap_or("-"),
        user_id = user.as_ref().and_then(|u| u.id.as_deref()).unwrap_or("-"),
        "Signed in"
    );
    Ok(([(header::SET_COOKIE, cookie)], Json(json!({ "user": user }))).into_response())
}

pub async fn logout(State(state): State<AppState>, meta: RequestMeta, headers: HeaderMap) -> Response {
    let runtime = state.snapshot();
    let auth = &runtime.config.auth;

    if let Some(token) = token_from_headers(&headers, &auth.cookie_name) {
        let client = runtime.auth.clone();
        let path = auth.logout_path.clone();
        let request_id = meta.request_id.clone();
        let upstream_token = token.clone();
        let leader = state
            .logout
            .run(&token, move || async move {
                let body = json!({});
                let call = Call::post(&path, &body)
                    .token(Some(&upstream_token))
                    .request_id(request_id.as_deref());
                if let Err(e) = client.send_json(call).await {
                    tracing::warn!(error = %e, "Upstream logout failed; clearing session anyway");
                }
            })
            .await;
        metrics::record_logout(!leader);
        tracing::info!(
            request_id = meta.request_id().unwrap_or("-"),
            joined = !leader,
            "Signed out"
        );
    }

    (
        [(header::SET_COOKIE, clear_cookie(auth))],
        Json(json!({ "success": true })),
    )
        .into_response()
}

pub async fn session(
    State(state): State<AppState>,
    meta: RequestMeta,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let runtime = state.snapshot();
    let auth = &runtime.config.auth;
    let Some(token) = token_from_headers(&headers, &auth.cookie_name) else {
        return Ok(Json(json!({ "authenticated": false })).into_response());
    };

    let call = Call::get(&auth.me_path)
        .token(Some(&token))
        .request_id(meta.request_id());
    match runtime.auth.send_json(call).await {
        Ok(response) => {
            let user = SessionUser::from_response(&response.body);
            Ok(Json(json!({ "authenticated": true, "user": user })).into_response())
        }
        Err(e) if e.is_unauthorized() => Ok((
            [(header::SET_COOKIE, clear_cookie(auth))],
            Json(json!({ "authenticated": false })),
        )
            .into_response()),
        Err(e) => Err(e.into()),
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/session", get(session))
}
