use std::time::Instant;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::http::server::AppState;
use crate::upstream::Call;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub uptime_secs: u64,
    pub upstream_base_url: String,
    pub storefront_enabled: bool,
    pub logouts_in_flight: usize,
    pub rate_limited_clients: usize,
}

#[derive(Serialize)]
pub struct UpstreamProbe {
    pub url: String,
    pub reachable: bool,
    pub status: Option<u16>,
    pub latency_ms: u64,
    pub error: Option<String>,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    let inner = state.snapshot();
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        uptime_secs: state.started_at.elapsed().as_secs(),
        upstream_base_url: inner.upstream.base_url().to_string(),
        storefront_enabled: inner.config.storefront.enabled,
        logouts_in_flight: state.logout.in_flight(),
        rate_limited_clients: state.limiter.tracked_clients(),
    })
}

/// Probe the upstream health endpoint and report latency.
pub async fn get_upstream(State(state): State<AppState>) -> Json<UpstreamProbe> {
    let inner = state.snapshot();
    let path = &inner.config.upstream.health_path;
    let url = inner
        .upstream
        .url(path, None)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| path.clone());

    let start = Instant::now();
    let result = inner.upstream.send_json(Call::get(path)).await;
    let latency_ms = start.elapsed().as_millis() as u64;

    let probe = match result {
        Ok(response) => UpstreamProbe {
            url,
            reachable: true,
            status: Some(response.status.as_u16()),
            latency_ms,
            error: None,
        },
        Err(e) => UpstreamProbe {
            url,
            // Any HTTP answer means the service is up.
            reachable: matches!(e, crate::upstream::UpstreamError::Status { .. }),
            status: Some(e.status_code().as_u16()),
            latency_ms,
            error: Some(e.to_string()),
        },
    };
    Json(probe)
}
