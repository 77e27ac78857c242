//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with all handlers
//! - Wire up middleware (request ID, tracing, timeout, limits, headers)
//! - Hold the hot-swappable runtime snapshot
//! - Serve until shutdown, applying config reloads as they arrive

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::{DefaultBodyLimit, MatchedPath},
    http::{header::CONTENT_TYPE, Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin;
use crate::auth::LogoutGuard;
use crate::config::AppConfig;
use crate::http::error::ApiError;
use crate::http::handlers;
use crate::http::request::X_REQUEST_ID;
use crate::observability::metrics;
use crate::sales::SHAPE_COUNT;
use crate::security::{headers, RateLimiterState};
use crate::upstream::{UpstreamClient, UpstreamError};
use crate::validation::ValidationContext;

/// Everything derived from one configuration generation.
pub struct RuntimeState {
    pub config: AppConfig,
    pub upstream: UpstreamClient,
    /// Client for the auth service; the upstream API when none is configured.
    pub auth: UpstreamClient,
    pub validation: ValidationContext,
}

impl RuntimeState {
    pub fn new(config: AppConfig) -> Result<Self, UpstreamError> {
        let upstream = UpstreamClient::new(&config.upstream.base_url, &config.upstream)?;
        let auth = match &config.auth.base_url {
            Some(url) => UpstreamClient::new(url, &config.upstream)?,
            None => upstream.clone(),
        };
        let validation = ValidationContext {
            default_country_code: config.validation.default_country_code.clone(),
        };
        Ok(Self {
            config,
            upstream,
            auth,
            validation,
        })
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<ArcSwap<RuntimeState>>,
    pub logout: Arc<LogoutGuard>,
    pub limiter: Arc<RateLimiterState>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self, UpstreamError> {
        Ok(Self {
            inner: Arc::new(ArcSwap::from_pointee(RuntimeState::new(config)?)),
            logout: Arc::new(LogoutGuard::new()),
            limiter: Arc::new(RateLimiterState::new()),
            started_at: Instant::now(),
        })
    }

    /// Current runtime snapshot.
    pub fn snapshot(&self) -> Arc<RuntimeState> {
        self.inner.load_full()
    }

    /// Swap in a new configuration. Settings baked into the router or the
    /// listener apply on restart; everything read per request applies
    /// immediately.
    pub fn reload(&self, config: AppConfig) -> Result<(), UpstreamError> {
        let pending = restart_required(&self.snapshot().config, &config);
        if !pending.is_empty() {
            tracing::warn!(settings = ?pending, "Changed settings take effect after a restart");
        }
        let next = RuntimeState::new(config)?;
        self.inner.store(Arc::new(next));
        Ok(())
    }
}

/// Settings that differ between `old` and `new` but are fixed at startup.
pub fn restart_required(old: &AppConfig, new: &AppConfig) -> Vec<&'static str> {
    let checks = [
        ("listener.bind_address", old.listener.bind_address != new.listener.bind_address),
        (
            "listener.request_timeout_secs",
            request_budget(old) != request_budget(new),
        ),
        ("security.enable_headers", old.security.enable_headers != new.security.enable_headers),
        ("security.max_body_size", old.security.max_body_size != new.security.max_body_size),
        ("uploads.max_bytes", old.uploads.max_bytes != new.uploads.max_bytes),
        ("storefront.enabled", old.storefront.enabled != new.storefront.enabled),
        ("admin.enabled", old.admin.enabled != new.admin.enabled),
        ("observability.log_level", old.observability.log_level != new.observability.log_level),
        ("observability.log_format", old.observability.log_format != new.observability.log_format),
        (
            "observability.metrics_address",
            old.observability.metrics_enabled != new.observability.metrics_enabled
                || old.observability.metrics_address != new.observability.metrics_address,
        ),
    ];
    checks
        .into_iter()
        .filter_map(|(name, changed)| changed.then_some(name))
        .collect()
}

/// Whole-request time limit. A sale may spend one upstream timeout per
/// payload shape plus a re-read, so the listener setting is raised to fit.
pub fn request_budget(config: &AppConfig) -> Duration {
    let sale = config.upstream.timeout_secs.saturating_mul(SHAPE_COUNT as u64 + 1);
    Duration::from_secs(config.listener.request_timeout_secs.max(sale))
}

/// HTTP server for the dealership BFF.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: AppConfig) -> Result<Self, UpstreamError> {
        let state = AppState::new(config.clone())?;
        let router = Self::build_router(&config, state.clone());
        Ok(Self { router, state })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, state: AppState) -> Router {
        let mut router = handlers::api_routes(config, state.clone())
            .route_layer(middleware::from_fn(track_metrics))
            .with_state(state.clone());

        if config.admin.enabled {
            router = router.merge(admin::setup_admin_router(state));
        }

        router = router
            .layer(DefaultBodyLimit::max(config.security.max_body_size))
            .layer(TimeoutLayer::new(request_budget(config)))
            .layer(middleware::map_response(timeout_body));

        if config.security.enable_headers {
            for layer in headers::layers() {
                router = router.layer(layer);
            }
        }

        router.layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    let request_id = request
                        .headers()
                        .get(X_REQUEST_ID)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("-");
                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        path = %request.uri().path(),
                        request_id = %request_id,
                    )
                }))
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
    }

    /// The router, for serving on a custom listener or in-process tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<AppConfig>,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let state = self.state.clone();
        tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                match state.reload(config) {
                    Ok(()) => tracing::info!("Configuration reloaded"),
                    Err(e) => tracing::error!(error = %e, "Rejected configuration reload"),
                }
            }
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Give the bare 408 from the timeout layer the usual JSON error body.
async fn timeout_body(response: Response) -> Response {
    if response.status() == StatusCode::REQUEST_TIMEOUT && !response.headers().contains_key(CONTENT_TYPE) {
        return ApiError::Timeout.into_response();
    }
    response
}

/// Record request count and latency by matched route.
async fn track_metrics(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;
    metrics::record_request(&method, &route, response.status().as_u16(), start);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    #[test]
    fn test_request_budget_covers_every_sale_shape() {
        let mut config = AppConfig::default();
        config.listener.request_timeout_secs = 35;
        config.upstream.timeout_secs = 30;
        assert_eq!(request_budget(&config), Duration::from_secs(180));

        config.upstream.timeout_secs = 2;
        assert_eq!(request_budget(&config), Duration::from_secs(35));
    }

    #[tokio::test]
    async fn test_bare_timeout_gets_json_body() {
        let bare = StatusCode::REQUEST_TIMEOUT.into_response();
        let response = timeout_body(bare).await;
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "Request took too long to complete");

        let ok = timeout_body(StatusCode::OK.into_response()).await;
        assert_eq!(ok.status(), StatusCode::OK);
    }

    #[test]
    fn test_restart_only_changes_are_reported() {
        let old = AppConfig::default();
        let mut new = old.clone();
        new.upstream.base_url = "http://other.internal/api".into();
        assert!(restart_required(&old, &new).is_empty());

        new.uploads.max_bytes = old.uploads.max_bytes * 2;
        new.storefront.enabled = !old.storefront.enabled;
        assert_eq!(restart_required(&old, &new), vec!["uploads.max_bytes", "storefront.enabled"]);
    }
}
