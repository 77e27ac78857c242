//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the BFF.
//! All types derive Serde traits for deserialization from config files.
//!
//! Most settings are read per request and follow a hot reload. Those that
//! shape the listener or the router are fixed at startup and a reload only
//! logs that they changed: `listener.bind_address`,
//! `listener.request_timeout_secs`, `security.*`, `uploads.max_bytes`,
//! `storefront.enabled`, `admin.enabled` and `observability.*`.

use serde::{Deserialize, Serialize};

/// Placeholder admin key shipped in defaults; validation rejects it when the
/// admin listener is enabled.
pub const PLACEHOLDER_ADMIN_KEY: &str = "CHANGE_ME_IN_PRODUCTION";

/// Root configuration for the dealership BFF.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address, public URL).
    pub listener: ListenerConfig,

    /// External dealership API.
    pub upstream: UpstreamConfig,

    /// Session cookie and external auth service.
    pub auth: AuthConfig,

    /// File upload limits.
    pub uploads: UploadConfig,

    /// Public storefront.
    pub storefront: StorefrontConfig,

    /// Field validation defaults.
    pub validation: ValidationConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    pub admin: AdminConfig,

    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Public base URL used when request headers carry no usable host.
    pub public_url: String,

    /// Total time allowed for one inbound request, in seconds. Raised to
    /// fit every sale payload shape at `upstream.timeout_secs` each.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            public_url: "http://localhost:8080".to_string(),
            request_timeout_secs: 35,
        }
    }
}

/// External dealership REST API.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL, e.g. "https://api.dealer.example/api".
    pub base_url: String,

    /// Single timeout applied to every upstream call, in seconds.
    pub timeout_secs: u64,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Path probed by the admin upstream check.
    pub health_path: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000/api".to_string(),
            timeout_secs: 30,
            connect_timeout_secs: 5,
            health_path: "/health".to_string(),
        }
    }
}

/// Session cookie and the external token service.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Base URL of the auth service. Falls back to the upstream base URL.
    pub base_url: Option<String>,

    pub login_path: String,
    pub logout_path: String,
    pub me_path: String,

    /// Name of the httpOnly cookie carrying the bearer token.
    pub cookie_name: String,

    /// Emit the `Secure` cookie attribute.
    pub cookie_secure: bool,

    /// Cookie lifetime when the auth service does not report one.
    pub session_max_age_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            login_path: "/auth/login".to_string(),
            logout_path: "/auth/logout".to_string(),
            me_path: "/auth/me".to_string(),
            cookie_name: "dealer_session".to_string(),
            cookie_secure: true,
            session_max_age_secs: 8 * 3600,
        }
    }
}

/// File upload limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Maximum accepted file size in bytes. The route body limit derived
    /// from it is set at startup.
    pub max_bytes: usize,

    /// Accepted MIME types.
    pub allowed_content_types: Vec<String>,

    /// Upstream endpoint receiving the multipart form.
    pub upstream_path: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: 10 * 1024 * 1024,
            allowed_content_types: vec![
                "image/jpeg".to_string(),
                "image/png".to_string(),
                "image/webp".to_string(),
                "application/pdf".to_string(),
            ],
            upstream_path: "/files/upload".to_string(),
        }
    }
}

/// Public storefront.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorefrontConfig {
    pub enabled: bool,

    /// Upstream vehicle listing used for the storefront.
    pub upstream_path: String,

    /// Token sent upstream for storefront reads, when the upstream
    /// listing is not anonymous.
    pub service_token: Option<String>,

    /// Maximum requests per second per client IP.
    pub requests_per_second: u32,

    /// Burst capacity.
    pub burst_size: u32,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            upstream_path: "/vehicles".to_string(),
            service_token: None,
            requests_per_second: 20,
            burst_size: 40,
        }
    }
}

/// Field validation defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Country calling code prepended to national phone numbers.
    pub default_country_code: String,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            default_country_code: "91".to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Mount the admin routes.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: PLACEHOLDER_ADMIN_KEY.to_string(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Enable security headers.
    pub enable_headers: bool,
    /// Maximum JSON body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_headers: true,
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}
