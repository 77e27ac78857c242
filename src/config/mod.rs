//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) + DEALER_BFF_* environment
//!     → loader.rs (parse, deserialize, env overrides)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → runtime snapshot behind ArcSwap
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → atomic swap of the runtime snapshot
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Invalid reloads are dropped and the running config stays

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, load_from_env, ConfigError};
pub use schema::{
    AdminConfig, AppConfig, AuthConfig, ListenerConfig, LogFormat, ObservabilityConfig,
    SecurityConfig, StorefrontConfig, UploadConfig, UpstreamConfig, ValidationConfig,
};
