//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → body limit (tower-http / axum DefaultBodyLimit)
//!     → rate_limit.rs (per-IP limits on public routes)
//!     → handler
//! Outgoing response:
//!     → headers.rs (hardening headers)
//! ```
//!
//! # Design Decisions
//! - Only the unauthenticated storefront is rate limited
//! - Handler-set headers win over defaults

pub mod headers;
pub mod rate_limit;

pub use rate_limit::{rate_limit_middleware, RateLimiterState};
