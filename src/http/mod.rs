//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace, timeout, limits)
//!     → request.rs (request ID, base URL, JSON body extraction)
//!     → handlers/ (session check, validation, upstream call, normalization)
//!     → error.rs (failures as JSON {message})
//!     → Send to client
//! ```

pub mod error;
pub mod handlers;
pub mod request;
pub mod server;

pub use error::ApiError;
pub use request::{ApiJson, RequestMeta, X_REQUEST_ID};
pub use server::{AppState, HttpServer, RuntimeState};
