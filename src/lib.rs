//! Dealership back-office BFF library

pub mod admin;
pub mod auth;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod models;
pub mod normalize;
pub mod observability;
pub mod sales;
pub mod security;
pub mod upstream;
pub mod validation;

pub use config::schema::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
