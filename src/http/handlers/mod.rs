//! Route handlers.
//!
//! # Routes
//! ```text
//! /api/auth/{login,logout,session}            auth.rs
//! /api/{customers,purchases,vehicles,
//!       finance-companies,manual-bills}[/{id}] resources.rs
//! /api/sales[/{id}[/cancel]]                  sales.rs
//! /api/settings/delivery-note                 settings.rs
//! /api/sales/{id}/{invoice,delivery-note}/pdf documents.rs
//! /api/sales/{id}/invoice/send                documents.rs
//! /api/manual-bills/{id}/pdf                  documents.rs
//! /api/uploads                                uploads.rs
//! /api/public/vehicles[/{id}]                 storefront.rs
//! ```

pub mod auth;
pub mod documents;
pub mod resources;
pub mod sales;
pub mod settings;
pub mod storefront;
pub mod uploads;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

use crate::config::AppConfig;
use crate::http::server::AppState;
use crate::models::{Customer, FinanceCompany, ManualBill, Purchase, Vehicle};

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

/// Every browser-facing route, still expecting [`AppState`].
pub fn api_routes(config: &AppConfig, state: AppState) -> Router<AppState> {
    let mut router = Router::new()
        .route("/api/health", get(health))
        .merge(auth::routes())
        .merge(resources::routes::<Customer>(true))
        .merge(resources::routes::<Purchase>(true))
        .merge(resources::routes::<Vehicle>(true))
        .merge(resources::routes::<FinanceCompany>(true))
        .merge(resources::routes::<ManualBill>(false))
        .merge(sales::routes())
        .merge(settings::routes())
        .merge(documents::routes())
        .merge(uploads::routes(config));

    if config.storefront.enabled {
        router = router.merge(storefront::routes(state));
    }
    router
}
