//! Public storefront filtering and rate limiting.

mod common;

use axum::{extract::Path, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use common::*;
use serde_json::{json, Value};

fn stock() -> Value {
    json!({
        "items": [
            {
                "VehicleId": 11, "Brand": "Tata", "Model": "Nexon", "Year": "2021",
                "Status": 0, "FuelType": 1, "SellingPrice": 650000,
                "PurchasePrice": 540000, "ChassisNumber": "MAT123", "RegistrationNumber": "MH12AB1234"
            },
            { "id": "12", "make": "Maruti", "model": "Swift", "status": "sold", "price": 420000 },
            { "id": "13", "make": "Honda", "model": "City", "status": "Reserved" },
            { "id": "14", "make": "Hyundai", "model": "Creta", "status": "AVAILABLE", "fuel": "petrol" }
        ]
    })
}

async fn vehicles() -> Json<Value> {
    Json(stock())
}

async fn vehicle(Path(id): Path<String>) -> impl IntoResponse {
    let found = stock()["items"]
        .as_array()
        .unwrap()
        .iter()
        .find(|v| v["id"].as_str() == Some(id.as_str()) || v["VehicleId"].to_string() == id)
        .cloned();
    match found {
        Some(v) => (StatusCode::OK, Json(v)),
        None => (StatusCode::NOT_FOUND, Json(json!({ "message": "no such vehicle" }))),
    }
}

async fn start(rps: u32, burst: u32) -> TestServer {
    let upstream = Router::new()
        .route("/api/vehicles", get(vehicles))
        .route("/api/vehicles/{id}", get(vehicle));
    let addr = start_mock_upstream(upstream).await;
    let mut config = test_config(addr);
    config.storefront.requests_per_second = rps;
    config.storefront.burst_size = burst;
    start_bff(config).await
}

#[tokio::test]
async fn test_only_available_vehicles_listed() {
    let bff = start(100, 100).await;

    let res = client().get(bff.url("/api/public/vehicles")).send().await.unwrap();

    assert_eq!(res.status(), 200);
    let list: Vec<Value> = res.json().await.unwrap();
    let ids: Vec<&str> = list.iter().map(|v| v["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["11", "14"]);

    let nexon = &list[0];
    assert_eq!(nexon["title"], "2021 Tata Nexon");
    assert_eq!(nexon["price"], 650000.0);
    assert_eq!(nexon["fuelType"], "diesel");
    assert!(nexon.get("purchasePrice").is_none());
    assert!(nexon.get("chassisNumber").is_none());
    assert!(nexon.get("registrationNumber").is_none());
}

#[tokio::test]
async fn test_unlisted_vehicle_is_404() {
    let bff = start(100, 100).await;

    let res = client().get(bff.url("/api/public/vehicles/14")).send().await.unwrap();
    assert_eq!(res.status(), 200);

    for id in ["12", "13", "99"] {
        let res = client()
            .get(bff.url(&format!("/api/public/vehicles/{id}")))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 404, "vehicle {id}");
    }
}

#[tokio::test]
async fn test_rate_limited_per_client() {
    let bff = start(1, 2).await;
    let http = client();

    let mut statuses = Vec::new();
    for _ in 0..4 {
        let res = http.get(bff.url("/api/public/vehicles")).send().await.unwrap();
        statuses.push(res.status().as_u16());
    }

    assert_eq!(&statuses[..2], &[200, 200]);
    assert_eq!(statuses[3], 429);
}

#[tokio::test]
async fn test_admin_routes_unaffected_by_storefront_limit() {
    let bff = start(1, 1).await;

    for _ in 0..3 {
        let res = client().get(bff.url("/api/health")).send().await.unwrap();
        assert_eq!(res.status(), 200);
    }
}
