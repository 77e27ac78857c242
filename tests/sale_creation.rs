//! Sale creation against upstreams that only accept one payload shape.

mod common;

use std::sync::{Arc, Mutex};

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router};
use common::*;
use serde_json::{json, Value};

type Seen = Arc<Mutex<Vec<Value>>>;

fn sale_body() -> Value {
    json!({
        "vehicleId": "17",
        "customerId": "4",
        "saleDate": "2024-05-02",
        "sellingPrice": 500000,
        "payments": [
            { "mode": "cash", "amount": 200000 },
            { "mode": "upi", "amount": 300000, "reference": "UTR991" }
        ]
    })
}

/// Accepts only PascalCase bodies with numeric payment modes.
async fn pascal_only(State(seen): State<Seen>, Json(body): Json<Value>) -> impl IntoResponse {
    seen.lock().unwrap().push(body.clone());
    if body.get("VehicleId").is_none() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "title": "One or more validation errors occurred.", "errors": { "VehicleId": ["The VehicleId field is required."] } })),
        );
    }
    (
        StatusCode::CREATED,
        Json(json!({
            "Id": 901,
            "VehicleId": body["VehicleId"],
            "CustomerId": body["CustomerId"],
            "SellingPrice": body["SellingPrice"],
            "Status": 0,
            "Payments": body["Payments"],
        })),
    )
}

async fn always_rejects(State(seen): State<Seen>, Json(body): Json<Value>) -> impl IntoResponse {
    seen.lock().unwrap().push(body);
    (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "message": "Vehicle is not in stock" })))
}

async fn conflict(State(seen): State<Seen>, Json(body): Json<Value>) -> impl IntoResponse {
    seen.lock().unwrap().push(body);
    (StatusCode::CONFLICT, Json(json!({ "message": "Vehicle already sold" })))
}

async fn accepted_without_body(State(seen): State<Seen>, Json(body): Json<Value>) -> StatusCode {
    seen.lock().unwrap().push(body);
    StatusCode::CREATED
}

async fn start(handler: axum::routing::MethodRouter<Seen>) -> (TestServer, Seen) {
    let seen: Seen = Arc::default();
    let upstream = Router::new()
        .route("/api/sales", handler)
        .with_state(seen.clone());
    let addr = start_mock_upstream(upstream).await;
    (start_bff(test_config(addr)).await, seen)
}

#[tokio::test]
async fn test_third_shape_accepted() {
    let (bff, seen) = start(post(pascal_only)).await;
    let (name, value) = session_cookie();

    let res = client()
        .post(bff.url("/api/sales"))
        .header(name, value)
        .json(&sale_body())
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 201);
    let location = res.headers()["location"].to_str().unwrap().to_string();
    assert!(location.ends_with("/api/sales/901"), "location: {location}");
    let sale: Value = res.json().await.unwrap();
    assert_eq!(sale["id"], "901");
    assert_eq!(sale["vehicleId"], "17");
    assert_eq!(sale["status"], "pending");
    assert_eq!(sale["payments"].as_array().unwrap().len(), 2);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 3);
    assert_eq!(seen[0]["vehicleId"], 17);
    assert_eq!(seen[0]["payments"][0]["paymentMode"], "Cash");
    assert_eq!(seen[1]["payments"][1]["paymentMode"], 4);
    assert_eq!(seen[2]["VehicleId"], 17);
    assert_eq!(seen[2]["Payments"][0]["PaymentMode"], 0);
    assert_eq!(seen[2]["Payments"][1]["ReferenceNumber"], "UTR991");
}

#[tokio::test]
async fn test_every_shape_rejected() {
    let (bff, seen) = start(post(always_rejects)).await;
    let (name, value) = session_cookie();

    let res = client()
        .post(bff.url("/api/sales"))
        .header(name, value)
        .json(&sale_body())
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 400);
    let body: Value = res.json().await.unwrap();
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("after 5 attempts"), "message: {message}");
    assert!(message.contains("Vehicle is not in stock"), "message: {message}");
    assert_eq!(seen.lock().unwrap().len(), 5);
}

#[tokio::test]
async fn test_conflict_is_not_retried() {
    let (bff, seen) = start(post(conflict)).await;
    let (name, value) = session_cookie();

    let res = client()
        .post(bff.url("/api/sales"))
        .header(name, value)
        .json(&sale_body())
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 409);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Vehicle already sold");
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_invalid_sale_never_reaches_upstream() {
    let (bff, seen) = start(post(pascal_only)).await;
    let (name, value) = session_cookie();
    let mut body = sale_body();
    body["payments"][1]["amount"] = json!(100);

    let res = client()
        .post(bff.url("/api/sales"))
        .header(name, value)
        .json(&body)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 400);
    let body: Value = res.json().await.unwrap();
    assert!(body["errors"]["payments"].is_array());
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_bodyless_acceptance_is_202() {
    let (bff, seen) = start(post(accepted_without_body)).await;
    let (name, value) = session_cookie();

    let res = client()
        .post(bff.url("/api/sales"))
        .header(name, value)
        .json(&sale_body())
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 202);
    assert!(res.headers().get("location").is_none());
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "accepted": true }));
    assert_eq!(seen.lock().unwrap().len(), 1);
}
