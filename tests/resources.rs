//! Resource writes: thin upstream responses, re-reads and totals.

mod common;

use std::sync::{Arc, Mutex};

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use common::*;
use serde_json::{json, Value};

/// Every upstream call as `(method path, body)`.
type Calls = Arc<Mutex<Vec<(String, Value)>>>;

fn record(calls: &Calls, method: &Method, uri: &Uri, body: Value) {
    calls
        .lock()
        .unwrap()
        .push((format!("{method} {}", uri.path()), body));
}

fn customer(id: &str) -> Value {
    json!({ "CustomerId": id.parse::<i64>().unwrap(), "FullName": "Ravi Kumar", "Mobile": "+919876543210" })
}

/// Acknowledges with an id only, or with nothing for walk-in customers.
async fn create_customer(
    State(calls): State<Calls>,
    method: Method,
    uri: Uri,
    Json(body): Json<Value>,
) -> Response {
    record(&calls, &method, &uri, body.clone());
    if body["name"] == "Walk-in" {
        return StatusCode::CREATED.into_response();
    }
    (StatusCode::CREATED, Json(json!({ "id": 42, "message": "Customer created" }))).into_response()
}

async fn read_customer(State(calls): State<Calls>, method: Method, uri: Uri, Path(id): Path<String>) -> Json<Value> {
    record(&calls, &method, &uri, Value::Null);
    Json(customer(&id))
}

async fn no_content(State(calls): State<Calls>, method: Method, uri: Uri, body: Bytes) -> StatusCode {
    record(&calls, &method, &uri, serde_json::from_slice(&body).unwrap_or(Value::Null));
    StatusCode::NO_CONTENT
}

async fn create_bill(State(calls): State<Calls>, method: Method, uri: Uri, Json(body): Json<Value>) -> Response {
    record(&calls, &method, &uri, body.clone());
    let mut saved = body;
    saved["id"] = json!(5);
    (StatusCode::CREATED, Json(json!({ "success": true, "data": saved }))).into_response()
}

async fn cancel_sale(State(calls): State<Calls>, method: Method, uri: Uri) -> Json<Value> {
    record(&calls, &method, &uri, Value::Null);
    Json(json!({ "success": true, "message": "Sale cancelled" }))
}

async fn read_sale(State(calls): State<Calls>, method: Method, uri: Uri, Path(id): Path<String>) -> Json<Value> {
    record(&calls, &method, &uri, Value::Null);
    Json(json!({
        "SaleId": id,
        "VehicleId": 3,
        "CustomerId": 42,
        "SellingPrice": 100000,
        "Status": "Cancelled"
    }))
}

async fn start() -> (TestServer, Calls) {
    let calls: Calls = Arc::default();
    let upstream = Router::new()
        .route("/api/customers", post(create_customer))
        .route(
            "/api/customers/{id}",
            get(read_customer).put(no_content).delete(no_content),
        )
        .route("/api/manual-bills", post(create_bill))
        .route("/api/settings/delivery-note", put(no_content))
        .route("/api/sales/{id}", get(read_sale))
        .route("/api/sales/{id}/cancel", post(cancel_sale))
        .with_state(calls.clone());
    let addr = start_mock_upstream(upstream).await;
    (start_bff(test_config(addr)).await, calls)
}

fn paths(calls: &Calls) -> Vec<String> {
    calls.lock().unwrap().iter().map(|(p, _)| p.clone()).collect()
}

#[tokio::test]
async fn test_id_only_create_is_read_back() {
    let (bff, calls) = start().await;
    let (name, value) = session_cookie();

    let res = client()
        .post(bff.url("/api/customers"))
        .header(name, value)
        .json(&json!({ "name": "Ravi Kumar", "phone": "98765 43210" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 201);
    let location = res.headers()["location"].to_str().unwrap().to_string();
    assert!(location.ends_with("/api/customers/42"), "location: {location}");
    let created: Value = res.json().await.unwrap();
    assert_eq!(created["id"], "42");
    assert_eq!(created["name"], "Ravi Kumar");
    assert_eq!(created["phone"], "+919876543210");

    assert_eq!(paths(&calls), vec!["POST /api/customers", "GET /api/customers/42"]);
    assert_eq!(calls.lock().unwrap()[0].1["phone"], "+919876543210");
}

#[tokio::test]
async fn test_bodyless_create_is_accepted() {
    let (bff, calls) = start().await;
    let (name, value) = session_cookie();

    let res = client()
        .post(bff.url("/api/customers"))
        .header(name, value)
        .json(&json!({ "name": "Walk-in", "phone": "9876543210" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 202);
    assert!(res.headers().get("location").is_none());
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "accepted": true }));
    assert_eq!(paths(&calls), vec!["POST /api/customers"]);
}

#[tokio::test]
async fn test_update_without_body_reads_back() {
    let (bff, calls) = start().await;
    let (name, value) = session_cookie();

    let res = client()
        .put(bff.url("/api/customers/42"))
        .header(name, value)
        .json(&json!({ "name": "Ravi Kumar", "phone": "+91 98765 43210", "city": "Pune" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    let updated: Value = res.json().await.unwrap();
    assert_eq!(updated["id"], "42");
    assert_eq!(updated["name"], "Ravi Kumar");
    assert_eq!(paths(&calls), vec!["PUT /api/customers/42", "GET /api/customers/42"]);
}

#[tokio::test]
async fn test_delete_is_no_content() {
    let (bff, calls) = start().await;
    let (name, value) = session_cookie();

    let res = client()
        .delete(bff.url("/api/customers/42"))
        .header(name, value)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 204);
    assert_eq!(paths(&calls), vec!["DELETE /api/customers/42"]);
}

#[tokio::test]
async fn test_manual_bill_totals_recomputed() {
    let (bff, calls) = start().await;
    let (name, value) = session_cookie();

    let res = client()
        .post(bff.url("/api/manual-bills"))
        .header(name, value)
        .json(&json!({
            "billDate": "2024-05-02",
            "customerName": "Anita Desai",
            "taxPercent": 18,
            "total": 1,
            "items": [
                { "description": "Tyres", "quantity": 4, "unitPrice": 2500.5, "amount": 1 },
                { "description": "Fitting", "quantity": 1, "unitPrice": 499 }
            ]
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 201);
    let bill: Value = res.json().await.unwrap();
    assert_eq!(bill["id"], "5");
    assert_eq!(bill["total"], 12391.18);

    let calls = calls.lock().unwrap();
    let sent = &calls[0].1;
    assert_eq!(sent["items"][0]["amount"], 10002.0);
    assert_eq!(sent["items"][1]["amount"], 499.0);
    assert_eq!(sent["subtotal"], 10501.0);
    assert_eq!(sent["taxAmount"], 1890.18);
    assert_eq!(sent["total"], 12391.18);
}

#[tokio::test]
async fn test_settings_echoed_on_no_content() {
    let (bff, calls) = start().await;
    let (name, value) = session_cookie();

    let res = client()
        .put(bff.url("/api/settings/delivery-note"))
        .header(name, value)
        .json(&json!({ "companyName": "Shree Motors", "phone": "9876543210", "taxId": "27abcde1234f1z5" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    let settings: Value = res.json().await.unwrap();
    assert_eq!(settings["companyName"], "Shree Motors");
    assert_eq!(settings["phone"], "+919876543210");
    assert_eq!(settings["taxId"], "27ABCDE1234F1Z5");
    assert_eq!(paths(&calls), vec!["PUT /api/settings/delivery-note"]);
}

#[tokio::test]
async fn test_cancel_sale_reads_back_status() {
    let (bff, calls) = start().await;
    let (name, value) = session_cookie();

    let res = client()
        .post(bff.url("/api/sales/77/cancel"))
        .header(name, value)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    let sale: Value = res.json().await.unwrap();
    assert_eq!(sale["id"], "77");
    assert_eq!(sale["status"], "cancelled");
    assert_eq!(paths(&calls), vec!["POST /api/sales/77/cancel", "GET /api/sales/77"]);
}
