//! Request validation through the full router

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use salon_booking::domain::ProfileRole;

use crate::common::TestApp;

#[tokio::test]
async fn test_catalog_service_requires_category() {
    let app = TestApp::new();
    let token = app.token(1, ProfileRole::Admin);

    let response = app
        .server
        .post("/api/v1/catalog/services")
        .authorization_bearer(token)
        .json(&json!({ "name": "Beard trim" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["message"], "category: Category is required");
    assert_eq!(body["errors"][0]["field"], "category");
}

#[tokio::test]
async fn test_cancel_with_malformed_id_rejected() {
    let app = TestApp::new();
    let token = app.token(1001, ProfileRole::Customer);

    let response = app
        .server
        .post("/api/v1/appointments/not-a-number/cancel")
        .authorization_bearer(token)
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["message"], "appointment_id: Invalid id");
}

#[tokio::test]
async fn test_booking_with_malformed_staff_id_rejected() {
    let app = TestApp::new();
    let token = app.token(1001, ProfileRole::Customer);

    let response = app
        .server
        .post("/api/v1/appointments")
        .authorization_bearer(token)
        .json(&json!({
            "salon_id": "10",
            "staff_id": "abc",
            "service_id": "30",
            "starts_at": "2030-01-07T10:00:00Z",
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["errors"][0]["field"], "staff_id");
}

#[tokio::test]
async fn test_booking_without_start_time_rejected() {
    let app = TestApp::new();
    let token = app.token(1001, ProfileRole::Customer);

    let response = app
        .server
        .post("/api/v1/appointments")
        .authorization_bearer(token)
        .json(&json!({ "salon_id": "10", "staff_id": "20", "service_id": "30" }))
        .await;

    // axum reports missing fields as 422; the extractor maps every JSON
    // rejection to 400
    response.assert_status(StatusCode::BAD_REQUEST);
}
