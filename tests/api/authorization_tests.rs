//! Role checks that reject before any store access

use axum::http::StatusCode;
use serde_json::{json, Value};
use test_case::test_case;

use salon_booking::domain::ProfileRole;

use crate::common::TestApp;

#[test_case("/api/v1/admin/dashboard" ; "admin dashboard")]
#[test_case("/api/v1/approvals" ; "approval queue")]
#[test_case("/api/v1/profiles" ; "profile directory")]
#[test_case("/api/v1/tickets" ; "ticket queue")]
#[tokio::test]
async fn test_customer_cannot_read_admin_views(path: &str) {
    let app = TestApp::new();
    let token = app.token(1001, ProfileRole::Customer);

    let response = app.server.get(path).authorization_bearer(token).await;

    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_owner_cannot_create_catalog_service() {
    let app = TestApp::new();
    let token = app.token(2002, ProfileRole::SalonOwner);

    let response = app
        .server
        .post("/api/v1/catalog/services")
        .authorization_bearer(token)
        .json(&json!({ "name": "Balayage", "category": "Colour" }))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(response.json::<Value>()["code"], 10004);
}

#[tokio::test]
async fn test_customer_cannot_change_roles() {
    let app = TestApp::new();
    let token = app.token(1001, ProfileRole::Customer);

    let response = app
        .server
        .put("/api/v1/profiles/1001/role")
        .authorization_bearer(token)
        .json(&json!({ "role": "ADMIN" }))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_customer_cannot_moderate_salons() {
    let app = TestApp::new();
    let token = app.token(1001, ProfileRole::Customer);

    let response = app
        .server
        .put("/api/v1/salons/42/status")
        .authorization_bearer(token)
        .json(&json!({ "status": "SUSPENDED" }))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
}
