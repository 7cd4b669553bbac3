//! Authentication API Tests

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use salon_booking::application::services::encode_access_token;
use salon_booking::domain::ProfileRole;

use crate::common::{full_name, unique_email, TestApp};

#[tokio::test]
async fn test_register_with_invalid_email_fails() {
    let app = TestApp::new();

    let response = app
        .server
        .post("/api/v1/auth/register")
        .json(&json!({
            "email": "not-an-email",
            "password": "ValidPassword123!",
            "full_name": full_name(),
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["errors"][0]["field"], "email");
}

#[tokio::test]
async fn test_register_with_short_password_fails() {
    let app = TestApp::new();

    let response = app
        .server
        .post("/api/v1/auth/register")
        .json(&json!({
            "email": unique_email(),
            "password": "short",
            "full_name": full_name(),
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["message"], "password: Password must be 8-128 characters");
}

#[tokio::test]
async fn test_register_without_name_fails() {
    let app = TestApp::new();

    let response = app
        .server
        .post("/api/v1/auth/register")
        .json(&json!({
            "email": unique_email(),
            "password": "ValidPassword123!",
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["errors"][0]["field"], "full_name");
}

#[tokio::test]
async fn test_login_with_malformed_json_fails() {
    let app = TestApp::new();

    let response = app
        .server
        .post("/api/v1/auth/login")
        .text("{\"email\":")
        .content_type("application/json")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_protected_route_requires_token() {
    let app = TestApp::new();

    let response = app.server.get("/api/v1/me").await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["message"], "Missing authorization header");
}

#[tokio::test]
async fn test_protected_route_rejects_garbage_token() {
    let app = TestApp::new();

    let response = app
        .server
        .get("/api/v1/me/appointments")
        .authorization_bearer("not.a.jwt")
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["message"], "Invalid token");
}

#[tokio::test]
async fn test_token_signed_with_other_secret_rejected() {
    let app = TestApp::new();
    let mut other = app.settings.jwt.clone();
    other.secret = "a-completely-different-secret-of-32-chars".into();
    let token = tokio_test::assert_ok!(encode_access_token(&other, 7, ProfileRole::Admin));

    let response = app
        .server
        .get("/api/v1/admin/dashboard")
        .authorization_bearer(token)
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_write_on_public_path_requires_token() {
    let app = TestApp::new();

    let response = app
        .server
        .post("/api/v1/salons")
        .json(&json!({ "name": "Cut & Colour" }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}
