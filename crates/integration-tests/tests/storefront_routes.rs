//! Router-level tests that never reach the database.
//!
//! Permission checks and form validation run before any query, so these use
//! a lazily connecting pool that is never touched.

#![allow(clippy::unwrap_used)]

use axum::http::{StatusCode, header};
use serde_json::json;

use bazaar_integration_tests::{TEST_PASSWORD, TestApp};

// ============================================================================
// Health & Headers
// ============================================================================

#[tokio::test]
async fn test_health() {
    let mut app = TestApp::without_database();
    let response = app.get("/health").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, "ok");
}

#[tokio::test]
async fn test_pages_carry_security_headers_and_request_id() {
    let mut app = TestApp::without_database();
    let response = app.get("/login").await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("<h1>Log in</h1>"));
    assert!(response.headers.contains_key(header::CONTENT_SECURITY_POLICY));
    assert_eq!(
        response.headers.get(header::X_FRAME_OPTIONS).unwrap(),
        "DENY"
    );
    assert!(response.headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let mut app = TestApp::without_database();
    let response = app.get("/no/such/page").await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Permissions
// ============================================================================

#[tokio::test]
async fn test_logged_out_visitors_are_sent_to_login() {
    let mut app = TestApp::without_database();

    for path in ["/cart", "/vendor/dashboard", "/product/1", "/review/1"] {
        let response = app.get(path).await;
        assert_eq!(response.status, StatusCode::SEE_OTHER, "GET {path}");
        assert_eq!(response.location(), Some("/login"), "GET {path}");
    }

    let response = app.post_form("/checkout", &[]).await;
    assert_eq!(response.location(), Some("/login"));

    let response = app.post_form("/cart/add/1", &[("quantity", "2")]).await;
    assert_eq!(response.location(), Some("/login"));
}

#[tokio::test]
async fn test_api_requires_authentication_with_json_error() {
    let mut app = TestApp::without_database();

    let response = app.get("/api/products/1/reviews/").await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.json(), json!({ "error": "Authentication required" }));

    let response = app
        .post_json(
            "/api/stores/create/",
            &json!({ "name": "Kloof Street Pantry", "description": "" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.json(), json!({ "error": "Authentication required" }));

    let response = app
        .post_json(
            "/api/stores/1/products/add/",
            &json!({ "name": "Rooibos", "price": "10.00", "stock": 5 }),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn test_register_rejects_unknown_role() {
    let mut app = TestApp::without_database();
    let response = app
        .post_form(
            "/register",
            &[
                ("username", "thandi"),
                ("email", "thandi@bazaar.test"),
                ("password", TEST_PASSWORD),
                ("confirm_password", TEST_PASSWORD),
                ("role", "admin"),
            ],
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(
        response
            .body
            .contains("Choose whether you are a vendor or a buyer")
    );
    assert!(response.body.contains(r#"value="thandi""#));
}

#[tokio::test]
async fn test_register_rejects_invalid_email() {
    let mut app = TestApp::without_database();
    let response = app
        .post_form(
            "/register",
            &[
                ("username", "thandi"),
                ("email", "not-an-email"),
                ("password", TEST_PASSWORD),
                ("confirm_password", TEST_PASSWORD),
                ("role", "buyer"),
            ],
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Enter a valid email address"));
}

#[tokio::test]
async fn test_register_rejects_mismatched_passwords() {
    let mut app = TestApp::without_database();
    let response = app
        .post_form(
            "/register",
            &[
                ("username", "thandi"),
                ("email", "thandi@bazaar.test"),
                ("password", TEST_PASSWORD),
                ("confirm_password", "something-else"),
                ("role", "vendor"),
            ],
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Passwords do not match"));
    // The chosen role survives the round trip.
    assert!(response.body.contains(r#"value="vendor" checked"#));
}

// ============================================================================
// Password Reset
// ============================================================================

#[tokio::test]
async fn test_forgot_password_flashes_the_same_message_once() {
    let mut app = TestApp::without_database();
    let response = app
        .post_form("/forgot-password", &[("email", "not-an-email")])
        .await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/login"));

    let page = app.get("/login").await;
    assert!(
        page.body
            .contains("If an account exists with that email, a reset link has been sent")
    );

    let page = app.get("/login").await;
    assert!(!page.body.contains("If an account exists"));
}

#[tokio::test]
async fn test_credential_posts_are_rate_limited() {
    let mut app = TestApp::without_database();

    for _ in 0..5 {
        let response = app
            .post_form("/forgot-password", &[("email", "nobody")])
            .await;
        assert_eq!(response.status, StatusCode::SEE_OTHER);
    }

    let response = app
        .post_form("/forgot-password", &[("email", "nobody")])
        .await;
    assert_eq!(response.status, StatusCode::TOO_MANY_REQUESTS);

    // Pages themselves are not limited.
    let response = app.get("/forgot-password").await;
    assert_eq!(response.status, StatusCode::OK);
}
