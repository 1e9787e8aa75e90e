//! End-to-end vendor and buyer journeys against a real database.
//!
//! These tests require a scratch `PostgreSQL` database; point
//! `TEST_DATABASE_URL` at it and run with `--ignored`. Every test registers
//! fresh accounts, so runs do not interfere with each other.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use chrono::{DateTime, Duration, Utc};
use serde_json::{Value, json};

use bazaar_core::Email;
use bazaar_integration_tests::{TEST_PASSWORD, TestApp, test_config, unique_username};
use bazaar_storefront::db::{ResetTokenRepository, UserRepository};
use bazaar_storefront::services::password_reset::{generate_token, hash_token};
use bazaar_storefront::services::{PasswordResetService, ResetError};

async fn create_store(vendor: &mut TestApp, name: &str) -> i64 {
    let response = vendor
        .post_json(
            "/api/stores/create/",
            &json!({ "name": name, "description": "Fresh from the Karoo" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    response.json()["id"].as_i64().unwrap()
}

async fn add_product(
    vendor: &mut TestApp,
    store_id: i64,
    name: &str,
    price: &str,
    stock: i64,
) -> i64 {
    let response = vendor
        .post_json(
            &format!("/api/stores/{store_id}/products/add/"),
            &json!({ "name": name, "price": price, "stock": stock }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    response.json()["id"].as_i64().unwrap()
}

async fn stock_levels(app: &mut TestApp, store_id: i64) -> Vec<(String, i64)> {
    let response = app.get(&format!("/api/stores/{store_id}/products/")).await;
    assert_eq!(response.status, StatusCode::OK);
    response
        .json()
        .as_array()
        .unwrap()
        .iter()
        .map(|p: &Value| {
            (
                p["name"].as_str().unwrap().to_owned(),
                p["stock"].as_i64().unwrap(),
            )
        })
        .collect()
}

// ============================================================================
// Checkout
// ============================================================================

#[tokio::test]
#[ignore = "Requires a PostgreSQL database (TEST_DATABASE_URL)"]
async fn test_buyer_checks_out_two_line_cart() {
    let mut vendor = TestApp::with_database().await;
    vendor.register(&unique_username("vendor"), "vendor").await;
    let store_id = create_store(&mut vendor, "Karoo Larder").await;
    let rooibos = add_product(&mut vendor, store_id, "Rooibos", "10.00", 5).await;
    let rusks = add_product(&mut vendor, store_id, "Rusks", "7.50", 3).await;

    let mut buyer = vendor.new_client();
    buyer.register(&unique_username("buyer"), "buyer").await;

    let response = buyer
        .post_form(&format!("/cart/add/{rooibos}"), &[("quantity", "2")])
        .await;
    assert_eq!(response.location(), Some(format!("/store/{store_id}").as_str()));
    buyer
        .post_form(&format!("/cart/add/{rusks}"), &[("quantity", "1")])
        .await;

    let cart = buyer.get("/cart").await;
    assert_eq!(cart.status, StatusCode::OK);
    assert!(cart.body.contains("R20.00"));
    assert!(cart.body.contains("R7.50"));
    assert!(cart.body.contains("R27.50"));

    let response = buyer.post_form("/checkout", &[]).await;
    assert_eq!(response.location(), Some("/"));
    let home = buyer.get("/").await;
    assert!(home.body.contains("Order placed successfully"));

    assert_eq!(
        stock_levels(&mut buyer, store_id).await,
        [("Rooibos".to_owned(), 3), ("Rusks".to_owned(), 2)]
    );

    let cart = buyer.get("/cart").await;
    assert!(cart.body.contains("Your cart is empty"));
}

#[tokio::test]
#[ignore = "Requires a PostgreSQL database (TEST_DATABASE_URL)"]
async fn test_checkout_skips_sold_out_lines() {
    let mut vendor = TestApp::with_database().await;
    vendor.register(&unique_username("vendor"), "vendor").await;
    let store_id = create_store(&mut vendor, "Last Stock Co").await;
    let biltong = add_product(&mut vendor, store_id, "Biltong", "55.00", 1).await;
    let chutney = add_product(&mut vendor, store_id, "Chutney", "32.00", 4).await;

    let mut first = vendor.new_client();
    first.register(&unique_username("buyer"), "buyer").await;
    let mut second = vendor.new_client();
    second.register(&unique_username("buyer"), "buyer").await;

    for buyer in [&mut first, &mut second] {
        buyer
            .post_form(&format!("/cart/add/{biltong}"), &[("quantity", "1")])
            .await;
    }
    second
        .post_form(&format!("/cart/add/{chutney}"), &[("quantity", "2")])
        .await;

    first.post_form("/checkout", &[]).await;
    let response = second.post_form("/checkout", &[]).await;
    assert_eq!(response.location(), Some("/"));

    let home = second.get("/").await;
    assert!(home.body.contains("Biltong is out of stock"), "{}", home.body);
    assert!(home.body.contains("Order placed successfully"));

    assert_eq!(
        stock_levels(&mut second, store_id).await,
        [("Biltong".to_owned(), 0), ("Chutney".to_owned(), 2)]
    );
}

#[tokio::test]
#[ignore = "Requires a PostgreSQL database (TEST_DATABASE_URL)"]
async fn test_checkout_with_nothing_available_places_empty_order() {
    let mut vendor = TestApp::with_database().await;
    vendor.register(&unique_username("vendor"), "vendor").await;
    let store_id = create_store(&mut vendor, "Single Jar Shop").await;
    let marmalade = add_product(&mut vendor, store_id, "Marmalade", "28.00", 1).await;

    let mut first = vendor.new_client();
    first.register(&unique_username("buyer"), "buyer").await;
    let mut second = vendor.new_client();
    second.register(&unique_username("buyer"), "buyer").await;
    for buyer in [&mut first, &mut second] {
        buyer
            .post_form(&format!("/cart/add/{marmalade}"), &[("quantity", "1")])
            .await;
    }

    first.post_form("/checkout", &[]).await;
    let response = second.post_form("/checkout", &[]).await;
    assert_eq!(response.location(), Some("/"));

    let home = second.get("/").await;
    assert!(home.body.contains("Marmalade is out of stock"), "{}", home.body);
    assert!(home.body.contains("none of the items in your cart were available"));
    assert!(!home.body.contains("Order placed successfully"));
}

#[tokio::test]
#[ignore = "Requires a PostgreSQL database (TEST_DATABASE_URL)"]
async fn test_order_total_may_exceed_largest_product_price() {
    let mut vendor = TestApp::with_database().await;
    vendor.register(&unique_username("vendor"), "vendor").await;
    let store_id = create_store(&mut vendor, "Diamond Exchange").await;
    let diamond = add_product(&mut vendor, store_id, "Diamond", "60000000.00", 5).await;

    let mut buyer = vendor.new_client();
    buyer.register(&unique_username("buyer"), "buyer").await;
    buyer
        .post_form(&format!("/cart/add/{diamond}"), &[("quantity", "2")])
        .await;
    let cart = buyer.get("/cart").await;
    assert!(cart.body.contains("R120000000.00"));

    let response = buyer.post_form("/checkout", &[]).await;
    assert_eq!(response.status, StatusCode::SEE_OTHER, "{}", response.body);
    assert_eq!(response.location(), Some("/"));

    let total: String = sqlx::query_scalar(
        r"
        SELECT o.total_price::text
        FROM customer_order o
        JOIN order_item oi ON oi.order_id = o.id
        WHERE oi.product_id = $1
        ",
    )
    .bind(i32::try_from(diamond).unwrap())
    .fetch_one(buyer.pool())
    .await
    .unwrap();
    assert_eq!(total, "120000000.00");
    assert_eq!(
        stock_levels(&mut buyer, store_id).await,
        [("Diamond".to_owned(), 3)]
    );
}

#[tokio::test]
#[ignore = "Requires a PostgreSQL database (TEST_DATABASE_URL)"]
async fn test_empty_cart_checkout_is_refused() {
    let mut buyer = TestApp::with_database().await;
    buyer.register(&unique_username("buyer"), "buyer").await;

    let response = buyer.post_form("/checkout", &[]).await;
    assert_eq!(response.location(), Some("/cart"));
    let cart = buyer.get("/cart").await;
    assert!(cart.body.contains("Your cart is empty"));
}

// ============================================================================
// Reviews
// ============================================================================

#[tokio::test]
#[ignore = "Requires a PostgreSQL database (TEST_DATABASE_URL)"]
async fn test_reviews_are_verified_only_after_purchase() {
    let mut vendor = TestApp::with_database().await;
    vendor.register(&unique_username("vendor"), "vendor").await;
    let store_id = create_store(&mut vendor, "Review Roastery").await;
    let coffee = add_product(&mut vendor, store_id, "Coffee", "120.00", 10).await;

    let mut purchaser = vendor.new_client();
    purchaser.register(&unique_username("buyer"), "buyer").await;
    purchaser
        .post_form(&format!("/cart/add/{coffee}"), &[("quantity", "1")])
        .await;
    purchaser.post_form("/checkout", &[]).await;

    let mut browser = vendor.new_client();
    browser.register(&unique_username("buyer"), "buyer").await;

    let path = format!("/review/{coffee}");
    let response = purchaser
        .post_form(&path, &[("rating", "5"), ("comment", "Great beans")])
        .await;
    assert_eq!(response.location(), Some(format!("/store/{store_id}").as_str()));
    browser
        .post_form(&path, &[("rating", "2"), ("comment", "")])
        .await;

    let response = browser
        .get(&format!("/api/products/{coffee}/reviews/"))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let reviews = response.json();
    let mut verified: Vec<(i64, bool)> = reviews
        .as_array()
        .unwrap()
        .iter()
        .map(|r| {
            (
                r["rating"].as_i64().unwrap(),
                r["is_verified"].as_bool().unwrap(),
            )
        })
        .collect();
    verified.sort_unstable();
    assert_eq!(verified, [(2, false), (5, true)]);
}

#[tokio::test]
#[ignore = "Requires a PostgreSQL database (TEST_DATABASE_URL)"]
async fn test_out_of_range_rating_is_rejected() {
    let mut vendor = TestApp::with_database().await;
    vendor.register(&unique_username("vendor"), "vendor").await;
    let store_id = create_store(&mut vendor, "Ratings Depot").await;
    let product = add_product(&mut vendor, store_id, "Honey", "45.00", 2).await;

    let mut buyer = vendor.new_client();
    buyer.register(&unique_username("buyer"), "buyer").await;
    let response = buyer
        .post_form(&format!("/review/{product}"), &[("rating", "9")])
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Rating must be between 1 and 5"));
}

// ============================================================================
// Password Reset
// ============================================================================

const NEW_PASSWORD: &str = "a-brand-new-secret";

/// Plant a reset token for `username` and return the raw token.
async fn issue_token(app: &TestApp, username: &str, expires_at: DateTime<Utc>) -> String {
    let email = Email::parse(&format!("{username}@bazaar.test")).unwrap();
    let user = UserRepository::new(app.pool())
        .get_by_email(&email)
        .await
        .unwrap()
        .unwrap();
    let raw = generate_token();
    ResetTokenRepository::new(app.pool())
        .create(user.id, &hash_token(&raw), expires_at)
        .await
        .unwrap();
    raw
}

async fn tokens_with_digest(app: &TestApp, raw: &str) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM reset_token WHERE token_hash = $1")
        .bind(hash_token(raw))
        .fetch_one(app.pool())
        .await
        .unwrap()
}

async fn can_log_in(app: &TestApp, username: &str, password: &str) -> bool {
    let mut client = app.new_client();
    let response = client
        .post_form("/login", &[("username", username), ("password", password)])
        .await;
    response.location() == Some("/")
}

#[tokio::test]
#[ignore = "Requires a PostgreSQL database (TEST_DATABASE_URL)"]
async fn test_expired_reset_token_is_rejected_and_deleted() {
    let mut app = TestApp::with_database().await;
    let username = unique_username("buyer");
    app.register(&username, "buyer").await;
    let raw = issue_token(&app, &username, Utc::now() - Duration::minutes(1)).await;

    let config = test_config();
    let result = PasswordResetService::new(app.pool(), None, &config)
        .complete_reset(&raw, NEW_PASSWORD, NEW_PASSWORD)
        .await;

    assert!(matches!(result, Err(ResetError::Expired)), "{result:?}");
    assert_eq!(tokens_with_digest(&app, &raw).await, 0);
    assert!(can_log_in(&app, &username, TEST_PASSWORD).await);
}

#[tokio::test]
#[ignore = "Requires a PostgreSQL database (TEST_DATABASE_URL)"]
async fn test_reset_token_sets_password_once() {
    let mut app = TestApp::with_database().await;
    let username = unique_username("vendor");
    app.register(&username, "vendor").await;
    let raw = issue_token(&app, &username, Utc::now() + Duration::minutes(5)).await;

    let config = test_config();
    let service = PasswordResetService::new(app.pool(), None, &config);
    service
        .complete_reset(&raw, NEW_PASSWORD, NEW_PASSWORD)
        .await
        .unwrap();

    assert_eq!(tokens_with_digest(&app, &raw).await, 0);
    assert!(can_log_in(&app, &username, NEW_PASSWORD).await);
    assert!(!can_log_in(&app, &username, TEST_PASSWORD).await);

    let again = service
        .complete_reset(&raw, "yet-another-secret", "yet-another-secret")
        .await;
    assert!(
        matches!(again, Err(ResetError::InvalidOrExpiredToken)),
        "{again:?}"
    );
}

#[tokio::test]
#[ignore = "Requires a PostgreSQL database (TEST_DATABASE_URL)"]
async fn test_rejected_new_password_keeps_the_token() {
    let mut app = TestApp::with_database().await;
    let username = unique_username("buyer");
    app.register(&username, "buyer").await;
    let raw = issue_token(&app, &username, Utc::now() + Duration::minutes(5)).await;

    let config = test_config();
    let service = PasswordResetService::new(app.pool(), None, &config);

    let mismatch = service
        .complete_reset(&raw, NEW_PASSWORD, "something-else")
        .await;
    assert!(matches!(mismatch, Err(ResetError::Password(_))), "{mismatch:?}");

    let short = service.complete_reset(&raw, "short", "short").await;
    assert!(matches!(short, Err(ResetError::Password(_))), "{short:?}");

    assert_eq!(tokens_with_digest(&app, &raw).await, 1);
    assert!(can_log_in(&app, &username, TEST_PASSWORD).await);

    // The reset form posts through the same path.
    let mut client = app.new_client();
    let response = client
        .post_form(
            &format!("/reset-password/{raw}"),
            &[("password", NEW_PASSWORD), ("confirm_password", NEW_PASSWORD)],
        )
        .await;
    assert_eq!(response.location(), Some("/login"));
    assert!(can_log_in(&app, &username, NEW_PASSWORD).await);
}

// ============================================================================
// Roles & Ownership
// ============================================================================

#[tokio::test]
#[ignore = "Requires a PostgreSQL database (TEST_DATABASE_URL)"]
async fn test_api_enforces_vendor_role_and_ownership() {
    let mut owner = TestApp::with_database().await;
    owner.register(&unique_username("vendor"), "vendor").await;
    let store_id = create_store(&mut owner, "Owner's Outlet").await;

    let mut rival = owner.new_client();
    rival.register(&unique_username("vendor"), "vendor").await;
    let response = rival
        .post_json(
            &format!("/api/stores/{store_id}/products/add/"),
            &json!({ "name": "Knock-off", "price": 1, "stock": 1 }),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.json(), json!({ "error": "You do not own this store" }));

    let mut buyer = owner.new_client();
    buyer.register(&unique_username("buyer"), "buyer").await;
    let response = buyer
        .post_json("/api/stores/create/", &json!({ "name": "Not allowed" }))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = owner
        .post_json(
            &format!("/api/stores/{store_id}/products/add/"),
            &json!({ "name": "Bad price", "price": "-1", "stock": 1 }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = owner.get("/api/products/999999999/reviews/").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.json(), json!({ "error": "Product not found" }));
}

#[tokio::test]
#[ignore = "Requires a PostgreSQL database (TEST_DATABASE_URL)"]
async fn test_vendor_cannot_see_another_vendors_store() {
    let mut owner = TestApp::with_database().await;
    owner.register(&unique_username("vendor"), "vendor").await;
    let store_id = create_store(&mut owner, "Private Pantry").await;

    let response = owner.get(&format!("/vendor/store/{store_id}")).await;
    assert_eq!(response.status, StatusCode::OK);

    let mut rival = owner.new_client();
    rival.register(&unique_username("vendor"), "vendor").await;
    let response = rival.get(&format!("/vendor/store/{store_id}")).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = rival
        .post_form(&format!("/vendor/store/{store_id}/delete"), &[])
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires a PostgreSQL database (TEST_DATABASE_URL)"]
async fn test_buyers_are_kept_out_of_the_dashboard() {
    let mut buyer = TestApp::with_database().await;
    buyer.register(&unique_username("buyer"), "buyer").await;

    let response = buyer.get("/vendor/dashboard").await;
    assert_eq!(response.location(), Some("/"));
    let home = buyer.get("/").await;
    assert!(home.body.contains("You are not a vendor"));
}
