//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness check
//! GET  /health/ready                    - Readiness check (database)
//!
//! # Auth
//! GET  /register                        - Registration page
//! POST /register                        - Register (rate limited)
//! GET  /login                           - Login page
//! POST /login                           - Login (rate limited)
//! POST /logout                          - Logout
//! GET  /forgot-password                 - Request a reset link
//! POST /forgot-password                 - Send the reset link (rate limited)
//! GET  /reset-password/{token}          - Choose a new password
//! POST /reset-password/{token}          - Set the new password (rate limited)
//!
//! # Catalog
//! GET  /                                - Store list
//! GET  /store/{store_id}                - Products in a store
//! GET  /product/{product_id}            - Product detail with reviews (login)
//!
//! # Buyers
//! POST /cart/add/{product_id}           - Add to cart
//! GET  /cart                            - Cart page
//! POST /cart/remove/{product_id}        - Remove a cart line
//! POST /checkout                        - Place the order
//! GET  /review/{product_id}             - Review form
//! POST /review/{product_id}             - Submit a review
//!
//! # Vendors
//! GET  /vendor/dashboard                - Own stores
//! GET  /vendor/store/create             - New store form
//! POST /vendor/store/create             - Create store
//! GET  /vendor/store/{id}               - Store with products
//! GET  /vendor/store/{id}/edit          - Edit store form
//! POST /vendor/store/{id}/edit          - Update store
//! POST /vendor/store/{id}/delete        - Delete store
//! GET  /vendor/store/{id}/product/add   - New product form
//! POST /vendor/store/{id}/product/add   - Add product
//! GET  /vendor/product/{id}/edit        - Edit product form
//! POST /vendor/product/{id}/edit        - Update product
//! POST /vendor/product/{id}/delete      - Delete product
//!
//! # JSON API (rate limited)
//! GET  /api/vendors/{vendor_id}/stores/         - A vendor's stores
//! GET  /api/stores/{store_id}/products/         - A store's products
//! POST /api/stores/create/                      - Create store (vendor)
//! POST /api/stores/{store_id}/products/add/     - Add product (owner)
//! GET  /api/products/{product_id}/reviews/      - Product reviews (login)
//! ```

pub mod api;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod health;
pub mod reviews;
pub mod vendor;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::{api_rate_limiter, auth_rate_limiter};
use crate::state::AppState;

/// Create the auth routes router.
///
/// Only the form posts are rate limited.
pub fn auth_routes() -> Router<AppState> {
    let pages = Router::new()
        .route("/register", get(auth::register_page))
        .route("/login", get(auth::login_page))
        .route("/logout", post(auth::logout))
        .route("/forgot-password", get(auth::forgot_password_page))
        .route("/reset-password/{token}", get(auth::reset_password_page));

    let actions = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/reset-password/{token}", post(auth::reset_password))
        .route_layer(auth_rate_limiter());

    pages.merge(actions)
}

/// Create the public catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(catalog::store_list))
        .route("/store/{store_id}", get(catalog::product_list))
        .route("/product/{product_id}", get(catalog::product_detail))
}

/// Create the buyer routes router: cart, checkout and reviews.
pub fn buyer_routes() -> Router<AppState> {
    Router::new()
        .route("/cart", get(cart::show))
        .route("/cart/add/{product_id}", post(cart::add))
        .route("/cart/remove/{product_id}", post(cart::remove))
        .route("/checkout", post(cart::checkout))
        .route(
            "/review/{product_id}",
            get(reviews::review_page).post(reviews::submit_review),
        )
}

/// Create the vendor dashboard routes router.
pub fn vendor_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(vendor::dashboard))
        .route(
            "/store/create",
            get(vendor::create_store_page).post(vendor::create_store),
        )
        .route("/store/{id}", get(vendor::store_detail))
        .route(
            "/store/{id}/edit",
            get(vendor::edit_store_page).post(vendor::edit_store),
        )
        .route("/store/{id}/delete", post(vendor::delete_store))
        .route(
            "/store/{id}/product/add",
            get(vendor::add_product_page).post(vendor::add_product),
        )
        .route(
            "/product/{id}/edit",
            get(vendor::edit_product_page).post(vendor::edit_product),
        )
        .route("/product/{id}/delete", post(vendor::delete_product))
}

/// Create the JSON API routes router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/vendors/{vendor_id}/stores/", get(api::vendor_stores))
        .route("/stores/{store_id}/products/", get(api::store_products))
        .route("/stores/create/", post(api::create_store))
        .route("/stores/{store_id}/products/add/", post(api::add_product))
        .route(
            "/products/{product_id}/reviews/",
            get(api::product_reviews),
        )
        .layer(api_rate_limiter())
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .merge(auth_routes())
        .merge(catalog_routes())
        .merge(buyer_routes())
        .nest("/vendor", vendor_routes())
        .nest("/api", api_routes())
}
