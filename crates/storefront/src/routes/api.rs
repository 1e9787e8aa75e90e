//! JSON API.
//!
//! Listings are public. Creating stores and products needs a vendor session
//! and reading reviews needs any session. Failures render `{"error": "..."}`.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use bazaar_core::{ProductId, Rating, ReviewId, StoreId, UserId};

use crate::db::{ProductRepository, ReviewRepository, StoreRepository};
use crate::error::ApiError;
use crate::middleware::{RequireAuth, RequireVendor};
use crate::models::{Product, Review, Store};
use crate::services::{CatalogService, catalog};
use crate::state::AppState;

type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Serialize)]
pub struct StoreJson {
    pub id: StoreId,
    pub owner: UserId,
    pub name: String,
    pub description: String,
}

impl From<Store> for StoreJson {
    fn from(store: Store) -> Self {
        Self {
            id: store.id,
            owner: store.owner_id,
            name: store.name,
            description: store.description,
        }
    }
}

/// `price` serializes as a string, e.g. `"10.00"`.
#[derive(Debug, Serialize)]
pub struct ProductJson {
    pub id: ProductId,
    pub store: StoreId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock: i32,
}

impl From<Product> for ProductJson {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            store: product.store_id,
            name: product.name,
            description: product.description,
            price: product.price,
            stock: product.stock,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReviewJson {
    pub id: ReviewId,
    pub product: ProductId,
    pub reviewer: UserId,
    pub rating: Rating,
    pub comment: String,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Review> for ReviewJson {
    fn from(review: Review) -> Self {
        Self {
            id: review.id,
            product: review.product_id,
            reviewer: review.reviewer_id,
            rating: review.rating,
            comment: review.comment,
            is_verified: review.is_verified,
            created_at: review.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateStoreRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Prices may be sent as a JSON number or a string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PriceField {
    Text(String),
    Number(serde_json::Number),
}

impl PriceField {
    fn parse(&self) -> Result<Decimal, catalog::ValidationError> {
        match self {
            Self::Text(raw) => catalog::parse_price(raw),
            Self::Number(number) => catalog::parse_price(&number.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: PriceField,
    pub stock: i64,
}

/// GET /api/vendors/{vendor_id}/stores/
///
/// An unknown vendor simply has no stores.
pub async fn vendor_stores(
    State(state): State<AppState>,
    Path(vendor_id): Path<i32>,
) -> ApiResult<Json<Vec<StoreJson>>> {
    let stores = StoreRepository::new(state.pool())
        .list_by_owner(UserId::new(vendor_id))
        .await?;
    Ok(Json(stores.into_iter().map(StoreJson::from).collect()))
}

/// GET /api/stores/{store_id}/products/
pub async fn store_products(
    State(state): State<AppState>,
    Path(store_id): Path<i32>,
) -> ApiResult<Json<Vec<ProductJson>>> {
    let (_store, products) = CatalogService::new(state.pool())
        .store_with_products(StoreId::new(store_id))
        .await?;
    Ok(Json(products.into_iter().map(ProductJson::from).collect()))
}

/// POST /api/stores/create/
#[instrument(skip_all, fields(owner_id = %vendor.id))]
pub async fn create_store(
    State(state): State<AppState>,
    RequireVendor(vendor): RequireVendor,
    body: Result<Json<CreateStoreRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<StoreJson>)> {
    let Json(body) = body?;
    let input = catalog::validate_store(&body.name, &body.description)
        .map_err(|e| ApiError::bad_request(e.to_string()))?;
    let store = CatalogService::new(state.pool())
        .create_store(vendor.id, &input)
        .await?;
    Ok((StatusCode::CREATED, Json(store.into())))
}

/// POST /api/stores/{store_id}/products/add/
///
/// Only the store's owner may add products.
#[instrument(skip_all, fields(owner_id = %vendor.id, store_id))]
pub async fn add_product(
    State(state): State<AppState>,
    RequireVendor(vendor): RequireVendor,
    Path(store_id): Path<i32>,
    body: Result<Json<CreateProductRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ProductJson>)> {
    tracing::Span::current().record("store_id", store_id);
    let Json(body) = body?;
    let input = body
        .price
        .parse()
        .and_then(|price| {
            catalog::validate_product(&body.name, &body.description, price, body.stock)
        })
        .map_err(|e| ApiError::bad_request(e.to_string()))?;
    let product = CatalogService::new(state.pool())
        .add_product(StoreId::new(store_id), vendor.id, &input)
        .await?;
    Ok((StatusCode::CREATED, Json(product.into())))
}

/// GET /api/products/{product_id}/reviews/
pub async fn product_reviews(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Path(product_id): Path<i32>,
) -> ApiResult<Json<Vec<ReviewJson>>> {
    let product_id = ProductId::new(product_id);
    ProductRepository::new(state.pool())
        .get(product_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product"))?;
    let reviews = ReviewRepository::new(state.pool())
        .list_for_product(product_id)
        .await?;
    Ok(Json(reviews.into_iter().map(ReviewJson::from).collect()))
}
