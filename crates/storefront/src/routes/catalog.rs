//! Public catalog pages: the store list, a store's products and product
//! detail.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};

use bazaar_core::{ProductId, StoreId};

use crate::db::{ProductRepository, ReviewRepository, StoreRepository};
use crate::error::{AppError, Result};
use crate::middleware::{PageContext, RequireAuth};
use crate::models::{Product, Review, Store};
use crate::services::CatalogService;
use crate::state::AppState;

#[derive(Template, WebTemplate)]
#[template(path = "store/store_list.html")]
pub struct StoreListTemplate {
    pub page: PageContext,
    pub stores: Vec<Store>,
}

#[derive(Template, WebTemplate)]
#[template(path = "store/product_list.html")]
pub struct ProductListTemplate {
    pub page: PageContext,
    pub store: Store,
    pub products: Vec<Product>,
}

#[derive(Template, WebTemplate)]
#[template(path = "store/product_detail.html")]
pub struct ProductDetailTemplate {
    pub page: PageContext,
    pub product: Product,
    pub reviews: Vec<Review>,
}

/// Every store, oldest first.
pub async fn store_list(State(state): State<AppState>, page: PageContext) -> Result<impl IntoResponse> {
    let stores = StoreRepository::new(state.pool()).list_all().await?;
    Ok(StoreListTemplate { page, stores })
}

pub async fn product_list(
    State(state): State<AppState>,
    page: PageContext,
    Path(store_id): Path<i32>,
) -> Result<impl IntoResponse> {
    let (store, products) = CatalogService::new(state.pool())
        .store_with_products(StoreId::new(store_id))
        .await?;
    Ok(ProductListTemplate {
        page,
        store,
        products,
    })
}

/// Product detail with its reviews. Requires a login.
pub async fn product_detail(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    page: PageContext,
    Path(product_id): Path<i32>,
) -> Result<impl IntoResponse> {
    let product_id = ProductId::new(product_id);
    let product = ProductRepository::new(state.pool())
        .get(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("product".to_owned()))?;
    let reviews = ReviewRepository::new(state.pool())
        .list_for_product(product_id)
        .await?;

    Ok(ProductDetailTemplate {
        page,
        product,
        reviews,
    })
}
