//! Vendor dashboard: store and product management.
//!
//! Every handler requires the vendor role. Stores and products belonging to
//! another vendor are reported as not found.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use bazaar_core::{ProductId, StoreId};

use crate::db::StoreRepository;
use crate::error::{AppError, Result};
use crate::middleware::{PageContext, RequireVendor, push_flash};
use crate::models::{FlashLevel, Product, Store};
use crate::services::{CatalogError, CatalogService, catalog};
use crate::state::AppState;

const DASHBOARD: &str = "/vendor/dashboard";

#[derive(Debug, Deserialize)]
pub struct StoreForm {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct ProductForm {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: String,
    pub stock: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "vendor/dashboard.html")]
pub struct DashboardTemplate {
    pub page: PageContext,
    pub stores: Vec<Store>,
}

#[derive(Template, WebTemplate)]
#[template(path = "vendor/store_detail.html")]
pub struct StoreDetailTemplate {
    pub page: PageContext,
    pub store: Store,
    pub products: Vec<Product>,
}

/// Create and edit share one form.
#[derive(Template, WebTemplate)]
#[template(path = "vendor/store_form.html")]
pub struct StoreFormTemplate {
    pub page: PageContext,
    pub heading: String,
    pub action: String,
    pub name: String,
    pub description: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "vendor/product_form.html")]
pub struct ProductFormTemplate {
    pub page: PageContext,
    pub heading: String,
    pub action: String,
    pub store_name: String,
    pub name: String,
    pub description: String,
    pub price: String,
    pub stock: String,
}

impl ProductFormTemplate {
    fn from_form(
        page: PageContext,
        heading: String,
        action: String,
        store_name: String,
        form: ProductForm,
    ) -> Self {
        Self {
            page,
            heading,
            action,
            store_name,
            name: form.name,
            description: form.description,
            price: form.price,
            stock: form.stock,
        }
    }
}

async fn flash_redirect(session: &Session, text: &str, to: &str) -> Response {
    push_flash(session, FlashLevel::Success, text).await;
    Redirect::to(to).into_response()
}

/// A validation failure is shown on the re-rendered form; anything else
/// becomes an error response.
async fn form_error(session: &Session, err: CatalogError) -> Result<PageContext> {
    match err {
        CatalogError::Invalid(e) => {
            let mut page = PageContext::from_session(session).await;
            page.flash_now(FlashLevel::Error, e.to_string());
            Ok(page)
        }
        other => Err(other.into()),
    }
}

// =============================================================================
// Stores
// =============================================================================

pub async fn dashboard(
    State(state): State<AppState>,
    RequireVendor(vendor): RequireVendor,
    page: PageContext,
) -> Result<impl IntoResponse> {
    let stores = StoreRepository::new(state.pool())
        .list_by_owner(vendor.id)
        .await?;
    Ok(DashboardTemplate { page, stores })
}

pub async fn store_detail(
    State(state): State<AppState>,
    RequireVendor(vendor): RequireVendor,
    page: PageContext,
    Path(store_id): Path<i32>,
) -> Result<impl IntoResponse> {
    let (store, products) = CatalogService::new(state.pool())
        .owned_store_with_products(StoreId::new(store_id), vendor.id)
        .await?;
    Ok(StoreDetailTemplate {
        page,
        store,
        products,
    })
}

pub async fn create_store_page(
    RequireVendor(_vendor): RequireVendor,
    page: PageContext,
) -> impl IntoResponse {
    StoreFormTemplate {
        page,
        heading: "Create a store".to_owned(),
        action: "/vendor/store/create".to_owned(),
        name: String::new(),
        description: String::new(),
    }
}

pub async fn create_store(
    State(state): State<AppState>,
    session: Session,
    RequireVendor(vendor): RequireVendor,
    Form(form): Form<StoreForm>,
) -> Result<Response> {
    let result = match catalog::validate_store(&form.name, &form.description) {
        Ok(input) => CatalogService::new(state.pool())
            .create_store(vendor.id, &input)
            .await
            .map(|_| ()),
        Err(e) => Err(e.into()),
    };

    match result {
        Ok(()) => Ok(flash_redirect(&session, "Store created successfully", DASHBOARD).await),
        Err(e) => Ok(StoreFormTemplate {
            page: form_error(&session, e).await?,
            heading: "Create a store".to_owned(),
            action: "/vendor/store/create".to_owned(),
            name: form.name,
            description: form.description,
        }
        .into_response()),
    }
}

pub async fn edit_store_page(
    State(state): State<AppState>,
    RequireVendor(vendor): RequireVendor,
    page: PageContext,
    Path(store_id): Path<i32>,
) -> Result<impl IntoResponse> {
    let store = StoreRepository::new(state.pool())
        .get_owned(StoreId::new(store_id), vendor.id)
        .await?
        .ok_or_else(|| AppError::NotFound("store".to_owned()))?;
    Ok(StoreFormTemplate {
        page,
        heading: format!("Edit {}", store.name),
        action: format!("/vendor/store/{}/edit", store.id),
        name: store.name,
        description: store.description,
    })
}

pub async fn edit_store(
    State(state): State<AppState>,
    session: Session,
    RequireVendor(vendor): RequireVendor,
    Path(store_id): Path<i32>,
    Form(form): Form<StoreForm>,
) -> Result<Response> {
    let store_id = StoreId::new(store_id);
    let result = match catalog::validate_store(&form.name, &form.description) {
        Ok(input) => CatalogService::new(state.pool())
            .update_store(store_id, vendor.id, &input)
            .await
            .map(|_| ()),
        Err(e) => Err(e.into()),
    };

    match result {
        Ok(()) => Ok(flash_redirect(&session, "Store updated successfully", DASHBOARD).await),
        Err(e) => Ok(StoreFormTemplate {
            page: form_error(&session, e).await?,
            heading: "Edit store".to_owned(),
            action: format!("/vendor/store/{store_id}/edit"),
            name: form.name,
            description: form.description,
        }
        .into_response()),
    }
}

pub async fn delete_store(
    State(state): State<AppState>,
    session: Session,
    RequireVendor(vendor): RequireVendor,
    Path(store_id): Path<i32>,
) -> Result<Response> {
    CatalogService::new(state.pool())
        .delete_store(StoreId::new(store_id), vendor.id)
        .await?;
    Ok(flash_redirect(&session, "Store deleted successfully", DASHBOARD).await)
}

// =============================================================================
// Products
// =============================================================================

pub async fn add_product_page(
    State(state): State<AppState>,
    RequireVendor(vendor): RequireVendor,
    page: PageContext,
    Path(store_id): Path<i32>,
) -> Result<impl IntoResponse> {
    let store = StoreRepository::new(state.pool())
        .get_owned(StoreId::new(store_id), vendor.id)
        .await?
        .ok_or_else(|| AppError::NotFound("store".to_owned()))?;
    Ok(ProductFormTemplate {
        page,
        heading: "Add a product".to_owned(),
        action: format!("/vendor/store/{}/product/add", store.id),
        store_name: store.name,
        name: String::new(),
        description: String::new(),
        price: String::new(),
        stock: String::new(),
    })
}

pub async fn add_product(
    State(state): State<AppState>,
    session: Session,
    RequireVendor(vendor): RequireVendor,
    Path(store_id): Path<i32>,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    let store = StoreRepository::new(state.pool())
        .get_owned(StoreId::new(store_id), vendor.id)
        .await?
        .ok_or_else(|| AppError::NotFound("store".to_owned()))?;

    let result = match catalog::validate_product_form(
        &form.name,
        &form.description,
        &form.price,
        &form.stock,
    ) {
        Ok(input) => CatalogService::new(state.pool())
            .add_product(store.id, vendor.id, &input)
            .await
            .map(|_| ()),
        Err(e) => Err(e.into()),
    };

    match result {
        Ok(()) => Ok(flash_redirect(&session, "Product added successfully", DASHBOARD).await),
        Err(e) => Ok(ProductFormTemplate::from_form(
            form_error(&session, e).await?,
            "Add a product".to_owned(),
            format!("/vendor/store/{}/product/add", store.id),
            store.name,
            form,
        )
        .into_response()),
    }
}

pub async fn edit_product_page(
    State(state): State<AppState>,
    RequireVendor(vendor): RequireVendor,
    page: PageContext,
    Path(product_id): Path<i32>,
) -> Result<impl IntoResponse> {
    let product = CatalogService::new(state.pool())
        .owned_product(ProductId::new(product_id), vendor.id)
        .await?;
    Ok(ProductFormTemplate {
        page,
        heading: format!("Edit {}", product.name),
        action: format!("/vendor/product/{}/edit", product.id),
        store_name: String::new(),
        name: product.name,
        description: product.description,
        price: product.price.to_string(),
        stock: product.stock.to_string(),
    })
}

pub async fn edit_product(
    State(state): State<AppState>,
    session: Session,
    RequireVendor(vendor): RequireVendor,
    Path(product_id): Path<i32>,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    let product_id = ProductId::new(product_id);
    let result = match catalog::validate_product_form(
        &form.name,
        &form.description,
        &form.price,
        &form.stock,
    ) {
        Ok(input) => CatalogService::new(state.pool())
            .update_product(product_id, vendor.id, &input)
            .await
            .map(|_| ()),
        Err(e) => Err(e.into()),
    };

    match result {
        Ok(()) => Ok(flash_redirect(&session, "Product updated successfully", DASHBOARD).await),
        Err(e) => Ok(ProductFormTemplate::from_form(
            form_error(&session, e).await?,
            "Edit product".to_owned(),
            format!("/vendor/product/{product_id}/edit"),
            String::new(),
            form,
        )
        .into_response()),
    }
}

pub async fn delete_product(
    State(state): State<AppState>,
    session: Session,
    RequireVendor(vendor): RequireVendor,
    Path(product_id): Path<i32>,
) -> Result<Response> {
    CatalogService::new(state.pool())
        .delete_product(ProductId::new(product_id), vendor.id)
        .await?;
    Ok(flash_redirect(&session, "Product deleted successfully", DASHBOARD).await)
}
