//! Cart and checkout route handlers.
//!
//! Buyers only. Every action redirects with a flash message except the cart
//! page itself.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use bazaar_core::{CartError, CartView, ProductId, format_money};

use crate::db::ProductRepository;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::{PageContext, RequireBuyer, push_flash};
use crate::models::FlashLevel;
use crate::services::{CartService, CartServiceError, CheckoutError, CheckoutService};
use crate::state::AppState;

/// Add to cart form data. `quantity` defaults to 1.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub quantity: Option<String>,
}

/// A cart line with display-ready prices.
pub struct CartLineDisplay {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: String,
    pub quantity: u32,
    pub subtotal: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "store/cart.html")]
pub struct CartTemplate {
    pub page: PageContext,
    pub lines: Vec<CartLineDisplay>,
    pub total: String,
    pub item_count: u32,
}

impl CartTemplate {
    fn new(page: PageContext, view: CartView) -> Self {
        let lines = view
            .lines
            .into_iter()
            .map(|line| CartLineDisplay {
                product_id: line.product_id,
                name: line.name,
                unit_price: format_money(line.unit_price),
                quantity: line.quantity,
                subtotal: format_money(line.subtotal),
            })
            .collect();
        Self {
            page,
            lines,
            total: format_money(view.total),
            item_count: view.item_count,
        }
    }
}

/// Parse the submitted quantity; anything unparseable counts as zero and is
/// rejected by the cart.
fn parse_quantity(raw: Option<&str>) -> u32 {
    match raw.map(str::trim) {
        None | Some("") => 1,
        Some(value) => value.parse().unwrap_or(0),
    }
}

#[instrument(skip(state, session, buyer, form), fields(user_id = %buyer.id))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    RequireBuyer(buyer): RequireBuyer,
    Path(product_id): Path<i32>,
    Form(form): Form<AddToCartForm>,
) -> Result<Redirect> {
    let product_id = ProductId::new(product_id);
    let quantity = parse_quantity(form.quantity.as_deref());

    match CartService::new(state.pool(), state.carts())
        .add(buyer.id, product_id, quantity)
        .await
    {
        Ok(added) => {
            add_breadcrumb(
                "cart",
                "Added to cart",
                Some(&[("product_id", &product_id.to_string())]),
            );
            push_flash(
                &session,
                FlashLevel::Success,
                format!("{} added to cart", added.product.name),
            )
            .await;
            Ok(Redirect::to(&format!("/store/{}", added.product.store_id)))
        }
        Err(CartServiceError::Rejected(e)) => {
            push_flash(&session, FlashLevel::Error, e.to_string()).await;
            let target = match e {
                CartError::OutOfStock => {
                    let product = ProductRepository::new(state.pool())
                        .get(product_id)
                        .await?
                        .ok_or_else(|| AppError::NotFound("product".to_owned()))?;
                    format!("/store/{}", product.store_id)
                }
                CartError::InvalidQuantity | CartError::InsufficientStock { .. } => {
                    format!("/product/{product_id}")
                }
            };
            Ok(Redirect::to(&target))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn show(
    State(state): State<AppState>,
    RequireBuyer(buyer): RequireBuyer,
    page: PageContext,
) -> Result<impl IntoResponse> {
    let view = CartService::new(state.pool(), state.carts())
        .view(buyer.id)
        .await?;
    Ok(CartTemplate::new(page, view))
}

pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    RequireBuyer(buyer): RequireBuyer,
    Path(product_id): Path<i32>,
) -> Result<Redirect> {
    let removed = CartService::new(state.pool(), state.carts())
        .remove(buyer.id, ProductId::new(product_id))
        .await?;
    if removed {
        push_flash(&session, FlashLevel::Success, "Product removed from cart").await;
    }
    Ok(Redirect::to("/cart"))
}

/// Place the order.
///
/// Lines that could not be filled and a failed invoice email are reported
/// as flash messages; neither undoes the order.
#[instrument(skip_all, fields(user_id = %buyer.id))]
pub async fn checkout(
    State(state): State<AppState>,
    session: Session,
    RequireBuyer(buyer): RequireBuyer,
) -> Result<Redirect> {
    let receipt = match CheckoutService::new(state.pool(), state.carts(), state.email())
        .checkout(&buyer)
        .await
    {
        Ok(receipt) => receipt,
        Err(CheckoutError::EmptyCart) => {
            push_flash(&session, FlashLevel::Error, "Your cart is empty").await;
            return Ok(Redirect::to("/cart"));
        }
        Err(e) => return Err(e.into()),
    };

    for warning in receipt.warnings() {
        push_flash(&session, FlashLevel::Error, warning).await;
    }
    if receipt.notification.is_failed() {
        push_flash(
            &session,
            FlashLevel::Warning,
            "Order placed successfully, but invoice email could not be sent",
        )
        .await;
    }
    if receipt.is_empty_order() {
        push_flash(
            &session,
            FlashLevel::Warning,
            "Order placed, but none of the items in your cart were available",
        )
        .await;
    } else {
        push_flash(&session, FlashLevel::Success, "Order placed successfully").await;
    }

    Ok(Redirect::to("/"))
}
