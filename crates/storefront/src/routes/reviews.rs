//! Review route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use bazaar_core::ProductId;

use crate::error::Result;
use crate::middleware::{PageContext, RequireBuyer, push_flash};
use crate::models::{FlashLevel, Product};
use crate::services::{ReviewError, ReviewService};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ReviewForm {
    pub rating: String,
    #[serde(default)]
    pub comment: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "store/leave_review.html")]
pub struct LeaveReviewTemplate {
    pub page: PageContext,
    pub product: Product,
    pub has_purchased: bool,
    pub comment: String,
}

pub async fn review_page(
    State(state): State<AppState>,
    RequireBuyer(buyer): RequireBuyer,
    page: PageContext,
    Path(product_id): Path<i32>,
) -> Result<impl IntoResponse> {
    let (product, has_purchased) = ReviewService::new(state.pool())
        .prepare(ProductId::new(product_id), buyer.id)
        .await?;
    Ok(LeaveReviewTemplate {
        page,
        product,
        has_purchased,
        comment: String::new(),
    })
}

pub async fn submit_review(
    State(state): State<AppState>,
    session: Session,
    RequireBuyer(buyer): RequireBuyer,
    Path(product_id): Path<i32>,
    Form(form): Form<ReviewForm>,
) -> Result<Response> {
    let service = ReviewService::new(state.pool());
    let product_id = ProductId::new(product_id);
    let rating = form.rating.trim().parse::<i64>().unwrap_or(0);

    match service
        .submit(product_id, buyer.id, rating, &form.comment)
        .await
    {
        Ok((product, _review)) => {
            push_flash(&session, FlashLevel::Success, "Review submitted successfully").await;
            Ok(Redirect::to(&format!("/store/{}", product.store_id)).into_response())
        }
        Err(e @ ReviewError::InvalidRating(_)) => {
            let (product, has_purchased) = service.prepare(product_id, buyer.id).await?;
            let mut page = PageContext::from_session(&session).await;
            page.flash_now(FlashLevel::Error, e.to_string());
            Ok(LeaveReviewTemplate {
                page,
                product,
                has_purchased,
                comment: form.comment,
            }
            .into_response())
        }
        Err(e) => Err(e.into()),
    }
}
