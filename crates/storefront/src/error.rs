//! Unified error handling with Sentry integration.
//!
//! HTML handlers return `Result<T, AppError>`; JSON handlers under `/api`
//! return `Result<T, ApiError>`, which renders `{"error": "..."}`. Both
//! capture server-side failures to Sentry before responding.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::carts::{CartServiceError, CartStoreError};
use crate::services::catalog::CatalogError;
use crate::services::checkout::CheckoutError;
use crate::services::password_reset::ResetError;
use crate::services::reviews::ReviewError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated, but not allowed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(err) => {
                if err.is_user_facing() {
                    StatusCode::BAD_REQUEST
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_owned(),
            Self::Auth(err) if err.is_user_facing() => err.to_string(),
            Self::Auth(_) => "Authentication error".to_owned(),
            _ => self.to_string(),
        };

        (status, message).into_response()
    }
}

impl From<CartStoreError> for AppError {
    fn from(err: CartStoreError) -> Self {
        match err {
            CartStoreError::Repository(e) => Self::Database(e),
        }
    }
}

impl From<CartServiceError> for AppError {
    fn from(err: CartServiceError) -> Self {
        match err {
            CartServiceError::ProductNotFound => Self::NotFound("product".to_owned()),
            CartServiceError::Rejected(e) => Self::BadRequest(e.to_string()),
            CartServiceError::Store(e) => e.into(),
            CartServiceError::Repository(e) => Self::Database(e),
        }
    }
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::EmptyCart => Self::BadRequest(err.to_string()),
            CheckoutError::CartStore(e) => e.into(),
            CheckoutError::Repository(e) => Self::Database(e),
        }
    }
}

impl From<ResetError> for AppError {
    fn from(err: ResetError) -> Self {
        match err {
            ResetError::Repository(e) => Self::Database(e),
            ResetError::Password(e) => Self::Auth(e),
            other => Self::BadRequest(other.to_string()),
        }
    }
}

impl From<ReviewError> for AppError {
    fn from(err: ReviewError) -> Self {
        match err {
            ReviewError::ProductNotFound => Self::NotFound("product".to_owned()),
            ReviewError::InvalidRating(_) => Self::BadRequest(err.to_string()),
            ReviewError::Repository(e) => Self::Database(e),
        }
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Invalid(e) => Self::BadRequest(e.to_string()),
            CatalogError::StoreNotFound => Self::NotFound("store".to_owned()),
            CatalogError::ProductNotFound => Self::NotFound("product".to_owned()),
            CatalogError::NotOwner => Self::Forbidden(err.to_string()),
            CatalogError::Repository(e) => Self::Database(e),
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Error body for the JSON API: `{"error": message}`.
#[derive(Debug, Error)]
#[error("{status}: {message}")]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    #[must_use]
    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Authentication required")
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(what: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, format!("{what} not found"))
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        let event_id = sentry::capture_error(&err);
        tracing::error!(error = %err, sentry_event_id = %event_id, "API request error");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Invalid(e) => Self::bad_request(e.to_string()),
            CatalogError::StoreNotFound => Self::not_found("Store"),
            CatalogError::ProductNotFound => Self::not_found("Product"),
            CatalogError::NotOwner => Self::forbidden(err.to_string()),
            CatalogError::Repository(e) => e.into(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, username: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            username: username.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "12")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_owned()),
        message: Some(message.to_owned()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_owned(),
                serde_json::Value::String((*value).to_owned()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bazaar_core::CartError;

    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_owned());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = AppError::BadRequest("invalid input".to_owned());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_owned())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_owned())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_owned())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_owned())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::RateLimited),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_owned())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Auth(AuthError::UsernameTaken)),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_service_errors_map_to_client_errors() {
        let err = AppError::from(CartServiceError::Rejected(CartError::OutOfStock));
        assert_eq!(get_status(err), StatusCode::BAD_REQUEST);

        let err = AppError::from(CheckoutError::EmptyCart);
        assert_eq!(get_status(err), StatusCode::BAD_REQUEST);

        let err = AppError::from(ReviewError::ProductNotFound);
        assert_eq!(get_status(err), StatusCode::NOT_FOUND);

        let err = AppError::from(ResetError::Expired);
        assert_eq!(get_status(err), StatusCode::BAD_REQUEST);

        let err = AppError::from(CatalogError::NotOwner);
        assert_eq!(get_status(err), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_catalog_errors_map_to_api_statuses() {
        assert_eq!(
            ApiError::from(CatalogError::StoreNotFound).status,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(CatalogError::NotOwner).status,
            StatusCode::FORBIDDEN
        );
        let err = ApiError::from(CatalogError::Invalid(
            crate::services::ValidationError::MissingName,
        ));
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Name is required");
    }

    #[tokio::test]
    async fn test_api_error_renders_json_body() {
        let response = ApiError::forbidden("Vendors only").into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value, json!({ "error": "Vendors only" }));
    }
}
