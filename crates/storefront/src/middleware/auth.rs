//! Authentication middleware and extractors.
//!
//! Every permission check in the storefront goes through one of these
//! extractors. HTML requests are redirected (to `/login` when logged out, or
//! home with a flash message when the role is wrong); requests under `/api/`
//! get a JSON 401 or 403 instead.

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use bazaar_core::Role;

use super::flash::push_flash;
use crate::error::ApiError;
use crate::models::{CurrentUser, FlashLevel, session_keys};

/// Extractor that requires a logged-in user of any role.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.username)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Extractor that requires a logged-in vendor.
pub struct RequireVendor(pub CurrentUser);

/// Extractor that requires a logged-in buyer.
pub struct RequireBuyer(pub CurrentUser);

/// Error returned when a request fails an authentication or role check.
pub enum AuthRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin,
    /// Redirect home; a flash message explains why.
    RedirectHome,
    /// JSON 401 (for API requests).
    Unauthorized,
    /// JSON 403 (for API requests).
    Forbidden(&'static str),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/login").into_response(),
            Self::RedirectHome => Redirect::to("/").into_response(),
            Self::Unauthorized => ApiError::unauthorized().into_response(),
            Self::Forbidden(message) => ApiError::forbidden(message).into_response(),
        }
    }
}

/// Nested routers see a stripped path, so prefer the original URI.
fn is_api_request(parts: &Parts) -> bool {
    parts
        .extensions
        .get::<OriginalUri>()
        .map_or(&parts.uri, |original| &original.0)
        .path()
        .starts_with("/api/")
}

async fn session_user(parts: &Parts) -> Option<CurrentUser> {
    let session = parts.extensions.get::<Session>()?;
    session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

async fn require_user(parts: &Parts) -> Result<CurrentUser, AuthRejection> {
    session_user(parts).await.ok_or_else(|| {
        if is_api_request(parts) {
            AuthRejection::Unauthorized
        } else {
            AuthRejection::RedirectToLogin
        }
    })
}

async fn require_role(
    parts: &Parts,
    role: Role,
    message: &'static str,
) -> Result<CurrentUser, AuthRejection> {
    let user = require_user(parts).await?;
    if user.role == role {
        return Ok(user);
    }

    tracing::info!(user_id = %user.id, required = role.as_str(), "role check failed");
    if is_api_request(parts) {
        return Err(AuthRejection::Forbidden(message));
    }
    if let Some(session) = parts.extensions.get::<Session>() {
        push_flash(session, FlashLevel::Error, message).await;
    }
    Err(AuthRejection::RedirectHome)
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        require_user(parts).await.map(Self)
    }
}

impl<S> FromRequestParts<S> for RequireVendor
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        require_role(parts, Role::Vendor, "You are not a vendor")
            .await
            .map(Self)
    }
}

impl<S> FromRequestParts<S> for RequireBuyer
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        require_role(parts, Role::Buyer, "Only buyers can do that")
            .await
            .map(Self)
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this does not reject the request if nobody is logged in.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(session_user(parts).await))
    }
}

/// Helper to set the current user in the session.
///
/// The session id is cycled first so a pre-login id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Helper to clear the current user from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    Ok(())
}
