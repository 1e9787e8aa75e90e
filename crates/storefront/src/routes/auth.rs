//! Authentication route handlers.
//!
//! Registration, login, logout and the password reset flow. Form errors
//! re-render the form with the message; successful posts redirect with a
//! flash message.

use std::str::FromStr;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use bazaar_core::Role;

use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::middleware::{PageContext, clear_current_user, push_flash, set_current_user};
use crate::models::{CurrentUser, FlashLevel, User};
use crate::services::{
    AuthService, PasswordResetService, Registration, ResetError, ResetRequestOutcome,
};
use crate::state::AppState;

const FORGOT_PASSWORD_SENT: &str =
    "If an account exists with that email, a reset link has been sent";

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub role: String,
}

/// Forgot password form data.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordForm {
    pub email: String,
}

/// Reset password form data.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordForm {
    pub password: String,
    pub confirm_password: String,
}

// =============================================================================
// Templates
// =============================================================================

#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub page: PageContext,
    pub username: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub page: PageContext,
    pub username: String,
    pub email: String,
    pub role: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "auth/forgot_password.html")]
pub struct ForgotPasswordTemplate {
    pub page: PageContext,
}

#[derive(Template, WebTemplate)]
#[template(path = "auth/reset_password.html")]
pub struct ResetPasswordTemplate {
    pub page: PageContext,
    pub token: String,
}

/// Put the user in the session and tag Sentry events with them.
async fn start_session(session: &Session, user: &User) -> Result<(), AppError> {
    set_current_user(session, &CurrentUser::from(user))
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    set_sentry_user(&user.id, Some(&user.username));
    Ok(())
}

// =============================================================================
// Registration
// =============================================================================

pub async fn register_page(page: PageContext) -> impl IntoResponse {
    RegisterTemplate {
        page,
        username: String::new(),
        email: String::new(),
        role: Role::Buyer.as_str().to_owned(),
    }
}

async fn register_form_error(
    session: &Session,
    form: RegisterForm,
    message: String,
) -> Result<Response, AppError> {
    let mut page = PageContext::from_session(session).await;
    page.flash_now(FlashLevel::Error, message);
    Ok(RegisterTemplate {
        page,
        username: form.username,
        email: form.email,
        role: form.role,
    }
    .into_response())
}

/// Handle registration form submission.
///
/// On success the new account is logged in straight away.
#[instrument(skip_all, fields(username = %form.username))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    let Ok(role) = Role::from_str(&form.role) else {
        let message = "Choose whether you are a vendor or a buyer".to_owned();
        return register_form_error(&session, form, message).await;
    };

    let result = AuthService::new(state.pool())
        .register(Registration {
            username: &form.username,
            email: &form.email,
            password: &form.password,
            confirm_password: &form.confirm_password,
            role,
        })
        .await;

    match result {
        Ok(user) => {
            start_session(&session, &user).await?;
            tracing::info!(user_id = %user.id, role = %user.role, "account registered");
            push_flash(&session, FlashLevel::Success, "Registration successful").await;
            Ok(Redirect::to("/").into_response())
        }
        Err(e) if e.is_user_facing() => register_form_error(&session, form, e.to_string()).await,
        Err(e) => Err(e.into()),
    }
}

// =============================================================================
// Login / Logout
// =============================================================================

pub async fn login_page(page: PageContext) -> impl IntoResponse {
    LoginTemplate {
        page,
        username: String::new(),
    }
}

#[instrument(skip_all, fields(username = %form.username))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    match AuthService::new(state.pool())
        .login(&form.username, &form.password)
        .await
    {
        Ok(user) => {
            start_session(&session, &user).await?;
            tracing::info!(user_id = %user.id, "logged in");
            Ok(Redirect::to("/").into_response())
        }
        Err(e) if e.is_user_facing() => {
            tracing::info!("login rejected");
            let mut page = PageContext::from_session(&session).await;
            page.flash_now(FlashLevel::Error, e.to_string());
            Ok(LoginTemplate {
                page,
                username: form.username,
            }
            .into_response())
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn logout(session: Session) -> Result<Redirect, AppError> {
    clear_current_user(&session)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    clear_sentry_user();
    Ok(Redirect::to("/login"))
}

// =============================================================================
// Password Reset
// =============================================================================

pub async fn forgot_password_page(page: PageContext) -> impl IntoResponse {
    ForgotPasswordTemplate { page }
}

/// Issue a reset link.
///
/// The response is the same whether or not the address belongs to an
/// account.
#[instrument(skip_all)]
pub async fn forgot_password(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ForgotPasswordForm>,
) -> Result<Redirect, AppError> {
    let outcome = PasswordResetService::new(state.pool(), state.email(), state.config())
        .request_reset(&form.email)
        .await?;
    if let ResetRequestOutcome::Issued(notification) = outcome {
        tracing::debug!(?notification, "reset email outcome");
    }

    push_flash(&session, FlashLevel::Success, FORGOT_PASSWORD_SENT).await;
    Ok(Redirect::to("/login"))
}

/// Where to send someone holding an unusable token.
async fn reject_token(session: &Session, err: &ResetError) -> Response {
    push_flash(session, FlashLevel::Error, err.to_string()).await;
    let target = match err {
        ResetError::Expired => "/forgot-password",
        _ => "/login",
    };
    Redirect::to(target).into_response()
}

pub async fn reset_password_page(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    Path(token): Path<String>,
) -> Result<Response, AppError> {
    match PasswordResetService::new(state.pool(), state.email(), state.config())
        .validate(&token)
        .await
    {
        Ok(_) => Ok(ResetPasswordTemplate { page, token }.into_response()),
        Err(e @ (ResetError::InvalidOrExpiredToken | ResetError::Expired)) => {
            Ok(reject_token(&session, &e).await)
        }
        Err(e) => Err(e.into()),
    }
}

#[instrument(skip_all)]
pub async fn reset_password(
    State(state): State<AppState>,
    session: Session,
    Path(token): Path<String>,
    Form(form): Form<ResetPasswordForm>,
) -> Result<Response, AppError> {
    match PasswordResetService::new(state.pool(), state.email(), state.config())
        .complete_reset(&token, &form.password, &form.confirm_password)
        .await
    {
        Ok(()) => {
            push_flash(
                &session,
                FlashLevel::Success,
                "Password reset successfully, please log in",
            )
            .await;
            Ok(Redirect::to("/login").into_response())
        }
        Err(ResetError::Password(e)) => {
            let mut page = PageContext::from_session(&session).await;
            page.flash_now(FlashLevel::Error, e.to_string());
            Ok(ResetPasswordTemplate { page, token }.into_response())
        }
        Err(e @ (ResetError::InvalidOrExpiredToken | ResetError::Expired)) => {
            Ok(reject_token(&session, &e).await)
        }
        Err(e) => Err(e.into()),
    }
}
