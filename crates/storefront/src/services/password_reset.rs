//! Password reset flow.
//!
//! A reset request mints 32 random bytes, emails them as a URL-safe base64
//! token and stores only the SHA-256 hex digest. Tokens are single-use and
//! short-lived: a token found past its expiry is deleted on the spot.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use bazaar_core::Email;

use super::auth::{AuthError, hash_password, validate_new_password};
use super::email::{EmailService, NotificationOutcome};
use crate::config::StorefrontConfig;
use crate::db::{RepositoryError, ResetTokenRepository, UserRepository};
use crate::models::ResetToken;

const TOKEN_BYTES: usize = 32;

#[derive(Debug, Error)]
pub enum ResetError {
    /// No unused token matches; also covers tokens that were already consumed.
    #[error("Invalid or expired link")]
    InvalidOrExpiredToken,

    #[error("Reset link has expired")]
    Expired,

    /// The new password was rejected.
    #[error("{0}")]
    Password(AuthError),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<AuthError> for ResetError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Repository(e) => Self::Repository(e),
            other => Self::Password(other),
        }
    }
}

/// Result of a reset request.
///
/// The HTML layer shows the same message whatever this is, so accounts
/// cannot be enumerated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetRequestOutcome {
    /// No account has that address (or the address was malformed).
    NoAccount,
    /// A token was issued; the email may or may not have gone out.
    Issued(NotificationOutcome),
}

pub struct PasswordResetService<'a> {
    users: UserRepository<'a>,
    tokens: ResetTokenRepository<'a>,
    email: Option<&'a EmailService>,
    config: &'a StorefrontConfig,
}

impl<'a> PasswordResetService<'a> {
    #[must_use]
    pub const fn new(
        pool: &'a PgPool,
        email: Option<&'a EmailService>,
        config: &'a StorefrontConfig,
    ) -> Self {
        Self {
            users: UserRepository::new(pool),
            tokens: ResetTokenRepository::new(pool),
            email,
            config,
        }
    }

    /// Issue a reset token for the account with `email`, if there is one.
    ///
    /// # Errors
    ///
    /// Returns `ResetError::Repository` if the database is unavailable.
    #[instrument(skip(self, email))]
    pub async fn request_reset(&self, email: &str) -> Result<ResetRequestOutcome, ResetError> {
        let Ok(email) = Email::parse(email) else {
            return Ok(ResetRequestOutcome::NoAccount);
        };
        let Some(user) = self.users.get_by_email(&email).await? else {
            tracing::info!("password reset requested for unknown email");
            return Ok(ResetRequestOutcome::NoAccount);
        };

        let raw = generate_token();
        let expires_at = Utc::now() + self.config.reset_token_ttl;
        self.tokens
            .create(user.id, &hash_token(&raw), expires_at)
            .await?;

        let reset_url = self.config.absolute_url(&format!("/reset-password/{raw}"));
        let notification = match self.email {
            Some(service) => NotificationOutcome::from_result(
                service
                    .send_password_reset(
                        user.email.as_str(),
                        &reset_url,
                        self.config.reset_token_ttl.num_minutes(),
                    )
                    .await,
                "password_reset",
            ),
            None => {
                tracing::warn!(user_id = %user.id, "email disabled; reset link not delivered");
                NotificationOutcome::Disabled
            }
        };

        tracing::info!(user_id = %user.id, "password reset token issued");
        Ok(ResetRequestOutcome::Issued(notification))
    }

    /// Look up a presented token, deleting it if it has expired.
    ///
    /// # Errors
    ///
    /// Returns `ResetError::InvalidOrExpiredToken` when nothing matches and
    /// `ResetError::Expired` when the match is past its expiry.
    pub async fn validate(&self, raw_token: &str) -> Result<ResetToken, ResetError> {
        self.validate_at(raw_token, Utc::now()).await
    }

    async fn validate_at(
        &self,
        raw_token: &str,
        now: DateTime<Utc>,
    ) -> Result<ResetToken, ResetError> {
        let token = self
            .tokens
            .find_unused(&hash_token(raw_token))
            .await?
            .ok_or(ResetError::InvalidOrExpiredToken)?;

        if token.is_expired_at(now) {
            self.tokens.delete(token.id).await?;
            tracing::info!(user_id = %token.user_id, "expired reset token removed");
            return Err(ResetError::Expired);
        }
        Ok(token)
    }

    /// Set a new password using a presented token.
    ///
    /// The token is checked before the passwords, so an expired token is
    /// rejected (and deleted) regardless of what was typed.
    ///
    /// # Errors
    ///
    /// Returns the token errors of [`Self::validate`], or
    /// `ResetError::Password` if the new password is rejected.
    #[instrument(skip_all)]
    pub async fn complete_reset(
        &self,
        raw_token: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<(), ResetError> {
        let token = self.validate(raw_token).await?;
        validate_new_password(password, confirm_password)?;
        let password_hash = hash_password(password)?;

        self.tokens
            .consume(&token, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => ResetError::InvalidOrExpiredToken,
                other => ResetError::Repository(other),
            })?;

        tracing::info!(user_id = %token.user_id, "password reset completed");
        Ok(())
    }
}

/// A fresh URL-safe reset token.
#[must_use]
pub fn generate_token() -> String {
    let mut bytes = [0_u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Hex SHA-256 digest of a raw token, as stored in the database.
#[must_use]
pub fn hash_token(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_tokens_are_url_safe_and_unique() {
        let a = generate_token();
        let b = generate_token();

        assert_eq!(a.len(), 43);
        assert!(
            a.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_token_is_stable_hex_sha256() {
        let digest = hash_token("abc");
        assert_eq!(
            digest,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(digest.len(), 64);
        assert_ne!(hash_token("abd"), digest);
    }

    #[test]
    fn test_password_errors_stay_user_facing() {
        let err = ResetError::from(AuthError::PasswordMismatch);
        assert_eq!(err.to_string(), "Passwords do not match");
    }
}
