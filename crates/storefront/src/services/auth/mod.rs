//! Authentication service.
//!
//! Username and password accounts with argon2id hashes. Every account is
//! created with exactly one [`Role`].

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;
use tracing::instrument;

use bazaar_core::{Email, Role, UserId};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::User;

/// Minimum password length, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 8;

const MAX_USERNAME_LENGTH: usize = 150;

/// A submitted registration form.
#[derive(Debug, Clone, Copy)]
pub struct Registration<'r> {
    pub username: &'r str,
    pub email: &'r str,
    pub password: &'r str,
    pub confirm_password: &'r str,
    pub role: Role,
}

pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a new account.
    ///
    /// Checks run in a fixed order and the first failure is reported:
    /// username and email shape, password confirmation, password length,
    /// username availability, then email availability.
    ///
    /// # Errors
    ///
    /// Returns the first failing check as an `AuthError`, or
    /// `AuthError::Repository` if the database is unavailable.
    #[instrument(skip(self, form), fields(username = %form.username, role = %form.role))]
    pub async fn register(&self, form: Registration<'_>) -> Result<User, AuthError> {
        let username = validate_username(form.username)?;
        let email = Email::parse(form.email)?;
        validate_new_password(form.password, form.confirm_password)?;

        if self.users.username_exists(username).await? {
            return Err(AuthError::UsernameTaken);
        }
        if self.users.email_exists(&email).await? {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = hash_password(form.password)?;
        let user = self
            .users
            .create(username, &email, &password_hash, form.role)
            .await
            .map_err(|e| match e {
                // Lost a race with a concurrent registration.
                RepositoryError::Conflict(_) => AuthError::UsernameTaken,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "account registered");
        Ok(user)
    }

    /// Login with username and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the username or password is wrong.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let (user, password_hash) = self
            .users
            .get_password_hash(username.trim())
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;
        Ok(user)
    }

    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the account cannot be loaded.
    pub async fn get_user(&self, user_id: UserId) -> Result<Option<User>, AuthError> {
        Ok(self.users.get_by_id(user_id).await?)
    }
}

fn validate_username(username: &str) -> Result<&str, AuthError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(AuthError::InvalidUsername("Username is required".to_owned()));
    }
    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(AuthError::InvalidUsername(format!(
            "Username must be at most {MAX_USERNAME_LENGTH} characters"
        )));
    }
    if username.chars().any(char::is_whitespace) {
        return Err(AuthError::InvalidUsername(
            "Username cannot contain spaces".to_owned(),
        ));
    }
    Ok(username)
}

/// Check a new password and its confirmation.
///
/// # Errors
///
/// Returns `AuthError::PasswordMismatch` first, then `AuthError::WeakPassword`
/// if the password is shorter than [`MIN_PASSWORD_LENGTH`] characters.
pub fn validate_new_password(password: &str, confirm_password: &str) -> Result<(), AuthError> {
    if password != confirm_password {
        return Err(AuthError::PasswordMismatch);
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_mismatch_is_reported_before_length() {
        assert!(matches!(
            validate_new_password("short", "other"),
            Err(AuthError::PasswordMismatch)
        ));
    }

    #[test]
    fn test_short_password_rejected() {
        let err = validate_new_password("seven77", "seven77").unwrap_err();
        assert_eq!(err.to_string(), "Password must be at least 8 characters");
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        // Eight characters, more than eight bytes.
        assert!(validate_new_password("ääääääää", "ääääääää").is_ok());
        assert!(validate_new_password("äääääää", "äääääää").is_err());
    }

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_verify_against_garbage_hash_is_invalid_credentials() {
        assert!(matches!(
            verify_password("anything", "not-a-hash"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_username_rules() {
        assert_eq!(validate_username("  thandi ").unwrap(), "thandi");
        assert!(validate_username("   ").is_err());
        assert!(validate_username("two words").is_err());
        assert!(validate_username(&"u".repeat(151)).is_err());
    }

    #[test]
    fn test_user_facing_messages() {
        assert!(AuthError::UsernameTaken.is_user_facing());
        assert!(!AuthError::PasswordHash.is_user_facing());
    }
}
