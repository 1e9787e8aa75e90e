//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors from registration, login and password changes.
///
/// Display strings of the user-correctable variants are shown verbatim on
/// the forms.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Enter a valid email address")]
    InvalidEmail(#[from] bazaar_core::EmailError),

    #[error("{0}")]
    InvalidUsername(String),

    /// Wrong password or unknown username; never says which.
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("{0}")]
    WeakPassword(String),

    #[error("Username already taken")]
    UsernameTaken,

    #[error("Email already in use")]
    EmailTaken,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("password hashing error")]
    PasswordHash,
}

impl AuthError {
    /// Whether the message is safe and useful to show the person filling in the form.
    #[must_use]
    pub const fn is_user_facing(&self) -> bool {
        !matches!(self, Self::Repository(_) | Self::PasswordHash)
    }
}
