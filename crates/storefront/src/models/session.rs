//! Session-related types.
//!
//! Types stored in the session for authentication state and one-shot
//! user-facing messages.

use serde::{Deserialize, Serialize};

use bazaar_core::{Email, Role, UserId};

use super::User;

/// Session-stored identity of the logged-in account.
///
/// Carries the role so permission checks never need a database round trip.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: UserId,
    pub username: String,
    pub email: Email,
    pub role: Role,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashLevel {
    Success,
    Warning,
    Error,
}

impl FlashLevel {
    /// CSS class used by the layout template.
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Success => "flash-success",
            Self::Warning => "flash-warning",
            Self::Error => "flash-error",
        }
    }
}

/// A message shown once on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub level: FlashLevel,
    pub text: String,
}

/// Session keys.
pub mod keys {
    /// The logged-in [`CurrentUser`](super::CurrentUser).
    pub const CURRENT_USER: &str = "current_user";

    /// Queued [`FlashMessage`](super::FlashMessage)s.
    pub const FLASH: &str = "flash";
}
