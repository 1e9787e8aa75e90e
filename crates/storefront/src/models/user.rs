//! Account domain types.

use chrono::{DateTime, Utc};

use bazaar_core::{Email, ResetTokenId, Role, UserId};

/// A marketplace account.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    /// Login name, unique across accounts.
    pub username: String,
    pub email: Email,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// A stored password reset token.
///
/// The raw token is never stored; only its digest identifies the row.
#[derive(Debug, Clone)]
pub struct ResetToken {
    pub id: ResetTokenId,
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub created_at: DateTime<Utc>,
}

impl ResetToken {
    /// A token is expired once `now` is past its expiry instant.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}
