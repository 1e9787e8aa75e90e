//! Account management commands.
//!
//! # Usage
//!
//! ```bash
//! BAZAAR_NEW_USER_PASSWORD='...' bazaar user create -u thandi -e thandi@example.com -r vendor
//! ```
//!
//! The password is read from the environment so it never lands in shell
//! history. It goes through the same checks as the registration form.

use bazaar_core::Role;
use bazaar_storefront::services::{AuthError, AuthService, Registration};

use super::{CommandError, connect};

/// Environment variable holding the new account's password.
pub const PASSWORD_ENV: &str = "BAZAAR_NEW_USER_PASSWORD";

/// Create an account with the given role.
///
/// # Returns
///
/// The ID of the created account.
pub async fn create(username: &str, email: &str, role: &str) -> Result<i32, CommandError> {
    let role: Role = role.parse().map_err(|_| {
        CommandError::Invalid(format!("Invalid role: {role}. Valid roles: vendor, buyer"))
    })?;

    let pool = connect().await?;
    let password =
        std::env::var(PASSWORD_ENV).map_err(|_| CommandError::MissingEnvVar(PASSWORD_ENV))?;

    let user = AuthService::new(&pool)
        .register(Registration {
            username,
            email,
            password: &password,
            confirm_password: &password,
            role,
        })
        .await
        .map_err(|e| match e {
            AuthError::Repository(e) => CommandError::Repository(e),
            other => CommandError::Invalid(other.to_string()),
        })?;

    tracing::info!(
        "Account created successfully! ID: {}, Username: {}, Role: {}",
        user.id,
        user.username,
        user.role
    );
    Ok(user.id.as_i32())
}
