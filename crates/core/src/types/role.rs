//! Account roles.

use serde::{Deserialize, Serialize};

/// What an account is allowed to do in the marketplace.
///
/// Every account has exactly one role, chosen at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "account_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Manages stores and their products.
    Vendor,
    /// Purchases products and writes reviews.
    Buyer,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Vendor => "vendor",
            Self::Buyer => "buyer",
        }
    }

    #[must_use]
    pub const fn is_vendor(self) -> bool {
        matches!(self, Self::Vendor)
    }

    #[must_use]
    pub const fn is_buyer(self) -> bool {
        matches!(self, Self::Buyer)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown account type: {0}")]
pub struct RoleParseError(pub String);

impl std::str::FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vendor" => Ok(Self::Vendor),
            "buyer" => Ok(Self::Buyer),
            other => Err(RoleParseError(other.to_owned())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roles() {
        assert_eq!("vendor".parse::<Role>().unwrap(), Role::Vendor);
        assert_eq!(" Buyer ".parse::<Role>().unwrap(), Role::Buyer);
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_serde_snake_case() {
        assert_eq!(serde_json::to_string(&Role::Vendor).unwrap(), "\"vendor\"");
        let role: Role = serde_json::from_str("\"buyer\"").unwrap();
        assert!(role.is_buyer());
    }
}
