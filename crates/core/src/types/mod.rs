//! Core types for Bazaar.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod money;
pub mod rating;
pub mod role;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::{format_money, round_money};
pub use rating::{Rating, RatingError};
pub use role::{Role, RoleParseError};
