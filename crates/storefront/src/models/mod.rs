//! Domain models for the storefront.
//!
//! These are validated domain objects; database row types live next to the
//! queries in [`crate::db`].

pub mod catalog;
pub mod order;
pub mod review;
pub mod session;
pub mod user;

pub use catalog::{Product, Store};
pub use order::{Order, OrderItem};
pub use review::Review;
pub use session::{CurrentUser, FlashLevel, FlashMessage, keys as session_keys};
pub use user::{ResetToken, User};
