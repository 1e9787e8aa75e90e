//! Business logic services for the storefront.
//!
//! Services borrow the pool (and whatever else they need) from [`AppState`]
//! for the length of one request.
//!
//! - `auth` - registration, login and password hashing
//! - `carts` - cart storage backends and cart operations
//! - `catalog` - vendor store and product management
//! - `checkout` - turning a cart into an order
//! - `email` - password reset and invoice emails
//! - `password_reset` - reset tokens
//! - `reviews` - review submission
//!
//! [`AppState`]: crate::state::AppState

pub mod auth;
pub mod carts;
pub mod catalog;
pub mod checkout;
pub mod email;
pub mod password_reset;
pub mod reviews;

pub use auth::{AuthError, AuthService, Registration};
pub use carts::{CartService, CartServiceError, CartStore, MemoryCartStore, PgCartStore};
pub use catalog::{CatalogError, CatalogService, ValidationError};
pub use checkout::{CheckoutError, CheckoutReceipt, CheckoutService};
pub use email::{EmailService, NotificationOutcome};
pub use password_reset::{PasswordResetService, ResetError, ResetRequestOutcome};
pub use reviews::{ReviewError, ReviewService};
