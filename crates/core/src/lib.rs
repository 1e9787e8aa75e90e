//! Bazaar Core - Shared domain library.
//!
//! This crate provides the types and pure domain logic used across all Bazaar
//! components:
//! - `storefront` - Multi-vendor marketplace web application and JSON API
//! - `cli` - Command-line tools for migrations and account management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. The cart aggregate and checkout settlement live here
//! so their rules can be exercised without a running database.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, emails, money, roles and ratings
//! - [`cart`] - The per-buyer cart aggregate
//! - [`checkout`] - Settlement of a cart against current product stock

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod checkout;
pub mod types;

pub use cart::{Cart, CartError, CartLine, CartLineView, CartView, ProductSnapshot};
pub use checkout::{Settlement, SettledItem, SkipReason, SkippedLine, StockLevel};
pub use types::*;
