//! Vendor catalog management: stores and products.
//!
//! Input is validated here so the HTML forms and the JSON API accept exactly
//! the same things. Every mutation is scoped to the acting vendor.

use rust_decimal::Decimal;
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use bazaar_core::{ProductId, StoreId, UserId};

use crate::db::{ProductInput, ProductRepository, RepositoryError, StoreInput, StoreRepository};
use crate::models::{Product, Store};

const MAX_NAME_LENGTH: usize = 255;

/// Largest price accepted, matching `NUMERIC(10, 2)`.
const MAX_PRICE: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Name is required")]
    MissingName,

    #[error("Name must be at most {MAX_NAME_LENGTH} characters")]
    NameTooLong,

    #[error("Enter a valid price")]
    InvalidPrice,

    #[error("Price cannot be negative")]
    NegativePrice,

    #[error("Enter a whole number of units in stock")]
    InvalidStock,

    #[error("Stock cannot be negative")]
    NegativeStock,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("Store not found")]
    StoreNotFound,

    #[error("Product not found")]
    ProductNotFound,

    /// The store exists but belongs to another vendor.
    #[error("You do not own this store")]
    NotOwner,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

fn validate_name(name: &str) -> Result<String, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::MissingName);
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::NameTooLong);
    }
    Ok(name.to_owned())
}

/// # Errors
///
/// Returns the first failing field check.
pub fn validate_store(name: &str, description: &str) -> Result<StoreInput, ValidationError> {
    Ok(StoreInput {
        name: validate_name(name)?,
        description: description.trim().to_owned(),
    })
}

/// Parse a price as typed into a form, e.g. `"10"` or `"7.50"`.
///
/// # Errors
///
/// Returns `InvalidPrice` for non-numbers, more than two decimal places or
/// values too large to store, and `NegativePrice` below zero.
pub fn parse_price(raw: &str) -> Result<Decimal, ValidationError> {
    let price: Decimal = raw
        .trim()
        .parse()
        .map_err(|_| ValidationError::InvalidPrice)?;
    check_price(price)
}

fn check_price(price: Decimal) -> Result<Decimal, ValidationError> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(ValidationError::NegativePrice);
    }
    if price.normalize().scale() > 2 || price > MAX_PRICE {
        return Err(ValidationError::InvalidPrice);
    }
    let mut price = price;
    price.rescale(2);
    Ok(price)
}

fn check_stock(stock: i64) -> Result<i32, ValidationError> {
    if stock < 0 {
        return Err(ValidationError::NegativeStock);
    }
    i32::try_from(stock).map_err(|_| ValidationError::InvalidStock)
}

/// Validate product fields as submitted by a form.
///
/// # Errors
///
/// Returns the first failing field check.
pub fn validate_product_form(
    name: &str,
    description: &str,
    price: &str,
    stock: &str,
) -> Result<ProductInput, ValidationError> {
    let name = validate_name(name)?;
    let price = parse_price(price)?;
    let stock: i64 = stock
        .trim()
        .parse()
        .map_err(|_| ValidationError::InvalidStock)?;
    Ok(ProductInput {
        name,
        description: description.trim().to_owned(),
        price,
        stock: check_stock(stock)?,
    })
}

/// Validate product fields that arrived already typed (JSON).
///
/// # Errors
///
/// Returns the first failing field check.
pub fn validate_product(
    name: &str,
    description: &str,
    price: Decimal,
    stock: i64,
) -> Result<ProductInput, ValidationError> {
    Ok(ProductInput {
        name: validate_name(name)?,
        description: description.trim().to_owned(),
        price: check_price(price)?,
        stock: check_stock(stock)?,
    })
}

pub struct CatalogService<'a> {
    stores: StoreRepository<'a>,
    products: ProductRepository<'a>,
}

impl<'a> CatalogService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            stores: StoreRepository::new(pool),
            products: ProductRepository::new(pool),
        }
    }

    /// A store together with its products.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::StoreNotFound` for an unknown store.
    pub async fn store_with_products(
        &self,
        store_id: StoreId,
    ) -> Result<(Store, Vec<Product>), CatalogError> {
        let store = self
            .stores
            .get(store_id)
            .await?
            .ok_or(CatalogError::StoreNotFound)?;
        let products = self.products.list_by_store(store.id).await?;
        Ok((store, products))
    }

    /// Like [`Self::store_with_products`], but only for the store's owner.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::StoreNotFound` when the store is missing or
    /// owned by someone else.
    pub async fn owned_store_with_products(
        &self,
        store_id: StoreId,
        owner_id: UserId,
    ) -> Result<(Store, Vec<Product>), CatalogError> {
        let store = self
            .stores
            .get_owned(store_id, owner_id)
            .await?
            .ok_or(CatalogError::StoreNotFound)?;
        let products = self.products.list_by_store(store.id).await?;
        Ok((store, products))
    }

    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the insert fails.
    #[instrument(skip(self, input), fields(owner_id = %owner_id))]
    pub async fn create_store(
        &self,
        owner_id: UserId,
        input: &StoreInput,
    ) -> Result<Store, CatalogError> {
        let store = self.stores.create(owner_id, input).await?;
        tracing::info!(store_id = %store.id, "store created");
        Ok(store)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::StoreNotFound` when the store is missing or
    /// owned by someone else.
    pub async fn update_store(
        &self,
        store_id: StoreId,
        owner_id: UserId,
        input: &StoreInput,
    ) -> Result<Store, CatalogError> {
        self.stores
            .update_owned(store_id, owner_id, input)
            .await?
            .ok_or(CatalogError::StoreNotFound)
    }

    /// Delete a store and all of its products.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::StoreNotFound` when the store is missing or
    /// owned by someone else.
    #[instrument(skip(self))]
    pub async fn delete_store(&self, store_id: StoreId, owner_id: UserId) -> Result<(), CatalogError> {
        self.stores
            .delete_owned(store_id, owner_id)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => CatalogError::StoreNotFound,
                other => CatalogError::Repository(other),
            })?;
        tracing::info!("store deleted");
        Ok(())
    }

    /// Add a product to one of the vendor's stores.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::StoreNotFound` for an unknown store and
    /// `CatalogError::NotOwner` for a store owned by another vendor.
    #[instrument(skip(self, input))]
    pub async fn add_product(
        &self,
        store_id: StoreId,
        owner_id: UserId,
        input: &ProductInput,
    ) -> Result<Product, CatalogError> {
        let store = self
            .stores
            .get(store_id)
            .await?
            .ok_or(CatalogError::StoreNotFound)?;
        if store.owner_id != owner_id {
            return Err(CatalogError::NotOwner);
        }

        let product = self.products.create(store.id, input).await?;
        tracing::info!(product_id = %product.id, "product added");
        Ok(product)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::ProductNotFound` when the product is missing or
    /// its store is owned by someone else.
    pub async fn owned_product(
        &self,
        product_id: ProductId,
        owner_id: UserId,
    ) -> Result<Product, CatalogError> {
        self.products
            .get_owned(product_id, owner_id)
            .await?
            .ok_or(CatalogError::ProductNotFound)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::ProductNotFound` when the product is missing or
    /// its store is owned by someone else.
    pub async fn update_product(
        &self,
        product_id: ProductId,
        owner_id: UserId,
        input: &ProductInput,
    ) -> Result<Product, CatalogError> {
        self.products
            .update_owned(product_id, owner_id, input)
            .await?
            .ok_or(CatalogError::ProductNotFound)
    }

    /// Returns the store the product was removed from.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::ProductNotFound` when the product is missing or
    /// its store is owned by someone else.
    #[instrument(skip(self))]
    pub async fn delete_product(
        &self,
        product_id: ProductId,
        owner_id: UserId,
    ) -> Result<StoreId, CatalogError> {
        self.products
            .delete_owned(product_id, owner_id)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => CatalogError::ProductNotFound,
                other => CatalogError::Repository(other),
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_store_name_is_trimmed_and_required() {
        let input = validate_store("  Karoo Crafts ", " Handmade ").unwrap();
        assert_eq!(input.name, "Karoo Crafts");
        assert_eq!(input.description, "Handmade");

        assert_eq!(
            validate_store("   ", "x").unwrap_err(),
            ValidationError::MissingName
        );
        assert_eq!(
            validate_store(&"a".repeat(256), "").unwrap_err(),
            ValidationError::NameTooLong
        );
    }

    #[test]
    fn test_parse_price_accepts_two_decimal_places() {
        assert_eq!(parse_price("10").unwrap().to_string(), "10.00");
        assert_eq!(parse_price(" 7.5 ").unwrap().to_string(), "7.50");
        assert_eq!(parse_price("0").unwrap().to_string(), "0.00");
        assert_eq!(parse_price("7.500").unwrap().to_string(), "7.50");
    }

    #[test]
    fn test_parse_price_rejects_bad_input() {
        assert_eq!(parse_price("abc"), Err(ValidationError::InvalidPrice));
        assert_eq!(parse_price("1.999"), Err(ValidationError::InvalidPrice));
        assert_eq!(parse_price("-1"), Err(ValidationError::NegativePrice));
        assert_eq!(
            parse_price("100000000.00"),
            Err(ValidationError::InvalidPrice)
        );
        assert_eq!(parse_price("99999999.99").unwrap().to_string(), "99999999.99");
    }

    #[test]
    fn test_product_form_validation() {
        let input = validate_product_form("Rooibos", "Loose leaf", "10.00", "5").unwrap();
        assert_eq!(input.price, Decimal::new(1000, 2));
        assert_eq!(input.stock, 5);

        assert_eq!(
            validate_product_form("Rooibos", "", "10", "five").unwrap_err(),
            ValidationError::InvalidStock
        );
        assert_eq!(
            validate_product_form("Rooibos", "", "10", "-1").unwrap_err(),
            ValidationError::NegativeStock
        );
        assert_eq!(
            validate_product_form("", "", "10", "1").unwrap_err(),
            ValidationError::MissingName
        );
    }

    #[test]
    fn test_typed_product_validation() {
        let input = validate_product("Rusks", "", Decimal::new(75, 1), 3).unwrap();
        assert_eq!(input.price.to_string(), "7.50");

        assert_eq!(
            validate_product("Rusks", "", Decimal::new(-1, 0), 3).unwrap_err(),
            ValidationError::NegativePrice
        );
        assert_eq!(
            validate_product("Rusks", "", Decimal::ONE, i64::from(i32::MAX) + 1).unwrap_err(),
            ValidationError::InvalidStock
        );
    }
}
