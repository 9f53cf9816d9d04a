//! Product entity and stock reservation.

use chrono::{DateTime, Utc};
use common::{Money, ProductId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// A sellable product owned by a seller.
///
/// Stock is a `u32`, so the `stock >= 0` invariant cannot be violated by
/// construction; every draw-down goes through [`Product::reserve`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    seller_id: UserId,
    name: String,
    price: Money,
    stock: u32,
    available: bool,
    discount_percent: u8,
    /// Optimistic-concurrency token, bumped by the store on every write.
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Product {
    /// Creates a new available product with no discount.
    ///
    /// Fails `Validation` unless the price is positive and the name is
    /// non-blank.
    pub fn new(
        id: ProductId,
        seller_id: UserId,
        name: impl Into<String>,
        price: Money,
        stock: u32,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::Validation(
                "product name must not be blank".to_string(),
            ));
        }
        if !price.is_positive() {
            return Err(DomainError::Validation(format!(
                "product price must be positive, got {price}"
            )));
        }

        Ok(Self {
            id,
            seller_id,
            name,
            price,
            stock,
            available: true,
            discount_percent: 0,
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Sets the availability flag.
    pub fn with_availability(mut self, available: bool) -> Self {
        self.available = available;
        self
    }

    /// Sets the advertised discount percentage.
    pub fn with_discount_percent(mut self, discount_percent: u8) -> Self {
        self.discount_percent = discount_percent;
        self
    }

    /// Returns the product ID.
    pub fn id(&self) -> ProductId {
        self.id
    }

    /// Returns the owning seller's ID.
    pub fn seller_id(&self) -> UserId {
        self.seller_id
    }

    /// Returns the product name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the current unit price.
    pub fn price(&self) -> Money {
        self.price
    }

    /// Returns the units currently in stock.
    pub fn stock(&self) -> u32 {
        self.stock
    }

    /// Returns true if the product is listed as available.
    pub fn is_available(&self) -> bool {
        self.available
    }

    /// Returns the advertised discount percentage.
    pub fn discount_percent(&self) -> u8 {
        self.discount_percent
    }

    /// Returns the optimistic-concurrency version.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns the creation timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last-update timestamp.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Draws `quantity` units out of stock.
    ///
    /// Fails `ProductUnavailable` when the availability flag is off, and
    /// `InsufficientStock` when the quantity is zero or exceeds current
    /// stock.
    pub fn reserve(&mut self, quantity: u32) -> Result<(), DomainError> {
        if !self.available {
            return Err(DomainError::ProductUnavailable {
                name: self.name.clone(),
            });
        }
        if quantity == 0 || quantity > self.stock {
            return Err(DomainError::InsufficientStock {
                name: self.name.clone(),
                requested: quantity,
                available: self.stock,
            });
        }
        self.stock -= quantity;
        Ok(())
    }

    /// Advances the version token. Called by the store on every write.
    pub fn bump_version(&mut self) {
        self.version += 1;
    }

    /// Refreshes the last-update timestamp.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget(stock: u32) -> Product {
        Product::new(
            ProductId::new(),
            UserId::new(),
            "Widget",
            Money::from_cents(1000),
            stock,
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn new_product_is_available_with_version_zero() {
        let product = widget(5);
        assert!(product.is_available());
        assert_eq!(product.version(), 0);
        assert_eq!(product.discount_percent(), 0);
    }

    #[test]
    fn zero_price_is_rejected() {
        let result = Product::new(
            ProductId::new(),
            UserId::new(),
            "Freebie",
            Money::zero(),
            5,
            Utc::now(),
        );
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn blank_name_is_rejected() {
        let result = Product::new(
            ProductId::new(),
            UserId::new(),
            "  ",
            Money::from_cents(100),
            5,
            Utc::now(),
        );
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn reserve_decrements_stock() {
        let mut product = widget(10);
        product.reserve(3).unwrap();
        assert_eq!(product.stock(), 7);
        product.reserve(7).unwrap();
        assert_eq!(product.stock(), 0);
    }

    #[test]
    fn reserve_more_than_stock_fails() {
        let mut product = widget(2);
        let result = product.reserve(3);
        assert!(matches!(
            result,
            Err(DomainError::InsufficientStock {
                requested: 3,
                available: 2,
                ..
            })
        ));
        assert_eq!(product.stock(), 2);
    }

    #[test]
    fn reserve_zero_fails() {
        let mut product = widget(2);
        assert!(matches!(
            product.reserve(0),
            Err(DomainError::InsufficientStock { .. })
        ));
    }

    #[test]
    fn reserve_unavailable_product_fails() {
        let mut product = widget(10).with_availability(false);
        assert!(matches!(
            product.reserve(1),
            Err(DomainError::ProductUnavailable { .. })
        ));
        assert_eq!(product.stock(), 10);
    }

    #[test]
    fn bump_version_advances() {
        let mut product = widget(1);
        product.bump_version();
        product.bump_version();
        assert_eq!(product.version(), 2);
    }
}
