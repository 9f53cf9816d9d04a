//! Cart aggregate: a per-user collection of product lines.
//!
//! A cart holds at most one line per product; adding a product that is
//! already present merges into the existing line instead of creating a
//! duplicate. Lines carry only their cart's id as a plain foreign key,
//! never a back-pointer.

use chrono::{DateTime, Utc};
use common::{CartId, LineId, ProductId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// A single product entry in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Line identifier, referenced by update/remove operations.
    pub id: LineId,

    /// Owning cart's identifier.
    pub cart_id: CartId,

    /// The product this line holds.
    pub product_id: ProductId,

    /// Units of the product, always at least 1 once persisted.
    pub quantity: u32,
}

/// A user's shopping cart.
///
/// One cart per user, created lazily on first item add and cleared (not
/// deleted) by checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    id: CartId,
    user_id: UserId,
    lines: Vec<CartLine>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Cart {
    /// Creates an empty cart for a user.
    pub fn new(user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id: CartId::new(),
            user_id,
            lines: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the cart ID.
    pub fn id(&self) -> CartId {
        self.id
    }

    /// Returns the owning user's ID.
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the cart's lines.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Returns true if the cart holds no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Returns the number of lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Returns the creation timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last-update timestamp.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Looks up a line by id. A line id belonging to another user's cart is
    /// simply absent here, so ownership falls out of membership.
    pub fn line(&self, line_id: LineId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.id == line_id)
    }

    /// Looks up the line holding a given product, if any.
    pub fn line_for_product(&self, product_id: ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.product_id == product_id)
    }

    /// Returns the quantity the cart would hold for `product_id` after
    /// adding `quantity` more units.
    pub fn merged_quantity(&self, product_id: ProductId, quantity: u32) -> u32 {
        self.line_for_product(product_id)
            .map(|line| line.quantity)
            .unwrap_or(0)
            + quantity
    }

    /// Adds `quantity` units of a product, merging into an existing line
    /// when the product is already present. The upsert mutates the line in
    /// place, so no intermediate state with two lines for one product ever
    /// exists. Returns the resulting line quantity.
    pub fn add(&mut self, product_id: ProductId, quantity: u32) -> u32 {
        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product_id) {
            line.quantity += quantity;
            line.quantity
        } else {
            self.lines.push(CartLine {
                id: LineId::new(),
                cart_id: self.id,
                product_id,
                quantity,
            });
            quantity
        }
    }

    /// Sets a line's quantity; zero removes the line entirely.
    ///
    /// Fails `NotFound` when the line is not part of this cart.
    pub fn set_quantity(&mut self, line_id: LineId, quantity: u32) -> Result<(), DomainError> {
        let index = self
            .lines
            .iter()
            .position(|line| line.id == line_id)
            .ok_or(DomainError::NotFound {
                entity: "cart item",
                id: line_id.to_string(),
            })?;

        if quantity == 0 {
            self.lines.remove(index);
        } else {
            self.lines[index].quantity = quantity;
        }
        Ok(())
    }

    /// Removes a line. Fails `NotFound` when the line is not part of this
    /// cart; removal of a foreign or missing line is never a silent no-op.
    pub fn remove(&mut self, line_id: LineId) -> Result<(), DomainError> {
        let index = self
            .lines
            .iter()
            .position(|line| line.id == line_id)
            .ok_or(DomainError::NotFound {
                entity: "cart item",
                id: line_id.to_string(),
            })?;
        self.lines.remove(index);
        Ok(())
    }

    /// Deletes every line. Succeeds on an already-empty cart.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Refreshes the last-update timestamp.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}
