//! Domain model for the marketplace order engine.
//!
//! This crate provides the core domain types:
//! - Product entity with stock reservation
//! - Cart aggregate with merge-on-add line semantics
//! - Order aggregate with frozen line prices and the order status machine
//! - Principals, roles, and per-operation authorization predicates
//! - The shared error taxonomy surfaced by every marketplace operation

pub mod auth;
pub mod cart;
pub mod error;
pub mod order;
pub mod product;

pub use auth::{Principal, Role};
pub use cart::{Cart, CartLine};
pub use error::{DomainError, Result};
pub use order::{Order, OrderLine, OrderStatus, PaymentMethod};
pub use product::Product;
