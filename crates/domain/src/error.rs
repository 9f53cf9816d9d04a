//! Shared error taxonomy for marketplace operations.

use thiserror::Error;

/// Errors surfaced by marketplace operations.
///
/// Business-rule violations are typed variants passed to the caller
/// unchanged. Unexpected infrastructure failures are logged with their
/// context at the service boundary and surface only as the opaque
/// [`DomainError::Internal`].
#[derive(Debug, Error)]
pub enum DomainError {
    /// An entity id did not resolve, or the entity does not belong to the
    /// caller.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The principal may not perform this operation.
    #[error("not authorized: {0}")]
    Unauthorized(&'static str),

    /// Requested quantity cannot be served from current stock.
    #[error("insufficient stock for product {name}: requested {requested}, available {available}")]
    InsufficientStock {
        name: String,
        requested: u32,
        available: u32,
    },

    /// A merged cart quantity would exceed current stock.
    #[error("requested quantity for product {name} exceeds available stock: {requested} > {available}")]
    ExceedsStock {
        name: String,
        requested: u32,
        available: u32,
    },

    /// The product's availability flag is off.
    #[error("product {name} is not available")]
    ProductUnavailable { name: String },

    /// An order must contain at least one line item.
    #[error("order contains no line items")]
    EmptyOrder,

    /// Too many order attempts inside the rolling window.
    #[error("too many order attempts, please try again later")]
    RateLimited,

    /// Malformed input.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Unexpected infrastructure failure. Details are logged where the
    /// failure is wrapped, never carried to the caller.
    #[error("internal error")]
    Internal,
}

/// Result type for marketplace operations.
pub type Result<T> = std::result::Result<T, DomainError>;
