use common::ProductId;
use thiserror::Error;

/// Errors that can occur when interacting with the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A staged product's version no longer matches the stored version.
    /// The whole commit was rejected; nothing was written.
    #[error("version conflict for product {product_id}: staged {staged}, stored {stored}")]
    VersionConflict {
        product_id: ProductId,
        staged: u64,
        stored: u64,
    },

    /// A referenced entity was missing at write time.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The storage backend failed.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
