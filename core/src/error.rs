//! Error taxonomy for catalog operations.

use crate::store::StoreError;
use crate::sweet::SweetId;
use thiserror::Error;

/// Errors returned by [`crate::Catalog`] operations.
///
/// Validation always happens before the store is touched, so a
/// [`CatalogError::Validation`] guarantees nothing was mutated.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Input rejected; the message names the offending field.
    #[error("{0}")]
    Validation(String),

    /// No record with this identifier.
    #[error("sweet not found: {0}")]
    NotFound(SweetId),

    /// Purchase could not be applied.
    ///
    /// Missing records and insufficient stock are deliberately reported
    /// with the same error.
    #[error("insufficient stock or sweet not found")]
    InsufficientStockOrNotFound,

    /// Caller lacks the admin role.
    #[error("admin role required")]
    Forbidden,

    /// Backing store failed.
    #[error("store failure: {0}")]
    Store(StoreError),
}

impl From<StoreError> for CatalogError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Constraint(message) => Self::Validation(message),
            other => Self::Store(other),
        }
    }
}

/// Result alias for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;
