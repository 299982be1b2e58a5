//! Error types for the Vantage resource store.

use thiserror::Error;

/// Result type alias for resource store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during resource store operations.
///
/// Absent entities are not errors: get-style operations return
/// `Ok(None)` and deletes return `Ok(false)` instead.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to connect to cluster: {0}")]
    Connect(String),

    #[error("store backend error: {0}")]
    Backend(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid request: {0}")]
    Invalid(String),

    #[error("serialization error: {0}")]
    Serialize(String),
}
