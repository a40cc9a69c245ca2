use thiserror::Error;

use syncin_store::StoreError;

/// Errors surfaced to the view layer by client operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The operation needs a signed-in user and none is present.
    #[error("No active session")]
    Unauthenticated,

    /// Input rejected before any write was attempted.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Failure from the storage or media layer.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ClientError>;
