use thiserror::Error;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A lookup expected exactly one document but found none.
    #[error("Record not found")]
    NotFound,

    /// A create hit an existing document id.
    #[error("Record already exists: {0}")]
    AlreadyExists(String),

    /// The backend rejected a write (unauthenticated or disallowed mutation).
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Backend-reported failure (network, misconfigured index, ...).
    #[error("Backend error: {0}")]
    Backend(String),

    /// A document could not be decoded into its domain model.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic I/O error (media storage).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Requested media file absent from the media store.
    #[error("Media not found: {0}")]
    MediaNotFound(String),

    #[error("Media too large: {size} bytes (max {max})")]
    MediaTooLarge { size: usize, max: usize },

    #[error("Media storage error: {0}")]
    MediaStorage(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
