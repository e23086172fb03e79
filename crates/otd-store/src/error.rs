/// Errors from blob store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A conditional write found the key in a different state than expected.
    #[error("precondition failed for {key}")]
    PreconditionFailed { key: String },

    /// The key is not usable as a storage location.
    #[error("invalid key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backend is unusable (poisoned lock, missing bucket, ...).
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Returns `true` if this error is a failed write precondition.
    pub fn is_precondition_failed(&self) -> bool {
        matches!(self, Self::PreconditionFailed { .. })
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
