use otd_store::StoreError;

/// Errors produced by code bank operations.
///
/// Redemption outcomes (valid, expired, invalid) are not errors; see
/// [`Redemption`](crate::Redemption).
#[derive(Debug, thiserror::Error)]
pub enum BankError {
    /// The namespace failed validation and was never looked up.
    #[error("invalid namespace {namespace:?}: {reason}")]
    InvalidNamespace { namespace: String, reason: String },

    /// Fetching the record failed for a reason other than absence.
    #[error("could not read code bank {key}: {source}")]
    StoreRead {
        key: String,
        #[source]
        source: StoreError,
    },

    /// The store rejected the write.
    #[error("could not write code bank {key}: {source}")]
    StoreWrite {
        key: String,
        #[source]
        source: StoreError,
    },

    /// The persisted record could not be decoded or violates bank invariants.
    #[error("corrupt code bank {key}: {reason}")]
    CorruptData { key: String, reason: String },

    /// The record changed between load and save.
    #[error("code bank {key} was modified concurrently")]
    Conflict { key: String },

    /// Every attempt of a load-mutate-save cycle hit a conflict.
    #[error("code bank for namespace {namespace} still contended after {attempts} attempts")]
    Contended { namespace: String, attempts: u32 },
}

impl BankError {
    /// Returns `true` if the whole load-mutate-save cycle may be retried.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Returns `true` if the error came from the caller's input rather than
    /// from the service.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidNamespace { .. })
    }
}

/// Result alias for code bank operations.
pub type BankResult<T> = Result<T, BankError>;
