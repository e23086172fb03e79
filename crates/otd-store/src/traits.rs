use crate::blob::{Precondition, VersionToken, VersionedBlob};
use crate::error::StoreResult;

/// Versioned key/value blob store.
///
/// All implementations must satisfy these invariants:
/// - The version changes whenever the stored bytes change, so a token
///   observed by a read identifies the state that read saw.
/// - A conditional write checks its [`Precondition`] and applies the new
///   bytes as one atomic step; two writers holding the same token cannot
///   both succeed.
/// - The store never interprets blob contents.
/// - All I/O errors are propagated, never silently ignored.
pub trait BlobStore: Send + Sync {
    /// Read a blob and its current version.
    ///
    /// Returns `Ok(None)` if the key does not exist.
    fn get(&self, key: &str) -> StoreResult<Option<VersionedBlob>>;

    /// Write a blob if `precondition` holds and return the new version.
    ///
    /// Returns [`StoreError::PreconditionFailed`](crate::StoreError::PreconditionFailed)
    /// if the key is not in the expected state.
    fn put(&self, key: &str, data: &[u8], precondition: Precondition)
        -> StoreResult<VersionToken>;

    /// List all keys, sorted.
    fn keys(&self) -> StoreResult<Vec<String>>;
}
