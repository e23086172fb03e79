use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::blob::{validate_key, Precondition, VersionToken, VersionedBlob};
use crate::error::{StoreError, StoreResult};
use crate::traits::BlobStore;

/// In-memory, HashMap-based blob store.
///
/// Intended for tests and single-process deployments. Versions are taken
/// from a store-wide generation counter, so every write yields a fresh token
/// even when the bytes are unchanged.
pub struct InMemoryBlobStore {
    inner: RwLock<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    blobs: HashMap<String, Entry>,
    generation: u64,
}

struct Entry {
    data: Vec<u8>,
    version: VersionToken,
}

impl InMemoryBlobStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryState::default()),
        }
    }

    /// Number of blobs currently stored.
    pub fn len(&self) -> usize {
        self.read_state().map(|s| s.blobs.len()).unwrap_or(0)
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of successful writes since creation.
    pub fn generation(&self) -> u64 {
        self.read_state().map(|s| s.generation).unwrap_or(0)
    }

    fn read_state(&self) -> StoreResult<RwLockReadGuard<'_, MemoryState>> {
        self.inner
            .read()
            .map_err(|e| StoreError::Unavailable(format!("lock poisoned: {e}")))
    }

    fn write_state(&self) -> StoreResult<RwLockWriteGuard<'_, MemoryState>> {
        self.inner
            .write()
            .map_err(|e| StoreError::Unavailable(format!("lock poisoned: {e}")))
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BlobStore for InMemoryBlobStore {
    fn get(&self, key: &str) -> StoreResult<Option<VersionedBlob>> {
        let state = self.read_state()?;
        Ok(state
            .blobs
            .get(key)
            .map(|e| VersionedBlob::new(e.data.clone(), e.version.clone())))
    }

    fn put(
        &self,
        key: &str,
        data: &[u8],
        precondition: Precondition,
    ) -> StoreResult<VersionToken> {
        validate_key(key)?;
        let mut state = self.write_state()?;

        let current = state.blobs.get(key).map(|e| &e.version);
        if !precondition.holds(current) {
            tracing::debug!(key, ?precondition, "in-memory precondition failed");
            return Err(StoreError::PreconditionFailed {
                key: key.to_string(),
            });
        }

        state.generation += 1;
        let version = VersionToken::new(format!("g{}", state.generation));
        state.blobs.insert(
            key.to_string(),
            Entry {
                data: data.to_vec(),
                version: version.clone(),
            },
        );
        Ok(version)
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        let state = self.read_state()?;
        let mut keys: Vec<String> = state.blobs.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

impl std::fmt::Debug for InMemoryBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBlobStore")
            .field("blob_count", &self.len())
            .field("generation", &self.generation())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // Core get / put
    // -----------------------------------------------------------------------

    #[test]
    fn put_and_get() {
        let store = InMemoryBlobStore::new();
        let v = store.put("a", b"hello", Precondition::None).unwrap();

        let blob = store.get("a").unwrap().expect("should exist");
        assert_eq!(blob.data, b"hello");
        assert_eq!(blob.version, v);
    }

    #[test]
    fn get_missing_returns_none() {
        let store = InMemoryBlobStore::new();
        assert!(store.get("missing").unwrap().is_none());
    }

    #[test]
    fn every_write_gets_a_fresh_version() {
        let store = InMemoryBlobStore::new();
        let v1 = store.put("a", b"same", Precondition::None).unwrap();
        let v2 = store.put("a", b"same", Precondition::None).unwrap();
        assert_ne!(v1, v2);
        assert_eq!(store.generation(), 2);
    }

    #[test]
    fn invalid_key_rejected() {
        let store = InMemoryBlobStore::new();
        let err = store.put("a/b", b"x", Precondition::None).unwrap_err();
        assert!(matches!(err, StoreError::InvalidKey { .. }));
        assert!(store.is_empty());
    }

    // -----------------------------------------------------------------------
    // Preconditions
    // -----------------------------------------------------------------------

    #[test]
    fn create_only_fails_when_present() {
        let store = InMemoryBlobStore::new();
        store.put("a", b"1", Precondition::DoesNotExist).unwrap();

        let err = store.put("a", b"2", Precondition::DoesNotExist).unwrap_err();
        assert!(err.is_precondition_failed());
        assert_eq!(store.get("a").unwrap().unwrap().data, b"1");
    }

    #[test]
    fn matches_succeeds_on_current_version() {
        let store = InMemoryBlobStore::new();
        let v1 = store.put("a", b"1", Precondition::DoesNotExist).unwrap();
        let v2 = store.put("a", b"2", Precondition::Matches(v1)).unwrap();
        let blob = store.get("a").unwrap().unwrap();
        assert_eq!(blob.data, b"2");
        assert_eq!(blob.version, v2);
    }

    #[test]
    fn stale_token_is_rejected() {
        let store = InMemoryBlobStore::new();
        let v1 = store.put("a", b"1", Precondition::None).unwrap();
        store.put("a", b"2", Precondition::Matches(v1.clone())).unwrap();

        let err = store.put("a", b"3", Precondition::Matches(v1)).unwrap_err();
        assert!(err.is_precondition_failed());
        assert_eq!(store.get("a").unwrap().unwrap().data, b"2");
    }

    #[test]
    fn matches_on_missing_key_fails() {
        let store = InMemoryBlobStore::new();
        let err = store
            .put("a", b"1", Precondition::Matches(VersionToken::new("g1")))
            .unwrap_err();
        assert!(err.is_precondition_failed());
    }

    // -----------------------------------------------------------------------
    // Listing
    // -----------------------------------------------------------------------

    #[test]
    fn keys_are_sorted() {
        let store = InMemoryBlobStore::new();
        for k in ["c", "a", "b"] {
            store.put(k, b"x", Precondition::None).unwrap();
        }
        assert_eq!(store.keys().unwrap(), vec!["a", "b", "c"]);
    }

    // -----------------------------------------------------------------------
    // Concurrency
    // -----------------------------------------------------------------------

    #[test]
    fn racing_conditional_writes_have_one_winner() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(InMemoryBlobStore::new());
        let base = store.put("k", b"base", Precondition::None).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                let base = base.clone();
                thread::spawn(move || {
                    store
                        .put("k", format!("w{i}").as_bytes(), Precondition::Matches(base))
                        .is_ok()
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().expect("thread should not panic"))
            .filter(|ok| *ok)
            .count();
        assert_eq!(winners, 1);
    }

    #[test]
    fn debug_format() {
        let store = InMemoryBlobStore::new();
        store.put("x", b"x", Precondition::None).unwrap();
        let debug = format!("{store:?}");
        assert!(debug.contains("InMemoryBlobStore"));
        assert!(debug.contains("blob_count"));
    }
}
