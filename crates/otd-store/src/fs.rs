//! Filesystem-backed blob store.
//!
//! A bucket is a directory; each key is one file inside it. Writes go to a
//! temporary file in the same directory and are renamed into place, so a
//! reader never observes a half-written blob. Versions are BLAKE3 hashes of
//! the file contents.
//!
//! Conditional writes are serialized by an in-process lock. Two processes
//! sharing one bucket directory do not coordinate with each other.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::NamedTempFile;

use crate::blob::{validate_key, Precondition, VersionToken, VersionedBlob};
use crate::error::{StoreError, StoreResult};
use crate::traits::BlobStore;

/// Blob store rooted at a bucket directory.
#[derive(Debug)]
pub struct FsBlobStore {
    bucket_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FsBlobStore {
    /// Open an existing bucket directory.
    ///
    /// Fails with [`StoreError::Unavailable`] if the directory does not exist.
    pub fn open(bucket_dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let bucket_dir = bucket_dir.into();
        if !bucket_dir.is_dir() {
            return Err(StoreError::Unavailable(format!(
                "bucket directory {} does not exist",
                bucket_dir.display()
            )));
        }
        Ok(Self {
            bucket_dir,
            write_lock: Mutex::new(()),
        })
    }

    /// Open a bucket directory, creating it (and its parents) if needed.
    pub fn create(bucket_dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let bucket_dir = bucket_dir.into();
        std::fs::create_dir_all(&bucket_dir)?;
        tracing::debug!(dir = %bucket_dir.display(), "bucket directory ready");
        Self::open(bucket_dir)
    }

    /// The directory holding this bucket's blobs.
    pub fn bucket_dir(&self) -> &Path {
        &self.bucket_dir
    }

    fn path_for(&self, key: &str) -> StoreResult<PathBuf> {
        validate_key(key)?;
        Ok(self.bucket_dir.join(key))
    }

    fn read_file(path: &Path) -> StoreResult<Option<Vec<u8>>> {
        match std::fs::read(path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl BlobStore for FsBlobStore {
    fn get(&self, key: &str) -> StoreResult<Option<VersionedBlob>> {
        let path = self.path_for(key)?;
        Ok(Self::read_file(&path)?.map(|data| {
            let version = VersionToken::for_content(&data);
            VersionedBlob::new(data, version)
        }))
    }

    fn put(
        &self,
        key: &str,
        data: &[u8],
        precondition: Precondition,
    ) -> StoreResult<VersionToken> {
        let path = self.path_for(key)?;
        let _guard = self
            .write_lock
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("lock poisoned: {e}")))?;

        let current = Self::read_file(&path)?.map(|d| VersionToken::for_content(&d));
        if !precondition.holds(current.as_ref()) {
            tracing::debug!(key, ?precondition, "filesystem precondition failed");
            return Err(StoreError::PreconditionFailed {
                key: key.to_string(),
            });
        }

        let mut tmp = NamedTempFile::new_in(&self.bucket_dir)?;
        tmp.write_all(data)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| StoreError::Io(e.error))?;

        Ok(VersionToken::for_content(data))
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        let mut keys = Vec::new();
        for entry in std::fs::read_dir(&self.bucket_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            // Temp files from in-flight writes start with '.', which keys cannot.
            if let Some(name) = entry.file_name().to_str() {
                if validate_key(name).is_ok() {
                    keys.push(name.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}
