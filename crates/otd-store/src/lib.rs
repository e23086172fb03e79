//! Versioned blob storage for the one-time download service.
//!
//! This crate is the durable layer underneath the code bank: a flat
//! key/value store whose reads return a [`VersionToken`] and whose writes can
//! be made conditional on that token. Conditional writes are what turn the
//! code bank's read-modify-write cycle into a compare-and-swap.
//!
//! # Storage Backends
//!
//! All backends implement the [`BlobStore`] trait:
//!
//! - [`InMemoryBlobStore`] -- `HashMap`-based store for tests and embedding
//! - [`FsBlobStore`] -- one directory per bucket, one file per key
//!
//! # Design Rules
//!
//! 1. The store never interprets blob contents.
//! 2. A [`Precondition`] is checked and the write applied as one atomic step.
//! 3. Keys are flat names; see [`validate_key`].
//! 4. All I/O errors are propagated, never silently ignored.

pub mod blob;
pub mod error;
pub mod fs;
pub mod memory;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use blob::{validate_key, Precondition, VersionToken, VersionedBlob};
pub use error::{StoreError, StoreResult};
pub use fs::FsBlobStore;
pub use memory::InMemoryBlobStore;
pub use traits::BlobStore;
