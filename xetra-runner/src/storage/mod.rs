//! Blob storage abstraction.
//!
//! The pipeline reads source objects and writes report/ledger objects through
//! the [`BlobStore`] trait so orchestration can be tested against an in-memory
//! store and run against a directory-backed one. Keys are `/`-separated
//! relative paths; listing filters by key prefix and returns keys in
//! ascending order.

pub mod fs;
pub mod mem;

pub use fs::FsBlobStore;
pub use mem::MemBlobStore;

use thiserror::Error;

/// Structured errors for blob operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object not found: {key}")]
    NotFound { key: String },

    #[error("storage I/O error on '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("write rejected for '{key}'")]
    WriteRejected { key: String },
}

/// Minimal object-store contract consumed by the pipeline.
///
/// Listing an empty prefix match is not an error; reading an absent key is
/// (`NotFound`), and the ledger layer relies on that distinction for its
/// first-run branch.
pub trait BlobStore: Send + Sync {
    /// Keys starting with `prefix`, ascending. Empty when nothing matches.
    fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

    /// Full contents of the object at `key`.
    fn get(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Create or replace the object at `key`.
    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError>;
}
