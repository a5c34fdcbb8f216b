//! Xetra Runner — orchestration and I/O around `xetra-core`.
//!
//! This crate wires the pure core algorithms to the outside world:
//! - Blob storage (filesystem-backed and in-memory stores)
//! - Table codecs (source CSV decoding, CSV/Parquet report writing)
//! - Ledger persistence (the processed-dates meta file)
//! - The extract-transform-load-commit pipeline
//! - TOML run configuration

pub mod config;
pub mod ledger;
pub mod pipeline;
pub mod storage;
pub mod tables;

pub use config::{ConfigError, EtlConfig, MetaConfig, SourceConfig, TargetConfig};
pub use ledger::LedgerError;
pub use pipeline::{Pipeline, PipelineError, RunSummary};
pub use storage::{BlobStore, FsBlobStore, MemBlobStore, StorageError};
pub use tables::TableError;

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn stores_are_send_sync() {
        assert_send::<FsBlobStore>();
        assert_sync::<FsBlobStore>();
        assert_send::<MemBlobStore>();
        assert_sync::<MemBlobStore>();
    }

    #[test]
    fn config_is_send_sync() {
        assert_send::<EtlConfig>();
        assert_sync::<EtlConfig>();
    }
}
