//! Run configuration, deserialized from TOML.
//!
//! One config file fully describes a pipeline run: where the source and
//! target buckets live, the source/target column mappings, the ledger key,
//! and the report format. The format string is validated into the closed
//! [`FileFormat`] enum while deserializing, so an unsupported format is
//! rejected before anything runs.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use thiserror::Error;
use xetra_core::aggregate::LagReference;
use xetra_core::schema::{FileFormat, SourceColumns, TargetColumns};

/// Errors from loading or validating a config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Full pipeline configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EtlConfig {
    pub source: SourceConfig,
    pub target: TargetConfig,
    #[serde(default)]
    pub meta: MetaConfig,
}

/// Source bucket and column mapping.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    /// Directory backing the source blob store.
    pub bucket: PathBuf,
    /// Date of the earliest source data this job should ever extract.
    pub first_extract_date: NaiveDate,
    #[serde(default)]
    pub columns: SourceColumns,
}

/// Target bucket, report naming, and report shape.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    /// Directory backing the target blob store.
    pub bucket: PathBuf,
    /// Prefix of written report keys, e.g. `xetra_daily_report`.
    pub key_prefix: String,
    /// strftime pattern stamped into the report key.
    #[serde(default = "default_key_date_format")]
    pub key_date_format: String,
    /// Report serialization format (`csv` or `parquet`).
    #[serde(deserialize_with = "de_file_format")]
    pub format: FileFormat,
    #[serde(default)]
    pub columns: TargetColumns,
    /// Which previous-day price the percent change is measured against.
    #[serde(default)]
    pub lag_reference: LagReference,
}

/// Ledger location within the target bucket.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetaConfig {
    #[serde(default = "default_meta_key")]
    pub key: String,
}

impl Default for MetaConfig {
    fn default() -> Self {
        Self {
            key: default_meta_key(),
        }
    }
}

fn default_meta_key() -> String {
    "meta.csv".to_string()
}

fn default_key_date_format() -> String {
    "%Y%m%d_%H%M%S".to_string()
}

fn de_file_format<'de, D>(deserializer: D) -> Result<FileFormat, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
}

impl EtlConfig {
    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
