//! Error types for bundle storage and configuration.

use hwgrid_bundle::BundleError;
use thiserror::Error;

/// Errors that can occur while storing, loading or configuring.
#[derive(Debug, Error)]
pub enum StoreError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization failure (index or cached report).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The stored archive could not be parsed.
    #[error(transparent)]
    Bundle(#[from] BundleError),

    /// No stored bundle has this identifier.
    #[error("bundle not found: {0}")]
    BundleNotFound(String),

    /// A bundle with the same main run was already ingested.
    #[error("bundle already exists: {0}")]
    AlreadyExists(String),

    /// The bundle lacks the system information needed to name it.
    #[error("cannot identify bundle: {0}")]
    Unidentified(String),

    /// Requested archive entry is not present in the stored bundle.
    #[error("no entry '{path}' in bundle {id}")]
    EntryNotFound { id: String, path: String },

    /// Writing an extracted archive failed.
    #[error("archive error: {0}")]
    Archive(String),

    /// Configuration failed validation.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

/// Convenience alias for results with [`StoreError`].
pub type Result<T> = std::result::Result<T, StoreError>;
