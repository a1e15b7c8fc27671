//! Error types for bundle parsing.
//!
//! Only conditions that make the whole bundle unusable are errors. Optional
//! sources that fail to parse degrade to absence and never surface here.

use thiserror::Error;

/// Fatal failures while parsing a bundle.
#[derive(Debug, Error)]
pub enum BundleError {
    /// The archive failed its integrity check or could not be read.
    #[error("corrupt archive: {0}")]
    CorruptArchive(String),

    /// The archive holds no top-level run directory.
    #[error("archive contains no run directories")]
    EmptyArchive,

    /// A required entry is absent from the archive.
    #[error("missing archive entry: {0}")]
    MissingEntry(String),

    /// A required JSON entry could not be decoded.
    #[error("invalid JSON in '{path}': {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// Reading bundle bytes from storage failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for results with [`BundleError`].
pub type Result<T> = std::result::Result<T, BundleError>;
