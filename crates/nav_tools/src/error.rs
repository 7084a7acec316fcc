//! Error types for the command-line tools.

use nav_core::error::NavError;
use thiserror::Error;

/// Result type alias using [`ToolError`].
pub type Result<T> = std::result::Result<T, ToolError>;

/// Errors raised by the tools on top of [`NavError`].
#[derive(Debug, Error)]
pub enum ToolError {
    /// World data failed to load or validate.
    #[error(transparent)]
    Nav(#[from] NavError),

    /// Failed to read or write a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Binary cache could not be encoded or decoded.
    #[error("Snapshot cache error: {0}")]
    Cache(#[from] bincode::Error),

    /// JSON output could not be produced.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Cache file was written by an incompatible version.
    #[error("Snapshot cache version mismatch: expected {expected}, found {found}")]
    CacheVersion {
        /// Version this build reads.
        expected: u32,
        /// Version found in the file.
        found: u32,
    },

    /// A named map does not exist in the snapshot.
    #[error("Unknown map: {0}")]
    UnknownMap(String),
}
