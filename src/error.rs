//! Error types for gitmeta-cache

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

/// Error types for cache operations
#[derive(Error, Debug)]
pub enum CacheError {
    /// I/O error while reading, writing or deleting a cache file
    #[error("Cache I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A snapshot file exists but its contents cannot be decoded
    #[error("Corrupt cache snapshot '{path}': {reason}")]
    Decode { path: PathBuf, reason: String },

    /// A snapshot could not be serialized
    #[error("Failed to encode cache snapshot: {0}")]
    Encode(String),

    /// A snapshot was written by an incompatible format version
    #[error("Cache snapshot '{path}' has format version {found} (expected {expected})")]
    FormatVersion {
        path: PathBuf,
        found: u32,
        expected: u32,
    },

    /// A byte string or hex string is not a valid object hash
    #[error("Invalid object hash: {0}")]
    InvalidHash(String),

    /// Git operation failed
    #[error("Git error: {0}")]
    Git(String),

    /// Not inside a git repository
    #[error("Not a git repository")]
    NotGitRepo,

    /// Invalid configuration provided
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CacheError {
    /// Build an I/O error tagged with the path it happened at
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CacheError::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error means the cache contents cannot be trusted
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            CacheError::Decode { .. } | CacheError::FormatVersion { .. }
        )
    }
}
