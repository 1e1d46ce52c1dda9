//! Configuration types for gitmeta-cache

use crate::cache::DEFAULT_SIZE_WARNING_BYTES;
use std::path::{Path, PathBuf};

/// Directory name used when no cache directory is configured
pub const DEFAULT_CACHE_DIR_NAME: &str = ".gitmeta-cache";

/// Configuration options for gitmeta-cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory inside the repository to operate on (default: ".")
    pub repo_dir: PathBuf,

    /// Cache directory (default: .gitmeta-cache in repo root)
    pub cache_dir: Option<PathBuf>,

    /// Snapshot size in bytes above which a warning is logged
    pub size_warning_bytes: u64,

    /// Enable debug logging
    pub verbose: bool,

    /// Print status as JSON instead of text
    pub json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repo_dir: PathBuf::from("."),
            cache_dir: None,
            size_warning_bytes: DEFAULT_SIZE_WARNING_BYTES,
            verbose: false,
            json: false,
        }
    }
}

impl Config {
    /// The cache directory to use for a repository rooted at `repo_root`.
    /// A relative `cache_dir` is taken relative to the repository root.
    pub fn resolve_cache_dir(&self, repo_root: &Path) -> PathBuf {
        match &self.cache_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => repo_root.join(dir),
            None => repo_root.join(DEFAULT_CACHE_DIR_NAME),
        }
    }
}
