//! Repository handle backed by the `git` command line

use crate::core::{ObjectHash, Timestamp};
use crate::error::{CacheError, Result};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// Source of the commit the cache is keyed to
pub trait HeadSource {
    /// Hash of the commit HEAD points at. Fails for an unborn branch.
    fn head_hash(&self) -> impl Future<Output = Result<ObjectHash>> + Send;
}

/// A git work tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitRepository {
    root: PathBuf,
}

impl GitRepository {
    /// Wrap a known work-tree root without checking it.
    ///
    /// Use [`GitRepository::discover`] when `root` may be a subdirectory or
    /// may not be a repository at all; git errors then only surface on the
    /// first command run against it.
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Find the work-tree root containing `path`
    pub async fn discover(path: &Path) -> Result<Self> {
        let output = Command::new("git")
            .args(["rev-parse", "--show-toplevel"])
            .current_dir(path)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| CacheError::Git(format!("Failed to run git: {}", e)))?;

        if !output.status.success() {
            return Err(CacheError::NotGitRepo);
        }

        let root = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(Self::at(root))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Committer date of the HEAD commit, with the committer's own offset
    pub async fn head_time(&self) -> Result<Timestamp> {
        let output = Command::new("git")
            .args(["show", "-s", "--format=%cd", "--date=raw", "HEAD"])
            .current_dir(&self.root)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| CacheError::Git(format!("Failed to run git show: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CacheError::Git(format!(
                "Cannot read HEAD commit date in '{}': {}",
                self.root.display(),
                stderr.trim()
            )));
        }

        let raw = String::from_utf8_lossy(&output.stdout);
        Timestamp::parse_git(raw.trim())
            .ok_or_else(|| CacheError::Git(format!("Unexpected commit date '{}'", raw.trim())))
    }
}

impl HeadSource for GitRepository {
    async fn head_hash(&self) -> Result<ObjectHash> {
        let output = Command::new("git")
            .args(["rev-parse", "--verify", "--quiet", "HEAD^{commit}"])
            .current_dir(&self.root)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| CacheError::Git(format!("Failed to run git rev-parse: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CacheError::Git(format!(
                "Cannot resolve HEAD in '{}': {}",
                self.root.display(),
                stderr.trim()
            )));
        }

        ObjectHash::from_hex(&String::from_utf8_lossy(&output.stdout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_discover_outside_repo_fails() {
        let temp = TempDir::new().unwrap();
        // A bare temp dir may still sit below a checkout on some machines,
        // so only assert that a failure is reported as NotGitRepo.
        if let Err(e) = GitRepository::discover(temp.path()).await {
            assert!(matches!(e, CacheError::NotGitRepo));
        }
    }

    #[tokio::test]
    async fn test_head_hash_in_missing_dir_fails() {
        let repo = GitRepository::at("/nonexistent/gitmeta-cache/repo");
        assert!(repo.head_hash().await.is_err());
        assert!(repo.head_time().await.is_err());
    }

    #[test]
    fn test_root_accessor() {
        let repo = GitRepository::at("/tmp/work");
        assert_eq!(repo.root(), Path::new("/tmp/work"));
    }
}
