//! Cache store: persists both builder snapshots and reconciles their heads

use super::codec::{self, Snapshot};
use crate::config::Config;
use crate::core::{CreationTimeState, ModificationTimeState, ObjectHash, StateExchange};
use crate::error::{CacheError, Result};
use crate::git::HeadSource;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// File holding the creation-time snapshot
pub const CREATION_SNAPSHOT_FILE: &str = "ctime-v1.bin";

/// File holding the modification-time snapshot
pub const MODIFICATION_SNAPSHOT_FILE: &str = "mtime-v1.bin";

/// Default size above which a written snapshot triggers a warning
pub const DEFAULT_SIZE_WARNING_BYTES: u64 = 64 * 1024 * 1024;

/// Repository handle plus the builder states loaded for it
#[derive(Debug, Clone)]
pub struct FileStorage<R> {
    pub repo: R,
    pub creation: Snapshot<CreationTimeState>,
    pub modification: Snapshot<ModificationTimeState>,
}

impl<R> FileStorage<R> {
    /// Empty state for a repository that has never been cached
    pub fn empty(repo: R) -> Self {
        Self {
            repo,
            creation: Snapshot::default(),
            modification: Snapshot::default(),
        }
    }

    /// Take over the current progress of both traversal engines
    pub fn capture<C, M>(&mut self, creation: &C, modification: &M)
    where
        C: StateExchange<State = CreationTimeState>,
        M: StateExchange<State = ModificationTimeState>,
    {
        self.creation.state = creation.export_state();
        self.modification.state = modification.export_state();
    }

    /// Hand the loaded progress to both traversal engines
    pub fn restore<C, M>(&self, creation: &mut C, modification: &mut M)
    where
        C: StateExchange<State = CreationTimeState>,
        M: StateExchange<State = ModificationTimeState>,
    {
        creation.import_state(self.creation.state.clone());
        modification.import_state(self.modification.state.clone());
    }
}

/// Owner of a cache directory holding one snapshot per builder kind.
///
/// The store assumes a single owner per directory; callers serialize
/// `load`, `save` and `clear`.
#[derive(Debug)]
pub struct CacheStore {
    cache_dir: PathBuf,
    size_warning_bytes: u64,
    /// Head both snapshots agree on, zero when unknown
    last_head: ObjectHash,
}

impl CacheStore {
    /// Create a store over `cache_dir` with the default size warning.
    ///
    /// Nothing is touched on disk until the first `load`, `save` or `clear`.
    ///
    /// # Arguments
    ///
    /// * `cache_dir` - Directory holding the two snapshot files. It need not
    ///   exist yet; `save` creates it.
    ///
    /// # Returns
    ///
    /// A store whose tracked head is zero
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            size_warning_bytes: DEFAULT_SIZE_WARNING_BYTES,
            last_head: ObjectHash::ZERO,
        }
    }

    /// Create a store for the cache directory `config` resolves to
    pub fn from_config(config: &Config, repo_root: &Path) -> Self {
        Self::new(config.resolve_cache_dir(repo_root))
            .with_size_warning(config.size_warning_bytes)
    }

    /// Warn when a written snapshot exceeds `bytes`
    pub fn with_size_warning(mut self, bytes: u64) -> Self {
        self.size_warning_bytes = bytes;
        self
    }

    /// Directory the snapshots live in
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Head the cache is known to be caught up to, zero if unknown
    pub fn last_head(&self) -> ObjectHash {
        self.last_head
    }

    /// Location of the creation-time snapshot, whether or not it exists
    pub fn creation_path(&self) -> PathBuf {
        self.cache_dir.join(CREATION_SNAPSHOT_FILE)
    }

    /// Location of the modification-time snapshot, whether or not it exists
    pub fn modification_path(&self) -> PathBuf {
        self.cache_dir.join(MODIFICATION_SNAPSHOT_FILE)
    }

    /// Delete both snapshots. Never fails: missing files are fine and other
    /// errors are only logged.
    ///
    /// The tracked head is left alone; the next [`CacheStore::load`] sees an
    /// empty directory and resets it.
    pub async fn clear(&mut self) {
        for path in [self.creation_path(), self.modification_path()] {
            match fs::remove_file(&path).await {
                Ok(()) => debug!(path = %path.display(), "Removed cache snapshot"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to remove cache snapshot"
                ),
            }
        }
    }

    /// Read both snapshots and reconcile their heads.
    ///
    /// A missing snapshot loads as empty state with a zero head. A snapshot
    /// that exists but cannot be decoded is an error. Both files are always
    /// read before any error is returned.
    ///
    /// # Arguments
    ///
    /// * `repo` - Repository handle, handed back inside the result
    ///
    /// # Returns
    ///
    /// Both builder states with their recorded heads. [`CacheStore::last_head`]
    /// is set to the common head, or zero if the heads differ or loading
    /// failed.
    pub async fn load<R: HeadSource>(&mut self, repo: R) -> Result<FileStorage<R>> {
        let creation_path = self.creation_path();
        let modification_path = self.modification_path();

        let creation = read_snapshot(&creation_path, codec::decode_creation).await;
        let modification = read_snapshot(&modification_path, codec::decode_modification).await;

        let (creation, modification) = match (creation, modification) {
            (Ok(c), Ok(m)) => (c, m),
            (Err(e), Ok(_)) | (Ok(_), Err(e)) => {
                self.last_head = ObjectHash::ZERO;
                return Err(e);
            }
            (Err(e), Err(second)) => {
                warn!(error = %second, "Modification-time snapshot also failed to load");
                self.last_head = ObjectHash::ZERO;
                return Err(e);
            }
        };

        self.last_head = if creation.head == modification.head {
            creation.head
        } else {
            debug!(
                creation_head = %creation.head,
                modification_head = %modification.head,
                "Snapshot heads disagree"
            );
            ObjectHash::ZERO
        };

        debug!(
            head = %self.last_head,
            blobs = creation.state.ctimes.len(),
            paths = modification.state.mtimes.len(),
            "Loaded cache"
        );

        Ok(FileStorage {
            repo,
            creation,
            modification,
        })
    }

    /// Persist both builder states tagged with the repository's current head.
    ///
    /// An unresolvable head (e.g. no commits yet) is saved as zero. Any I/O
    /// or encoding failure is returned rather than raised.
    ///
    /// # Arguments
    ///
    /// * `storage` - States to write; its `repo` supplies the head
    ///
    /// # Returns
    ///
    /// `Ok(())` once both snapshots are written, after which
    /// [`CacheStore::last_head`] is the head they were tagged with. On error
    /// the files may be half written and the tracked head is zero.
    pub async fn save<R: HeadSource>(&mut self, storage: &FileStorage<R>) -> Result<()> {
        let head = match storage.repo.head_hash().await {
            Ok(head) => head,
            Err(e) => {
                debug!(error = %e, "No resolvable HEAD, saving cache against zero head");
                ObjectHash::ZERO
            }
        };

        match self.write_snapshots(head, storage).await {
            Ok(()) => {
                self.last_head = head;
                debug!(head = %head, "Saved cache");
                Ok(())
            }
            Err(e) => {
                self.last_head = ObjectHash::ZERO;
                Err(e)
            }
        }
    }

    async fn write_snapshots<R>(&self, head: ObjectHash, storage: &FileStorage<R>) -> Result<()> {
        fs::create_dir_all(&self.cache_dir)
            .await
            .map_err(|e| CacheError::io(&self.cache_dir, e))?;

        let bytes = codec::encode_creation(head, &storage.creation.state)?;
        self.write_snapshot(&self.creation_path(), &bytes).await?;

        let bytes = codec::encode_modification(head, &storage.modification.state)?;
        self.write_snapshot(&self.modification_path(), &bytes).await?;

        Ok(())
    }

    async fn write_snapshot(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        fs::write(path, bytes)
            .await
            .map_err(|e| CacheError::io(path, e))?;

        let size = bytes.len() as u64;
        if size > self.size_warning_bytes {
            warn!(
                path = %path.display(),
                size_bytes = size,
                limit_bytes = self.size_warning_bytes,
                "Cache snapshot is unusually large"
            );
        }
        Ok(())
    }
}

async fn read_snapshot<S: Default>(
    path: &Path,
    decode: fn(&Path, &[u8]) -> Result<Snapshot<S>>,
) -> Result<Snapshot<S>> {
    match fs::read(path).await {
        Ok(bytes) => decode(path, &bytes),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "No cache snapshot, starting empty");
            Ok(Snapshot::default())
        }
        Err(e) => Err(CacheError::io(path, e)),
    }
}
