//! Status report for the `status` command (text and JSON)

use crate::cache::{FileStorage, Snapshot};
use crate::core::{CreationTimeState, ModificationTimeState, ObjectHash};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Summary of one snapshot
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SnapshotSummary {
    /// Head the snapshot was saved against, None if unknown
    pub head: Option<String>,
    pub processed_commits: usize,
    /// Only tracked by the creation-time builder
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_trees: Option<usize>,
    pub entries: usize,
}

impl SnapshotSummary {
    fn creation(snapshot: &Snapshot<CreationTimeState>) -> Self {
        Self {
            head: hex_or_none(snapshot.head),
            processed_commits: snapshot.state.processed_commits.len(),
            processed_trees: Some(snapshot.state.processed_trees.len()),
            entries: snapshot.state.ctimes.len(),
        }
    }

    fn modification(snapshot: &Snapshot<ModificationTimeState>) -> Self {
        Self {
            head: hex_or_none(snapshot.head),
            processed_commits: snapshot.state.processed_commits.len(),
            processed_trees: None,
            entries: snapshot.state.mtimes.len(),
        }
    }
}

/// What a loaded cache knows relative to the repository
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StatusReport {
    pub cache_dir: String,
    pub creation_time: SnapshotSummary,
    pub modification_time: SnapshotSummary,
    /// Head both snapshots agree on
    pub cached_head: Option<String>,
    pub repository_head: Option<String>,
    pub up_to_date: bool,
}

impl StatusReport {
    pub fn new<R>(
        cache_dir: &Path,
        storage: &FileStorage<R>,
        cached_head: ObjectHash,
        repository_head: Option<ObjectHash>,
    ) -> Self {
        let up_to_date = !cached_head.is_zero() && repository_head == Some(cached_head);
        Self {
            cache_dir: cache_dir.display().to_string(),
            creation_time: SnapshotSummary::creation(&storage.creation),
            modification_time: SnapshotSummary::modification(&storage.modification),
            cached_head: hex_or_none(cached_head),
            repository_head: repository_head.and_then(hex_or_none),
            up_to_date,
        }
    }

    /// Human-readable rendering
    pub fn write_text(&self, out: &mut dyn Write) -> std::io::Result<()> {
        writeln!(out, "Cache directory: {}", self.cache_dir)?;
        write_summary(out, "Creation times", &self.creation_time)?;
        write_summary(out, "Modification times", &self.modification_time)?;
        writeln!(out, "Cached head: {}", display_head(&self.cached_head))?;
        writeln!(out, "Repository head: {}", display_head(&self.repository_head))?;
        writeln!(
            out,
            "Status: {}",
            if self.up_to_date {
                "up to date"
            } else {
                "needs update"
            }
        )
    }

    pub fn write_json(&self, out: &mut dyn Write) -> std::io::Result<()> {
        serde_json::to_writer_pretty(&mut *out, self)?;
        writeln!(out)
    }
}

fn write_summary(
    out: &mut dyn Write,
    title: &str,
    summary: &SnapshotSummary,
) -> std::io::Result<()> {
    writeln!(out, "{}:", title)?;
    writeln!(out, "  head: {}", display_head(&summary.head))?;
    writeln!(out, "  processed commits: {}", summary.processed_commits)?;
    if let Some(trees) = summary.processed_trees {
        writeln!(out, "  processed trees: {}", trees)?;
    }
    writeln!(out, "  entries: {}", summary.entries)
}

fn display_head(head: &Option<String>) -> &str {
    head.as_deref().unwrap_or("(none)")
}

fn hex_or_none(hash: ObjectHash) -> Option<String> {
    (!hash.is_zero()).then(|| hash.to_hex())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ModificationRecord, Timestamp, HASH_LEN};

    fn h(byte: u8) -> ObjectHash {
        ObjectHash::new([byte; HASH_LEN])
    }

    fn storage() -> FileStorage<()> {
        let mut storage = FileStorage::empty(());
        storage.creation.head = h(1);
        storage.creation.state.processed_commits.insert(h(1));
        storage.creation.state.processed_trees.insert(h(2));
        storage.modification.head = h(1);
        storage.modification.state.record(ModificationRecord {
            path: "a.txt".to_string(),
            blob: h(3),
            time: Timestamp::new(0, 0).unwrap(),
        });
        storage
    }

    #[test]
    fn test_up_to_date_when_heads_match() {
        let report = StatusReport::new(Path::new("/c"), &storage(), h(1), Some(h(1)));
        assert!(report.up_to_date);
        assert_eq!(report.creation_time.processed_trees, Some(1));
        assert_eq!(report.modification_time.processed_trees, None);
        assert_eq!(report.modification_time.entries, 1);
    }

    #[test]
    fn test_zero_cached_head_is_never_up_to_date() {
        let report = StatusReport::new(Path::new("/c"), &storage(), ObjectHash::ZERO, None);
        assert!(!report.up_to_date);
        assert_eq!(report.cached_head, None);
    }

    #[test]
    fn test_text_output() {
        let report = StatusReport::new(Path::new("/c"), &storage(), h(1), Some(h(2)));
        let mut out = Vec::new();
        report.write_text(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Cache directory: /c"));
        assert!(text.contains("processed trees: 1"));
        assert!(text.contains("Status: needs update"));
    }

    #[test]
    fn test_json_output() {
        let report = StatusReport::new(Path::new("/c"), &storage(), h(1), Some(h(1)));
        let mut out = Vec::new();
        report.write_json(&mut out).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["up_to_date"], true);
        assert_eq!(value["cached_head"], h(1).to_hex());
        assert!(value["modification_time"].get("processed_trees").is_none());
    }
}
