//! On-disk snapshot encoding
//!
//! Snapshots are bincode-encoded serde structs. Each file starts with a
//! `u32` format version followed by the head hash, the processed object
//! lists and the map entries. Hashes travel as raw bytes; sets are written
//! as sorted lists so identical state always produces identical bytes.

use crate::core::{
    CreationTimeState, ModificationRecord, ModificationTimeState, ObjectHash, ProcessedSet,
    Timestamp,
};
use crate::error::{CacheError, Result};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Current snapshot format version
pub const FORMAT_VERSION: u32 = 1;

/// One builder's persisted state together with the head it was saved against
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot<S> {
    pub head: ObjectHash,
    pub state: S,
}

#[derive(Debug, Serialize, Deserialize)]
struct CreationSnapshotWire {
    version: u32,
    head: Vec<u8>,
    processed_commits: Vec<Vec<u8>>,
    processed_trees: Vec<Vec<u8>>,
    entries: Vec<CreationEntryWire>,
}

/// Keyed by the blob hash in hex. `hash` is always written as null.
#[derive(Debug, Serialize, Deserialize)]
struct CreationEntryWire {
    key: String,
    hash: Option<Vec<u8>>,
    offset_seconds: i32,
    epoch_seconds: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct ModificationSnapshotWire {
    version: u32,
    head: Vec<u8>,
    processed_commits: Vec<Vec<u8>>,
    entries: Vec<ModificationEntryWire>,
}

/// Keyed by file path; the path is repeated inside the record
#[derive(Debug, Serialize, Deserialize)]
struct ModificationEntryWire {
    key: String,
    path: String,
    hash: Option<Vec<u8>>,
    offset_seconds: i32,
    epoch_seconds: i64,
}

/// Encode the creation-time builder state
pub fn encode_creation(head: ObjectHash, state: &CreationTimeState) -> Result<Vec<u8>> {
    let mut entries: Vec<CreationEntryWire> = state
        .ctimes
        .iter()
        .map(|(blob, time)| CreationEntryWire {
            key: blob.to_hex(),
            hash: None,
            offset_seconds: time.offset_seconds(),
            epoch_seconds: time.epoch_seconds(),
        })
        .collect();
    entries.sort_by(|a, b| a.key.cmp(&b.key));

    let wire = CreationSnapshotWire {
        version: FORMAT_VERSION,
        head: head.as_bytes().to_vec(),
        processed_commits: encode_set(&state.processed_commits),
        processed_trees: encode_set(&state.processed_trees),
        entries,
    };
    encode_wire(&wire)
}

/// Decode a creation-time snapshot read from `path`
pub fn decode_creation(path: &Path, bytes: &[u8]) -> Result<Snapshot<CreationTimeState>> {
    let wire: CreationSnapshotWire = decode_wire(path, bytes)?;

    let mut state = CreationTimeState {
        processed_commits: decode_set(path, &wire.processed_commits)?,
        processed_trees: decode_set(path, &wire.processed_trees)?,
        ..Default::default()
    };
    state.ctimes.reserve(wire.entries.len());
    for entry in wire.entries {
        let blob = ObjectHash::from_hex(&entry.key).map_err(|e| corrupt(path, e))?;
        if let Some(raw) = &entry.hash {
            if decode_hash(path, raw)? != blob {
                return Err(corrupt(
                    path,
                    format!("entry hash does not match key {}", entry.key),
                ));
            }
        }
        let time = decode_time(path, entry.epoch_seconds, entry.offset_seconds)?;
        state.ctimes.insert(blob, time);
    }

    Ok(Snapshot {
        head: decode_hash(path, &wire.head)?,
        state,
    })
}

/// Encode the modification-time builder state
pub fn encode_modification(head: ObjectHash, state: &ModificationTimeState) -> Result<Vec<u8>> {
    let mut entries: Vec<ModificationEntryWire> = state
        .mtimes
        .iter()
        .map(|(key, record)| ModificationEntryWire {
            key: key.clone(),
            path: record.path.clone(),
            hash: (!record.blob.is_zero()).then(|| record.blob.as_bytes().to_vec()),
            offset_seconds: record.time.offset_seconds(),
            epoch_seconds: record.time.epoch_seconds(),
        })
        .collect();
    entries.sort_by(|a, b| a.key.cmp(&b.key));

    let wire = ModificationSnapshotWire {
        version: FORMAT_VERSION,
        head: head.as_bytes().to_vec(),
        processed_commits: encode_set(&state.processed_commits),
        entries,
    };
    encode_wire(&wire)
}

/// Decode a modification-time snapshot read from `path`
pub fn decode_modification(
    path: &Path,
    bytes: &[u8],
) -> Result<Snapshot<ModificationTimeState>> {
    let wire: ModificationSnapshotWire = decode_wire(path, bytes)?;

    let mut state = ModificationTimeState {
        processed_commits: decode_set(path, &wire.processed_commits)?,
        ..Default::default()
    };
    state.mtimes.reserve(wire.entries.len());
    for entry in wire.entries {
        let blob = match entry.hash {
            Some(raw) => decode_hash(path, &raw)?,
            None => ObjectHash::ZERO,
        };
        let time = decode_time(path, entry.epoch_seconds, entry.offset_seconds)?;
        // The key wins over the embedded path.
        if entry.path != entry.key {
            debug!(
                key = %entry.key,
                embedded = %entry.path,
                "Snapshot record path differs from key"
            );
        }
        let record = ModificationRecord {
            path: entry.key.clone(),
            blob,
            time,
        };
        state.mtimes.insert(entry.key, record);
    }

    Ok(Snapshot {
        head: decode_hash(path, &wire.head)?,
        state,
    })
}

fn encode_set(set: &ProcessedSet) -> Vec<Vec<u8>> {
    let mut hashes: Vec<&ObjectHash> = set.iter().collect();
    hashes.sort();
    hashes.into_iter().map(|h| h.as_bytes().to_vec()).collect()
}

fn decode_set(path: &Path, raw: &[Vec<u8>]) -> Result<ProcessedSet> {
    raw.iter().map(|bytes| decode_hash(path, bytes)).collect()
}

fn decode_hash(path: &Path, bytes: &[u8]) -> Result<ObjectHash> {
    ObjectHash::from_bytes(bytes).map_err(|e| corrupt(path, e))
}

fn decode_time(path: &Path, epoch_seconds: i64, offset_seconds: i32) -> Result<Timestamp> {
    Timestamp::new(epoch_seconds, offset_seconds).ok_or_else(|| CacheError::Decode {
        path: path.to_path_buf(),
        reason: format!(
            "invalid timestamp {} with offset {}s",
            epoch_seconds, offset_seconds
        ),
    })
}

fn corrupt(path: &Path, err: impl std::fmt::Display) -> CacheError {
    CacheError::Decode {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}

fn encode_wire<T: Serialize>(wire: &T) -> Result<Vec<u8>> {
    bincode::serde::encode_to_vec(wire, bincode::config::standard())
        .map_err(|e| CacheError::Encode(e.to_string()))
}

fn decode_wire<T: DeserializeOwned>(path: &Path, bytes: &[u8]) -> Result<T> {
    let config = bincode::config::standard();

    // Check the version before trusting the layout of the rest.
    let (version, _): (u32, usize) =
        bincode::serde::decode_from_slice(bytes, config).map_err(|e| corrupt(path, e))?;
    if version != FORMAT_VERSION {
        return Err(CacheError::FormatVersion {
            path: path.to_path_buf(),
            found: version,
            expected: FORMAT_VERSION,
        });
    }

    let (wire, read): (T, usize) =
        bincode::serde::decode_from_slice(bytes, config).map_err(|e| corrupt(path, e))?;
    if read != bytes.len() {
        return Err(CacheError::Decode {
            path: path.to_path_buf(),
            reason: format!("{} trailing bytes after snapshot", bytes.len() - read),
        });
    }
    Ok(wire)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::HASH_LEN;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn h(byte: u8) -> ObjectHash {
        ObjectHash::new([byte; HASH_LEN])
    }

    fn path() -> PathBuf {
        PathBuf::from("snapshot.bin")
    }

    fn sample_creation() -> CreationTimeState {
        let mut state = CreationTimeState::default();
        state.processed_commits.extend([h(1), h(2)]);
        state.processed_trees.insert(h(3));
        state
            .ctimes
            .insert(h(4), Timestamp::new(1_600_000_000, -7 * 3600).unwrap());
        state
            .ctimes
            .insert(h(5), Timestamp::new(1_650_000_000, 19_800).unwrap());
        state
    }

    fn sample_modification() -> ModificationTimeState {
        let mut state = ModificationTimeState::default();
        state.processed_commits.insert(h(1));
        state.record(ModificationRecord {
            path: "README.md".to_string(),
            blob: h(6),
            time: Timestamp::new(1_700_000_000, 3600).unwrap(),
        });
        state.record(ModificationRecord {
            path: "src/main.rs".to_string(),
            blob: ObjectHash::ZERO,
            time: Timestamp::new(1_700_000_100, 0).unwrap(),
        });
        state
    }

    #[test]
    fn test_creation_roundtrip() {
        let state = sample_creation();
        let bytes = encode_creation(h(9), &state).unwrap();
        let snapshot = decode_creation(&path(), &bytes).unwrap();

        assert_eq!(snapshot.head, h(9));
        assert_eq!(snapshot.state, state);
    }

    #[test]
    fn test_modification_roundtrip_keeps_zero_blob() {
        let state = sample_modification();
        let bytes = encode_modification(ObjectHash::ZERO, &state).unwrap();
        let snapshot = decode_modification(&path(), &bytes).unwrap();

        assert!(snapshot.head.is_zero());
        assert_eq!(snapshot.state, state);
        assert!(snapshot.state.mtimes["src/main.rs"].blob.is_zero());
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let state = sample_creation();
        let first = encode_creation(h(9), &state).unwrap();
        let second = encode_creation(h(9), &state.clone()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_duplicate_hashes_collapse_into_set() {
        let wire = CreationSnapshotWire {
            version: FORMAT_VERSION,
            head: h(1).as_bytes().to_vec(),
            processed_commits: vec![h(2).as_bytes().to_vec(), h(2).as_bytes().to_vec()],
            processed_trees: vec![],
            entries: vec![],
        };
        let bytes = encode_wire(&wire).unwrap();
        let snapshot = decode_creation(&path(), &bytes).unwrap();
        assert_eq!(snapshot.state.processed_commits.len(), 1);
    }

    #[test]
    fn test_key_overrides_embedded_path() {
        let wire = ModificationSnapshotWire {
            version: FORMAT_VERSION,
            head: h(1).as_bytes().to_vec(),
            processed_commits: vec![],
            entries: vec![ModificationEntryWire {
                key: "docs/guide.md".to_string(),
                path: "stale/name.md".to_string(),
                hash: Some(h(7).as_bytes().to_vec()),
                offset_seconds: 0,
                epoch_seconds: 42,
            }],
        };
        let bytes = encode_wire(&wire).unwrap();
        let snapshot = decode_modification(&path(), &bytes).unwrap();

        let record = &snapshot.state.mtimes["docs/guide.md"];
        assert_eq!(record.path, "docs/guide.md");
        assert_eq!(record.blob, h(7));
    }

    #[test]
    fn test_truncated_snapshot_is_decode_error() {
        let bytes = encode_creation(h(9), &sample_creation()).unwrap();
        let err = decode_creation(&path(), &bytes[..bytes.len() / 2]).unwrap_err();
        assert!(matches!(err, CacheError::Decode { .. }));
    }

    #[test]
    fn test_trailing_bytes_are_decode_error() {
        let mut bytes = encode_modification(h(9), &sample_modification()).unwrap();
        bytes.push(0);
        let err = decode_modification(&path(), &bytes).unwrap_err();
        assert!(matches!(err, CacheError::Decode { .. }));
    }

    #[test]
    fn test_version_mismatch_is_reported() {
        let mut bytes = encode_creation(h(9), &CreationTimeState::default()).unwrap();
        // Varint-encoded version occupies the first byte.
        bytes[0] = 2;
        let err = decode_creation(&path(), &bytes).unwrap_err();
        assert!(matches!(
            err,
            CacheError::FormatVersion {
                found: 2,
                expected: FORMAT_VERSION,
                ..
            }
        ));
    }

    #[test]
    fn test_wrong_hash_length_is_decode_error() {
        let wire = CreationSnapshotWire {
            version: FORMAT_VERSION,
            head: vec![1, 2, 3],
            processed_commits: vec![],
            processed_trees: vec![],
            entries: vec![],
        };
        let bytes = encode_wire(&wire).unwrap();
        assert!(decode_creation(&path(), &bytes).unwrap_err().is_corruption());
    }

    #[test]
    fn test_invalid_offset_is_decode_error() {
        let wire = CreationSnapshotWire {
            version: FORMAT_VERSION,
            head: h(1).as_bytes().to_vec(),
            processed_commits: vec![],
            processed_trees: vec![],
            entries: vec![CreationEntryWire {
                key: h(2).to_hex(),
                hash: None,
                offset_seconds: 90_000,
                epoch_seconds: 0,
            }],
        };
        let bytes = encode_wire(&wire).unwrap();
        assert!(decode_creation(&path(), &bytes).unwrap_err().is_corruption());
    }
}
