//! Builder state exchanged with the history traversal engines
//!
//! The traversal engines that compute creation and modification times are
//! not part of this crate. They hand their progress over as plain values:
//! the set of objects already visited plus the accumulated result map.

use super::hash::ObjectHash;
use super::timestamp::Timestamp;
use std::collections::{HashMap, HashSet};

/// Objects a traversal has already visited
pub type ProcessedSet = HashSet<ObjectHash>;

/// Blob hash -> commit time at which the content first appeared
pub type CreationTimeMap = HashMap<ObjectHash, Timestamp>;

/// File path -> last modification of that path
pub type ModificationTimeMap = HashMap<String, ModificationRecord>;

/// Last change of a tracked file path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModificationRecord {
    pub path: String,
    /// Blob the path pointed to after the change
    pub blob: ObjectHash,
    pub time: Timestamp,
}

/// Progress of the creation-time traversal
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreationTimeState {
    pub processed_commits: ProcessedSet,
    pub processed_trees: ProcessedSet,
    pub ctimes: CreationTimeMap,
}

impl CreationTimeState {
    pub fn is_empty(&self) -> bool {
        self.processed_commits.is_empty()
            && self.processed_trees.is_empty()
            && self.ctimes.is_empty()
    }
}

/// Progress of the modification-time traversal
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModificationTimeState {
    pub processed_commits: ProcessedSet,
    pub mtimes: ModificationTimeMap,
}

impl ModificationTimeState {
    pub fn is_empty(&self) -> bool {
        self.processed_commits.is_empty() && self.mtimes.is_empty()
    }

    /// Insert a record under its own path
    pub fn record(&mut self, record: ModificationRecord) {
        self.mtimes.insert(record.path.clone(), record);
    }
}

/// Capability a traversal engine exposes so its progress can be persisted
/// and restored without exposing how it walks history.
pub trait StateExchange {
    type State;

    /// Copy out everything needed to resume later
    fn export_state(&self) -> Self::State;

    /// Replace the current progress wholesale
    fn import_state(&mut self, state: Self::State);
}

impl StateExchange for CreationTimeState {
    type State = CreationTimeState;

    fn export_state(&self) -> Self::State {
        self.clone()
    }

    fn import_state(&mut self, state: Self::State) {
        *self = state;
    }
}

impl StateExchange for ModificationTimeState {
    type State = ModificationTimeState;

    fn export_state(&self) -> Self::State {
        self.clone()
    }

    fn import_state(&mut self, state: Self::State) {
        *self = state;
    }
}
