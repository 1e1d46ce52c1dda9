//! gitmeta-cache - resumable cache for git history metadata
//!
//! Computing when each blob first appeared and when each path last changed
//! requires walking the whole commit graph. This crate persists the progress
//! of those walks, keyed to the HEAD commit they reached, so the next run can
//! resume instead of starting over.

pub mod cache;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod git;
pub mod report;

pub use cache::{CacheStore, FileStorage, Snapshot};
pub use config::Config;
pub use crate::core::{
    CreationTimeState, ModificationRecord, ModificationTimeState, ObjectHash, StateExchange,
    Timestamp,
};
pub use error::{CacheError, Result};
pub use git::{GitRepository, HeadSource};
