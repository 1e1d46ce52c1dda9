//! Git integration module
//!
//! The cache only needs one thing from a repository: the commit HEAD
//! currently points at. This module provides that lookup.

mod repository;

pub use repository::{GitRepository, HeadSource};
