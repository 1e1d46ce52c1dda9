//! Persistent cache for history traversal progress
//!
//! This module stores the state of the creation-time and modification-time
//! builders in two independent snapshot files, each tagged with the HEAD
//! commit it was saved against. Loading compares the two tags to decide
//! whether the cache as a whole is caught up to a known commit.

mod codec;
mod store;

pub use codec::{
    decode_creation, decode_modification, encode_creation, encode_modification, Snapshot,
    FORMAT_VERSION,
};
pub use store::{
    CacheStore, FileStorage, CREATION_SNAPSHOT_FILE, DEFAULT_SIZE_WARNING_BYTES,
    MODIFICATION_SNAPSHOT_FILE,
};
