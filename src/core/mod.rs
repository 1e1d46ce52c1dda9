//! Core value types: object hashes, timestamps and builder state

mod hash;
mod state;
mod timestamp;

pub use hash::{ObjectHash, HASH_LEN};
pub use state::{
    CreationTimeMap, CreationTimeState, ModificationRecord, ModificationTimeMap,
    ModificationTimeState, ProcessedSet, StateExchange,
};
pub use timestamp::Timestamp;
