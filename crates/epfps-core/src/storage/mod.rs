//! Local persistence for client state.
//!
//! This module provides the key-value media the state caches are written to
//! and the `Persisted` wrapper that loads a cache on open and saves it after
//! every mutation.
//!
//! Media:
//! - `FileStore`: one JSON document per key in a directory
//! - `MemoryStore`: in-process map, mostly for tests and embedding
//! - `DetachedStore`: no medium at all; reads are empty, writes are dropped

pub mod error;
pub mod kv;
pub mod persisted;

pub use error::StorageError;
pub use kv::{DetachedStore, FileStore, KeyValueStore, MemoryStore, SharedStore};
pub use persisted::Persisted;
