//! Client-side state layer for the EPFPS school-management application.
//!
//! Reference data, the signed-in user and the academic-year switch flag are
//! cached locally, persisted between runs and kept in sync with the backend:
//!
//! - `storage`: key-value persistence media and the `Persisted` wrapper
//! - `cache`: the configuration, session and academic-year caches
//! - `init`: fetch configuration only when missing or stale
//! - `api`: backend client and response envelopes
//! - `upload`: object storage uploads
//! - `context`: `AppContext`, the container holding every cache

pub mod api;
pub mod cache;
pub mod config;
pub mod context;
pub mod init;
pub mod models;
pub mod storage;
pub mod upload;
pub mod utils;

pub use context::AppContext;
pub use init::{init_configs, refresh_configs, InitOutcome};
