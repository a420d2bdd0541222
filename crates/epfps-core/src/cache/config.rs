use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::models::ConfigurationSnapshot;
use crate::storage::{Persisted, SharedStore};
use crate::utils::format_age;

/// Storage key of the configuration document
pub const CONFIG_STORAGE_KEY: &str = "location-storage";

/// Cached reference data is refetched once it is this old.
pub const FRESHNESS_WINDOW_HOURS: i64 = 24;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheMetadata {
    pub is_loaded: bool,
    pub last_updated: Option<DateTime<Utc>>,
}

impl CacheMetadata {
    fn loaded_at(at: DateTime<Utc>) -> Self {
        Self {
            is_loaded: true,
            last_updated: Some(at),
        }
    }

    /// Whether the last write happened inside the freshness window.
    pub fn is_recent(&self, now: DateTime<Utc>) -> bool {
        self.last_updated
            .map(|at| now - at < Duration::hours(FRESHNESS_WINDOW_HOURS))
            .unwrap_or(false)
    }

    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.is_loaded && self.is_recent(now)
    }

    pub fn age_minutes(&self, now: DateTime<Utc>) -> Option<i64> {
        self.last_updated.map(|at| (now - at).num_minutes())
    }

    pub fn age_display(&self, now: DateTime<Utc>) -> String {
        self.age_minutes(now)
            .map(format_age)
            .unwrap_or_else(|| "never".to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct ConfigState {
    #[serde(default)]
    snapshot: ConfigurationSnapshot,
    #[serde(default)]
    metadata: CacheMetadata,
}

/// Reference data cache.
///
/// Only whole snapshots are written; there is no per-list update.
#[derive(Clone)]
pub struct ConfigCache {
    inner: Arc<RwLock<Persisted<ConfigState>>>,
}

impl ConfigCache {
    pub fn open(store: SharedStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Persisted::open(store, CONFIG_STORAGE_KEY))),
        }
    }

    /// Replace every list and mark the cache loaded as of now.
    pub async fn set_config(&self, snapshot: ConfigurationSnapshot) {
        self.set_config_at(snapshot, Utc::now()).await;
    }

    pub(crate) async fn set_config_at(&self, snapshot: ConfigurationSnapshot, at: DateTime<Utc>) {
        let records = snapshot.record_count();
        self.inner.write().await.replace(ConfigState {
            snapshot,
            metadata: CacheMetadata::loaded_at(at),
        });
        info!(records, "Configuration cache replaced");
    }

    /// Back to the empty, never-loaded state.
    pub async fn reset_config(&self) {
        self.inner.write().await.replace(ConfigState::default());
        debug!("Configuration cache reset");
    }

    pub async fn snapshot(&self) -> ConfigurationSnapshot {
        self.inner.read().await.get().snapshot.clone()
    }

    /// Run `f` against the current snapshot without cloning it.
    pub async fn read<R>(&self, f: impl FnOnce(&ConfigurationSnapshot) -> R) -> R {
        f(&self.inner.read().await.get().snapshot)
    }

    pub async fn metadata(&self) -> CacheMetadata {
        self.inner.read().await.get().metadata
    }

    pub async fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.metadata().await.is_fresh(now)
    }
}
