use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::{debug, warn};

use super::StorageError;

/// Handle to a storage medium shared by every cache in the process.
pub type SharedStore = Arc<dyn KeyValueStore>;

/// A persistent medium holding one JSON document per key.
///
/// `load` never fails: a missing, unreadable or corrupt document reads as
/// absent so callers can always fall back to defaults. `save` replaces the
/// whole document for the key.
pub trait KeyValueStore: Send + Sync {
    fn load(&self, key: &str) -> Option<Value>;

    fn save(&self, key: &str, value: &Value) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Whether writes reach a real medium.
    fn is_available(&self) -> bool {
        true
    }
}

/// Keys become file names, so keep them to a safe alphabet.
fn check_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

// ============================================================================
// File-backed medium
// ============================================================================

pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| StorageError::Io {
            key: dir.display().to_string(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn load(&self, key: &str) -> Option<Value> {
        if check_key(key).is_err() {
            warn!(key, "Refusing to load invalid storage key");
            return None;
        }

        let path = self.path(key);
        if !path.exists() {
            return None;
        }

        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!(key, error = %e, "Failed to read stored document");
                return None;
            }
        };

        match serde_json::from_str(&contents) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "Failed to parse stored document");
                None
            }
        }
    }

    fn save(&self, key: &str, value: &Value) -> Result<(), StorageError> {
        check_key(key)?;

        let contents = serde_json::to_string_pretty(value).map_err(|source| StorageError::Encode {
            key: key.to_string(),
            source,
        })?;

        // Write beside the target and rename so readers never see a torn document
        let path = self.path(key);
        let tmp = self.dir.join(format!(".{}.json.tmp", key));
        let io_err = |source| StorageError::Io {
            key: key.to_string(),
            source,
        };
        std::fs::write(&tmp, contents).map_err(io_err)?;
        std::fs::rename(&tmp, &path).map_err(io_err)?;

        debug!(key, "Stored document");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        check_key(key)?;

        let path = self.path(key);
        if path.exists() {
            std::fs::remove_file(&path).map_err(|source| StorageError::Io {
                key: key.to_string(),
                source,
            })?;
        }
        Ok(())
    }
}

// ============================================================================
// In-memory medium
// ============================================================================

#[derive(Default)]
pub struct MemoryStore {
    documents: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn documents(&self) -> std::sync::MutexGuard<'_, HashMap<String, Value>> {
        // A panic while holding the lock cannot leave a half-written map
        self.documents.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Option<Value> {
        self.documents().get(key).cloned()
    }

    fn save(&self, key: &str, value: &Value) -> Result<(), StorageError> {
        check_key(key)?;
        self.documents().insert(key.to_string(), value.clone());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        check_key(key)?;
        self.documents().remove(key);
        Ok(())
    }
}

// ============================================================================
// No medium
// ============================================================================

/// Stand-in used when no persistent medium can be opened.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedStore;

impl KeyValueStore for DetachedStore {
    fn load(&self, _key: &str) -> Option<Value> {
        None
    }

    fn save(&self, _key: &str, _value: &Value) -> Result<(), StorageError> {
        Ok(())
    }

    fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Ok(())
    }

    fn is_available(&self) -> bool {
        false
    }
}
