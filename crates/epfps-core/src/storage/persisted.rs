use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use super::SharedStore;

/// Layout version of persisted documents. Documents written with any other
/// version are discarded on load.
pub const STATE_VERSION: u32 = 0;

#[derive(Debug, Serialize, Deserialize)]
struct Envelope<T> {
    state: T,
    version: u32,
}

/// A state value mirrored into a key of a storage medium.
///
/// The value is restored from the medium when opened and written back in
/// full after every mutation. Failed writes are logged and otherwise
/// ignored: the in-memory value stays authoritative for the process.
pub struct Persisted<T> {
    key: &'static str,
    store: SharedStore,
    state: T,
}

impl<T> Persisted<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    /// Restore the value stored under `key`, or start from the default.
    pub fn open(store: SharedStore, key: &'static str) -> Self {
        let state = match store.load(key) {
            Some(value) => match serde_json::from_value::<Envelope<T>>(value) {
                Ok(envelope) if envelope.version == STATE_VERSION => {
                    debug!(key, "Restored persisted state");
                    envelope.state
                }
                Ok(envelope) => {
                    warn!(key, version = envelope.version, "Discarding persisted state with unknown version");
                    T::default()
                }
                Err(e) => {
                    warn!(key, error = %e, "Discarding unreadable persisted state");
                    T::default()
                }
            },
            None => T::default(),
        };

        Self { key, store, state }
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    pub fn get(&self) -> &T {
        &self.state
    }

    /// Replace the whole value and persist it.
    pub fn replace(&mut self, state: T) {
        self.state = state;
        self.flush();
    }

    /// Mutate the value in place and persist the result.
    pub fn update(&mut self, f: impl FnOnce(&mut T)) {
        f(&mut self.state);
        self.flush();
    }

    /// Mutate fields that are never serialized, without writing to the medium.
    pub fn update_local(&mut self, f: impl FnOnce(&mut T)) {
        f(&mut self.state);
    }

    fn flush(&self) {
        let envelope = Envelope {
            state: &self.state,
            version: STATE_VERSION,
        };

        let value = match serde_json::to_value(&envelope) {
            Ok(value) => value,
            Err(e) => {
                warn!(key = self.key, error = %e, "Failed to encode state for persistence");
                return;
            }
        };

        if let Err(e) = self.store.save(self.key, &value) {
            warn!(key = self.key, error = %e, "Failed to persist state");
        }
    }
}
