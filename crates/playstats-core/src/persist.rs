// ── Durable key/value storage ──
//
// The seam between in-memory session state and whatever survives a
// restart. Writes are best effort: a failed write is logged and reported
// back as a value, never raised to the caller's caller.

use std::collections::BTreeMap;
use std::sync::RwLock;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::warn;

use crate::error::CoreError;

/// Storage keys shared by preferences and name mappings.
pub mod keys {
    pub const THEME: &str = "theme";
    pub const DEFAULT_DAYS: &str = "default_days";
    pub const CLIENT_NAMES: &str = "name_mappings.client";
    pub const DEVICE_NAMES: &str = "name_mappings.device";
}

/// Failure reported by a [`KeyValueStore`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("storage quota exceeded")]
    QuotaExceeded,

    #[error("IO error: {0}")]
    Io(String),
}

/// A durable string-to-string store.
///
/// `get` returns `Ok(None)` for a missing key. Implementations must make a
/// successful `set` visible to the next `get`, including across restarts.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// In-process store. Survives nothing; used by tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| StorageError::Unavailable("memory store lock poisoned".into()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StorageError::Unavailable("memory store lock poisoned".into()))?;
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

/// Read a raw value. Read failures count as "not set".
pub(crate) fn read_raw(store: &dyn KeyValueStore, key: &str) -> Option<String> {
    match store.get(key) {
        Ok(value) => value,
        Err(e) => {
            let err = CoreError::PersistenceRead {
                key: key.into(),
                reason: e.to_string(),
            };
            warn!(error = %err, "falling back to default");
            None
        }
    }
}

/// Read and decode a JSON value. Malformed values count as "not set".
pub(crate) fn read_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = read_raw(store, key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, error = %e, "ignoring malformed stored value");
            None
        }
    }
}

/// Write a raw value, returning the failure instead of propagating it.
pub(crate) fn write_raw(store: &dyn KeyValueStore, key: &str, value: &str) -> Option<CoreError> {
    let err = store.set(key, value).err()?;
    let err = CoreError::PersistenceWrite {
        key: key.into(),
        reason: err.to_string(),
    };
    warn!(error = %err, "in-memory value kept for this session");
    Some(err)
}

/// Encode as JSON and write.
pub(crate) fn write_json<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Option<CoreError> {
    match serde_json::to_string(value) {
        Ok(raw) => write_raw(store, key, &raw),
        Err(e) => Some(CoreError::PersistenceWrite {
            key: key.into(),
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Io("disk gone".into()))
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::QuotaExceeded)
        }
    }

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryStore::new();
        assert_eq!(store.get("theme").unwrap(), None);
        store.set("theme", "light").unwrap();
        assert_eq!(store.get("theme").unwrap().as_deref(), Some("light"));
    }

    #[test]
    fn read_failure_is_absent() {
        assert_eq!(read_raw(&BrokenStore, keys::THEME), None);
    }

    #[test]
    fn malformed_json_is_absent() {
        let store = MemoryStore::new();
        store.set(keys::CLIENT_NAMES, "{not json").unwrap();
        let value: Option<BTreeMap<String, String>> = read_json(&store, keys::CLIENT_NAMES);
        assert!(value.is_none());
    }

    #[test]
    fn write_failure_is_returned_not_raised() {
        let err = write_raw(&BrokenStore, keys::THEME, "dark").unwrap();
        assert_eq!(
            err,
            CoreError::PersistenceWrite {
                key: "theme".into(),
                reason: "storage quota exceeded".into(),
            }
        );
    }
}
