// File-backed preference store: a flat string map in `state.toml`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use playstats_core::{KeyValueStore, StorageError};
use tracing::{debug, warn};

use crate::{ConfigError, state_path};

/// Durable [`KeyValueStore`] persisted as TOML.
///
/// The whole map is held in memory and rewritten on every `set`. The file
/// is replaced atomically (write to a sibling, then rename).
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at the canonical data path.
    pub fn open_default() -> Result<Self, ConfigError> {
        Self::open(state_path())
    }

    /// Open (or lazily create) a store at `path`.
    ///
    /// A missing file is an empty store. A file that fails to parse is
    /// also treated as empty and gets replaced on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) => toml::from_str(&raw).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "ignoring unreadable state file");
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), keys = entries.len(), "state store opened");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let raw = toml::to_string_pretty(entries).map_err(|e| StorageError::Io(e.to_string()))?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::Io(e.to_string()))?;
        }
        let tmp = self.path.with_extension("toml.tmp");
        std::fs::write(&tmp, raw).map_err(|e| StorageError::Io(e.to_string()))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| StorageError::Io(e.to_string()))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| StorageError::Unavailable("state store lock poisoned".into()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StorageError::Unavailable("state store lock poisoned".into()))?;
        let mut next = entries.clone();
        next.insert(key.to_owned(), value.to_owned());
        self.persist(&next)?;
        *entries = next;
        Ok(())
    }
}
