// ── Display-name overrides ──
//
// User-chosen labels for raw client and device identifiers. Overrides are
// written through to storage on every change and never expire.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use playstats_api::FilterOptions;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::debug;

use crate::error::CoreError;
use crate::persist::{self, KeyValueStore, keys};

/// What a raw identifier names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MappingKind {
    Client,
    Device,
}

impl MappingKind {
    pub const ALL: [MappingKind; 2] = [Self::Client, Self::Device];

    fn storage_key(self) -> &'static str {
        match self {
            Self::Client => keys::CLIENT_NAMES,
            Self::Device => keys::DEVICE_NAMES,
        }
    }
}

/// One override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameMapping {
    pub kind: MappingKind,
    pub raw_id: String,
    pub label: String,
}

#[derive(Debug, Default)]
struct KindTable {
    labels: BTreeMap<String, String>,
    available: BTreeSet<String>,
}

/// Label overrides for clients and devices, plus the ids the backend has
/// reported for each kind.
pub struct NameMappingRegistry {
    store: Arc<dyn KeyValueStore>,
    clients: KindTable,
    devices: KindTable,
    last_write_error: Option<CoreError>,
}

impl NameMappingRegistry {
    /// Load both kinds. A missing or malformed stored set starts empty.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let read = |kind: MappingKind| KindTable {
            labels: persist::read_json(store.as_ref(), kind.storage_key()).unwrap_or_default(),
            available: BTreeSet::new(),
        };
        let clients = read(MappingKind::Client);
        let devices = read(MappingKind::Device);

        debug!(
            clients = clients.labels.len(),
            devices = devices.labels.len(),
            "name mappings loaded"
        );

        Self {
            store,
            clients,
            devices,
            last_write_error: None,
        }
    }

    /// Upsert an override. A blank label removes it. The full set for
    /// `kind` is written out before returning.
    pub fn set_mapping(&mut self, kind: MappingKind, raw_id: &str, label: &str) {
        let label = label.trim();
        let table = self.table_mut(kind);
        if label.is_empty() {
            table.labels.remove(raw_id);
        } else {
            table.labels.insert(raw_id.to_owned(), label.to_owned());
        }
        debug!(%kind, raw_id, label, "name mapping updated");

        let labels = &self.table(kind).labels;
        self.last_write_error = persist::write_json(self.store.as_ref(), kind.storage_key(), labels);
    }

    /// Remove an override. Same as setting a blank label.
    pub fn clear_mapping(&mut self, kind: MappingKind, raw_id: &str) {
        self.set_mapping(kind, raw_id, "");
    }

    /// The override for `raw_id`, or `raw_id` itself.
    pub fn resolve_label<'a>(&'a self, kind: MappingKind, raw_id: &'a str) -> &'a str {
        self.table(kind)
            .labels
            .get(raw_id)
            .map_or(raw_id, String::as_str)
    }

    /// Every override for `kind`, ordered by raw id.
    pub fn all_mappings(&self, kind: MappingKind) -> Vec<NameMapping> {
        self.table(kind)
            .labels
            .iter()
            .map(|(raw_id, label)| NameMapping {
                kind,
                raw_id: raw_id.clone(),
                label: label.clone(),
            })
            .collect()
    }

    /// Record the ids the backend currently reports.
    pub fn set_available(&mut self, options: &FilterOptions) {
        self.clients.available = options.clients.iter().cloned().collect();
        self.devices.available = options.devices.iter().cloned().collect();
    }

    /// Backend-reported ids for `kind`, ordered.
    pub fn available(&self, kind: MappingKind) -> Vec<&str> {
        self.table(kind)
            .available
            .iter()
            .map(String::as_str)
            .collect()
    }

    pub fn last_write_error(&self) -> Option<&CoreError> {
        self.last_write_error.as_ref()
    }

    fn table(&self, kind: MappingKind) -> &KindTable {
        match kind {
            MappingKind::Client => &self.clients,
            MappingKind::Device => &self.devices,
        }
    }

    fn table_mut(&mut self, kind: MappingKind) -> &mut KindTable {
        match kind {
            MappingKind::Client => &mut self.clients,
            MappingKind::Device => &mut self.devices,
        }
    }
}

impl std::fmt::Debug for NameMappingRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NameMappingRegistry")
            .field("clients", &self.clients)
            .field("devices", &self.devices)
            .field("last_write_error", &self.last_write_error)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::persist::{MemoryStore, StorageError};
    use pretty_assertions::assert_eq;

    fn registry() -> (Arc<dyn KeyValueStore>, NameMappingRegistry) {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let registry = NameMappingRegistry::load(Arc::clone(&store));
        (store, registry)
    }

    #[test]
    fn unmapped_ids_pass_through() {
        let (_, names) = registry();
        assert_eq!(names.resolve_label(MappingKind::Client, "Emby Web"), "Emby Web");
    }

    #[test]
    fn mapping_survives_reload() {
        let (store, mut names) = registry();
        names.set_mapping(MappingKind::Device, "SHIELD-1", "Living Room TV");
        assert_eq!(
            names.resolve_label(MappingKind::Device, "SHIELD-1"),
            "Living Room TV"
        );

        let reloaded = NameMappingRegistry::load(store);
        assert_eq!(
            reloaded.resolve_label(MappingKind::Device, "SHIELD-1"),
            "Living Room TV"
        );
        assert_eq!(reloaded.resolve_label(MappingKind::Client, "SHIELD-1"), "SHIELD-1");
    }

    #[test]
    fn blank_label_clears_override() {
        let (store, mut names) = registry();
        names.set_mapping(MappingKind::Client, "abc", "Phone");
        names.set_mapping(MappingKind::Client, "abc", "   ");

        assert_eq!(names.resolve_label(MappingKind::Client, "abc"), "abc");
        assert!(NameMappingRegistry::load(store)
            .all_mappings(MappingKind::Client)
            .is_empty());
    }

    #[test]
    fn all_mappings_sorted_by_raw_id() {
        let (_, mut names) = registry();
        names.set_mapping(MappingKind::Client, "zz", "Last");
        names.set_mapping(MappingKind::Client, "aa", "First");

        let ids: Vec<_> = names
            .all_mappings(MappingKind::Client)
            .into_iter()
            .map(|m| m.raw_id)
            .collect();
        assert_eq!(ids, vec!["aa".to_string(), "zz".to_string()]);
    }

    #[test]
    fn malformed_storage_starts_empty() {
        let store = MemoryStore::new();
        store.set(keys::CLIENT_NAMES, "[1,2,3]").unwrap();
        let names = NameMappingRegistry::load(Arc::new(store));
        assert!(names.all_mappings(MappingKind::Client).is_empty());
    }

    #[test]
    fn available_ids_are_ordered_and_per_kind() {
        let (_, mut names) = registry();
        names.set_available(&FilterOptions {
            clients: vec!["Kodi".into(), "Infuse".into()],
            devices: vec!["Pixel".into()],
            users: vec![],
        });

        assert_eq!(names.available(MappingKind::Client), vec!["Infuse", "Kodi"]);
        assert_eq!(names.available(MappingKind::Device), vec!["Pixel"]);
    }

    struct ReadOnlyStore(MemoryStore);

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.0.get(key)
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::QuotaExceeded)
        }
    }

    #[test]
    fn failed_write_is_recorded_and_memory_wins() {
        let mut names = NameMappingRegistry::load(Arc::new(ReadOnlyStore(MemoryStore::new())));
        names.set_mapping(MappingKind::Client, "abc", "Phone");

        assert_eq!(names.resolve_label(MappingKind::Client, "abc"), "Phone");
        assert!(matches!(
            names.last_write_error(),
            Some(CoreError::PersistenceWrite { .. })
        ));
    }

    #[test]
    fn successful_write_clears_recorded_error() {
        let (_, mut names) = registry();
        names.last_write_error = Some(CoreError::PersistenceWrite {
            key: "name_mappings.client".into(),
            reason: "quota exceeded".into(),
        });
        names.set_mapping(MappingKind::Client, "abc", "Phone");
        assert!(names.last_write_error().is_none());
    }
}
