// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Workbench - one editing session over a store
//!
//! Opening a workbench loads every collection, migrates stored prints and
//! writes the migrated prints back. Each mutating method persists the
//! collections it touched before returning.
//!
//! Stored spools that cannot be read are never dropped: they are carried
//! along untouched and written back after the readable ones.

use crate::backup::BackupSnapshot;
use crate::catalog::{defaults, Catalog, DEFAULT_BRANDS, DEFAULT_MATERIALS, DEFAULT_RECIPIENTS};
use crate::error::SpoolError;
use crate::ledger::{self, Committed, PrintDraft, StockPreview};
use crate::migrate::{self, MigrationReport, DEFAULT_RECIPIENT};
use crate::store::{keys, KeyValueStore};
use crate::tags::{TagAdded, TagRegistry};
use crate::types::{Filament, Print, PrintId};
use chrono::{NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{info, warn};

/// Default print time of a new draft, in minutes
pub const DEFAULT_DURATION: u32 = 60;

/// Values for a new spool; unset fields take the catalog defaults
#[derive(Debug, Clone, Default)]
pub struct NewFilament {
    /// Display name (required)
    pub name: String,
    /// Brand, defaults to the first known brand
    pub brand: Option<String>,
    /// Material, defaults to the first known material
    pub material: Option<String>,
    /// Hex color, defaults to black
    pub color: Option<String>,
    /// Starting grams, defaults to 1000
    pub weight: Option<f64>,
    /// Price, defaults to 20
    pub price: Option<f64>,
}

/// An open session over a store
pub struct Workbench<S: KeyValueStore> {
    store: S,
    catalog: Catalog,
    unreadable_filaments: Vec<Value>,
    migration: MigrationReport,
    default_recipient: String,
}

impl<S: KeyValueStore> Workbench<S> {
    /// Load all collections from `store`.
    ///
    /// Never fails: unreadable collections start empty (or with their
    /// defaults) and a failed migration write-back is only logged.
    pub fn open(store: S) -> Self {
        let (filaments, unreadable_filaments) = load_each::<Filament, _>(&store, keys::FILAMENTS);
        let tags = store.load(keys::TAGS, TagRegistry::new()).into_value();
        let materials = store.load(keys::MATERIALS, defaults(DEFAULT_MATERIALS)).into_value();
        let brands = store.load(keys::BRANDS, defaults(DEFAULT_BRANDS)).into_value();
        let recipients = store
            .load(keys::RECIPIENTS, defaults(DEFAULT_RECIPIENTS))
            .into_value();

        let stored_prints = store.load(keys::PRINTS, Value::Null);
        let (prints, migration) = migrate::migrate_document(stored_prints.value());

        let mut bench = Self {
            store,
            catalog: Catalog {
                filaments,
                prints,
                tags,
                materials,
                brands,
                recipients,
            },
            unreadable_filaments,
            migration,
            default_recipient: DEFAULT_RECIPIENT.to_string(),
        };

        // Corrupt documents are left alone until the next real save.
        if stored_prints.was_stored() && !migration.is_noop() {
            match bench.store.save(keys::PRINTS, &bench.catalog.prints) {
                Ok(()) => info!(
                    "Migrated {} of {} stored prints",
                    migration.changed, migration.seen
                ),
                Err(e) => warn!("Could not write migrated prints back: {}", e),
            }
        }

        bench
    }

    /// Use `recipient` for new drafts
    #[must_use]
    pub fn with_default_recipient(mut self, recipient: impl Into<String>) -> Self {
        self.default_recipient = recipient.into();
        self
    }

    /// The loaded catalog
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The underlying store
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// What the load-time migration did
    #[must_use]
    pub fn migration_report(&self) -> MigrationReport {
        self.migration
    }

    // =========================================================================
    // Prints
    // =========================================================================

    /// Start a new print dated `today`, on the first spool if there is one
    #[must_use]
    pub fn begin_new_print(&self, today: NaiveDate) -> PrintDraft {
        PrintDraft::new(Print {
            id: PrintId(0),
            name: String::new(),
            date: Some(today),
            duration: DEFAULT_DURATION,
            weight: 0.0,
            filament_id: self.catalog.filaments.first().map(|f| f.id.clone()),
            rating: 0,
            recipient: self.default_recipient.clone(),
            tags: Vec::new(),
            success: true,
            notes: String::new(),
            extra: serde_json::Map::new(),
        })
    }

    /// Start editing a stored print, snapshotting it
    pub fn begin_edit(&self, id: PrintId) -> Result<PrintDraft, SpoolError> {
        self.catalog
            .print(id)
            .map(PrintDraft::edit)
            .ok_or(SpoolError::UnknownPrint(id))
    }

    /// Projected spool balance for a draft
    #[must_use]
    pub fn preview(&self, draft: &PrintDraft) -> Option<StockPreview> {
        draft.preview(&self.catalog.filaments)
    }

    /// Commit a draft, charge the ledger and persist spools and prints.
    ///
    /// Spools are written first: if that write fails the print is not
    /// stored either, so no print is ever on disk without its charge.
    pub fn save_draft(&mut self, draft: PrintDraft) -> Result<Committed, SpoolError> {
        let committed = ledger::commit(&mut self.catalog, draft, Utc::now().timestamp_millis())?;

        self.save_filaments()?;
        self.store.save(keys::PRINTS, &self.catalog.prints)?;
        if remember(&mut self.catalog.recipients, &committed.print.recipient) {
            self.store.save(keys::RECIPIENTS, &self.catalog.recipients)?;
        }

        info!(
            "{} print {} ({})",
            if committed.created { "Created" } else { "Updated" },
            committed.print.id,
            committed.print.name
        );
        Ok(committed)
    }

    /// Delete a print. Spool balances are not restored.
    pub fn delete_print(&mut self, id: PrintId) -> Result<Print, SpoolError> {
        let removed = self
            .catalog
            .remove_print(id)
            .ok_or(SpoolError::UnknownPrint(id))?;
        self.store.save(keys::PRINTS, &self.catalog.prints)?;
        info!("Deleted print {} ({}); stock left unchanged", removed.id, removed.name);
        Ok(removed)
    }

    // =========================================================================
    // Tags
    // =========================================================================

    /// Register a tag, also putting it on `draft` when one is open
    pub fn add_tag(&mut self, raw: &str, draft: Option<&mut PrintDraft>) -> Result<TagAdded, SpoolError> {
        let added = self.catalog.tags.add_tag(raw, draft);
        if added.is_new() {
            self.store.save(keys::TAGS, &self.catalog.tags)?;
        }
        Ok(added)
    }

    /// Remove a tag from the registry. Prints keep it.
    pub fn remove_tag(&mut self, tag: &str) -> Result<bool, SpoolError> {
        let removed = self.catalog.tags.remove_tag(tag);
        if removed {
            self.store.save(keys::TAGS, &self.catalog.tags)?;
        }
        Ok(removed)
    }

    // =========================================================================
    // Filaments
    // =========================================================================

    /// Add a spool, filling unset fields from the catalog defaults
    pub fn add_filament(&mut self, new: NewFilament) -> Result<Filament, SpoolError> {
        let name = new.name.trim();
        if name.is_empty() {
            return Err(SpoolError::MissingFilamentName);
        }

        let brand = new
            .brand
            .or_else(|| self.catalog.brands.first().cloned())
            .unwrap_or_default();
        let material = new
            .material
            .or_else(|| self.catalog.materials.first().cloned())
            .unwrap_or_default();

        let filament = Filament {
            id: self.catalog.next_filament_id(Utc::now().timestamp_millis()),
            name: name.to_string(),
            brand,
            material,
            color: new.color.unwrap_or_else(|| "#000000".to_string()),
            weight: new.weight.unwrap_or(1000.0),
            price: new.price.unwrap_or(20.0),
            extra: serde_json::Map::new(),
        };

        self.catalog.add_filament(filament.clone());
        self.save_filaments()?;
        if remember(&mut self.catalog.brands, &filament.brand) {
            self.store.save(keys::BRANDS, &self.catalog.brands)?;
        }
        if remember(&mut self.catalog.materials, &filament.material) {
            self.store.save(keys::MATERIALS, &self.catalog.materials)?;
        }

        info!("Added filament {} ({}g)", filament.name, filament.weight);
        Ok(filament)
    }

    // =========================================================================
    // Backup
    // =========================================================================

    /// Immutable copy of the data a backup carries
    #[must_use]
    pub fn backup_snapshot(&self) -> BackupSnapshot {
        BackupSnapshot::of(&self.catalog)
    }

    /// Stored spool records that could not be read, kept for write-back
    #[must_use]
    pub fn unreadable_filaments(&self) -> &[Value] {
        &self.unreadable_filaments
    }

    fn save_filaments(&mut self) -> Result<(), SpoolError> {
        let mut records = self
            .catalog
            .filaments
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| SpoolError::Serialize {
                key: keys::FILAMENTS.to_string(),
                source,
            })?;
        records.extend(self.unreadable_filaments.iter().cloned());
        self.store.save(keys::FILAMENTS, &records)
    }
}

/// Load a list key record by record. Records that do not parse are
/// returned separately, unchanged.
fn load_each<T: DeserializeOwned, S: KeyValueStore>(store: &S, key: &str) -> (Vec<T>, Vec<Value>) {
    let mut items = Vec::new();
    let mut unreadable = Vec::new();
    for record in store.load(key, Vec::<Value>::new()).into_value() {
        match serde_json::from_value(record.clone()) {
            Ok(item) => items.push(item),
            Err(e) => {
                warn!("Keeping unreadable entry in '{}' as is: {}", key, e);
                unreadable.push(record);
            }
        }
    }
    (items, unreadable)
}

/// Append a non-empty value to a suggestion list. Returns whether it was new.
fn remember(list: &mut Vec<String>, value: &str) -> bool {
    if value.is_empty() || list.iter().any(|v| v == value) {
        return false;
    }
    list.push(value.to_string());
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Loaded, MemoryStore};
    use crate::types::FilamentId;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn bench_with_spool(weight: f64) -> (Workbench<MemoryStore>, FilamentId) {
        let mut bench = Workbench::open(MemoryStore::new());
        let spool = bench
            .add_filament(NewFilament {
                name: "PLA-Red".into(),
                weight: Some(weight),
                ..NewFilament::default()
            })
            .unwrap();
        (bench, spool.id)
    }

    #[test]
    fn test_open_empty_store_uses_defaults() {
        let bench = Workbench::open(MemoryStore::new());
        assert!(bench.catalog().prints.is_empty());
        assert_eq!(bench.catalog().brands, vec!["Bambulab"]);
        assert!(bench.migration_report().is_noop());
        // Nothing stored means nothing written back
        assert!(bench.store().raw(keys::PRINTS).is_none());
    }

    #[test]
    fn test_open_migrates_and_writes_back() {
        let store = MemoryStore::new().with_raw(keys::PRINTS, r#"[{"id": 1, "name": "old"}]"#);
        let bench = Workbench::open(store);

        let print = &bench.catalog().prints[0];
        assert_eq!(print.recipient, "Ich");

        let written: Loaded<Vec<Print>> = bench.store().load(keys::PRINTS, Vec::new());
        assert!(written.was_stored());
        assert_eq!(written.into_value()[0].recipient, "Ich");
    }

    #[test]
    fn test_corrupt_prints_start_empty_and_are_not_overwritten() {
        let store = MemoryStore::new().with_raw(keys::PRINTS, "{{not json");
        let bench = Workbench::open(store);

        assert!(bench.catalog().prints.is_empty());
        assert_eq!(bench.store().raw(keys::PRINTS), Some("{{not json"));
    }

    #[test]
    fn test_unreadable_filament_entry_survives_saves() {
        let store = MemoryStore::new().with_raw(
            keys::FILAMENTS,
            r#"[{"id": 1, "name": "ok", "weight": 10}, {"name": "no id", "weight": 3}]"#,
        );
        let mut bench = Workbench::open(store);
        assert_eq!(bench.catalog().filaments.len(), 1);
        assert_eq!(bench.unreadable_filaments().len(), 1);

        let mut draft = bench.begin_new_print(today());
        draft.print.name = "Clip".into();
        draft.print.weight = 4.0;
        bench.save_draft(draft).unwrap();

        let stored: Vec<Value> = bench.store().load(keys::FILAMENTS, Vec::new()).into_value();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[1], serde_json::json!({"name": "no id", "weight": 3}));
    }

    #[test]
    fn test_null_weight_spool_survives_print_save() {
        let store = MemoryStore::new().with_raw(
            keys::FILAMENTS,
            r#"[{"id": 1, "name": "PLA-Red", "weight": 500},
                {"id": 2, "name": "Legacy", "weight": null, "spoolType": "cardboard"}]"#,
        );
        let mut bench = Workbench::open(store);
        assert_eq!(bench.catalog().filaments.len(), 2);

        let mut draft = bench.begin_new_print(today());
        draft.print.name = "Benchy".into();
        draft.print.weight = 10.0;
        bench.save_draft(draft).unwrap();

        let reopened = Workbench::open(bench.store().clone());
        let legacy = reopened.catalog().filament(&FilamentId::from_number(2)).unwrap();
        assert_eq!(legacy.name, "Legacy");
        assert!(legacy.weight.abs() < 1e-9);
        assert_eq!(legacy.extra.get("spoolType"), Some(&serde_json::json!("cardboard")));
        let red = reopened.catalog().filament(&FilamentId::from_number(1)).unwrap();
        assert!((red.weight - 490.0).abs() < 1e-9);
    }

    /// Store whose writes to one key always fail
    #[derive(Clone)]
    struct FailingStore {
        inner: MemoryStore,
        fail_key: &'static str,
    }

    impl KeyValueStore for FailingStore {
        fn get_raw(&self, key: &str) -> Result<Option<String>, SpoolError> {
            self.inner.get_raw(key)
        }

        fn set_raw(&mut self, key: &str, value: &str) -> Result<(), SpoolError> {
            if key == self.fail_key {
                return Err(SpoolError::Store {
                    key: key.to_string(),
                    source: std::io::Error::other("disk full"),
                });
            }
            self.inner.set_raw(key, value)
        }
    }

    #[test]
    fn test_failed_spool_write_stores_no_print() {
        let inner = MemoryStore::new().with_raw(keys::FILAMENTS, r#"[{"id": 1, "name": "PLA", "weight": 500}]"#);
        let mut bench = Workbench::open(FailingStore {
            inner,
            fail_key: keys::FILAMENTS,
        });

        let mut draft = bench.begin_new_print(today());
        draft.print.name = "Benchy".into();
        draft.print.weight = 120.0;

        assert!(matches!(bench.save_draft(draft), Err(SpoolError::Store { .. })));
        assert!(bench.store().inner.raw(keys::PRINTS).is_none());
    }

    #[test]
    fn test_new_draft_defaults() {
        let (bench, spool) = bench_with_spool(500.0);
        let draft = bench.with_default_recipient("Marco").begin_new_print(today());

        assert!(draft.is_new());
        assert_eq!(draft.print.filament_id, Some(spool));
        assert_eq!(draft.print.duration, DEFAULT_DURATION);
        assert_eq!(draft.print.recipient, "Marco");
        assert!(draft.print.success);
    }

    #[test]
    fn test_save_persists_prints_and_spools() {
        let (mut bench, spool) = bench_with_spool(500.0);
        let mut draft = bench.begin_new_print(today());
        draft.print.name = "Benchy".into();
        draft.print.weight = 120.0;

        bench.save_draft(draft).unwrap();

        let reopened = Workbench::open(bench.store().clone());
        assert_eq!(reopened.catalog().prints.len(), 1);
        let stored = reopened.catalog().filament(&spool).unwrap();
        assert!((stored.weight - 380.0).abs() < 1e-9);
    }

    #[test]
    fn test_abandoned_draft_has_no_effect() {
        let (bench, spool) = bench_with_spool(500.0);
        let mut draft = bench.begin_new_print(today());
        draft.print.name = "never saved".into();
        draft.print.weight = 100.0;
        drop(draft);

        assert!(bench.catalog().prints.is_empty());
        assert!((bench.catalog().filament(&spool).unwrap().weight - 500.0).abs() < 1e-9);
    }

    #[test]
    fn test_delete_leaves_stock() {
        let (mut bench, spool) = bench_with_spool(500.0);
        let mut draft = bench.begin_new_print(today());
        draft.print.name = "Benchy".into();
        draft.print.weight = 120.0;
        let id = bench.save_draft(draft).unwrap().print.id;

        bench.delete_print(id).unwrap();

        assert!(bench.catalog().prints.is_empty());
        assert!((bench.catalog().filament(&spool).unwrap().weight - 380.0).abs() < 1e-9);
        assert!(matches!(bench.delete_print(id), Err(SpoolError::UnknownPrint(_))));
    }

    #[test]
    fn test_add_tag_persists_only_when_new() {
        let mut bench = Workbench::open(MemoryStore::new());
        assert_eq!(bench.add_tag("  ", None).unwrap(), TagAdded::Empty);
        assert!(bench.store().raw(keys::TAGS).is_none());

        bench.add_tag("gift", None).unwrap();
        assert!(bench.store().raw(keys::TAGS).unwrap().contains("gift"));
    }

    #[test]
    fn test_new_recipient_is_remembered() {
        let (mut bench, _) = bench_with_spool(500.0);
        let mut draft = bench.begin_new_print(today());
        draft.print.name = "Ornament".into();
        draft.print.recipient = "Oma".into();
        bench.save_draft(draft).unwrap();

        assert!(bench.catalog().recipients.iter().any(|r| r == "Oma"));
    }

    #[test]
    fn test_add_filament_requires_name_and_fills_defaults() {
        let mut bench = Workbench::open(MemoryStore::new());
        assert!(matches!(
            bench.add_filament(NewFilament::default()),
            Err(SpoolError::MissingFilamentName)
        ));

        let spool = bench
            .add_filament(NewFilament {
                name: "Galaxy Black".into(),
                material: Some("PETG".into()),
                ..NewFilament::default()
            })
            .unwrap();
        assert_eq!(spool.brand, "Bambulab");
        assert_eq!(spool.material, "PETG");
        assert_eq!(spool.color, "#000000");
        assert!((spool.weight - 1000.0).abs() < 1e-9);
    }
}
