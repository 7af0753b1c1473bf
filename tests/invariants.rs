// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Invariant tests for the stock ledger and migrator
//!
//! These tests verify critical invariants:
//! 1. Ledger consistency - spool balances follow creates and edits exactly
//! 2. Delete never touches stock
//! 3. Migration is idempotent and never loses records
//! 4. Tag registry changes never rewrite print history

use chrono::NaiveDate;
use proptest::prelude::*;
use serde_json::{json, Value};
use spoolbook::ledger::{self, PrintDraft};
use spoolbook::migrate::{migrate_document, migrate_prints};
use spoolbook::prelude::*;
use spoolbook::store::keys;
use spoolbook::workbench::NewFilament;
use tempfile::TempDir;

// =============================================================================
// Test Helpers
// =============================================================================

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
}

fn add_spool<S: KeyValueStore>(bench: &mut Workbench<S>, name: &str, weight: f64) -> FilamentId {
    bench
        .add_filament(NewFilament {
            name: name.into(),
            weight: Some(weight),
            ..NewFilament::default()
        })
        .unwrap()
        .id
}

fn weight_of<S: KeyValueStore>(bench: &Workbench<S>, id: &FilamentId) -> f64 {
    bench.catalog().filament(id).unwrap().weight
}

fn assert_grams(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}g, got {actual}g"
    );
}

// =============================================================================
// Ledger Consistency Tests
// =============================================================================

#[test]
fn test_create_edit_move_delete_scenario() {
    let dir = TempDir::new().unwrap();
    let mut bench = Workbench::open(JsonDirStore::new(dir.path()));
    let red = add_spool(&mut bench, "PLA-Red", 500.0);
    let blue = add_spool(&mut bench, "PLA-Blue", 800.0);

    // Create: 120g on red
    let mut draft = bench.begin_new_print(day());
    draft.print.name = "Benchy".into();
    draft.print.filament_id = Some(red.clone());
    draft.print.weight = 120.0;
    let id = bench.save_draft(draft).unwrap().print.id;
    assert_grams(weight_of(&bench, &red), 380.0);

    // Edit weight to 200g on the same spool
    let mut draft = bench.begin_edit(id).unwrap();
    draft.print.weight = 200.0;
    bench.save_draft(draft).unwrap();
    assert_grams(weight_of(&bench, &red), 300.0);

    // Move the print to blue
    let mut draft = bench.begin_edit(id).unwrap();
    draft.print.filament_id = Some(blue.clone());
    bench.save_draft(draft).unwrap();
    assert_grams(weight_of(&bench, &red), 500.0);
    assert_grams(weight_of(&bench, &blue), 600.0);

    // Delete leaves both spools alone
    bench.delete_print(id).unwrap();
    assert_grams(weight_of(&bench, &red), 500.0);
    assert_grams(weight_of(&bench, &blue), 600.0);

    // And all of it survived on disk
    let reopened = Workbench::open(JsonDirStore::new(dir.path()));
    assert!(reopened.catalog().prints.is_empty());
    assert_grams(weight_of(&reopened, &red), 500.0);
    assert_grams(weight_of(&reopened, &blue), 600.0);
}

#[test]
fn test_delete_never_changes_stock() {
    let mut bench = Workbench::open(MemoryStore::new());
    let spool = add_spool(&mut bench, "PETG-Black", 1000.0);

    let mut ids = Vec::new();
    for (i, grams) in [50.0, 75.5, 10.0].into_iter().enumerate() {
        let mut draft = bench.begin_new_print(day());
        draft.print.name = format!("part-{i}");
        draft.print.weight = grams;
        ids.push(bench.save_draft(draft).unwrap().print.id);
    }
    let before = weight_of(&bench, &spool);

    for id in ids {
        bench.delete_print(id).unwrap();
        assert_grams(weight_of(&bench, &spool), before);
    }
}

#[test]
fn test_print_on_deleted_spool_is_skipped() {
    let mut bench = Workbench::open(MemoryStore::new());
    let spool = add_spool(&mut bench, "PLA", 500.0);

    let mut draft = bench.begin_new_print(day());
    draft.print.name = "orphan".into();
    draft.print.filament_id = Some(FilamentId::new("gone"));
    draft.print.weight = 40.0;
    let committed = bench.save_draft(draft).unwrap();

    assert!(!committed.deltas[0].is_applied());
    assert_grams(weight_of(&bench, &spool), 500.0);
}

#[test]
fn test_negative_stock_is_flagged_not_blocked() {
    let mut bench = Workbench::open(MemoryStore::new());
    let spool = add_spool(&mut bench, "Sample", 30.0);

    let mut draft = bench.begin_new_print(day());
    draft.print.name = "too big".into();
    draft.print.weight = 45.0;

    let preview = bench.preview(&draft).unwrap();
    assert!(preview.is_negative());
    assert_grams(preview.projected, -15.0);

    bench.save_draft(draft).unwrap();
    assert_grams(weight_of(&bench, &spool), -15.0);
}

#[test]
fn test_preview_while_editing_counts_the_snapshot() {
    let mut bench = Workbench::open(MemoryStore::new());
    let red = add_spool(&mut bench, "PLA-Red", 500.0);
    let blue = add_spool(&mut bench, "PLA-Blue", 800.0);

    let mut draft = bench.begin_new_print(day());
    draft.print.name = "Benchy".into();
    draft.print.filament_id = Some(red.clone());
    draft.print.weight = 120.0;
    let id = bench.save_draft(draft).unwrap().print.id;

    let mut draft = bench.begin_edit(id).unwrap();
    draft.print.weight = 200.0;
    let same = bench.preview(&draft).unwrap();
    assert_grams(same.current, 380.0);
    assert_grams(same.projected, 300.0);
    assert_eq!(same.change, Some(80.0));

    draft.print.filament_id = Some(blue);
    let moved = bench.preview(&draft).unwrap();
    assert_grams(moved.projected, 600.0);

    // Previewing changes nothing
    assert_grams(weight_of(&bench, &red), 380.0);
}

#[test]
fn test_failed_validation_leaves_everything_untouched() {
    let mut bench = Workbench::open(MemoryStore::new());
    let spool = add_spool(&mut bench, "PLA", 500.0);

    let mut draft = bench.begin_new_print(day());
    draft.print.name = "   ".into();
    draft.print.weight = 100.0;

    assert!(matches!(bench.save_draft(draft), Err(SpoolError::MissingPrintName)));
    assert!(bench.catalog().prints.is_empty());
    assert_grams(weight_of(&bench, &spool), 500.0);
}

// =============================================================================
// Tag Registry Tests
// =============================================================================

#[test]
fn test_removing_tag_keeps_print_history() {
    let mut bench = Workbench::open(MemoryStore::new());
    add_spool(&mut bench, "PLA", 500.0);

    let mut draft = bench.begin_new_print(day());
    draft.print.name = "Gift box".into();
    bench.add_tag("gift", Some(&mut draft)).unwrap();
    let id = bench.save_draft(draft).unwrap().print.id;

    assert!(bench.remove_tag("gift").unwrap());
    assert!(!bench.catalog().tags.contains("gift"));
    assert!(bench.catalog().print(id).unwrap().has_tag("gift"));

    let reopened = Workbench::open(bench.store().clone());
    assert!(reopened.catalog().print(id).unwrap().has_tag("gift"));
}

#[test]
fn test_add_tag_with_draft_does_not_persist_the_draft() {
    let mut bench = Workbench::open(MemoryStore::new());
    let mut draft = bench.begin_new_print(day());
    draft.print.name = "never saved".into();

    bench.add_tag("  prototype ", Some(&mut draft)).unwrap();

    assert!(draft.print.has_tag("prototype"));
    assert!(bench.catalog().tags.contains("prototype"));
    assert!(bench.store().raw(keys::PRINTS).is_none());
}

// =============================================================================
// Migration Tests
// =============================================================================

#[test]
fn test_legacy_document_migrates_on_open() {
    let legacy = json!([
        {"id": 3, "name": "Old vase", "weight": "42", "filamentId": "7", "tags": ["a", "a", ""]},
        {"id": 3, "name": "Clash", "success": false, "date": "last tuesday"},
        "not a print"
    ]);
    let store = MemoryStore::new().with_raw(keys::PRINTS, &legacy.to_string());
    let bench = Workbench::open(store);

    let report = bench.migration_report();
    assert_eq!(report.seen, 3);
    assert_eq!(report.dropped, 1);
    assert_eq!(report.reassigned_ids, 1);

    let prints = &bench.catalog().prints;
    assert_eq!(prints.len(), 2);
    assert_eq!(prints[0].filament_id, Some(FilamentId::from_number(7)));
    assert_eq!(prints[0].tags, vec!["a"]);
    assert_grams(prints[0].weight, 42.0);
    assert_eq!(prints[1].id, PrintId(4));
    assert!(!prints[1].success);
    assert_eq!(prints[1].extra.get("legacyDate"), Some(&json!("last tuesday")));

    // Reopening the migrated store finds nothing left to do
    let reopened = Workbench::open(bench.store().clone());
    assert!(reopened.migration_report().is_noop());
    assert_eq!(&reopened.catalog().prints, prints);
}

#[test]
fn test_non_list_document_degrades_to_empty() {
    let (prints, report) = migrate_document(&json!({"prints": []}));
    assert!(prints.is_empty());
    assert!(report.is_noop());
}

// =============================================================================
// Properties
// =============================================================================

fn legacy_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-5i64..2000).prop_map(Value::from),
        (0.0f64..2000.0).prop_map(Value::from),
        "[a-z0-9 ]{0,6}".prop_map(Value::from),
    ]
}

fn legacy_record() -> impl Strategy<Value = Value> {
    (
        proptest::option::of(legacy_value()),
        proptest::option::of("[A-Za-z ]{0,10}"),
        proptest::option::of(legacy_value()),
        proptest::option::of(legacy_value()),
        proptest::option::of(legacy_value()),
        proptest::option::of(proptest::collection::vec("[a-c]{0,2}", 0..4)),
        proptest::option::of(legacy_value()),
        proptest::option::of(prop_oneof![
            Just(json!("2025-01-02")),
            Just(json!("2025-01-02T08:30:00Z")),
            Just(json!("someday")),
        ]),
        proptest::option::of(legacy_value()),
    )
        .prop_map(|(id, name, weight, duration, rating, tags, success, date, filament)| {
            let mut record = serde_json::Map::new();
            let mut put = |k: &str, v: Option<Value>| {
                if let Some(v) = v {
                    record.insert(k.to_string(), v);
                }
            };
            put("id", id);
            put("name", name.map(Value::from));
            put("weight", weight);
            put("duration", duration);
            put("rating", rating);
            put("tags", tags.map(Value::from));
            put("success", success);
            put("date", date);
            put("filamentId", filament);
            Value::Object(record)
        })
}

proptest! {
    #[test]
    fn prop_migration_is_idempotent(records in proptest::collection::vec(legacy_record(), 0..8)) {
        let (first, report) = migrate_prints(&records);
        prop_assert_eq!(first.len(), records.len());
        prop_assert_eq!(report.dropped, 0);

        let stored: Vec<Value> = first.iter().map(|p| serde_json::to_value(p).unwrap()).collect();
        let (second, again) = migrate_prints(&stored);
        prop_assert_eq!(&second, &first);
        prop_assert!(again.is_noop());
        prop_assert_eq!(again.reassigned_ids, 0);
    }

    #[test]
    fn prop_migrated_ids_are_unique(records in proptest::collection::vec(legacy_record(), 0..8)) {
        let (prints, _) = migrate_prints(&records);
        let mut ids: Vec<i64> = prints.iter().map(|p| p.id.0).collect();
        ids.sort_unstable();
        ids.dedup();
        prop_assert_eq!(ids.len(), prints.len());
        prop_assert!(ids.iter().all(|id| *id > 0));
    }

    #[test]
    fn prop_edit_moves_only_the_difference(
        original in 0.0f64..1000.0,
        edited in 0.0f64..1000.0,
        move_spool in any::<bool>(),
    ) {
        let mut catalog = Catalog::default();
        for (id, grams) in [(1, 1000.0), (2, 1000.0)] {
            catalog.add_filament(Filament {
                id: FilamentId::from_number(id),
                name: format!("spool-{id}"),
                brand: String::new(),
                material: String::new(),
                color: String::new(),
                weight: grams,
                price: 0.0,
                extra: serde_json::Map::new(),
            });
        }

        let mut draft = PrintDraft::new(Print {
            id: PrintId(0),
            name: "part".into(),
            date: None,
            duration: 0,
            weight: original,
            filament_id: Some(FilamentId::from_number(1)),
            rating: 0,
            recipient: String::new(),
            tags: Vec::new(),
            success: true,
            notes: String::new(),
            extra: serde_json::Map::new(),
        });
        let id = ledger::commit(&mut catalog, draft, 1).unwrap().print.id;

        draft = PrintDraft::edit(catalog.print(id).unwrap());
        draft.print.weight = edited;
        if move_spool {
            draft.print.filament_id = Some(FilamentId::from_number(2));
        }
        ledger::commit(&mut catalog, draft, 2).unwrap();

        let one = catalog.filament(&FilamentId::from_number(1)).unwrap().weight;
        let two = catalog.filament(&FilamentId::from_number(2)).unwrap().weight;
        let total_used = 2000.0 - one - two;
        prop_assert!((total_used - edited).abs() < 1e-6);
        if move_spool {
            prop_assert!((one - 1000.0).abs() < 1e-6);
        } else {
            prop_assert!((two - 1000.0).abs() < 1e-6);
        }
    }
}
