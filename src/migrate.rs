// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Schema migration for stored print records
//!
//! Older releases wrote prints with fewer fields, a nested `filament`
//! object instead of `filamentId`, and ids as strings. Migration fills every
//! current field with its default and keeps unknown fields verbatim, so
//! nothing the user recorded is lost. Running it on its own output changes
//! nothing.
//!
//! Empty, zero and null values count as absent for every field except
//! `success`, where only a truly absent key defaults to `true`.

use crate::types::{FilamentId, Print, PrintId};
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Recipient given to prints that never recorded one
pub const DEFAULT_RECIPIENT: &str = "Ich";

/// Extra field holding a date that could not be parsed
pub const LEGACY_DATE_FIELD: &str = "legacyDate";

const KNOWN_FIELDS: &[&str] = &[
    "id",
    "name",
    "date",
    "duration",
    "weight",
    "filamentId",
    "rating",
    "recipient",
    "tags",
    "success",
    "notes",
];

/// What a migration pass did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    /// Records read
    pub seen: usize,
    /// Records whose stored form changed
    pub changed: usize,
    /// Records dropped because they were not objects
    pub dropped: usize,
    /// Records that received a fresh id
    pub reassigned_ids: usize,
}

impl MigrationReport {
    /// Whether the stored collection needs rewriting
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.changed == 0 && self.dropped == 0
    }
}

/// Migrate a stored print collection.
///
/// Anything other than a JSON array degrades to an empty collection.
#[must_use]
pub fn migrate_document(document: &Value) -> (Vec<Print>, MigrationReport) {
    match document {
        Value::Array(records) => migrate_prints(records),
        Value::Null => (Vec::new(), MigrationReport::default()),
        other => {
            warn!("Stored prints are not a list ({}), starting empty", kind_of(other));
            (Vec::new(), MigrationReport::default())
        }
    }
}

/// Migrate a sequence of print-shaped records to the current schema.
#[must_use]
pub fn migrate_prints(records: &[Value]) -> (Vec<Print>, MigrationReport) {
    let mut report = MigrationReport {
        seen: records.len(),
        ..MigrationReport::default()
    };

    let mut drafts: Vec<(Option<PrintId>, Print, &Value)> = Vec::with_capacity(records.len());
    for record in records {
        let Value::Object(fields) = record else {
            warn!("Dropping stored print that is not an object ({})", kind_of(record));
            report.dropped += 1;
            continue;
        };
        let (id, print) = migrate_record(fields);
        drafts.push((id, print, record));
    }

    // Ids must be unique; missing, out of range and duplicate ids get fresh
    // ones above the current maximum, in stored order, so a second pass
    // assigns nothing.
    let mut taken: HashSet<PrintId> = drafts.iter().filter_map(|(id, _, _)| *id).collect();
    let mut next_id = taken.iter().map(|i| i.0).max().unwrap_or(0) + 1;
    let mut seen_ids = HashSet::new();

    let mut prints = Vec::with_capacity(drafts.len());
    for (id, mut print, original) in drafts {
        match id {
            Some(id) if seen_ids.insert(id) => print.id = id,
            other => {
                let fresh = fresh_id(&mut next_id, &taken);
                if let Some(dup) = other {
                    warn!("Duplicate print id {}, assigning {}", dup, fresh);
                }
                print.id = fresh;
                taken.insert(fresh);
                seen_ids.insert(fresh);
                report.reassigned_ids += 1;
            }
        }

        if serde_json::to_value(&print).ok().as_ref() != Some(original) {
            report.changed += 1;
        }
        prints.push(print);
    }

    debug!(
        "Migrated {} prints ({} changed, {} dropped)",
        prints.len(),
        report.changed,
        report.dropped
    );
    (prints, report)
}

fn migrate_record(fields: &Map<String, Value>) -> (Option<PrintId>, Print) {
    let get = |key: &str| fields.get(key).filter(|v| is_truthy(v));

    let id = fields.get("id").and_then(PrintId::from_json);

    let filament_id = get("filamentId")
        .and_then(FilamentId::from_json)
        .or_else(|| {
            fields
                .get("filament")
                .and_then(|f| f.get("id"))
                .and_then(FilamentId::from_json)
        });

    let mut extra: Map<String, Value> = fields
        .iter()
        .filter(|(k, _)| !KNOWN_FIELDS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    let date = match fields.get("date") {
        None | Some(Value::Null) => None,
        Some(raw) => {
            let parsed = raw.as_str().and_then(parse_date);
            if parsed.is_none() && !extra.contains_key(LEGACY_DATE_FIELD) {
                extra.insert(LEGACY_DATE_FIELD.to_string(), raw.clone());
            }
            parsed
        }
    };

    let print = Print {
        id: id.unwrap_or(PrintId(0)),
        name: fields.get("name").map(text).unwrap_or_default(),
        date,
        duration: get("duration").and_then(number).map_or(0, to_minutes),
        weight: get("weight").and_then(number).unwrap_or(0.0),
        filament_id,
        rating: get("rating").and_then(number).map_or(0, to_rating),
        recipient: get("recipient")
            .map(text)
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_RECIPIENT.to_string()),
        tags: get("tags").map(tag_set).unwrap_or_default(),
        success: match fields.get("success") {
            None => true,
            Some(Value::Bool(b)) => *b,
            Some(other) => is_truthy(other),
        },
        notes: get("notes").map(text).unwrap_or_default(),
        extra,
    };

    (id, print)
}

/// Next unused id at or after `next`. Wraps to the lowest free id once the
/// ceiling is reached, so assigned ids always parse back.
fn fresh_id(next: &mut i64, taken: &HashSet<PrintId>) -> PrintId {
    if *next > PrintId::MAX {
        *next = 1;
    }
    while taken.contains(&PrintId(*next)) {
        *next += 1;
    }
    let id = PrintId(*next);
    *next += 1;
    id
}

/// Dates were written as `YYYY-MM-DD`, sometimes as full ISO timestamps.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| raw.get(..10).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn number(value: &Value) -> Option<f64> {
    let parsed: Option<f64> = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.filter(|f| f.is_finite())
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_minutes(minutes: f64) -> u32 {
    minutes.round().clamp(0.0, f64::from(u32::MAX)) as u32
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_rating(rating: f64) -> u8 {
    rating.round().clamp(0.0, 5.0) as u8
}

fn tag_set(value: &Value) -> Vec<String> {
    let raw: Vec<String> = match value {
        Value::Array(items) => items
            .iter()
            .filter(|v| !matches!(v, Value::Null | Value::Array(_) | Value::Object(_)))
            .map(text)
            .collect(),
        Value::String(s) => vec![s.clone()],
        _ => Vec::new(),
    };

    let mut seen = HashSet::new();
    raw.into_iter()
        .filter(|t| !t.is_empty() && seen.insert(t.clone()))
        .collect()
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
