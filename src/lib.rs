// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Spoolbook library - filament inventory and print log
//!
//! This crate keeps a filament inventory numerically consistent with a log
//! of print jobs. The stock ledger charges, refunds and re-charges spool
//! mass as prints are created and edited; the migrator upgrades print
//! records written by older schemas on load.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backup;
pub mod catalog;
pub mod commands;
pub mod config;
pub mod error;
pub mod ledger;
pub mod migrate;
pub mod report;
pub mod store;
pub mod tags;
pub mod workbench;

/// Core data types for filaments and print records
pub mod types {
    use chrono::NaiveDate;
    use serde::de::{self, Deserializer, Visitor};
    use serde::{Deserialize, Serialize, Serializer};
    use serde_json::{Map, Value};
    use std::fmt;

    // =========================================================================
    // Identifiers
    // =========================================================================

    /// Identifier of a filament spool.
    ///
    /// Stored data mixes numeric and string identifiers (older records
    /// carried the spool id as form text). Both shapes deserialize into the
    /// same canonical string so lookups are plain equality.
    #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct FilamentId(String);

    impl FilamentId {
        /// Build an identifier from any textual form, trimming whitespace
        #[must_use]
        pub fn new(raw: impl AsRef<str>) -> Self {
            Self(raw.as_ref().trim().to_string())
        }

        /// Build an identifier from a numeric id
        #[must_use]
        pub fn from_number(n: i64) -> Self {
            Self(n.to_string())
        }

        /// Canonicalise a JSON value into an identifier.
        ///
        /// Returns `None` for null, empty strings, zero, booleans and
        /// structured values: none of those ever named a spool.
        #[must_use]
        pub fn from_json(value: &Value) -> Option<Self> {
            match value {
                Value::String(s) if !s.trim().is_empty() => Some(Self::new(s)),
                Value::Number(n) => {
                    if let Some(i) = n.as_i64() {
                        (i != 0).then(|| Self::from_number(i))
                    } else if let Some(u) = n.as_u64() {
                        Some(Self(u.to_string()))
                    } else {
                        n.as_f64()
                            .filter(|f| f.is_finite() && *f != 0.0)
                            .map(|f| Self(f.to_string()))
                    }
                }
                _ => None,
            }
        }

        /// Borrow the canonical string form
        #[must_use]
        pub fn as_str(&self) -> &str {
            &self.0
        }

        /// Numeric value, when the identifier is numeric
        #[must_use]
        pub fn as_number(&self) -> Option<i64> {
            self.0.parse().ok()
        }
    }

    impl fmt::Display for FilamentId {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.0)
        }
    }

    impl Serialize for FilamentId {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_str(&self.0)
        }
    }

    impl<'de> Deserialize<'de> for FilamentId {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            struct IdVisitor;

            impl Visitor<'_> for IdVisitor {
                type Value = FilamentId;

                fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str("a filament id as string or number")
                }

                fn visit_str<E: de::Error>(self, v: &str) -> Result<FilamentId, E> {
                    Ok(FilamentId::new(v))
                }

                fn visit_i64<E: de::Error>(self, v: i64) -> Result<FilamentId, E> {
                    Ok(FilamentId::from_number(v))
                }

                fn visit_u64<E: de::Error>(self, v: u64) -> Result<FilamentId, E> {
                    Ok(FilamentId(v.to_string()))
                }

                fn visit_f64<E: de::Error>(self, v: f64) -> Result<FilamentId, E> {
                    Ok(FilamentId(v.to_string()))
                }
            }

            deserializer.deserialize_any(IdVisitor)
        }
    }

    /// Identifier of a print record: creation time in epoch milliseconds.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct PrintId(pub i64);

    impl PrintId {
        /// Largest accepted id: 2^53 - 1, the largest integer a JSON
        /// number holds exactly. Larger stored ids are treated as missing.
        pub const MAX: i64 = 9_007_199_254_740_991;

        /// Parse an id from a JSON number or numeric string.
        ///
        /// `None` unless the value lies in `1..=PrintId::MAX`.
        #[must_use]
        #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
        pub fn from_json(value: &Value) -> Option<Self> {
            let id = match value {
                Value::Number(n) => n.as_i64().or_else(|| {
                    n.as_f64()
                        .filter(|f| f.is_finite() && f.abs() <= Self::MAX as f64)
                        .map(|f| f as i64)
                }),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            }?;
            (1..=Self::MAX).contains(&id).then_some(Self(id))
        }
    }

    impl fmt::Display for PrintId {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    // =========================================================================
    // Filament
    // =========================================================================

    /// A spool of filament with its remaining mass.
    ///
    /// Only the id is required. Null or missing fields take their defaults,
    /// and fields this schema does not know are kept in `extra`.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Filament {
        /// Spool identifier
        pub id: FilamentId,
        /// Display name
        #[serde(default, deserialize_with = "null_as_default")]
        pub name: String,
        /// Manufacturer
        #[serde(default, deserialize_with = "null_as_default")]
        pub brand: String,
        /// Material (PLA, PETG, ...)
        #[serde(default, deserialize_with = "null_as_default")]
        pub material: String,
        /// Color as a hex string
        #[serde(default, deserialize_with = "null_as_default")]
        pub color: String,
        /// Grams remaining. A running balance that may go negative.
        #[serde(default, deserialize_with = "null_as_default")]
        pub weight: f64,
        /// Purchase price
        #[serde(default, deserialize_with = "null_as_default")]
        pub price: f64,
        /// Fields written by other versions, kept verbatim
        #[serde(flatten)]
        pub extra: Map<String, Value>,
    }

    fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Default + Deserialize<'de>,
    {
        Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
    }

    // =========================================================================
    // Print
    // =========================================================================

    /// One logged print job
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Print {
        /// Unique id, increasing with creation time
        pub id: PrintId,
        /// Job name
        pub name: String,
        /// Calendar date of the print
        pub date: Option<NaiveDate>,
        /// Print time in minutes
        pub duration: u32,
        /// Grams of filament consumed
        pub weight: f64,
        /// Spool the print consumed from. May name a spool that no longer exists.
        pub filament_id: Option<FilamentId>,
        /// Rating, 0 to 5
        pub rating: u8,
        /// Who the print was for
        pub recipient: String,
        /// Tags as recorded when the print was saved
        pub tags: Vec<String>,
        /// Whether the print succeeded
        pub success: bool,
        /// Free-form notes
        pub notes: String,
        /// Fields written by older schemas, kept verbatim
        #[serde(flatten)]
        pub extra: Map<String, Value>,
    }

    impl Print {
        /// Whether the print carries `tag` (exact, case-sensitive)
        #[must_use]
        pub fn has_tag(&self, tag: &str) -> bool {
            self.tags.iter().any(|t| t == tag)
        }
    }
}

/// Prelude for common imports
pub mod prelude {
    pub use crate::catalog::Catalog;
    pub use crate::error::SpoolError;
    pub use crate::ledger::{PrintDraft, StockPreview};
    pub use crate::store::{JsonDirStore, KeyValueStore, Loaded, MemoryStore};
    pub use crate::tags::TagRegistry;
    pub use crate::types::*;
    pub use crate::workbench::Workbench;
    pub use anyhow::{Context, Result};
}
