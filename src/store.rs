// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Key-value persistence for the catalog
//!
//! Every collection lives under its own string key as a JSON document.
//! Loading never fails: a missing key yields the caller's fallback and a
//! malformed document yields the fallback plus a diagnostic, so callers can
//! tell the three cases apart without the load aborting.

use crate::error::SpoolError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Store keys used by the catalog
pub mod keys {
    /// Filament collection
    pub const FILAMENTS: &str = "filaments";
    /// Print collection
    pub const PRINTS: &str = "prints";
    /// Material list
    pub const MATERIALS: &str = "materials";
    /// Brand list
    pub const BRANDS: &str = "brands";
    /// Recipient list
    pub const RECIPIENTS: &str = "recipients";
    /// Tag registry
    pub const TAGS: &str = "tags";
}

/// Outcome of a fail-open load
#[derive(Debug, Clone, PartialEq)]
pub enum Loaded<T> {
    /// The key existed and parsed
    Stored(T),
    /// The key did not exist; the fallback was used
    Missing(T),
    /// The key existed but could not be read or parsed; the fallback was used
    Fallback {
        /// The fallback value
        value: T,
        /// Why the stored value was rejected
        diagnostic: String,
    },
}

impl<T> Loaded<T> {
    /// Take the value, whichever way it was obtained
    pub fn into_value(self) -> T {
        match self {
            Self::Stored(v) | Self::Missing(v) | Self::Fallback { value: v, .. } => v,
        }
    }

    /// Borrow the value
    pub fn value(&self) -> &T {
        match self {
            Self::Stored(v) | Self::Missing(v) | Self::Fallback { value: v, .. } => v,
        }
    }

    /// Whether the stored data was rejected
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }

    /// Whether a value was present under the key
    pub fn was_stored(&self) -> bool {
        matches!(self, Self::Stored(_))
    }

    /// Diagnostic for a rejected value
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            Self::Fallback { diagnostic, .. } => Some(diagnostic),
            _ => None,
        }
    }
}

/// String-keyed storage of JSON documents
pub trait KeyValueStore {
    /// Read the raw document for `key`, `None` when absent
    fn get_raw(&self, key: &str) -> Result<Option<String>, SpoolError>;

    /// Replace the raw document for `key`
    fn set_raw(&mut self, key: &str, value: &str) -> Result<(), SpoolError>;

    /// Load and parse `key`, falling back on absence or corruption
    fn load<T: DeserializeOwned>(&self, key: &str, fallback: T) -> Loaded<T>
    where
        Self: Sized,
    {
        let raw = match self.get_raw(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Loaded::Missing(fallback),
            Err(e) => {
                warn!("Could not read '{}', using fallback: {}", key, e);
                return Loaded::Fallback {
                    value: fallback,
                    diagnostic: e.to_string(),
                };
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Loaded::Stored(value),
            Err(e) => {
                warn!("Data for '{}' could not be loaded, using fallback: {}", key, e);
                Loaded::Fallback {
                    value: fallback,
                    diagnostic: e.to_string(),
                }
            }
        }
    }

    /// Serialize and store `value` under `key`
    fn save<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<(), SpoolError>
    where
        Self: Sized,
    {
        let json = serde_json::to_string_pretty(value).map_err(|source| SpoolError::Serialize {
            key: key.to_string(),
            source,
        })?;
        debug!("Saving '{}' ({} bytes)", key, json.len());
        self.set_raw(key, &json)
    }
}

/// One JSON file per key inside a data directory
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    dir: PathBuf,
}

impl JsonDirStore {
    /// Use `dir` as the data directory; it is created on first write
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The data directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for JsonDirStore {
    fn get_raw(&self, key: &str) -> Result<Option<String>, SpoolError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(SpoolError::Store {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn set_raw(&mut self, key: &str, value: &str) -> Result<(), SpoolError> {
        let io_err = |source: std::io::Error| SpoolError::Store {
            key: key.to_string(),
            source,
        };
        fs::create_dir_all(&self.dir).map_err(io_err)?;

        // Write-then-rename so a crash never leaves a half-written document.
        let path = self.path_for(key);
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        fs::write(&tmp, value).map_err(io_err)?;
        fs::rename(&tmp, &path).map_err(io_err)?;
        Ok(())
    }
}

/// In-memory store, for tests and dry runs
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw document, bypassing serialization
    #[must_use]
    pub fn with_raw(mut self, key: &str, raw: &str) -> Self {
        self.entries.insert(key.to_string(), raw.to_string());
        self
    }

    /// Raw document for `key`
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl KeyValueStore for MemoryStore {
    fn get_raw(&self, key: &str) -> Result<Option<String>, SpoolError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set_raw(&mut self, key: &str, value: &str) -> Result<(), SpoolError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
