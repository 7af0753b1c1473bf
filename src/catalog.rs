// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! The print catalog - filaments, prints and the registries around them

use crate::error::SpoolError;
use crate::tags::TagRegistry;
use crate::types::{Filament, FilamentId, Print, PrintId};

/// Materials offered when none are stored
pub const DEFAULT_MATERIALS: &[&str] = &["PLA", "PLA Matte", "PETG"];
/// Brands offered when none are stored
pub const DEFAULT_BRANDS: &[&str] = &["Bambulab"];
/// Recipients offered when none are stored
pub const DEFAULT_RECIPIENTS: &[&str] = &["Ich", "Sónia", "Marco", "Geschenk", "Andere"];

/// Owned lists of the default registries
#[must_use]
pub fn defaults(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| (*s).to_string()).collect()
}

/// Everything the user has recorded
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    /// Spools, in creation order
    pub filaments: Vec<Filament>,
    /// Prints, most recent first
    pub prints: Vec<Print>,
    /// Known tags
    pub tags: TagRegistry,
    /// Known materials
    pub materials: Vec<String>,
    /// Known brands
    pub brands: Vec<String>,
    /// Known recipients
    pub recipients: Vec<String>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            filaments: Vec::new(),
            prints: Vec::new(),
            tags: TagRegistry::new(),
            materials: defaults(DEFAULT_MATERIALS),
            brands: defaults(DEFAULT_BRANDS),
            recipients: defaults(DEFAULT_RECIPIENTS),
        }
    }
}

impl Catalog {
    // =========================================================================
    // Prints
    // =========================================================================

    /// Add a print at the front of the log
    pub fn insert_print(&mut self, print: Print) {
        self.prints.insert(0, print);
    }

    /// Replace the stored print with the same id, returning the old record
    pub fn replace_print(&mut self, print: Print) -> Result<Print, SpoolError> {
        let slot = self
            .prints
            .iter_mut()
            .find(|p| p.id == print.id)
            .ok_or(SpoolError::UnknownPrint(print.id))?;
        Ok(std::mem::replace(slot, print))
    }

    /// Remove a print. Spool balances are left as they are.
    pub fn remove_print(&mut self, id: PrintId) -> Option<Print> {
        let idx = self.prints.iter().position(|p| p.id == id)?;
        Some(self.prints.remove(idx))
    }

    /// Look up a print
    #[must_use]
    pub fn print(&self, id: PrintId) -> Option<&Print> {
        self.prints.iter().find(|p| p.id == id)
    }

    /// Next print id: `now_millis`, or one past the newest id if that is later
    #[must_use]
    pub fn next_print_id(&self, now_millis: i64) -> PrintId {
        let newest = self.prints.iter().map(|p| p.id.0).max().unwrap_or(0);
        PrintId(now_millis.max(newest.saturating_add(1)))
    }

    // =========================================================================
    // Filaments
    // =========================================================================

    /// Append a spool
    pub fn add_filament(&mut self, filament: Filament) {
        self.filaments.push(filament);
    }

    /// Look up a spool
    #[must_use]
    pub fn filament(&self, id: &FilamentId) -> Option<&Filament> {
        self.filaments.iter().find(|f| &f.id == id)
    }

    /// The spool a print consumed from, if it still exists
    #[must_use]
    pub fn filament_for(&self, print: &Print) -> Option<&Filament> {
        print.filament_id.as_ref().and_then(|id| self.filament(id))
    }

    /// Next spool id, following the same rule as print ids
    #[must_use]
    pub fn next_filament_id(&self, now_millis: i64) -> FilamentId {
        let newest = self
            .filaments
            .iter()
            .filter_map(|f| f.id.as_number())
            .max()
            .unwrap_or(0);
        FilamentId::from_number(now_millis.max(newest.saturating_add(1)))
    }

    /// Resolve a spool by exact id, then by unique name
    pub fn resolve_filament(&self, id_or_name: &str) -> Result<&Filament, SpoolError> {
        let id = FilamentId::new(id_or_name);
        if let Some(f) = self.filament(&id) {
            return Ok(f);
        }

        let matches: Vec<_> = self
            .filaments
            .iter()
            .filter(|f| f.name == id_or_name)
            .collect();

        match matches.as_slice() {
            [] => Err(SpoolError::UnknownFilament(id_or_name.to_string())),
            [single] => Ok(*single),
            many => Err(SpoolError::AmbiguousFilament {
                query: id_or_name.to_string(),
                matches: many.len(),
            }),
        }
    }

    /// Prints charged to a spool
    #[must_use]
    pub fn prints_on(&self, id: &FilamentId) -> Vec<&Print> {
        self.prints
            .iter()
            .filter(|p| p.filament_id.as_ref() == Some(id))
            .collect()
    }
}
