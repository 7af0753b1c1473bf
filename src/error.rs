// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Error types for the spoolbook core

use crate::types::PrintId;
use thiserror::Error;

/// Errors raised by catalog, ledger and store operations
#[derive(Error, Debug)]
pub enum SpoolError {
    /// A print was saved without a name
    #[error("print name is required")]
    MissingPrintName,

    /// A filament was created without a name
    #[error("filament name is required")]
    MissingFilamentName,

    /// No print with this id exists
    #[error("print not found: {0}")]
    UnknownPrint(PrintId),

    /// No filament matched the id or name
    #[error("filament not found: {0}")]
    UnknownFilament(String),

    /// Several filaments share the given name
    #[error("filament name '{query}' is ambiguous ({matches} spools match), use the id")]
    AmbiguousFilament {
        /// The name that was looked up
        query: String,
        /// How many spools matched
        matches: usize,
    },

    /// Reading or writing a stored key failed
    #[error("store error for key '{key}': {source}")]
    Store {
        /// Store key
        key: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A value could not be serialized for storage
    #[error("failed to serialize '{key}': {source}")]
    Serialize {
        /// Store key
        key: String,
        /// Underlying serde error
        #[source]
        source: serde_json::Error,
    },

    /// The backup target rejected or failed the upload
    #[error("backup failed: {0}")]
    Backup(String),
}
