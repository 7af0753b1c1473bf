// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Backups - snapshot payload and upsert targets
//!
//! A backup is a single JSON document written under a fixed file name. If
//! the target already holds a file of that name it is replaced, otherwise
//! it is created. Local state is never touched by a backup.

use crate::catalog::Catalog;
use crate::error::SpoolError;
use crate::types::{Filament, Print};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

/// File name used when none is configured
pub const DEFAULT_BACKUP_FILENAME: &str = "spoolbook_backup.json";

/// The data a backup carries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupSnapshot {
    /// All spools
    pub filaments: Vec<Filament>,
    /// All prints, most recent first
    pub prints: Vec<Print>,
    /// Known materials
    pub materials: Vec<String>,
    /// Registered tags
    pub tags: Vec<String>,
}

impl BackupSnapshot {
    /// Copy the backed-up collections out of a catalog
    #[must_use]
    pub fn of(catalog: &Catalog) -> Self {
        Self {
            filaments: catalog.filaments.clone(),
            prints: catalog.prints.clone(),
            materials: catalog.materials.clone(),
            tags: catalog.tags.as_slice().to_vec(),
        }
    }
}

/// How an upsert went
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// No file of that name existed
    Created,
    /// An existing file was replaced
    Updated,
}

/// Somewhere a backup can be written
pub trait BackupTarget {
    /// Write `snapshot` as `filename`, replacing an existing file of that name
    fn upsert(&self, filename: &str, snapshot: &BackupSnapshot) -> Result<UpsertOutcome, SpoolError>;

    /// Human-readable location, for messages
    fn describe(&self) -> String;
}

/// A local folder, typically one synced by another tool
#[derive(Debug, Clone)]
pub struct DirectoryTarget {
    dir: PathBuf,
}

impl DirectoryTarget {
    /// Target the folder `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl BackupTarget for DirectoryTarget {
    fn upsert(&self, filename: &str, snapshot: &BackupSnapshot) -> Result<UpsertOutcome, SpoolError> {
        let io_err = |source: std::io::Error| SpoolError::Store {
            key: filename.to_string(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(io_err)?;
        let path = self.dir.join(filename);
        let outcome = if path.exists() {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Created
        };

        let json = serde_json::to_string_pretty(snapshot).map_err(|source| SpoolError::Serialize {
            key: filename.to_string(),
            source,
        })?;
        fs::write(&path, json).map_err(io_err)?;

        info!("Backup written to {} ({:?})", path.display(), outcome);
        Ok(outcome)
    }

    fn describe(&self) -> String {
        self.dir.display().to_string()
    }
}

/// An HTTP file endpoint: files live at `<base>/<folder>/<filename>`
pub struct HttpTarget {
    base_url: String,
    folder: Option<String>,
    token: Option<String>,
    client: reqwest::blocking::Client,
}

impl HttpTarget {
    /// Target `base_url`, optionally inside `folder`
    #[must_use]
    pub fn new(base_url: impl Into<String>, folder: Option<String>, token: Option<String>) -> Self {
        Self {
            base_url: base_url.into(),
            folder,
            token,
            client: reqwest::blocking::Client::new(),
        }
    }

    /// URL of `filename` on this target
    #[must_use]
    pub fn file_url(&self, filename: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        match self.folder.as_deref().map(|f| f.trim_matches('/')) {
            Some(folder) if !folder.is_empty() => format!("{base}/{folder}/{filename}"),
            _ => format!("{base}/{filename}"),
        }
    }

    fn authorize(&self, request: reqwest::blocking::RequestBuilder) -> reqwest::blocking::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

impl BackupTarget for HttpTarget {
    fn upsert(&self, filename: &str, snapshot: &BackupSnapshot) -> Result<UpsertOutcome, SpoolError> {
        let url = self.file_url(filename);

        let lookup = self
            .authorize(self.client.head(&url))
            .send()
            .map_err(|e| SpoolError::Backup(format!("lookup of {url} failed: {e}")))?;
        let outcome = match lookup.status() {
            s if s.is_success() => UpsertOutcome::Updated,
            reqwest::StatusCode::NOT_FOUND => UpsertOutcome::Created,
            s => return Err(SpoolError::Backup(format!("lookup of {url} returned {s}"))),
        };
        debug!("Backup lookup {} -> {:?}", url, outcome);

        let response = self
            .authorize(self.client.put(&url))
            .json(snapshot)
            .send()
            .map_err(|e| SpoolError::Backup(format!("upload to {url} failed: {e}")))?;
        if !response.status().is_success() {
            return Err(SpoolError::Backup(format!(
                "upload to {url} returned {}",
                response.status()
            )));
        }

        info!("Backup uploaded to {} ({:?})", url, outcome);
        Ok(outcome)
    }

    fn describe(&self) -> String {
        self.file_url("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_directory_target_creates_then_updates() {
        let dir = TempDir::new().unwrap();
        let target = DirectoryTarget::new(dir.path().join("backups"));
        let snapshot = BackupSnapshot::of(&Catalog::default());

        assert_eq!(target.upsert("b.json", &snapshot).unwrap(), UpsertOutcome::Created);
        assert_eq!(target.upsert("b.json", &snapshot).unwrap(), UpsertOutcome::Updated);

        let content = std::fs::read_to_string(dir.path().join("backups/b.json")).unwrap();
        let restored: BackupSnapshot = serde_json::from_str(&content).unwrap();
        assert_eq!(restored, snapshot);
    }

    #[test]
    fn test_snapshot_shape() {
        let value = serde_json::to_value(BackupSnapshot::of(&Catalog::default())).unwrap();
        let mut keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["filaments", "materials", "prints", "tags"]);
    }

    #[test]
    fn test_http_file_url() {
        let target = HttpTarget::new("https://files.example/dav/", Some("/prints/".into()), None);
        assert_eq!(target.file_url("b.json"), "https://files.example/dav/prints/b.json");

        let target = HttpTarget::new("https://files.example", None, None);
        assert_eq!(target.file_url("b.json"), "https://files.example/b.json");
    }
}
