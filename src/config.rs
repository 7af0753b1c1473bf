// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Configuration management
//!
//! Layers, lowest first: built-in defaults, the TOML config file, then
//! `SPOOLBOOK_*` environment variables (`SPOOLBOOK_BACKUP__URL` for nested
//! keys).

use crate::backup::DEFAULT_BACKUP_FILENAME;
use crate::migrate::DEFAULT_RECIPIENT;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the JSON collections
    pub data_dir: PathBuf,
    /// Spools below this many grams are highlighted
    pub low_stock_grams: f64,
    /// Recipient put on new prints
    pub default_recipient: String,
    /// Backup target settings
    pub backup: BackupConfig,
}

/// Where backups go
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackupConfig {
    /// Local folder target
    pub dir: Option<PathBuf>,
    /// HTTP target base URL
    pub url: Option<String>,
    /// Folder below the HTTP base URL
    pub folder: Option<String>,
    /// Bearer token for the HTTP target
    pub token: Option<String>,
    /// Backup file name
    pub filename: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: project_dirs()
                .map(|d| d.data_dir().to_path_buf())
                .unwrap_or_else(|| PathBuf::from("~/.local/share/spoolbook")),
            low_stock_grams: 100.0,
            default_recipient: DEFAULT_RECIPIENT.to_string(),
            backup: BackupConfig {
                filename: DEFAULT_BACKUP_FILENAME.to_string(),
                ..BackupConfig::default()
            },
        }
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("org", "hyperpolymath", "spoolbook")
}

/// Default config file location
#[must_use]
pub fn default_path() -> PathBuf {
    project_dirs()
        .map(|d| d.config_dir().join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("spoolbook.toml"))
}

/// Load configuration from defaults, the config file and the environment.
///
/// An explicitly given file must exist; the default file is optional.
pub fn load(path: Option<&Path>) -> Result<Config> {
    let (file, required) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => (default_path(), false),
    };

    let defaults = config::Config::try_from(&Config::default())
        .context("Failed to build default configuration")?;

    config::Config::builder()
        .add_source(defaults)
        .add_source(
            config::File::from(file.as_path())
                .format(config::FileFormat::Toml)
                .required(required),
        )
        .add_source(
            config::Environment::with_prefix("SPOOLBOOK")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .with_context(|| format!("Failed to read configuration from {}", file.display()))?
        .try_deserialize()
        .context("Invalid configuration")
}

/// Read a key (dotted path, e.g. `backup.url`) from an effective config
pub fn get(config: &Config, key: &str) -> Result<Option<String>> {
    let value = toml::Value::try_from(config).context("Failed to serialize configuration")?;
    let found = key
        .split('.')
        .try_fold(&value, |v, part| v.get(part));
    Ok(found.map(|v| match v {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    }))
}

/// Set a key in the TOML file at `path`, creating the file if needed
pub fn set(path: &Path, key: &str, value: &str) -> Result<()> {
    let mut table: toml::Table = if path.exists() {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        content
            .parse()
            .with_context(|| format!("Failed to parse {}", path.display()))?
    } else {
        toml::Table::new()
    };

    let parts: Vec<&str> = key.split('.').collect();
    let Some((last, parents)) = parts.split_last() else {
        anyhow::bail!("Empty configuration key");
    };

    let mut current = &mut table;
    for part in parents {
        current = current
            .entry((*part).to_string())
            .or_insert_with(|| toml::Value::Table(toml::Table::new()))
            .as_table_mut()
            .ok_or_else(|| anyhow::anyhow!("'{}' is not a table", part))?;
    }
    current.insert((*last).to_string(), parse_scalar(value));

    // Reject keys the config would not accept before writing them.
    let merged = config::Config::builder()
        .add_source(config::Config::try_from(&Config::default())?)
        .add_source(config::File::from_str(&table.to_string(), config::FileFormat::Toml))
        .build()?;
    merged
        .try_deserialize::<Config>()
        .with_context(|| format!("Invalid value for {key}"))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    fs::write(path, table.to_string())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

fn parse_scalar(value: &str) -> toml::Value {
    if let Ok(i) = value.parse::<i64>() {
        toml::Value::Integer(i)
    } else if let Ok(f) = value.parse::<f64>() {
        toml::Value::Float(f)
    } else if let Ok(b) = value.parse::<bool>() {
        toml::Value::Boolean(b)
    } else {
        toml::Value::String(value.to_string())
    }
}
