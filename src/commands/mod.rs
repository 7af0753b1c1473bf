// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Command implementations

pub mod backup;
pub mod completions;
pub mod config;
pub mod export;
pub mod filament;
pub mod print;
pub mod tag;

use crate::config::Config;
use crate::store::JsonDirStore;
use crate::workbench::Workbench;
use anyhow::{Context as _, Result};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

/// Settings shared by every command
#[derive(Debug, Clone)]
pub struct Context {
    /// Effective configuration
    pub config: Config,
    /// Config file that `config` writes to
    pub config_path: PathBuf,
    /// Emit JSON instead of text
    pub json: bool,
    /// Use ANSI colors
    pub color: bool,
}

impl Context {
    /// Directory holding the collections
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Open a session over the data directory
    #[must_use]
    pub fn open(&self) -> Workbench<JsonDirStore> {
        Workbench::open(JsonDirStore::new(self.data_dir()))
            .with_default_recipient(self.config.default_recipient.clone())
    }
}

/// Ask a yes/no question on stdin. `assume_yes` skips the prompt.
///
/// Anything but an explicit yes, including end of input, is a no.
pub fn confirm(prompt: &str, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }

    let mut stderr = std::io::stderr().lock();
    write!(stderr, "{prompt} [y/N] ")?;
    stderr.flush()?;

    let mut answer = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("Failed to read confirmation")?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// Print a value as pretty JSON on stdout
pub fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}
