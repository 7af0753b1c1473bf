// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Backup command - upserts a JSON snapshot to a folder or HTTP endpoint

use super::Context;
use crate::backup::{BackupTarget, DirectoryTarget, HttpTarget, UpsertOutcome};
use anyhow::{Context as _, Result};
use std::path::PathBuf;

/// Run the backup command.
///
/// Command-line targets win over configured ones; a folder wins over a URL.
pub fn run(ctx: &Context, dir: Option<PathBuf>, url: Option<String>, filename: Option<String>) -> Result<()> {
    let settings = &ctx.config.backup;
    let filename = filename.unwrap_or_else(|| settings.filename.clone());

    let target: Box<dyn BackupTarget> = match (dir, url) {
        (Some(dir), _) => Box::new(DirectoryTarget::new(dir)),
        (None, Some(url)) => Box::new(HttpTarget::new(url, settings.folder.clone(), settings.token.clone())),
        (None, None) => match (&settings.dir, &settings.url) {
            (Some(dir), _) => Box::new(DirectoryTarget::new(dir.clone())),
            (None, Some(url)) => Box::new(HttpTarget::new(
                url.clone(),
                settings.folder.clone(),
                settings.token.clone(),
            )),
            (None, None) => anyhow::bail!(
                "No backup target. Pass --dir or --url, or set backup.dir / backup.url in the config."
            ),
        },
    };

    let snapshot = ctx.open().backup_snapshot();
    let outcome = target
        .upsert(&filename, &snapshot)
        .with_context(|| format!("Backup to {} failed", target.describe()))?;

    let verb = match outcome {
        UpsertOutcome::Created => "Created",
        UpsertOutcome::Updated => "Updated",
    };
    println!("{} backup {} at {}", verb, filename, target.describe());
    println!(
        "  {} filaments, {} prints",
        snapshot.filaments.len(),
        snapshot.prints.len()
    );
    Ok(())
}
