// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Export command - writes the inventory and print log as CSV or JSON

use super::Context;
use crate::report::{self, Sheet};
use anyhow::{Context as _, Result};
use chrono::Local;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// One sheet as comma-separated values
    Csv,
    /// Both sheets as a JSON workbook
    Json,
}

impl ExportFormat {
    /// Parse format from string
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Get file extension for format
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

/// Run the export command
pub fn run(ctx: &Context, format: &str, sheet: Option<&str>, output: Option<PathBuf>) -> Result<()> {
    info!("Exporting to {}", format);

    let export_format = ExportFormat::parse(format)
        .ok_or_else(|| anyhow::anyhow!("Unknown export format: {}. Supported: csv, json", format))?;
    let sheet = sheet
        .map(|s| Sheet::parse(s).ok_or_else(|| anyhow::anyhow!("Unknown sheet: {}. Supported: inventory, prints", s)))
        .transpose()?;

    let bench = ctx.open();
    let catalog = bench.catalog();

    let content = match (export_format, sheet) {
        (ExportFormat::Csv, Some(sheet)) => report::to_csv(catalog, sheet),
        (ExportFormat::Csv, None) => {
            anyhow::bail!("CSV export holds one sheet; pass --sheet inventory or --sheet prints")
        }
        (ExportFormat::Json, Some(Sheet::Inventory)) => {
            serde_json::to_string_pretty(&report::inventory_rows(catalog))?
        }
        (ExportFormat::Json, Some(Sheet::Prints)) => {
            serde_json::to_string_pretty(&report::print_rows(catalog))?
        }
        (ExportFormat::Json, None) => serde_json::to_string_pretty(&report::workbook(catalog))?,
    };

    match output {
        Some(path) => {
            let path = resolve_output(&path, export_format, sheet);
            fs::write(&path, &content)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
            println!("Exported to {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            if !content.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
        }
    }

    Ok(())
}

/// An existing directory gets a dated file name inside it
fn resolve_output(path: &Path, format: ExportFormat, sheet: Option<Sheet>) -> PathBuf {
    if !path.is_dir() {
        return path.to_path_buf();
    }
    path.join(export_file_name(
        &Local::now().date_naive().to_string(),
        format,
        sheet,
    ))
}

fn export_file_name(date: &str, format: ExportFormat, sheet: Option<Sheet>) -> String {
    let suffix = match sheet {
        Some(Sheet::Inventory) => "_inventory",
        Some(Sheet::Prints) => "_prints",
        None => "",
    };
    format!("spoolbook_{date}{suffix}.{}", format.extension())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_export_file_name() {
        assert_eq!(
            export_file_name("2025-03-01", ExportFormat::Csv, Some(Sheet::Prints)),
            "spoolbook_2025-03-01_prints.csv"
        );
        assert_eq!(
            export_file_name("2025-03-01", ExportFormat::Json, None),
            "spoolbook_2025-03-01.json"
        );
    }

    #[test]
    fn test_resolve_output_keeps_file_paths() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("out.csv");
        assert_eq!(resolve_output(&file, ExportFormat::Csv, None), file);

        let inside = resolve_output(dir.path(), ExportFormat::Json, None);
        assert_eq!(inside.parent(), Some(dir.path()));
    }

    #[test]
    fn test_parse_format() {
        assert_eq!(ExportFormat::parse("CSV"), Some(ExportFormat::Csv));
        assert_eq!(ExportFormat::parse("dot"), None);
    }
}
