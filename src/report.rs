// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Export projections of the catalog
//!
//! Spreadsheet export never sees raw records, only these rows. Print rows
//! resolve their spool to a name; a print whose spool is gone shows
//! [`DANGLING_FILAMENT`].

use crate::catalog::Catalog;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt::Write as _;

/// Spool name shown for a print whose spool no longer exists
pub const DANGLING_FILAMENT: &str = "deleted";

/// One row of the inventory sheet
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventoryRow {
    /// Spool name
    pub name: String,
    /// Brand
    pub brand: String,
    /// Material
    pub material: String,
    /// Grams remaining
    pub remaining_grams: f64,
}

/// One row of the prints sheet
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrintRow {
    /// Print date
    pub date: Option<NaiveDate>,
    /// Print name
    pub name: String,
    /// Minutes
    pub duration_minutes: u32,
    /// Grams consumed
    pub weight_grams: f64,
    /// Spool name, or the dangling sentinel
    pub filament: String,
    /// Whether the print succeeded
    pub success: bool,
    /// Rating 0-5
    pub rating: u8,
    /// Recipient
    pub recipient: String,
}

/// Both sheets together
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Workbook {
    /// Inventory sheet
    pub inventory: Vec<InventoryRow>,
    /// Prints sheet
    pub prints: Vec<PrintRow>,
}

/// Which sheet to render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sheet {
    /// Spools and remaining grams
    Inventory,
    /// The print log
    Prints,
}

impl Sheet {
    /// Parse a sheet name
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "inventory" | "filaments" => Some(Self::Inventory),
            "prints" | "log" => Some(Self::Prints),
            _ => None,
        }
    }
}

/// Inventory rows, in spool order
#[must_use]
pub fn inventory_rows(catalog: &Catalog) -> Vec<InventoryRow> {
    catalog
        .filaments
        .iter()
        .map(|f| InventoryRow {
            name: f.name.clone(),
            brand: f.brand.clone(),
            material: f.material.clone(),
            remaining_grams: f.weight,
        })
        .collect()
}

/// Print rows, most recent first
#[must_use]
pub fn print_rows(catalog: &Catalog) -> Vec<PrintRow> {
    catalog
        .prints
        .iter()
        .map(|p| PrintRow {
            date: p.date,
            name: p.name.clone(),
            duration_minutes: p.duration,
            weight_grams: p.weight,
            filament: catalog
                .filament_for(p)
                .map_or_else(|| DANGLING_FILAMENT.to_string(), |f| f.name.clone()),
            success: p.success,
            rating: p.rating,
            recipient: p.recipient.clone(),
        })
        .collect()
}

/// Both sheets
#[must_use]
pub fn workbook(catalog: &Catalog) -> Workbook {
    Workbook {
        inventory: inventory_rows(catalog),
        prints: print_rows(catalog),
    }
}

/// Render one sheet as CSV with a header row
#[must_use]
pub fn to_csv(catalog: &Catalog, sheet: Sheet) -> String {
    let mut out = String::new();
    match sheet {
        Sheet::Inventory => {
            out.push_str("name,brand,material,remaining_g\n");
            for row in inventory_rows(catalog) {
                let _ = writeln!(
                    out,
                    "{},{},{},{}",
                    csv_field(&row.name),
                    csv_field(&row.brand),
                    csv_field(&row.material),
                    row.remaining_grams
                );
            }
        }
        Sheet::Prints => {
            out.push_str("date,name,duration_min,weight_g,filament,success,rating,recipient\n");
            for row in print_rows(catalog) {
                let _ = writeln!(
                    out,
                    "{},{},{},{},{},{},{},{}",
                    row.date.map(|d| d.to_string()).unwrap_or_default(),
                    csv_field(&row.name),
                    row.duration_minutes,
                    row.weight_grams,
                    csv_field(&row.filament),
                    if row.success { "yes" } else { "no" },
                    row.rating,
                    csv_field(&row.recipient)
                );
            }
        }
    }
    out
}

/// Quote a field when it contains a separator, quote or line break
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Minutes as `Hh Mm`
#[must_use]
pub fn format_duration(minutes: u32) -> String {
    format!("{}h {}m", minutes / 60, minutes % 60)
}
