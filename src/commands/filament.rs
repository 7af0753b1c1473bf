// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Filament commands - add spools and show remaining stock

use super::{print_json, Context};
use crate::workbench::NewFilament;
use anyhow::Result;
use owo_colors::OwoColorize;
use serde::Serialize;

/// Arguments for filament commands
#[derive(Debug, Default, Clone, clap::Args)]
pub struct FilamentArgs {
    /// Brand (defaults to the first known brand)
    #[arg(long)]
    pub brand: Option<String>,
    /// Material (defaults to the first known material)
    #[arg(long)]
    pub material: Option<String>,
    /// Color as hex, e.g. #ff0000
    #[arg(long)]
    pub color: Option<String>,
    /// Starting weight in grams
    #[arg(long)]
    pub weight: Option<f64>,
    /// Price
    #[arg(long)]
    pub price: Option<f64>,
}

#[derive(Serialize)]
struct SpoolLine<'a> {
    #[serde(flatten)]
    filament: &'a crate::types::Filament,
    prints: usize,
    low_stock: bool,
}

/// Run filament command
pub fn run(ctx: &Context, action: &str, name: Option<String>, args: FilamentArgs) -> Result<()> {
    let mut bench = ctx.open();

    match action {
        "add" | "create" | "new" => {
            let name = name.ok_or_else(|| anyhow::anyhow!("Filament name is required"))?;
            let filament = bench.add_filament(NewFilament {
                name,
                brand: args.brand,
                material: args.material,
                color: args.color,
                weight: args.weight,
                price: args.price,
            })?;

            if ctx.json {
                return print_json(&filament);
            }
            println!("Added filament: {} ({})", filament.name, filament.id);
            println!("  {} | {} | {}g", filament.brand, filament.material, filament.weight);
        }

        "list" | "ls" => {
            let catalog = bench.catalog();
            let threshold = ctx.config.low_stock_grams;

            if ctx.json {
                let lines: Vec<_> = catalog
                    .filaments
                    .iter()
                    .map(|f| SpoolLine {
                        filament: f,
                        prints: catalog.prints_on(&f.id).len(),
                        low_stock: f.weight < threshold,
                    })
                    .collect();
                return print_json(&lines);
            }

            if catalog.filaments.is_empty() {
                println!("No filaments yet. Use 'spoolbook filament add <name>' to add one.");
                return Ok(());
            }

            println!("Filaments ({}):", catalog.filaments.len());
            for f in &catalog.filaments {
                let grams = format!("{}g", f.weight);
                let grams = match (ctx.color, f.weight < threshold) {
                    (true, true) => grams.red().bold().to_string(),
                    (true, false) => grams.green().to_string(),
                    (false, true) => format!("{grams} (low)"),
                    (false, false) => grams,
                };
                println!(
                    "  {} [{}] {} | {} - {} ({} prints)",
                    f.name,
                    f.id,
                    f.brand,
                    f.material,
                    grams,
                    catalog.prints_on(&f.id).len()
                );
            }
        }

        other => {
            anyhow::bail!("Unknown action: {}. Valid: add, list", other);
        }
    }

    Ok(())
}
