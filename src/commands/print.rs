// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Print commands - log, edit and delete print jobs

use super::{confirm, print_json, Context};
use crate::ledger::{Delta, PrintDraft, StockPreview};
use crate::report::format_duration;
use crate::store::KeyValueStore;
use crate::types::{Print, PrintId};
use crate::workbench::Workbench;
use anyhow::{Context as _, Result};
use chrono::{Local, NaiveDate};
use owo_colors::OwoColorize;

/// Arguments for print commands
#[derive(Debug, Default, Clone, clap::Args)]
pub struct PrintArgs {
    /// Print name
    #[arg(long)]
    pub name: Option<String>,
    /// Print date (YYYY-MM-DD)
    #[arg(long)]
    pub date: Option<NaiveDate>,
    /// Print time in minutes
    #[arg(long)]
    pub duration: Option<u32>,
    /// Grams of filament used
    #[arg(long)]
    pub weight: Option<f64>,
    /// Spool id or name
    #[arg(long)]
    pub filament: Option<String>,
    /// Rating 0-5
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=5))]
    pub rating: Option<u8>,
    /// Who the print is for
    #[arg(long)]
    pub recipient: Option<String>,
    /// Toggle a registered tag (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,
    /// Register a tag and put it on the print (repeatable)
    #[arg(long = "new-tag")]
    pub new_tags: Vec<String>,
    /// Mark the print as failed
    #[arg(long, conflicts_with = "succeeded")]
    pub failed: bool,
    /// Mark the print as successful
    #[arg(long)]
    pub succeeded: bool,
    /// Notes
    #[arg(long)]
    pub notes: Option<String>,
}

/// Run print command
pub fn run(ctx: &Context, action: &str, id: Option<i64>, args: PrintArgs, yes: bool) -> Result<()> {
    let mut bench = ctx.open();

    match action {
        "add" | "create" | "new" => {
            let mut draft = bench.begin_new_print(Local::now().date_naive());
            apply_args(&mut bench, &mut draft, args)?;
            save(ctx, &mut bench, draft)?;
        }

        "edit" | "update" => {
            let id = require_id(id)?;
            let mut draft = bench.begin_edit(id)?;
            apply_args(&mut bench, &mut draft, args)?;
            save(ctx, &mut bench, draft)?;
        }

        "preview" => {
            if !args.new_tags.is_empty() {
                anyhow::bail!("--new-tag registers a tag and cannot be used with preview; use --tag");
            }
            let mut draft = match id {
                Some(id) => bench.begin_edit(PrintId(id))?,
                None => bench.begin_new_print(Local::now().date_naive()),
            };
            apply_args(&mut bench, &mut draft, args)?;
            let preview = bench.preview(&draft);

            if ctx.json {
                return print_json(&preview);
            }
            match preview {
                Some(p) => print_preview(ctx, &bench, &p),
                None => println!("No stock preview: the print is not on a known spool."),
            }
        }

        "delete" | "remove" | "rm" => {
            let id = require_id(id)?;
            let print = bench
                .catalog()
                .print(id)
                .ok_or_else(|| anyhow::anyhow!("Print not found: {}", id))?;

            let prompt = format!(
                "Delete print '{}'? Stock is NOT restored automatically.",
                print.name
            );
            if !confirm(&prompt, yes)? {
                println!("Aborted.");
                return Ok(());
            }

            let removed = bench.delete_print(id)?;
            if ctx.json {
                return print_json(&removed);
            }
            println!("Deleted print: {} ({})", removed.name, removed.id);
            println!("  stock unchanged; correct the spool by hand if needed");
        }

        "list" | "ls" => {
            let catalog = bench.catalog();
            if ctx.json {
                return print_json(&catalog.prints);
            }
            if catalog.prints.is_empty() {
                println!("No prints logged. Use 'spoolbook print add --name <name>' to log one.");
                return Ok(());
            }

            println!("Prints ({}):", catalog.prints.len());
            for p in &catalog.prints {
                println!("  {}", summary_line(ctx, &bench, p));
            }
        }

        "show" => {
            let id = require_id(id)?;
            let p = bench
                .catalog()
                .print(id)
                .ok_or_else(|| anyhow::anyhow!("Print not found: {}", id))?;
            if ctx.json {
                return print_json(p);
            }

            println!("Print: {}", p.name);
            println!("  id: {}", p.id);
            println!("  date: {}", p.date.map_or_else(|| "-".to_string(), |d| d.to_string()));
            println!("  duration: {}", format_duration(p.duration));
            println!("  weight: {}g", p.weight);
            println!("  filament: {}", spool_label(&bench, p));
            println!("  result: {}", if p.success { "success" } else { "failed" });
            println!("  rating: {}/5", p.rating);
            println!("  recipient: {}", p.recipient);
            if !p.tags.is_empty() {
                println!("  tags: {}", p.tags.join(", "));
            }
            if !p.notes.is_empty() {
                println!("  notes: {}", p.notes);
            }
        }

        other => {
            anyhow::bail!(
                "Unknown action: {}. Valid: add, edit, preview, delete, list, show",
                other
            );
        }
    }

    Ok(())
}

/// Copy command-line values onto a draft
fn apply_args<S: KeyValueStore>(
    bench: &mut Workbench<S>,
    draft: &mut PrintDraft,
    args: PrintArgs,
) -> Result<()> {
    if let Some(filament) = &args.filament {
        let spool = bench.catalog().resolve_filament(filament)?;
        draft.print.filament_id = Some(spool.id.clone());
    }
    for tag in &args.tags {
        if !bench.catalog().tags.contains(tag) {
            anyhow::bail!("Unknown tag: {}. Use --new-tag to register it.", tag);
        }
        draft.toggle_tag(tag);
    }
    for tag in &args.new_tags {
        bench.add_tag(tag, Some(&mut *draft))?;
    }

    let print = &mut draft.print;
    if let Some(name) = args.name {
        print.name = name;
    }
    if let Some(date) = args.date {
        print.date = Some(date);
    }
    if let Some(duration) = args.duration {
        print.duration = duration;
    }
    if let Some(weight) = args.weight {
        print.weight = weight;
    }
    if let Some(rating) = args.rating {
        print.rating = rating;
    }
    if let Some(recipient) = args.recipient {
        print.recipient = recipient;
    }
    if let Some(notes) = args.notes {
        print.notes = notes;
    }
    if args.failed {
        print.success = false;
    } else if args.succeeded {
        print.success = true;
    }
    Ok(())
}

fn save<S: KeyValueStore>(ctx: &Context, bench: &mut Workbench<S>, draft: PrintDraft) -> Result<()> {
    let preview = bench.preview(&draft);
    let committed = bench.save_draft(draft).context("Print not saved")?;

    if ctx.json {
        return print_json(&committed);
    }

    let verb = if committed.created { "Created" } else { "Updated" };
    println!("{} print: {} ({})", verb, committed.print.name, committed.print.id);
    for delta in &committed.deltas {
        match delta {
            Delta::Applied { filament, before, after, .. } => {
                let name = bench
                    .catalog()
                    .filament(filament)
                    .map_or(filament.as_str(), |f| f.name.as_str());
                println!("  {name}: {before}g -> {after}g");
            }
            Delta::Skipped { filament: Some(id), .. } => {
                println!("  spool {id} not found, stock unchanged");
            }
            Delta::Skipped { filament: None, .. } => {
                println!("  no spool selected, stock unchanged");
            }
        }
    }
    if preview.as_ref().is_some_and(StockPreview::is_negative) {
        let warning = "Warning: spool stock is now negative";
        if ctx.color {
            eprintln!("{}", warning.yellow());
        } else {
            eprintln!("{warning}");
        }
    }
    Ok(())
}

fn print_preview<S: KeyValueStore>(ctx: &Context, bench: &Workbench<S>, preview: &StockPreview) {
    let name = bench
        .catalog()
        .filament(&preview.filament)
        .map_or(preview.filament.as_str(), |f| f.name.as_str());

    println!("Stock preview for {name}:");
    println!("  current: {}g", preview.current);
    if let Some(change) = preview.change {
        let sign = if change > 0.0 { "+" } else { "" };
        println!("  change: {sign}{change:.1}g");
    }

    let projected = format!("{}g", preview.projected);
    if preview.is_negative() {
        let projected = if ctx.color {
            projected.red().bold().to_string()
        } else {
            projected
        };
        println!("  after save: {projected} (not enough filament)");
    } else {
        println!("  after save: {projected}");
    }
}

fn summary_line<S: KeyValueStore>(ctx: &Context, bench: &Workbench<S>, p: &Print) -> String {
    let status = match (p.success, ctx.color) {
        (true, true) => "ok".green().to_string(),
        (false, true) => "FAILED".red().to_string(),
        (true, false) => "ok".to_string(),
        (false, false) => "FAILED".to_string(),
    };
    let mut line = format!(
        "{} {} [{}] {} | {} | {}g | {} | {}/5",
        p.id,
        status,
        p.date.map_or_else(|| "----------".to_string(), |d| d.to_string()),
        p.name,
        format_duration(p.duration),
        p.weight,
        spool_label(bench, p),
        p.rating
    );
    if !p.tags.is_empty() {
        line.push_str(&format!(" #{}", p.tags.join(" #")));
    }
    line
}

fn spool_label<S: KeyValueStore>(bench: &Workbench<S>, p: &Print) -> String {
    bench
        .catalog()
        .filament_for(p)
        .map_or_else(|| "unknown".to_string(), |f| f.name.clone())
}

fn require_id(id: Option<i64>) -> Result<PrintId> {
    id.map(PrintId)
        .ok_or_else(|| anyhow::anyhow!("Print id is required"))
}
