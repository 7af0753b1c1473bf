// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Tag commands - manage the tag registry

use super::{confirm, print_json, Context};
use crate::tags::TagAdded;
use anyhow::Result;
use serde::Serialize;

#[derive(Serialize)]
struct TagLine<'a> {
    tag: &'a str,
    prints: usize,
}

/// Run tag command
pub fn run(ctx: &Context, action: &str, tag: Option<String>, yes: bool) -> Result<()> {
    let mut bench = ctx.open();

    match action {
        "add" | "create" | "new" => {
            let tag = tag.ok_or_else(|| anyhow::anyhow!("Tag name is required"))?;
            match bench.add_tag(&tag, None)? {
                TagAdded::Empty => anyhow::bail!("Tag name is empty"),
                TagAdded::Added(t) => println!("Added tag: {t}"),
                TagAdded::Known(t) => println!("Tag already registered: {t}"),
            }
        }

        "remove" | "delete" | "rm" => {
            let tag = tag.ok_or_else(|| anyhow::anyhow!("Tag name is required"))?;
            if !bench.catalog().tags.contains(&tag) {
                anyhow::bail!("Tag not found: {}", tag);
            }

            let used = bench.catalog().prints.iter().filter(|p| p.has_tag(&tag)).count();
            let prompt = format!("Remove tag '{tag}'? {used} print(s) keep it.");
            if !confirm(&prompt, yes)? {
                println!("Aborted.");
                return Ok(());
            }

            bench.remove_tag(&tag)?;
            println!("Removed tag: {tag}");
        }

        "list" | "ls" => {
            let catalog = bench.catalog();
            let lines: Vec<_> = catalog
                .tags
                .iter()
                .map(|t| TagLine {
                    tag: t,
                    prints: catalog.prints.iter().filter(|p| p.has_tag(t)).count(),
                })
                .collect();

            if ctx.json {
                return print_json(&lines);
            }
            if lines.is_empty() {
                println!("No tags registered. Use 'spoolbook tag add <tag>' to add one.");
                return Ok(());
            }

            println!("Tags ({}):", lines.len());
            for line in &lines {
                println!("  {} ({} prints)", line.tag, line.prints);
            }
        }

        other => {
            anyhow::bail!("Unknown action: {}. Valid: add, remove, list", other);
        }
    }

    Ok(())
}
