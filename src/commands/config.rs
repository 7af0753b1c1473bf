// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Config command - get or set configuration keys

use super::Context;
use crate::config;
use anyhow::Result;

/// Print a key, or write it to the config file when a value is given
pub fn run(ctx: &Context, key: &str, value: Option<String>) -> Result<()> {
    match value {
        Some(v) => {
            tracing::info!("Setting {} = {}", key, v);
            config::set(&ctx.config_path, key, &v)?;
            println!("{key} = {v} ({})", ctx.config_path.display());
        }
        None => match config::get(&ctx.config, key)? {
            Some(v) => println!("{v}"),
            None => anyhow::bail!("Unknown configuration key: {}", key),
        },
    }
    Ok(())
}
