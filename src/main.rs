// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Spoolbook CLI - filament inventory and print log

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use spoolbook::commands::{self, filament::FilamentArgs, print::PrintArgs, Context};
use std::io::IsTerminal;

#[derive(Parser)]
#[command(name = "spoolbook")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long)]
    quiet: bool,

    /// Configuration file path
    #[arg(short, long, env = "SPOOLBOOK_CONFIG")]
    config: Option<std::path::PathBuf>,

    /// Data directory override
    #[arg(long, env = "SPOOLBOOK_DATA_DIR")]
    data_dir: Option<std::path::PathBuf>,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR")]
    no_color: bool,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage filament spools
    Filament {
        /// Action: add, list
        action: String,

        /// Spool name
        name: Option<String>,

        #[command(flatten)]
        args: FilamentArgs,
    },

    /// Log, edit and delete prints
    Print {
        /// Action: add, edit, preview, delete, list, show
        action: String,

        /// Print id
        id: Option<i64>,

        #[command(flatten)]
        args: PrintArgs,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Manage the tag registry
    Tag {
        /// Action: add, remove, list
        action: String,

        /// Tag name
        tag: Option<String>,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Export inventory and prints for spreadsheets
    Export {
        /// Output format (csv, json)
        #[arg(short, long, default_value = "json")]
        format: String,

        /// Sheet to export (inventory, prints); csv needs one
        #[arg(short, long)]
        sheet: Option<String>,

        /// Output file or directory (stdout if not specified)
        #[arg(short, long)]
        output: Option<std::path::PathBuf>,
    },

    /// Upload a JSON backup to a folder or HTTP endpoint
    Backup {
        /// Target folder
        #[arg(long, conflicts_with = "url")]
        dir: Option<std::path::PathBuf>,

        /// Target base URL
        #[arg(long)]
        url: Option<String>,

        /// Backup file name
        #[arg(long)]
        filename: Option<String>,
    },

    /// Get or set configuration
    Config {
        /// Configuration key
        key: String,

        /// Value to set (omit to get)
        value: Option<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: clap_complete::Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 if cli.quiet => tracing::Level::ERROR,
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Completions { shell } = cli.command {
        return commands::completions::run(shell, Cli::command());
    }

    let mut config = spoolbook::config::load(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    let ctx = Context {
        config,
        config_path: cli.config.unwrap_or_else(spoolbook::config::default_path),
        json: cli.json,
        color: !cli.no_color && std::io::stdout().is_terminal(),
    };

    // Execute command
    match cli.command {
        Commands::Filament { action, name, args } => {
            commands::filament::run(&ctx, &action, name, args)
        }
        Commands::Print { action, id, args, yes } => {
            commands::print::run(&ctx, &action, id, args, yes)
        }
        Commands::Tag { action, tag, yes } => {
            commands::tag::run(&ctx, &action, tag, yes)
        }
        Commands::Export { format, sheet, output } => {
            commands::export::run(&ctx, &format, sheet.as_deref(), output)
        }
        Commands::Backup { dir, url, filename } => {
            commands::backup::run(&ctx, dir, url, filename)
        }
        Commands::Config { key, value } => {
            commands::config::run(&ctx, &key, value)
        }
        Commands::Completions { .. } => Ok(()),
    }
}
