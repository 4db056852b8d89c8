// Coffer: CLI module
//
// Command-line interface using clap derive macros.
// Subcommands: serve, migrate.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

pub use commands::execute;

/// Coffer: named bundles of secrets behind a root credential and
/// per-vault bearer tokens.
#[derive(Parser, Debug)]
#[command(name = "coffer")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// YAML config file. Overrides CONFIG_PATH.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply the schema and start the HTTP server.
    Serve,

    /// Apply or revert the database schema.
    Migrate {
        /// Direction to migrate.
        #[arg(long, value_enum)]
        action: MigrateAction,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum MigrateAction {
    Up,
    Down,
}

// ─── Tests ───────────────────────────────────────────────────────────────────
