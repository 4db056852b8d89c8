// Coffer: application entry point
//
// Parses CLI arguments, loads configuration, initializes logging for the
// configured environment and dispatches to the command handler.

use clap::Parser;

use coffer::cli::{execute, Cli};
use coffer::config::Config;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match cli.config.as_deref() {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    coffer::logging::init(config.env);
    tracing::debug!(?config, "configuration loaded");

    if let Err(e) = execute(cli.command, &config).await {
        tracing::error!(error = %e, "command failed");
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
