// Coffer: CLI command handlers
//
// `serve` opens the database (retrying while it is unavailable), applies
// the schema and runs the HTTP gateway. `migrate` applies or reverts the
// schema and exits.

use std::sync::Arc;

use crate::config::Config;
use crate::error::CofferError;
use crate::gateway::{AppState, HttpServer};
use crate::store::{Database, SqlVaultStore};

use super::{Commands, MigrateAction};

/// Execute the parsed CLI command.
pub async fn execute(command: Commands, config: &Config) -> Result<(), CofferError> {
    match command {
        Commands::Serve => cmd_serve(config).await,
        Commands::Migrate { action } => cmd_migrate(config, action).await,
    }
}

// ─── Serve ───────────────────────────────────────────────────────────────────

async fn cmd_serve(config: &Config) -> Result<(), CofferError> {
    let db = open_db(config).await?;
    db.migrate_up()?;

    let store = SqlVaultStore::new(db);
    let state = AppState::new(Arc::new(store), config.root_token(), config.secret());
    let server = HttpServer::new(&config.http_server, state);

    println!("Starting Coffer HTTP server on {}...", server.address());
    server.run().await?;

    Ok(())
}

// ─── Migrate ─────────────────────────────────────────────────────────────────

async fn cmd_migrate(config: &Config, action: MigrateAction) -> Result<(), CofferError> {
    let db = open_db(config).await?;

    match action {
        MigrateAction::Up => {
            db.migrate_up()?;
            println!("Migrations applied.");
        }
        MigrateAction::Down => {
            db.migrate_down()?;
            println!("Migrations reverted.");
        }
    }

    tracing::info!(action = ?action, "Migration finished");
    Ok(())
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Open the configured database. Retries sleep, so they run off the runtime.
async fn open_db(config: &Config) -> Result<Database, CofferError> {
    let db_config = config.database.clone();
    let db = tokio::task::spawn_blocking(move || Database::open_with_retries(&db_config))
        .await
        .map_err(|e| CofferError::Internal(format!("database open task failed: {}", e)))??;

    tracing::info!(path = %config.database.path.display(), "Database opened");
    Ok(db)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
