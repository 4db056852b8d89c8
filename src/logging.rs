// Coffer: logging setup
//
// `local` gets human-readable output; `dev` and `prod` emit JSON lines.
// RUST_LOG overrides the per-environment default filter.

use tracing_subscriber::EnvFilter;

use crate::config::Environment;

/// Default filter directive for an environment.
pub fn default_directive(env: Environment) -> &'static str {
    match env {
        Environment::Local | Environment::Dev => "coffer=debug,tower_http=debug",
        Environment::Prod => "coffer=info,tower_http=info",
    }
}

fn env_filter(env: Environment) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(env)))
}

/// Install the global subscriber. Call once, at startup.
pub fn init(env: Environment) {
    let filter = env_filter(env);
    match env {
        Environment::Local => tracing_subscriber::fmt()
            .pretty()
            .with_env_filter(filter)
            .init(),
        Environment::Dev | Environment::Prod => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init(),
    }
    tracing::debug!(env = ?env, "logging initialized");
}

// ─── Tests ───────────────────────────────────────────────────────────────────
