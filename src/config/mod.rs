// Coffer: configuration
//
// Non-secret settings come from a YAML file (`CONFIG_PATH`, default
// `config/default.yaml`). The root token and the token signing secret come
// only from the environment, optionally seeded from a `.env` file, and are
// held in zeroizing buffers.

mod error;

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Deserializer};
use zeroize::Zeroizing;

pub use error::ConfigError;

pub const CONFIG_PATH_ENV: &str = "CONFIG_PATH";
pub const ROOT_TOKEN_ENV: &str = "ROOT_TOKEN";
pub const SECRET_ENV: &str = "SECRET";
pub const DEFAULT_CONFIG_PATH: &str = "config/default.yaml";
pub const ENV_FILE: &str = ".env";

/// Deployment environment. Selects the log format and default verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Local,
    Dev,
    Prod,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
    /// How many times to try opening the database at startup.
    #[serde(default = "default_attempts")]
    pub attempts: u32,
    /// Pause between open attempts.
    #[serde(default = "default_delay", deserialize_with = "de_duration")]
    pub delay: Duration,
    /// How long a statement waits on a locked database before failing.
    #[serde(default = "default_busy_timeout", deserialize_with = "de_duration")]
    pub busy_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            attempts: default_attempts(),
            delay: default_delay(),
            busy_timeout: default_busy_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound on handling a single request.
    #[serde(default = "default_request_timeout", deserialize_with = "de_duration")]
    pub timeout: Duration,
}

#[derive(Deserialize)]
struct FileConfig {
    env: Environment,
    #[serde(default)]
    database: DatabaseConfig,
    http_server: HttpServerConfig,
}

/// Fully resolved configuration.
pub struct Config {
    pub env: Environment,
    pub database: DatabaseConfig,
    pub http_server: HttpServerConfig,
    root_token: Zeroizing<String>,
    secret: Zeroizing<String>,
}

impl Config {
    /// Load from the environment and the YAML file it points at.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .ok()
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

        Self::load_from(&path)
    }

    /// Load from an explicit YAML file, taking secrets from the environment.
    /// A `.env` file in the working directory is read first.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        load_env_file(Path::new(ENV_FILE))?;

        let root_token = required_env(ROOT_TOKEN_ENV)?;
        let secret = required_env(SECRET_ENV)?;

        Self::from_file(path, root_token, secret)
    }

    pub fn from_file(path: &Path, root_token: String, secret: String) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml(&raw, root_token, secret)
    }

    pub fn from_yaml(raw: &str, root_token: String, secret: String) -> Result<Self, ConfigError> {
        let root_token = Zeroizing::new(root_token);
        let secret = Zeroizing::new(secret);
        if root_token.is_empty() {
            return Err(ConfigError::EmptySecret(ROOT_TOKEN_ENV));
        }
        if secret.is_empty() {
            return Err(ConfigError::EmptySecret(SECRET_ENV));
        }

        let file: FileConfig = serde_yaml::from_str(raw)?;

        Ok(Self {
            env: file.env,
            database: file.database,
            http_server: file.http_server,
            root_token,
            secret,
        })
    }

    /// The static root credential.
    pub fn root_token(&self) -> &str {
        &self.root_token
    }

    /// The vault token signing secret.
    pub fn secret(&self) -> &[u8] {
        self.secret.as_bytes()
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("env", &self.env)
            .field("database", &self.database)
            .field("http_server", &self.http_server)
            .field("root_token", &"[REDACTED]")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Export the variables of a dotenv file into the process environment.
/// Variables that are already set keep their value. Returns false when the
/// file does not exist.
pub fn load_env_file(path: &Path) -> Result<bool, ConfigError> {
    match dotenvy::from_path(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "loaded env file");
            Ok(true)
        }
        Err(e) if e.not_found() => Ok(false),
        Err(e) => Err(ConfigError::EnvFile(e)),
    }
}

fn required_env(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingEnv(name))
}

// ─── Defaults ────────────────────────────────────────────────────────────────

fn default_db_path() -> PathBuf {
    dirs_next::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("coffer")
        .join("coffer.db")
}

fn default_attempts() -> u32 {
    5
}

fn default_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_busy_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(4)
}

// ─── Durations ───────────────────────────────────────────────────────────────

/// Parse a duration such as "500ms", "4s", "1m" or "2h".
/// Returns None for a missing number or an unknown unit.
pub fn parse_duration(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    let split = raw.find(|c: char| !c.is_ascii_digit())?;
    let (num_str, unit) = raw.split_at(split);
    let amount: u64 = num_str.parse().ok()?;

    match unit {
        "ms" => Some(Duration::from_millis(amount)),
        "s" => Some(Duration::from_secs(amount)),
        "m" => amount.checked_mul(60).map(Duration::from_secs),
        "h" => amount.checked_mul(3600).map(Duration::from_secs),
        _ => None,
    }
}

fn de_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_duration(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid duration '{}'", raw)))
}

// ─── Tests ───────────────────────────────────────────────────────────────────
