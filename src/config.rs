//! Application configuration.
//!
//! Configuration is assembled once at startup and passed down to every
//! component; there is no ambient global state.
//!
//! ## Resolution order
//!
//! 1. Explicit `--config PATH` (JSON file, highest priority for file values)
//! 2. First existing file from the standard search list:
//!    - `$XDG_CONFIG_HOME/scopebank/config.json`
//!    - `$HOME/.config/scopebank/config.json`
//!    - `$HOME/.scopebank/config.json`
//!    - `/etc/scopebank/config.json`
//!    - `./config.json`
//! 3. Environment variables override any file-sourced value:
//!    `PGHOST`, `PGPORT`, `PGDATABASE`, `PGUSER`, `PGPASSWORD`,
//!    `SCOPEBANK_MIN_CONNECTIONS`, `SCOPEBANK_MAX_CONNECTIONS`,
//!    `RUST_LOG`, `LOG_FORMAT`
//! 4. Built-in defaults (localhost:5432, database `scopebank`, user
//!    `postgres`, pool 1..=10, log level `info`, text format)
//!
//! ## Example config file
//!
//! ```json
//! {
//!   "database": {
//!     "host": "db.internal",
//!     "port": 5432,
//!     "database": "scopebank",
//!     "user": "recon",
//!     "password": "secret",
//!     "min_connections": 1,
//!     "max_connections": 10
//!   },
//!   "log": { "level": "info", "format": "text" }
//! }
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Full application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub log: LogConfig,
}

/// PostgreSQL connection and pool settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    pub min_connections: u32,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            database: "scopebank".to_string(),
            user: "postgres".to_string(),
            password: String::new(),
            min_connections: 1,
            max_connections: 10,
        }
    }
}

/// Logging settings. `format` is `text` or `json`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl Config {
    /// Loads configuration: explicit path, then search list, then env
    /// overrides, then defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly given config file is missing or
    /// unparseable, or if validation fails. A missing file from the search
    /// list is not an error.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = match explicit_path {
            Some(path) => Self::from_file(path)?,
            None => match Self::find_config_file() {
                Some(path) => Self::from_file(&path)?,
                None => Config::default(),
            },
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    /// Returns the first existing file from the standard search list.
    fn find_config_file() -> Option<PathBuf> {
        let home = env::var_os("HOME").map(PathBuf::from);
        let xdg = env::var_os("XDG_CONFIG_HOME").map(PathBuf::from);

        let candidates: Vec<PathBuf> = [
            xdg.map(|p| p.join("scopebank/config.json")),
            home.as_ref().map(|p| p.join(".config/scopebank/config.json")),
            home.as_ref().map(|p| p.join(".scopebank/config.json")),
            Some(PathBuf::from("/etc/scopebank/config.json")),
            Some(PathBuf::from("config.json")),
        ]
        .into_iter()
        .flatten()
        .collect();

        candidates.into_iter().find(|p| p.exists())
    }

    /// Applies environment variable overrides on top of file values.
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = env::var("PGHOST") {
            self.database.host = host;
        }
        if let Ok(port) = env::var("PGPORT")
            && let Ok(port) = port.parse()
        {
            self.database.port = port;
        }
        if let Ok(db) = env::var("PGDATABASE") {
            self.database.database = db;
        }
        if let Ok(user) = env::var("PGUSER") {
            self.database.user = user;
        }
        if let Ok(password) = env::var("PGPASSWORD") {
            self.database.password = password;
        }
        if let Ok(min) = env::var("SCOPEBANK_MIN_CONNECTIONS")
            && let Ok(min) = min.parse()
        {
            self.database.min_connections = min;
        }
        if let Ok(max) = env::var("SCOPEBANK_MAX_CONNECTIONS")
            && let Ok(max) = max.parse()
        {
            self.database.max_connections = max;
        }
        if let Ok(level) = env::var("RUST_LOG") {
            self.log.level = level;
        }
        if let Ok(format) = env::var("LOG_FORMAT") {
            self.log.format = format;
        }
    }

    /// Validates the assembled configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool bounds are inconsistent, the port is
    /// zero, or the log format is unrecognized.
    pub fn validate(&self) -> Result<()> {
        if self.database.port == 0 {
            anyhow::bail!("database port must be non-zero");
        }

        if self.database.max_connections == 0 {
            anyhow::bail!("max_connections must be at least 1");
        }

        if self.database.min_connections > self.database.max_connections {
            anyhow::bail!(
                "min_connections ({}) must not exceed max_connections ({})",
                self.database.min_connections,
                self.database.max_connections
            );
        }

        if self.log.format != "text" && self.log.format != "json" {
            anyhow::bail!("log format must be 'text' or 'json', got '{}'", self.log.format);
        }

        Ok(())
    }

    /// Builds the PostgreSQL connection URL.
    pub fn database_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.database.user,
            self.database.password,
            self.database.host,
            self.database.port,
            self.database.database
        )
    }

    /// Connection target for logging, password masked.
    pub fn masked_database_url(&self) -> String {
        let password = if self.database.password.is_empty() {
            ""
        } else {
            "***"
        };
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.database.user,
            password,
            self.database.host,
            self.database.port,
            self.database.database
        )
    }
}
