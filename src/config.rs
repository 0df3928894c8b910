//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Every section is optional: a missing file or key falls back to the
//! defaults, which match the production deployment. Database credentials
//! are referenced by env-var name in the config and resolved at runtime.

use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Default config file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Env var that overrides the config file path.
pub const CONFIG_PATH_ENV: &str = "LEADERBOARD_CONFIG";

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub refresh: RefreshConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8082 }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Unix socket of the local MySQL server.
    pub socket: PathBuf,
    pub name: String,
    pub user_env: String,
    pub password_env: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            socket: PathBuf::from("/var/lib/mysql/mysql.sock"),
            name: "banzai".to_string(),
            user_env: "MYSQL_USER".to_string(),
            password_env: "MYSQL_PASS".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct RefreshConfig {
    /// Terminate on the first failed cycle instead of skipping it.
    pub fail_fast: bool,
}

/// Resolved database credentials.
#[derive(Debug)]
pub struct Credentials {
    pub user: String,
    pub password: SecretString,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load from `path` if it exists, otherwise use the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!(path = %path.display(), "No config file found, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        Ok(config)
    }

    /// Config path from `LEADERBOARD_CONFIG`, falling back to `config.toml`.
    pub fn path_from_env() -> PathBuf {
        std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    /// Resolve an environment variable name to its value.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }

    /// Resolve the database user and password from the environment.
    pub fn credentials(&self) -> Result<Credentials> {
        let user = Self::resolve_env(&self.database.user_env)?;
        let password = Self::resolve_env(&self.database.password_env)?;
        Ok(Credentials {
            user,
            password: SecretString::new(password),
        })
    }
}
