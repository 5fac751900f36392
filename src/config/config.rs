//! TOML configuration parsing and management.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::environment::EnvironmentLoader;
use crate::counter::backend::{
    BackendKind, DEFAULT_BUSY_TIMEOUT_MS, DEFAULT_COLLECTION, DEFAULT_DATABASE,
};

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/counter.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    /// `[app]` section
    #[serde(default)]
    pub app: AppConfig,
    /// `[store]` section
    #[serde(default)]
    pub store: StoreConfig,
    /// `[logging]` section
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Application-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Which collaborators the actions are wired with
    #[serde(default)]
    pub environment: AppEnvironment,
}

/// Which collaborators the actions are wired with
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppEnvironment {
    /// Fake detector and in-memory store
    #[default]
    Dev,
    /// Caller-supplied detector and the configured store
    Prod,
}

impl fmt::Display for AppEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppEnvironment::Dev => f.write_str("dev"),
            AppEnvironment::Prod => f.write_str("prod"),
        }
    }
}

impl FromStr for AppEnvironment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dev" => Ok(AppEnvironment::Dev),
            "prod" => Ok(AppEnvironment::Prod),
            other => anyhow::bail!("Unknown application environment: {}", other),
        }
    }
}

/// Counter store configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Backend to build
    pub kind: BackendKind,
    /// Document backend host
    pub host: String,
    /// Document backend port
    pub port: u16,
    /// Document backend database
    pub database: String,
    /// Document backend collection
    pub collection: String,
    /// Document backend user; no credentials are sent when empty
    pub user: String,
    /// Document backend password, percent-encoded into the connection string
    pub password: String,
    /// Full connection string; wins over host/port/user/password
    pub uri: Option<String>,
    /// Database file of the relational backend
    pub path: PathBuf,
    /// How long a relational writer waits for a competing transaction
    pub busy_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::Memory,
            host: "localhost".to_string(),
            port: 27017,
            database: DEFAULT_DATABASE.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            user: String::new(),
            password: String::new(),
            uri: None,
            path: PathBuf::from("object_counter.db"),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Configuration {
    /// Apply overrides from a variable lookup (the process environment in
    /// practice). Variables that are not set leave the value untouched.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("ENV") {
            self.app.environment = value.parse::<AppEnvironment>().context("Invalid ENV")?;
        }
        if let Some(value) = lookup("DB_TYPE") {
            self.store.kind = value.parse::<BackendKind>().context("Invalid DB_TYPE")?;
        }
        if let Some(value) = lookup("DB_HOST") {
            self.store.host = value;
        }
        if let Some(value) = lookup("DB_PORT") {
            self.store.port = value
                .parse::<u16>()
                .with_context(|| format!("Invalid DB_PORT: {}", value))?;
        }
        if let Some(value) = lookup("DB_NAME") {
            self.store.database = value;
        }
        if let Some(value) = lookup("DB_COLLECTION") {
            self.store.collection = value;
        }
        if let Some(value) = lookup("DB_USER") {
            self.store.user = value;
        }
        if let Some(value) = lookup("DB_PSWD") {
            self.store.password = value;
        }
        if let Some(value) = lookup("DB_URI") {
            self.store.uri = Some(value);
        }
        if let Some(value) = lookup("DB_PATH") {
            self.store.path = PathBuf::from(value);
        }
        if let Some(value) = lookup("DB_BUSY_TIMEOUT_MS") {
            self.store.busy_timeout_ms = value
                .parse::<u64>()
                .with_context(|| format!("Invalid DB_BUSY_TIMEOUT_MS: {}", value))?;
        }
        if let Some(value) = lookup("LOG_LEVEL") {
            self.logging.level = value;
        }
        Ok(())
    }
}

/// Loads and manages TOML configuration.
#[derive(Debug)]
pub struct ConfigurationLoader {
    /// File the configuration was (or would have been) read from
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: Configuration,
}

impl ConfigurationLoader {
    /// Initialize configuration loader.
    ///
    /// # Arguments
    /// * `config_path` - Path to TOML config file. If None, uses
    ///   `config/counter.toml`; a missing file yields the default config.
    pub fn new(config_path: Option<&Path>) -> Result<Self> {
        let config_path = config_path
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

        let config = if config_path.exists() {
            Self::load_config(&config_path)?
        } else {
            Configuration::default()
        };

        Ok(Self {
            config_path,
            config,
        })
    }

    /// Load the TOML file, then apply environment overrides on top of it.
    pub fn with_environment(config_path: Option<&Path>, env: &EnvironmentLoader) -> Result<Self> {
        let mut loader = Self::new(config_path)?;
        loader.config.apply_overrides(|key| env.var(key))?;
        Ok(loader)
    }

    /// Load configuration from TOML file.
    fn load_config(path: &Path) -> Result<Configuration> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Configuration::default();
        assert_eq!(config.app.environment, AppEnvironment::Dev);
        assert_eq!(config.store.kind, BackendKind::Memory);
        assert_eq!(config.store.port, 27017);
        assert_eq!(config.store.database, "prod_counter");
        assert_eq!(config.store.collection, "counter");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp_dir = tempdir().unwrap();
        let loader = ConfigurationLoader::new(Some(&temp_dir.path().join("absent.toml"))).unwrap();
        assert_eq!(loader.config, Configuration::default());
    }

    #[test]
    fn test_store_config_from_toml() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("counter.toml");
        fs::write(
            &path,
            r#"
[app]
environment = "prod"

[store]
kind = "SQL"
path = "/var/lib/counter/counts.db"
busy_timeout_ms = 250

[logging]
level = "debug"
"#,
        )
        .unwrap();

        let loader = ConfigurationLoader::new(Some(&path)).unwrap();
        let config = &loader.config;
        assert_eq!(config.app.environment, AppEnvironment::Prod);
        assert_eq!(config.store.kind, BackendKind::Relational);
        assert_eq!(config.store.path, PathBuf::from("/var/lib/counter/counts.db"));
        assert_eq!(config.store.busy_timeout_ms, 250);
        // Unset fields keep their defaults
        assert_eq!(config.store.database, "prod_counter");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("counter.toml");
        fs::write(&path, "[store]\nkind = \"cassandra\"\n").unwrap();

        let err = ConfigurationLoader::new(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("Failed to parse TOML config"));
    }

    #[test]
    fn test_environment_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("ENV", "prod"),
            ("DB_TYPE", "MongoDB"),
            ("DB_HOST", "mongo"),
            ("DB_PORT", "27018"),
            ("DB_NAME", "counts"),
            ("DB_USER", "counter"),
            ("DB_PSWD", "secret"),
        ]);

        let mut config = Configuration::default();
        config
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.app.environment, AppEnvironment::Prod);
        assert_eq!(config.store.kind, BackendKind::DocumentDb);
        assert_eq!(config.store.host, "mongo");
        assert_eq!(config.store.port, 27018);
        assert_eq!(config.store.database, "counts");
        assert_eq!(config.store.user, "counter");
        assert_eq!(config.store.password, "secret");
        assert_eq!(config.store.collection, "counter");
    }

    #[test]
    fn test_invalid_override_is_an_error() {
        let mut config = Configuration::default();
        let err = config
            .apply_overrides(|key| (key == "DB_PORT").then(|| "not-a-port".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("DB_PORT"));

        let err = config
            .apply_overrides(|key| (key == "ENV").then(|| "staging".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("Invalid ENV"));
    }
}
