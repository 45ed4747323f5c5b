use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 5000 }

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "default_database_path")]
    pub path: String,
    pub max_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: None,
            acquire_timeout_secs: None,
        }
    }
}

fn default_database_path() -> String { "database/college_data.db".to_string() }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatchingSettings {
    /// Return matches ordered by opening cutoff instead of table order
    #[serde(default)]
    pub order_by_opening_rank: bool,
    /// Extra place spellings, merged over the built-in aliases
    #[serde(default)]
    pub place_aliases: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with PREDICTOR__)
    /// 5. `DATABASE_PATH`, if set
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., PREDICTOR__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("PREDICTOR")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings = apply_database_path_override(settings)?;

        settings.try_deserialize()
    }
}

/// `DATABASE_PATH` wins over every other source for the database location
fn apply_database_path_override(settings: Config) -> Result<Config, ConfigError> {
    match std::env::var("DATABASE_PATH") {
        Ok(path) if !path.trim().is_empty() => Config::builder()
            .add_source(settings)
            .set_override("database.path", path)?
            .build(),
        _ => Ok(settings),
    }
}
