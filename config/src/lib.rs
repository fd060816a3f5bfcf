//! # Configuration Management for Nordic
//!
//! This crate provides centralized configuration structures for the Nordic
//! engine: database connection settings and engine behaviour (schemas to
//! introspect, persisted metadata document, key casing, managed columns).
//!
//! ## Quick Start
//!
//! ### Programmatic Configuration
//! ```rust
//! use config::{DatabaseConfig, EngineConfig, KeyCase};
//!
//! let db_config = DatabaseConfig::new(
//!     "localhost".to_string(), 5432, "myapp".to_string(),
//!     "postgres".to_string(), "password".to_string(), 30,
//! );
//!
//! let engine_config = EngineConfig::default()
//!     .with_key_cases(KeyCase::CamelCase, KeyCase::SnakeCase);
//! ```
//!
//! ### TOML File Configuration
//! ```toml
//! [database]
//! host = "localhost"
//! port = 5432
//! database = "myapp"
//! username = "postgres"
//! password = "password"
//! connect_timeout_seconds = 30
//!
//! [engine]
//! schemas = ["public", "secured"]
//! metadata_path = "nordic-metadata.json"
//! object_keys = "camel_case"
//! row_keys = "snake_case"
//!
//! [[engine.managed_timestamps]]
//! table = "secured.articles"
//! column = "created_at"
//! policy = "insert"
//! ```
//!
//! Load configuration:
//! ```rust,no_run
//! use config::AppConfig;
//!
//! // Load from nordic.toml (or the file named by NORDIC_CONFIG)
//! let config = AppConfig::load()?;
//!
//! // Or load from custom path
//! let config = AppConfig::from_file("config/production.toml")?;
//! # Ok::<(), config::ConfigError>(())
//! ```

use serde::{Deserialize, Serialize};
use std::{
    env,
    path::{Path, PathBuf},
};
use thiserror::Error;

const DEFAULT_CONFIG_PATH: &str = "./nordic.toml";
const CONFIG_PATH_VARIABLE: &str = "NORDIC_CONFIG";

/// Schema used when an entity names only a table
pub const DEFAULT_SCHEMA: &str = "public";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Environment variable error: {0}")]
    Env(#[from] env::VarError),
    #[error("Dotenvy error: {0}")]
    Dotenvy(#[from] dotenvy::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
}

/// Key naming convention applied by the data codec
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyCase {
    /// Keys are passed through untouched
    #[default]
    Preserve,
    /// `article_id`
    SnakeCase,
    /// `articleId`
    CamelCase,
}

/// Operations on which the database supplies a managed timestamp column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampPolicy {
    Insert,
    Update,
    Both,
}

/// A column whose value is `now()` on the operations named by its policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedTimestampConfig {
    /// `table` or `schema.table`
    pub table: String,
    pub column: String,
    pub policy: TimestampPolicy,
}

/// Engine behaviour configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Schemas introspected when building the catalog
    #[serde(default = "default_schemas")]
    pub schemas: Vec<String>,
    /// Pre-computed metadata document used instead of live introspection
    #[serde(default)]
    pub metadata_path: Option<PathBuf>,
    /// Key convention handed to callers
    #[serde(default)]
    pub object_keys: KeyCase,
    /// Key convention of database columns
    #[serde(default)]
    pub row_keys: KeyCase,
    #[serde(default)]
    pub managed_timestamps: Vec<ManagedTimestampConfig>,
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_schemas() -> Vec<String> {
    vec![DEFAULT_SCHEMA.to_string()]
}

impl AppConfig {
    /// Load configuration from TOML file specified in .env or defaults
    pub fn load() -> Result<Self, ConfigError> {
        // A missing .env file is fine, a malformed one is not
        match dotenvy::dotenv() {
            Ok(_) => {}
            Err(error) if error.not_found() => {}
            Err(error) => return Err(error.into()),
        }

        let config = if let Ok(config_path) = env::var(CONFIG_PATH_VARIABLE) {
            Self::from_file(&config_path)
        } else if Path::new(DEFAULT_CONFIG_PATH).exists() {
            Self::from_file(DEFAULT_CONFIG_PATH)
        } else {
            Err(ConfigError::Invalid(format!(
                "Config path must be specified in .env file as {} or in {} file",
                CONFIG_PATH_VARIABLE, DEFAULT_CONFIG_PATH
            )))
        }?;

        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.database.validate()?;
        self.engine.validate()
    }
}

impl DatabaseConfig {
    /// Create a new database configuration
    pub fn new(
        host: String,
        port: u16,
        database: String,
        username: String,
        password: String,
        connect_timeout_seconds: u64,
    ) -> Self {
        Self {
            host,
            port,
            database,
            username,
            password,
            connect_timeout_seconds,
        }
    }

    /// Build connection string
    pub fn connection_string(&self) -> String {
        format!(
            "postgresql://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database
        )
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::Invalid(
                "Database host cannot be empty".to_string(),
            ));
        }
        if self.port == 0 {
            return Err(ConfigError::Invalid(
                "Database port cannot be zero".to_string(),
            ));
        }
        if self.database.is_empty() {
            return Err(ConfigError::Invalid(
                "Database name cannot be empty".to_string(),
            ));
        }
        if self.username.is_empty() {
            return Err(ConfigError::Invalid(
                "Database username cannot be empty".to_string(),
            ));
        }
        if self.connect_timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "Database connect_timeout_seconds must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl EngineConfig {
    pub fn with_schemas(mut self, schemas: Vec<String>) -> Self {
        self.schemas = schemas;
        self
    }

    pub fn with_metadata_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.metadata_path = Some(path.into());
        self
    }

    /// Set the object-side and row-side key conventions
    pub fn with_key_cases(mut self, object_keys: KeyCase, row_keys: KeyCase) -> Self {
        self.object_keys = object_keys;
        self.row_keys = row_keys;
        self
    }

    pub fn with_managed_timestamp(
        mut self,
        table: impl Into<String>,
        column: impl Into<String>,
        policy: TimestampPolicy,
    ) -> Self {
        self.managed_timestamps.push(ManagedTimestampConfig {
            table: table.into(),
            column: column.into(),
            policy,
        });
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.schemas.is_empty() {
            return Err(ConfigError::Invalid(
                "Engine schemas cannot be empty".to_string(),
            ));
        }
        if self.schemas.iter().any(|schema| schema.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "Engine schema names cannot be empty".to_string(),
            ));
        }
        for managed in &self.managed_timestamps {
            if managed.table.is_empty() || managed.column.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "Managed timestamp entry '{}.{}' needs both a table and a column",
                    managed.table, managed.column
                )));
            }
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            schemas: default_schemas(),
            metadata_path: None,
            object_keys: KeyCase::Preserve,
            row_keys: KeyCase::Preserve,
            managed_timestamps: Vec::new(),
        }
    }
}

impl ManagedTimestampConfig {
    /// Split `schema.table` into its parts, defaulting the schema
    pub fn schema_and_table(&self) -> (&str, &str) {
        match self.table.split_once('.') {
            Some((schema, table)) => (schema, table),
            None => (DEFAULT_SCHEMA, self.table.as_str()),
        }
    }
}
