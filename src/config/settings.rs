//! # Configuration Settings
//!
//! Settings for the harness components that are not part of the connection
//! profile: the import endpoint, datastore timeouts and logging.

use crate::errors::{HarnessError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use validator::Validate;

pub const ENV_IMPORT_API_BASE_URL: &str = "IMPORT_API_BASE_URL";
pub const ENV_IMPORT_API_TOKEN: &str = "IMPORT_API_TOKEN";
pub const ENV_IMPORT_API_TIMEOUT_SECONDS: &str = "IMPORT_API_TIMEOUT_SECONDS";
pub const ENV_IMPORT_API_CONNECT_TIMEOUT_SECONDS: &str = "IMPORT_API_CONNECT_TIMEOUT_SECONDS";
pub const ENV_RUN_REAL_API: &str = "RUN_REAL_API";
pub const ENV_DB_PERSON_TABLE: &str = "DB_PERSON_TABLE";
pub const ENV_DB_CONNECT_TIMEOUT_SECONDS: &str = "DB_CONNECT_TIMEOUT_SECONDS";
pub const ENV_DB_QUERY_TIMEOUT_SECONDS: &str = "DB_QUERY_TIMEOUT_SECONDS";
pub const ENV_DB_PROBE_TIMEOUT_SECONDS: &str = "DB_PROBE_TIMEOUT_SECONDS";
pub const ENV_DB_MAX_CONNECTIONS: &str = "DB_MAX_CONNECTIONS";
pub const ENV_LOG: &str = "IMPORT_HARNESS_LOG";
pub const ENV_LOG_JSON: &str = "IMPORT_HARNESS_LOG_JSON";

/// Schema-qualified or bare SQL identifier
static TABLE_IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?$")
        .expect("BUG: TABLE_IDENTIFIER pattern is invalid - validated by tests")
});

/// Whether `name` can be spliced into SQL as a table reference
pub fn is_valid_table_identifier(name: &str) -> bool {
    TABLE_IDENTIFIER.is_match(name)
}

/// Complete harness configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
pub struct HarnessConfig {
    /// Import endpoint configuration
    #[validate(nested)]
    pub import_api: ImportApiConfig,

    /// Datastore gateway settings
    #[validate(nested)]
    pub datastore: DatastoreSettings,

    /// Whether suites that hit the real import service may run
    pub real_api_enabled: bool,
}

impl HarnessConfig {
    /// Load from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Invalid numbers are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let import_defaults = ImportApiConfig::default();
        let store_defaults = DatastoreSettings::default();

        let config = Self {
            import_api: ImportApiConfig {
                base_url: read_string(&lookup, ENV_IMPORT_API_BASE_URL)
                    .unwrap_or(import_defaults.base_url),
                token: lookup(ENV_IMPORT_API_TOKEN).unwrap_or(import_defaults.token),
                timeout_seconds: read_parsed(
                    &lookup,
                    ENV_IMPORT_API_TIMEOUT_SECONDS,
                    import_defaults.timeout_seconds,
                )?,
                connect_timeout_seconds: read_parsed(
                    &lookup,
                    ENV_IMPORT_API_CONNECT_TIMEOUT_SECONDS,
                    import_defaults.connect_timeout_seconds,
                )?,
            },
            datastore: DatastoreSettings {
                person_table: read_string(&lookup, ENV_DB_PERSON_TABLE)
                    .unwrap_or(store_defaults.person_table),
                connect_timeout_seconds: read_parsed(
                    &lookup,
                    ENV_DB_CONNECT_TIMEOUT_SECONDS,
                    store_defaults.connect_timeout_seconds,
                )?,
                query_timeout_seconds: read_parsed(
                    &lookup,
                    ENV_DB_QUERY_TIMEOUT_SECONDS,
                    store_defaults.query_timeout_seconds,
                )?,
                probe_timeout_seconds: read_parsed(
                    &lookup,
                    ENV_DB_PROBE_TIMEOUT_SECONDS,
                    store_defaults.probe_timeout_seconds,
                )?,
                max_connections: read_parsed(
                    &lookup,
                    ENV_DB_MAX_CONNECTIONS,
                    store_defaults.max_connections,
                )?,
            },
            real_api_enabled: read_flag(&lookup, ENV_RUN_REAL_API),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(HarnessError::from)?;
        self.validate_custom()
    }

    fn validate_custom(&self) -> Result<()> {
        let parsed = url::Url::parse(&self.import_api.base_url).map_err(|e| {
            HarnessError::config_with_source(
                format!("Invalid import API base URL '{}'", self.import_api.base_url),
                Box::new(e),
            )
        })?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(HarnessError::validation_field(
                "Import API base URL must use http or https",
                "base_url",
            ));
        }

        if !is_valid_table_identifier(&self.datastore.person_table) {
            return Err(HarnessError::validation_field(
                format!("'{}' is not a valid table identifier", self.datastore.person_table),
                "person_table",
            ));
        }

        if self.import_api.connect_timeout_seconds > self.import_api.timeout_seconds {
            return Err(HarnessError::validation(
                "Import API connect timeout cannot exceed the request timeout",
            ));
        }

        Ok(())
    }
}

/// Import endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ImportApiConfig {
    /// Base URL; requests go to `{base_url}/import`
    #[validate(length(min = 1, message = "Base URL cannot be empty"))]
    pub base_url: String,

    /// Bearer token sent on authenticated requests
    pub token: String,

    /// Whole-request timeout in seconds
    #[validate(range(min = 1, max = 120, message = "Timeout must be between 1 and 120 seconds"))]
    pub timeout_seconds: u64,

    /// Connect timeout in seconds
    #[validate(range(
        min = 1,
        max = 60,
        message = "Connect timeout must be between 1 and 60 seconds"
    ))]
    pub connect_timeout_seconds: u64,
}

impl Default for ImportApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.test.worldsys.ar".to_string(),
            token: "xxx".to_string(),
            timeout_seconds: 10,
            connect_timeout_seconds: 5,
        }
    }
}

impl ImportApiConfig {
    /// Full URL of the import endpoint
    pub fn import_url(&self) -> String {
        format!("{}/import", self.base_url.trim_end_matches('/'))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }
}

/// Datastore gateway settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DatastoreSettings {
    /// Table holding imported persons, optionally schema-qualified
    #[validate(length(min = 1, message = "Person table cannot be empty"))]
    pub person_table: String,

    /// Connection acquire timeout in seconds
    #[validate(range(
        min = 1,
        max = 60,
        message = "Connect timeout must be between 1 and 60 seconds"
    ))]
    pub connect_timeout_seconds: u64,

    /// Per-query timeout in seconds
    #[validate(range(
        min = 1,
        max = 300,
        message = "Query timeout must be between 1 and 300 seconds"
    ))]
    pub query_timeout_seconds: u64,

    /// Availability probe timeout in seconds
    #[validate(range(min = 1, max = 60, message = "Probe timeout must be between 1 and 60 seconds"))]
    pub probe_timeout_seconds: u64,

    /// Maximum pooled connections
    #[validate(range(min = 1, max = 20, message = "Max connections must be between 1 and 20"))]
    pub max_connections: u32,
}

impl Default for DatastoreSettings {
    fn default() -> Self {
        Self {
            person_table: "Test.Worldsys".to_string(),
            connect_timeout_seconds: 5,
            query_timeout_seconds: 10,
            probe_timeout_seconds: 3,
            max_connections: 2,
        }
    }
}

impl DatastoreSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_seconds)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_seconds)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `import_harness=debug`
    pub log_level: String,

    /// Emit JSON lines instead of human-readable output
    pub json_logging: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { log_level: "info".to_string(), json_logging: false }
    }
}

impl LoggingConfig {
    /// Create LoggingConfig from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve from an arbitrary key lookup. Never fails.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            log_level: read_string(&lookup, ENV_LOG).unwrap_or_else(|| "info".to_string()),
            json_logging: read_flag(&lookup, ENV_LOG_JSON),
        }
    }
}

fn read_string<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn read_flag<F>(lookup: &F, key: &str) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    read_string(lookup, key).map(|v| v.eq_ignore_ascii_case("true") || v == "1").unwrap_or(false)
}

fn read_parsed<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match read_string(lookup, key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| HarnessError::config(format!("Invalid {} '{}': {}", key, raw, e))),
        None => Ok(default),
    }
}
