//! # Connection Profile Resolution
//!
//! Reads the datastore connection parameters from the process environment and
//! decides whether a datastore target is *configured*. Reachability is a
//! separate question answered by [`crate::storage::DatastoreGateway`].
//!
//! Resolution never fails: a missing mandatory variable, an unparseable port
//! or a driver with no backend all resolve to [`Resolution::Unconfigured`]
//! carrying the reason.

use std::fmt;

/// Database server host (mandatory)
pub const ENV_DB_SERVER: &str = "DB_SERVER";
/// Database name, or file path for SQLite (mandatory)
pub const ENV_DB_NAME: &str = "DB_NAME";
/// Database user (mandatory)
pub const ENV_DB_USER: &str = "DB_USER";
/// Database password (mandatory)
pub const ENV_DB_PASSWORD: &str = "DB_PASSWORD";
/// Database port (optional, driver default otherwise)
pub const ENV_DB_PORT: &str = "DB_PORT";
/// Driver identifier (optional, defaults to postgres)
pub const ENV_DB_DRIVER: &str = "DB_DRIVER";

const MANDATORY_VARS: [&str; 4] = [ENV_DB_SERVER, ENV_DB_NAME, ENV_DB_USER, ENV_DB_PASSWORD];

/// Datastore drivers the harness has a backend for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverKind {
    Postgres,
    MySql,
    Sqlite,
}

impl DriverKind {
    /// Parse a driver identifier. Returns `Err` with the raw identifier when
    /// no backend exists for it.
    pub fn parse(raw: &str) -> std::result::Result<Self, String> {
        let normalized = raw.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "postgres" | "postgresql" | "pg" => Ok(DriverKind::Postgres),
            "mysql" | "mariadb" => Ok(DriverKind::MySql),
            "sqlite" | "sqlite3" => Ok(DriverKind::Sqlite),
            _ => Err(raw.trim().to_string()),
        }
    }

    /// Port used when `DB_PORT` is not set
    pub fn default_port(&self) -> Option<u16> {
        match self {
            DriverKind::Postgres => Some(5432),
            DriverKind::MySql => Some(3306),
            DriverKind::Sqlite => None,
        }
    }

    /// Short scheme-like name used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            DriverKind::Postgres => "postgres",
            DriverKind::MySql => "mysql",
            DriverKind::Sqlite => "sqlite",
        }
    }
}

impl Default for DriverKind {
    fn default() -> Self {
        DriverKind::Postgres
    }
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fully populated datastore connection parameters.
///
/// Immutable once resolved. For SQLite, `database` is the file path and the
/// server/credential fields are carried but unused.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionProfile {
    pub server: String,
    pub database: String,
    pub username: String,
    pub password: String,
    pub port: Option<u16>,
    pub driver: DriverKind,
}

impl ConnectionProfile {
    /// Port to connect to, falling back to the driver default
    pub fn effective_port(&self) -> Option<u16> {
        self.port.or_else(|| self.driver.default_port())
    }

    /// Connection target without the password, safe for logging
    pub fn display_target(&self) -> String {
        match (self.driver, self.effective_port()) {
            (DriverKind::Sqlite, _) => format!("sqlite://{}", self.database),
            (driver, Some(port)) => {
                format!("{}://{}@{}:{}/{}", driver, self.username, self.server, port, self.database)
            }
            (driver, None) => {
                format!("{}://{}@{}/{}", driver, self.username, self.server, self.database)
            }
        }
    }
}

impl fmt::Debug for ConnectionProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionProfile")
            .field("server", &self.server)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"***")
            .field("port", &self.port)
            .field("driver", &self.driver)
            .finish()
    }
}

/// Why a profile could not be resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnconfiguredReason {
    /// One or more mandatory variables are unset or empty
    MissingVariables(Vec<&'static str>),
    /// `DB_PORT` is set but is not a valid port number
    InvalidPort(String),
    /// `DB_DRIVER` names a driver without a backend
    UnsupportedDriver(String),
}

impl fmt::Display for UnconfiguredReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnconfiguredReason::MissingVariables(vars) => {
                write!(f, "missing environment variables: {}", vars.join(", "))
            }
            UnconfiguredReason::InvalidPort(raw) => write!(f, "invalid {}: '{}'", ENV_DB_PORT, raw),
            UnconfiguredReason::UnsupportedDriver(raw) => {
                write!(f, "no datastore backend for driver '{}'", raw)
            }
        }
    }
}

/// Outcome of resolving the connection profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Configured(ConnectionProfile),
    Unconfigured(UnconfiguredReason),
}

impl Resolution {
    /// Resolve from the current process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve from an arbitrary key lookup.
    ///
    /// Empty and whitespace-only values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let missing: Vec<&'static str> =
            MANDATORY_VARS.iter().copied().filter(|&key| read(key).is_none()).collect();
        if !missing.is_empty() {
            return Resolution::Unconfigured(UnconfiguredReason::MissingVariables(missing));
        }

        let driver = match read(ENV_DB_DRIVER) {
            Some(raw) => match DriverKind::parse(&raw) {
                Ok(driver) => driver,
                Err(raw) => {
                    return Resolution::Unconfigured(UnconfiguredReason::UnsupportedDriver(raw))
                }
            },
            None => DriverKind::default(),
        };

        let port = match read(ENV_DB_PORT) {
            Some(raw) => match raw.parse::<u16>() {
                Ok(port) if port > 0 => Some(port),
                _ => return Resolution::Unconfigured(UnconfiguredReason::InvalidPort(raw)),
            },
            None => None,
        };

        // The mandatory fields were checked above; default only satisfies the type.
        Resolution::Configured(ConnectionProfile {
            server: read(ENV_DB_SERVER).unwrap_or_default(),
            database: read(ENV_DB_NAME).unwrap_or_default(),
            username: read(ENV_DB_USER).unwrap_or_default(),
            password: read(ENV_DB_PASSWORD).unwrap_or_default(),
            port,
            driver,
        })
    }

    /// Whether a complete profile was resolved
    pub fn is_configured(&self) -> bool {
        matches!(self, Resolution::Configured(_))
    }

    /// The resolved profile, if any
    pub fn profile(&self) -> Option<&ConnectionProfile> {
        match self {
            Resolution::Configured(profile) => Some(profile),
            Resolution::Unconfigured(_) => None,
        }
    }
}
