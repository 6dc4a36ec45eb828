//! # Datastore Backends
//!
//! One [`DatastoreBackend`] implementation per [`DriverKind`], each wrapping a
//! lazily-connected `sqlx` pool. New drivers are added as new implementations
//! here and a new arm in [`connect_lazy`]; nothing else branches on the driver.
//!
//! Every call acquires a pooled connection, runs under a timeout and returns
//! the connection to the pool when the call's scope ends, on success and
//! failure alike. Errors are classified so callers can tell an unreachable
//! datastore from a bad query.

use crate::config::{ConnectionProfile, DatastoreSettings, DriverKind};
use crate::storage::rows::{DbRow, QueryParam, SqlValue};
use async_trait::async_trait;
use bigdecimal::{BigDecimal, ToPrimitive};
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{
    mysql::{MySql, MySqlConnectOptions, MySqlPoolOptions, MySqlRow},
    postgres::{PgConnectOptions, PgPoolOptions, PgRow, Postgres},
    sqlite::{Sqlite, SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Column, Pool, Row, TypeInfo,
};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

const SQLITE_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Classified backend failure
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BackendError {
    /// The datastore could not be reached or the session broke
    #[error("connectivity failure: {0}")]
    Connectivity(String),

    /// The datastore was reached but rejected or could not answer the query
    #[error("query failure: {0}")]
    Query(String),

    /// The bounded wait for an operation elapsed
    #[error("{operation} timed out after {after:?}")]
    Timeout { operation: &'static str, after: Duration },
}

impl BackendError {
    /// Whether the failure is attributable to the query rather than reachability
    pub fn is_query(&self) -> bool {
        matches!(self, BackendError::Query(_))
    }
}

/// Capability set every datastore driver provides
#[async_trait]
pub trait DatastoreBackend: Send + Sync + fmt::Debug {
    /// Driver this backend speaks
    fn driver(&self) -> DriverKind;

    /// Bind placeholder for the 1-based parameter `position`
    fn placeholder(&self, position: usize) -> String;

    /// Lightweight connectivity check (`SELECT 1`)
    async fn probe(&self) -> Result<(), BackendError>;

    /// Run a query with positionally bound parameters
    async fn execute(&self, query: &str, params: &[QueryParam]) -> Result<Vec<DbRow>, BackendError>;
}

/// Placeholder syntax per driver
pub fn placeholder_for(driver: DriverKind, position: usize) -> String {
    match driver {
        DriverKind::Postgres => format!("${}", position),
        DriverKind::MySql | DriverKind::Sqlite => "?".to_string(),
    }
}

/// Build the backend for a profile without performing any I/O.
///
/// Must be called from within a Tokio runtime.
pub fn connect_lazy(
    profile: &ConnectionProfile,
    settings: &DatastoreSettings,
) -> Arc<dyn DatastoreBackend> {
    tracing::debug!(
        target = %profile.display_target(),
        max_connections = settings.max_connections,
        connect_timeout_ms = settings.connect_timeout().as_millis(),
        "Creating lazy datastore pool"
    );

    match profile.driver {
        DriverKind::Postgres => {
            let mut options = PgConnectOptions::new()
                .host(&profile.server)
                .username(&profile.username)
                .password(&profile.password)
                .database(&profile.database);
            if let Some(port) = profile.effective_port() {
                options = options.port(port);
            }
            let pool = PgPoolOptions::new()
                .max_connections(settings.max_connections)
                .min_connections(0)
                .acquire_timeout(settings.connect_timeout())
                .connect_lazy_with(options);
            Arc::new(PostgresBackend::from_pool(pool, settings))
        }
        DriverKind::MySql => {
            let mut options = MySqlConnectOptions::new()
                .host(&profile.server)
                .username(&profile.username)
                .password(&profile.password)
                .database(&profile.database);
            if let Some(port) = profile.effective_port() {
                options = options.port(port);
            }
            let pool = MySqlPoolOptions::new()
                .max_connections(settings.max_connections)
                .min_connections(0)
                .acquire_timeout(settings.connect_timeout())
                .connect_lazy_with(options);
            Arc::new(MySqlBackend::from_pool(pool, settings))
        }
        DriverKind::Sqlite => {
            let options = SqliteConnectOptions::new()
                .filename(&profile.database)
                .create_if_missing(false)
                .busy_timeout(SQLITE_BUSY_TIMEOUT);
            let pool = SqlitePoolOptions::new()
                .max_connections(settings.max_connections)
                .min_connections(0)
                .acquire_timeout(settings.connect_timeout())
                .connect_lazy_with(options);
            Arc::new(SqliteBackend::from_pool(pool, settings))
        }
    }
}

/// Sort an `sqlx` error into reachability vs query failure
fn classify(error: sqlx::Error) -> BackendError {
    let message = error.to_string();
    match error {
        sqlx::Error::Database(_)
        | sqlx::Error::RowNotFound
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::Encode(_)
        | sqlx::Error::Decode(_) => BackendError::Query(message),
        _ => BackendError::Connectivity(message),
    }
}

/// Decode one column, trying the types the harness understands in turn.
///
/// `$extra` covers driver-specific types (unsigned integers, NUMERIC) and is
/// tried right after the signed integers.
macro_rules! decode_column {
    ($row:expr, $index:expr, $type_name:expr, $extra:path) => {{
        if let Ok(v) = $row.try_get::<Option<i64>, _>($index) {
            v.map(SqlValue::Int).unwrap_or(SqlValue::Null)
        } else if let Ok(v) = $row.try_get::<Option<i32>, _>($index) {
            v.map(|v| SqlValue::Int(v.into())).unwrap_or(SqlValue::Null)
        } else if let Ok(v) = $row.try_get::<Option<i16>, _>($index) {
            v.map(|v| SqlValue::Int(v.into())).unwrap_or(SqlValue::Null)
        } else if let Some(value) = $extra($row, $index) {
            value
        } else if let Ok(v) = $row.try_get::<Option<f64>, _>($index) {
            v.map(SqlValue::Float).unwrap_or(SqlValue::Null)
        } else if let Ok(v) = $row.try_get::<Option<f32>, _>($index) {
            v.map(|v| SqlValue::Float(v.into())).unwrap_or(SqlValue::Null)
        } else if let Ok(v) = $row.try_get::<Option<bool>, _>($index) {
            v.map(SqlValue::Bool).unwrap_or(SqlValue::Null)
        } else if let Ok(v) = $row.try_get::<Option<String>, _>($index) {
            v.map(SqlValue::Text).unwrap_or(SqlValue::Null)
        } else if let Ok(v) = $row.try_get::<Option<NaiveDateTime>, _>($index) {
            v.map(SqlValue::Timestamp).unwrap_or(SqlValue::Null)
        } else if let Ok(v) = $row.try_get::<Option<DateTime<Utc>>, _>($index) {
            v.map(|v| SqlValue::Timestamp(v.naive_utc())).unwrap_or(SqlValue::Null)
        } else {
            SqlValue::Unsupported($type_name)
        }
    }};
}

/// Unsigned integers become `Int` when they fit, text otherwise.
fn unsigned_value(value: u64) -> SqlValue {
    i64::try_from(value).map(SqlValue::Int).unwrap_or_else(|_| SqlValue::Text(value.to_string()))
}

/// Whole NUMERIC/DECIMAL values become `Int`; fractional ones `Float`.
fn decimal_value(value: BigDecimal) -> SqlValue {
    if value.is_integer() {
        if let Some(v) = value.to_i64() {
            return SqlValue::Int(v);
        }
    }
    value.to_f64().map(SqlValue::Float).unwrap_or_else(|| SqlValue::Text(value.to_string()))
}

fn decode_postgres_extra(row: &PgRow, index: usize) -> Option<SqlValue> {
    row.try_get::<Option<BigDecimal>, _>(index)
        .ok()
        .map(|v| v.map(decimal_value).unwrap_or(SqlValue::Null))
}

fn decode_mysql_extra(row: &MySqlRow, index: usize) -> Option<SqlValue> {
    // Signed decoders reject columns flagged UNSIGNED.
    if let Ok(v) = row.try_get::<Option<u64>, _>(index) {
        return Some(v.map(unsigned_value).unwrap_or(SqlValue::Null));
    }
    if let Ok(v) = row.try_get::<Option<u32>, _>(index) {
        return Some(v.map(|v| unsigned_value(v.into())).unwrap_or(SqlValue::Null));
    }
    if let Ok(v) = row.try_get::<Option<u16>, _>(index) {
        return Some(v.map(|v| unsigned_value(v.into())).unwrap_or(SqlValue::Null));
    }
    row.try_get::<Option<BigDecimal>, _>(index)
        .ok()
        .map(|v| v.map(decimal_value).unwrap_or(SqlValue::Null))
}

fn decode_sqlite_extra(_row: &SqliteRow, _index: usize) -> Option<SqlValue> {
    None
}

/// Stamp out a pooled backend for one `sqlx` database.
macro_rules! sqlx_backend {
    ($(#[$meta:meta])* $name:ident, $db:ty, $row:ty, $driver:expr, $extra:path) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name {
            pool: Pool<$db>,
            query_timeout: Duration,
            probe_timeout: Duration,
        }

        impl $name {
            pub fn from_pool(pool: Pool<$db>, settings: &DatastoreSettings) -> Self {
                Self {
                    pool,
                    query_timeout: settings.query_timeout(),
                    probe_timeout: settings.probe_timeout(),
                }
            }

            fn decode_row(row: &$row) -> DbRow {
                let columns = row
                    .columns()
                    .iter()
                    .enumerate()
                    .map(|(index, column)| {
                        let type_name = column.type_info().name().to_string();
                        let value = decode_column!(row, index, type_name, $extra);
                        (column.name().to_string(), value)
                    })
                    .collect();
                DbRow::new(columns)
            }
        }

        #[async_trait]
        impl DatastoreBackend for $name {
            fn driver(&self) -> DriverKind {
                $driver
            }

            fn placeholder(&self, position: usize) -> String {
                placeholder_for($driver, position)
            }

            async fn probe(&self) -> Result<(), BackendError> {
                let work = async {
                    let mut conn = self
                        .pool
                        .acquire()
                        .await
                        .map_err(|e| BackendError::Connectivity(e.to_string()))?;
                    sqlx::query("SELECT 1").fetch_one(&mut *conn).await.map_err(classify)?;
                    Ok(())
                };

                tokio::time::timeout(self.probe_timeout, work).await.map_err(|_| {
                    BackendError::Timeout { operation: "probe", after: self.probe_timeout }
                })?
            }

            async fn execute(
                &self,
                query: &str,
                params: &[QueryParam],
            ) -> Result<Vec<DbRow>, BackendError> {
                let work = async {
                    // Any failure to obtain a session is a reachability problem,
                    // including authentication rejected by the server.
                    let mut conn = self
                        .pool
                        .acquire()
                        .await
                        .map_err(|e| BackendError::Connectivity(e.to_string()))?;

                    let mut statement = sqlx::query(query);
                    for param in params {
                        statement = match param {
                            QueryParam::Null => statement.bind(None::<String>),
                            QueryParam::Bool(v) => statement.bind(*v),
                            QueryParam::Int(v) => statement.bind(*v),
                            QueryParam::Float(v) => statement.bind(*v),
                            QueryParam::Text(v) => statement.bind(v.as_str()),
                        };
                    }

                    let rows = statement.fetch_all(&mut *conn).await.map_err(classify)?;
                    Ok(rows.iter().map(Self::decode_row).collect())
                };

                tokio::time::timeout(self.query_timeout, work).await.map_err(|_| {
                    BackendError::Timeout { operation: "query", after: self.query_timeout }
                })?
            }
        }
    };
}

sqlx_backend!(
    /// PostgreSQL backend
    PostgresBackend,
    Postgres,
    PgRow,
    DriverKind::Postgres,
    decode_postgres_extra
);

sqlx_backend!(
    /// MySQL / MariaDB backend
    MySqlBackend,
    MySql,
    MySqlRow,
    DriverKind::MySql,
    decode_mysql_extra
);

sqlx_backend!(
    /// SQLite backend; the profile's database field is the file path
    SqliteBackend,
    Sqlite,
    SqliteRow,
    DriverKind::Sqlite,
    decode_sqlite_extra
);
