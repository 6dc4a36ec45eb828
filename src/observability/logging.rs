//! # Structured Logging
//!
//! Logging setup and span macros for the harness, built on `tracing`.

use crate::config::LoggingConfig;
use tracing_subscriber::{fmt, EnvFilter};

/// Create a tracing span around one HTTP call.
///
/// ```rust,ignore
/// let span = request_span!("POST", url);
/// let span = request_span!("POST", url, authenticated = true);
/// ```
#[macro_export]
macro_rules! request_span {
    ($method:expr, $url:expr) => {
        tracing::info_span!(
            "http_request",
            method = %$method,
            url = %$url,
            request_id = %uuid::Uuid::new_v4()
        )
    };
    ($method:expr, $url:expr, $($field:tt)*) => {
        tracing::info_span!(
            "http_request",
            method = %$method,
            url = %$url,
            request_id = %uuid::Uuid::new_v4(),
            $($field)*
        )
    };
}

/// Create a tracing span around one datastore operation.
///
/// ```rust,ignore
/// let span = db_span!("probe", driver = "postgres");
/// ```
#[macro_export]
macro_rules! db_span {
    ($operation:expr) => {
        tracing::debug_span!(
            "db_operation",
            operation = %$operation,
            operation_id = %uuid::Uuid::new_v4()
        )
    };
    ($operation:expr, $($field:tt)*) => {
        tracing::debug_span!(
            "db_operation",
            operation = %$operation,
            operation_id = %uuid::Uuid::new_v4(),
            $($field)*
        )
    };
}

/// Install the global subscriber.
///
/// Returns `false` when a subscriber was already installed (e.g. by another
/// test in the same binary); that is not an error.
pub fn init_logging(config: &LoggingConfig) -> bool {
    let filter =
        EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    let installed = if config.json_logging {
        fmt().json().with_env_filter(filter).with_target(true).try_init()
    } else {
        fmt().with_env_filter(filter).with_target(false).try_init()
    };

    installed.is_ok()
}
