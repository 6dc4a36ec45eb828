//! # Configuration Management
//!
//! Configuration is resolved once at harness startup and passed explicitly to
//! every component; nothing below this module reads the environment.
//!
//! - [`profile`] decides whether a datastore target is configured
//! - [`settings`] holds endpoint, timeout and logging settings

pub mod profile;
pub mod settings;

pub use profile::{ConnectionProfile, DriverKind, Resolution, UnconfiguredReason};
pub use settings::{
    is_valid_table_identifier, DatastoreSettings, HarnessConfig, ImportApiConfig, LoggingConfig,
};
