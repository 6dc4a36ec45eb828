//! # Observability
//!
//! Structured logging for the harness. Every probe, query and import call is
//! logged with `tracing`; spans carry a correlation id so one test's calls
//! can be picked out of interleaved output.

pub mod logging;

pub use logging::init_logging;
