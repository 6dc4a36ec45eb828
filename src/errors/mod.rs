//! # Error Handling
//!
//! Error types for the import harness, built on `thiserror`.

pub mod types;

pub use types::{HarnessError, Result};

/// Short alias used across the crate
pub type Error = HarnessError;
