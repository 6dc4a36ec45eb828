//! Common test utilities for all integration tests.
//!
//! Provides the mocked import service, seeded SQLite person databases and a
//! scriptable datastore backend.

#![allow(dead_code)]
#![allow(clippy::duplicate_mod)]

pub mod import_service;
pub mod person_db;
pub mod stub_backend;
