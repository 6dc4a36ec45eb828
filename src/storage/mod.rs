//! # Storage
//!
//! Optional relational datastore access: a per-driver backend built on
//! `sqlx`, driver-neutral rows, and the [`DatastoreGateway`] that tracks
//! whether the datastore can be used at all.

pub mod backend;
pub mod gateway;
pub mod rows;

pub use backend::{connect_lazy, placeholder_for, BackendError, DatastoreBackend};
pub use gateway::{AvailabilityState, DatastoreGateway, QueryFailure};
pub use rows::{DbRow, QueryParam, SqlValue};
