//! Validation outcomes and the persisted person record.

use crate::storage::{AvailabilityState, DbRow, SqlValue};
use serde::Serialize;
use std::fmt;

/// Column that keys every person row
pub const PERSON_ID_COLUMN: &str = "personId";

/// A person row as read back from the datastore
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersistedRecord {
    pub person_id: i64,
    pub row: DbRow,
}

impl PersistedRecord {
    /// Build a record from a lookup row. `None` if the row carries no
    /// integer `personId`.
    pub fn from_row(row: DbRow) -> Option<Self> {
        let person_id = row.get(PERSON_ID_COLUMN).and_then(SqlValue::as_i64)?;
        Some(Self { person_id, row })
    }

    /// Any column by name, case-insensitive. SQL NULL reads as `None`.
    pub fn field(&self, name: &str) -> Option<&SqlValue> {
        self.row.get(name).filter(|value| !value.is_null())
    }

    pub fn first_name(&self) -> Option<&str> {
        self.field("firstName").and_then(SqlValue::as_str)
    }

    pub fn last_name(&self) -> Option<&str> {
        self.field("lastName").and_then(SqlValue::as_str)
    }

    pub fn email(&self) -> Option<&str> {
        self.field("email").and_then(SqlValue::as_str)
    }

    pub fn created_at(&self) -> Option<&SqlValue> {
        self.field("created_at")
    }
}

/// Result of asking whether a person was persisted
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    /// At least one row matched; the first one is kept
    ConfirmedPresent { record: PersistedRecord, matched_rows: usize },
    /// The datastore answered and no row matched
    ConfirmedAbsent,
    /// The datastore could not be asked
    Indeterminate(AvailabilityState),
    /// The datastore was reachable but rejected the lookup
    QueryError(String),
}

impl ValidationOutcome {
    pub fn is_present(&self) -> bool {
        matches!(self, ValidationOutcome::ConfirmedPresent { .. })
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, ValidationOutcome::ConfirmedAbsent)
    }

    pub fn is_indeterminate(&self) -> bool {
        matches!(self, ValidationOutcome::Indeterminate(_))
    }

    pub fn is_query_error(&self) -> bool {
        matches!(self, ValidationOutcome::QueryError(_))
    }

    pub fn record(&self) -> Option<&PersistedRecord> {
        match self {
            ValidationOutcome::ConfirmedPresent { record, .. } => Some(record),
            _ => None,
        }
    }

    /// Rows matched by the lookup; more than one means duplicates
    pub fn matched_rows(&self) -> usize {
        match self {
            ValidationOutcome::ConfirmedPresent { matched_rows, .. } => *matched_rows,
            _ => 0,
        }
    }

    pub fn into_record(self) -> Option<PersistedRecord> {
        match self {
            ValidationOutcome::ConfirmedPresent { record, .. } => Some(record),
            _ => None,
        }
    }
}

impl fmt::Display for ValidationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationOutcome::ConfirmedPresent { record, matched_rows } => {
                write!(
                    f,
                    "confirmed-present (personId={}, rows={})",
                    record.person_id, matched_rows
                )
            }
            ValidationOutcome::ConfirmedAbsent => f.write_str("confirmed-absent"),
            ValidationOutcome::Indeterminate(state) => {
                write!(f, "indeterminate (datastore {})", state)
            }
            ValidationOutcome::QueryError(message) => write!(f, "query-error: {}", message),
        }
    }
}
