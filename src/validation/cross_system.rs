//! # Cross-System Validator
//!
//! Answers "was this person persisted?" against the datastore. Availability
//! is checked before any lookup runs, so an unreachable datastore can only
//! ever produce [`ValidationOutcome::Indeterminate`], never
//! [`ValidationOutcome::ConfirmedAbsent`].

use crate::config::is_valid_table_identifier;
use crate::errors::{HarnessError, Result};
use crate::storage::{DatastoreGateway, QueryFailure, QueryParam};
use crate::validation::outcome::{PersistedRecord, ValidationOutcome, PERSON_ID_COLUMN};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct CrossSystemValidator {
    gateway: Arc<DatastoreGateway>,
    table: String,
}

impl CrossSystemValidator {
    /// Validator over `table` (`[schema.]table`)
    pub fn new(gateway: Arc<DatastoreGateway>, table: impl Into<String>) -> Result<Self> {
        let table = table.into();
        if !is_valid_table_identifier(&table) {
            return Err(HarnessError::validation_field(
                format!("'{}' is not a valid table identifier", table),
                "person_table",
            ));
        }
        Ok(Self { gateway, table })
    }

    /// Validator over the table named in the gateway's settings
    pub fn from_gateway(gateway: Arc<DatastoreGateway>) -> Result<Self> {
        let table = gateway.settings().person_table.clone();
        Self::new(gateway, table)
    }

    pub fn gateway(&self) -> &Arc<DatastoreGateway> {
        &self.gateway
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Lookup statement for the configured driver, `None` when unconfigured
    pub fn lookup_query(&self) -> Option<String> {
        let placeholder = self.gateway.placeholder(1)?;
        Some(format!(
            "SELECT DISTINCT * FROM {} WHERE {} = {}",
            self.table, PERSON_ID_COLUMN, placeholder
        ))
    }

    pub async fn validate(&self, person_id: i64) -> ValidationOutcome {
        let state = self.gateway.availability().await;
        if !state.is_available() {
            debug!(person_id, availability = %state, "Skipping lookup; datastore not available");
            return ValidationOutcome::Indeterminate(state);
        }

        let Some(query) = self.lookup_query() else {
            return ValidationOutcome::Indeterminate(state);
        };

        let rows = match self.gateway.execute_query(&query, &[QueryParam::Int(person_id)]).await {
            Ok(rows) => rows,
            Err(QueryFailure::Query(message)) => return ValidationOutcome::QueryError(message),
            Err(QueryFailure::Unavailable(state)) => return ValidationOutcome::Indeterminate(state),
            Err(failure @ QueryFailure::Timeout(_)) => {
                return ValidationOutcome::QueryError(failure.to_string())
            }
            Err(QueryFailure::Connectivity(_)) => {
                return ValidationOutcome::Indeterminate(self.gateway.availability().await)
            }
        };

        let matched_rows = rows.len();
        let Some(first) = rows.into_iter().next() else {
            info!(person_id, table = %self.table, "Person not found in datastore");
            return ValidationOutcome::ConfirmedAbsent;
        };

        match PersistedRecord::from_row(first) {
            Some(record) => {
                if matched_rows > 1 {
                    warn!(person_id, matched_rows, "Lookup matched more than one row");
                }
                info!(person_id, matched_rows, "Person found in datastore");
                ValidationOutcome::ConfirmedPresent { record, matched_rows }
            }
            None => ValidationOutcome::QueryError(format!(
                "lookup row in {} has no integer {} column",
                self.table, PERSON_ID_COLUMN
            )),
        }
    }

    /// True only for a confirmed-present outcome
    pub async fn person_exists(&self, person_id: i64) -> bool {
        self.validate(person_id).await.is_present()
    }

    pub async fn fetch_person(&self, person_id: i64) -> Option<PersistedRecord> {
        self.validate(person_id).await.into_record()
    }
}
