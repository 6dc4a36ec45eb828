//! Scriptable datastore backend.
//!
//! Stands in for a real driver: it can be reachable or not, return canned
//! rows or fail queries, and counts every call it receives.

use async_trait::async_trait;
use import_harness::config::{ConnectionProfile, DatastoreSettings, DriverKind};
use import_harness::storage::{
    placeholder_for, BackendError, DatastoreBackend, DbRow, QueryParam, SqlValue,
};
use import_harness::DatastoreGateway;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
pub struct StubBackend {
    reachable: AtomicBool,
    rows: Mutex<Vec<DbRow>>,
    query_error: Mutex<Option<String>>,
    stall_queries: AtomicBool,
    probes: AtomicUsize,
    executions: AtomicUsize,
    last_query: Mutex<Option<(String, Vec<QueryParam>)>>,
}

impl StubBackend {
    /// Reachable backend answering every query with `rows`
    pub fn reachable(rows: Vec<DbRow>) -> Arc<Self> {
        let backend = Self::default();
        backend.reachable.store(true, Ordering::SeqCst);
        *backend.rows.lock().unwrap() = rows;
        Arc::new(backend)
    }

    /// Backend whose probe and queries fail with a connectivity error
    pub fn unreachable() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    pub fn set_rows(&self, rows: Vec<DbRow>) {
        *self.rows.lock().unwrap() = rows;
    }

    /// Make every query fail with a database-reported error
    pub fn fail_queries(&self, message: &str) {
        *self.query_error.lock().unwrap() = Some(message.to_string());
    }

    /// Make every query run past its time bound
    pub fn stall_queries(&self, stall: bool) {
        self.stall_queries.store(stall, Ordering::SeqCst);
    }

    pub fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    pub fn executions(&self) -> usize {
        self.executions.load(Ordering::SeqCst)
    }

    pub fn last_query(&self) -> Option<(String, Vec<QueryParam>)> {
        self.last_query.lock().unwrap().clone()
    }
}

#[async_trait]
impl DatastoreBackend for StubBackend {
    fn driver(&self) -> DriverKind {
        DriverKind::Postgres
    }

    fn placeholder(&self, position: usize) -> String {
        placeholder_for(DriverKind::Postgres, position)
    }

    async fn probe(&self) -> Result<(), BackendError> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        if self.reachable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(BackendError::Connectivity("connection refused".to_string()))
        }
    }

    async fn execute(
        &self,
        query: &str,
        params: &[QueryParam],
    ) -> Result<Vec<DbRow>, BackendError> {
        self.executions.fetch_add(1, Ordering::SeqCst);
        *self.last_query.lock().unwrap() = Some((query.to_string(), params.to_vec()));

        if !self.reachable.load(Ordering::SeqCst) {
            return Err(BackendError::Connectivity("connection reset by peer".to_string()));
        }
        if let Some(message) = self.query_error.lock().unwrap().clone() {
            return Err(BackendError::Query(message));
        }
        if self.stall_queries.load(Ordering::SeqCst) {
            return Err(BackendError::Timeout {
                operation: "query",
                after: DatastoreSettings::default().query_timeout(),
            });
        }
        Ok(self.rows.lock().unwrap().clone())
    }
}

/// Gateway over `backend` with a configured Postgres-shaped profile
pub fn stub_gateway(backend: Arc<StubBackend>) -> Arc<DatastoreGateway> {
    let profile = ConnectionProfile {
        server: "db.internal".to_string(),
        database: "people".to_string(),
        username: "harness".to_string(),
        password: "secret".to_string(),
        port: Some(5432),
        driver: DriverKind::Postgres,
    };
    Arc::new(DatastoreGateway::with_backend(profile, backend, DatastoreSettings::default()))
}

/// A row shaped like the person table
pub fn person_row(person_id: i64, first: &str, last: &str) -> DbRow {
    DbRow::new(vec![
        ("personId".to_string(), SqlValue::Int(person_id)),
        ("firstName".to_string(), SqlValue::Text(first.to_string())),
        ("lastName".to_string(), SqlValue::Text(last.to_string())),
        ("email".to_string(), SqlValue::Text(format!("{}@example.com", first.to_lowercase()))),
        ("created_at".to_string(), SqlValue::Text("2024-01-01 00:00:00".to_string())),
    ])
}
