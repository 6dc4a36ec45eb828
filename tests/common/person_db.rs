//! Seeded SQLite person databases.
//!
//! Each database lives in its own temporary directory and is removed when
//! the fixture is dropped.

use import_harness::config::{ConnectionProfile, DatastoreSettings, DriverKind, Resolution};
use import_harness::DatastoreGateway;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// Table the fixtures create
pub const PERSON_TABLE: &str = "worldsys";

/// Rows seeded by [`PersonDatabase::standard`]
pub const STANDARD_PEOPLE: [(i64, &str, &str, &str); 3] = [
    (111, "John", "Doe", "john.doe@example.com"),
    (222, "Jane", "Roe", "jane.roe@example.com"),
    (333, "Max", "Mustermann", "max@example.com"),
];

pub struct PersonDatabase {
    pool: SqlitePool,
    pub path: PathBuf,
    _dir: TempDir,
}

impl PersonDatabase {
    /// Database seeded with persons 111, 222 and 333
    pub async fn standard() -> Self {
        let db = Self::empty().await;
        for (id, first, last, email) in STANDARD_PEOPLE {
            db.insert(id, first, last, email).await;
        }
        db
    }

    /// Database with the person table and no rows
    pub async fn empty() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir for person database");
        let path = dir.path().join("people.db");
        let url = format!("sqlite://{}?mode=rwc", path.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(&url)
            .await
            .expect("create person database");

        sqlx::query(
            "CREATE TABLE worldsys (
                personId INTEGER NOT NULL,
                firstName TEXT,
                lastName TEXT,
                email TEXT,
                created_at TEXT DEFAULT CURRENT_TIMESTAMP
            )",
        )
        .execute(&pool)
        .await
        .expect("create person table");

        Self { pool, path, _dir: dir }
    }

    pub async fn insert(&self, person_id: i64, first: &str, last: &str, email: &str) {
        sqlx::query(
            "INSERT INTO worldsys (personId, firstName, lastName, email) VALUES (?, ?, ?, ?)",
        )
        .bind(person_id)
        .bind(first)
        .bind(last)
        .bind(email)
        .execute(&self.pool)
        .await
        .expect("insert person");
    }

    pub fn profile(&self) -> ConnectionProfile {
        ConnectionProfile {
            server: "localhost".to_string(),
            database: self.path.display().to_string(),
            username: "harness".to_string(),
            password: "unused".to_string(),
            port: None,
            driver: DriverKind::Sqlite,
        }
    }

    /// Settings with short timeouts and the fixture table
    pub fn settings() -> DatastoreSettings {
        DatastoreSettings {
            person_table: PERSON_TABLE.to_string(),
            connect_timeout_seconds: 2,
            query_timeout_seconds: 5,
            probe_timeout_seconds: 2,
            max_connections: 2,
        }
    }

    /// A fresh gateway over this database
    pub fn gateway(&self) -> Arc<DatastoreGateway> {
        Arc::new(DatastoreGateway::new(Resolution::Configured(self.profile()), Self::settings()))
    }
}

/// Profile for a SQLite file that cannot be opened
pub fn unreachable_profile() -> ConnectionProfile {
    ConnectionProfile {
        server: "localhost".to_string(),
        database: "/nonexistent/dir/people.db".to_string(),
        username: "harness".to_string(),
        password: "unused".to_string(),
        port: None,
        driver: DriverKind::Sqlite,
    }
}
