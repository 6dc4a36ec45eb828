//! # Import Harness
//!
//! Environment-aware validation harness for the person import endpoint.
//! Tests exercise `POST /import` and, when a datastore is configured and
//! reachable, cross-check what was persisted.
//!
//! ## Architecture
//!
//! ```text
//! Configuration Resolver → Datastore Gateway → Cross-System Validator ← Import Client
//!                                   ↑
//!                      Execution Mode Selector (per test)
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use import_harness::{Harness, Result, TestDeclaration};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let harness = Harness::from_env()?;
//!     let client = harness.client();
//!     let declaration = TestDeclaration::real("import 111").requires_import_api();
//!     let outcome = harness
//!         .run(declaration, move |_mode| async move { client.import_person(111).await })
//!         .await;
//!     println!("{:?}", outcome.completed().map(|r| r.status()));
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod client;
pub mod config;
pub mod errors;
pub mod execution;
pub mod observability;
pub mod storage;
pub mod validation;

pub use client::{ImportClient, ImportRequest, ImportResponseDescriptor};
pub use config::{ConnectionProfile, HarnessConfig, Resolution};
pub use errors::{Error, HarnessError, Result};
pub use execution::{
    Decision, ExecutionMode, InfrastructureState, RunOutcome, RunState, TestDeclaration, TestRun,
};
pub use observability::init_logging;
pub use storage::{AvailabilityState, DatastoreGateway, QueryFailure};
pub use validation::{CrossSystemValidator, PersistedRecord, ValidationOutcome};

use std::future::Future;
use std::sync::Arc;

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

/// The harness object graph, built once and passed to every test
#[derive(Debug, Clone)]
pub struct Harness {
    config: HarnessConfig,
    gateway: Arc<DatastoreGateway>,
    validator: Arc<CrossSystemValidator>,
    client: ImportClient,
}

impl Harness {
    /// Build from the process environment
    pub fn from_env() -> Result<Self> {
        let config = HarnessConfig::from_env()?;
        Self::new(config, Resolution::from_env())
    }

    pub fn new(config: HarnessConfig, resolution: Resolution) -> Result<Self> {
        let gateway = Arc::new(DatastoreGateway::new(resolution, config.datastore.clone()));
        Self::with_gateway(config, gateway)
    }

    /// Build around an existing gateway
    pub fn with_gateway(config: HarnessConfig, gateway: Arc<DatastoreGateway>) -> Result<Self> {
        config.validate()?;

        let validator = Arc::new(CrossSystemValidator::new(
            gateway.clone(),
            config.datastore.person_table.clone(),
        )?);
        let client =
            ImportClient::new(config.import_api.clone())?.with_validator(validator.clone());

        tracing::debug!(
            import_url = %client.import_url(),
            datastore_configured = gateway.is_configured(),
            real_api_enabled = config.real_api_enabled,
            "Harness constructed"
        );

        Ok(Self { config, gateway, validator, client })
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Authenticated import client wired to the validator
    pub fn client(&self) -> &ImportClient {
        &self.client
    }

    pub fn gateway(&self) -> &Arc<DatastoreGateway> {
        &self.gateway
    }

    pub fn validator(&self) -> &Arc<CrossSystemValidator> {
        &self.validator
    }

    /// Observe infrastructure; probes the datastore at most once
    pub async fn infrastructure(&self) -> InfrastructureState {
        InfrastructureState {
            datastore: self.gateway.availability().await,
            real_api_enabled: self.config.real_api_enabled,
        }
    }

    /// Run one declared test through the execution mode selector
    pub async fn run<F, Fut, T>(&self, declaration: TestDeclaration, body: F) -> RunOutcome<T>
    where
        F: FnOnce(ExecutionMode) -> Fut,
        Fut: Future<Output = T>,
    {
        let infrastructure = self.infrastructure().await;
        TestRun::new(declaration).execute(&infrastructure, body).await
    }
}
