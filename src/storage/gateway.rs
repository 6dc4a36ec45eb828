//! # Datastore Gateway
//!
//! Owns the resolved connection profile, the lazily-built backend and the
//! memoized [`AvailabilityState`]. Nothing here raises for network or
//! credential problems: availability degrades to `false` and queries degrade
//! to a typed [`QueryFailure`].

use crate::config::{ConnectionProfile, DatastoreSettings, Resolution, UnconfiguredReason};
use crate::db_span;
use crate::storage::backend::{self, BackendError, DatastoreBackend};
use crate::storage::rows::{DbRow, QueryParam};
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn, Instrument};

/// Tri-state datastore availability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AvailabilityState {
    /// Mandatory connection parameters are missing
    Unconfigured,
    /// Configured, but the last probe or query could not reach it
    ConfiguredUnreachable,
    /// Configured and the last probe succeeded
    Available,
}

impl AvailabilityState {
    pub fn is_available(&self) -> bool {
        matches!(self, AvailabilityState::Available)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AvailabilityState::Unconfigured => "unconfigured",
            AvailabilityState::ConfiguredUnreachable => "configured-unreachable",
            AvailabilityState::Available => "available",
        }
    }
}

impl fmt::Display for AvailabilityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why `execute_query` produced no rows
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QueryFailure {
    /// The datastore was not available when the query was requested
    #[error("datastore {0}")]
    Unavailable(AvailabilityState),

    /// The datastore dropped out while the query ran
    #[error("datastore connectivity lost: {0}")]
    Connectivity(String),

    /// The datastore answered with an error for this query
    #[error("query rejected: {0}")]
    Query(String),

    /// The session was acquired but the query did not finish in time
    #[error("{0}")]
    Timeout(String),
}

impl QueryFailure {
    /// True when the query itself was at fault, not reachability
    pub fn is_query_error(&self) -> bool {
        matches!(self, QueryFailure::Query(_))
    }
}

/// Gateway to the optional relational datastore
pub struct DatastoreGateway {
    resolution: Resolution,
    settings: DatastoreSettings,
    backend: OnceCell<Arc<dyn DatastoreBackend>>,
    availability: Mutex<Option<AvailabilityState>>,
}

impl fmt::Debug for DatastoreGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatastoreGateway")
            .field("resolution", &self.resolution)
            .field("settings", &self.settings)
            .field("backend_initialized", &self.backend.get().is_some())
            .finish()
    }
}

impl DatastoreGateway {
    /// Create a gateway; no connection is opened until first use
    pub fn new(resolution: Resolution, settings: DatastoreSettings) -> Self {
        if let Resolution::Unconfigured(reason) = &resolution {
            info!(reason = %reason, "Datastore not configured; database checks will be skipped");
        }

        Self {
            resolution,
            settings,
            backend: OnceCell::new(),
            availability: Mutex::new(None),
        }
    }

    /// Create a gateway around an already-built backend (used for stubs)
    pub fn with_backend(
        profile: ConnectionProfile,
        backend: Arc<dyn DatastoreBackend>,
        settings: DatastoreSettings,
    ) -> Self {
        let backend_cell = OnceCell::new();
        let _ = backend_cell.set(backend);
        Self {
            resolution: Resolution::Configured(profile),
            settings,
            backend: backend_cell,
            availability: Mutex::new(None),
        }
    }

    /// Gateway that is permanently unconfigured
    pub fn unconfigured() -> Self {
        Self::new(
            Resolution::Unconfigured(UnconfiguredReason::MissingVariables(Vec::new())),
            DatastoreSettings::default(),
        )
    }

    pub fn resolution(&self) -> &Resolution {
        &self.resolution
    }

    pub fn settings(&self) -> &DatastoreSettings {
        &self.settings
    }

    /// True iff the profile resolved. No I/O.
    pub fn is_configured(&self) -> bool {
        self.resolution.is_configured()
    }

    /// Memoized availability; probes on first call
    pub async fn availability(&self) -> AvailabilityState {
        let mut memo = self.availability.lock().await;
        if let Some(state) = *memo {
            return state;
        }
        let state = self.probe().await;
        *memo = Some(state);
        state
    }

    /// Re-probe regardless of the memoized state
    pub async fn refresh_availability(&self) -> AvailabilityState {
        let mut memo = self.availability.lock().await;
        let state = self.probe().await;
        *memo = Some(state);
        state
    }

    /// Configured and reachable
    pub async fn is_available(&self) -> bool {
        self.availability().await.is_available()
    }

    /// Placeholder for the 1-based parameter `position`, if configured
    pub fn placeholder(&self, position: usize) -> Option<String> {
        self.resolution.profile().map(|profile| backend::placeholder_for(profile.driver, position))
    }

    /// Run a parameterized query.
    ///
    /// Fails with [`QueryFailure::Unavailable`] without touching the network
    /// when the datastore is not available.
    pub async fn execute_query(
        &self,
        query: &str,
        params: &[QueryParam],
    ) -> Result<Vec<DbRow>, QueryFailure> {
        let state = self.availability().await;
        if !state.is_available() {
            return Err(QueryFailure::Unavailable(state));
        }

        let Some(backend) = self.backend() else {
            return Err(QueryFailure::Unavailable(AvailabilityState::Unconfigured));
        };

        let span = db_span!("execute", driver = %backend.driver(), params = params.len());
        match backend.execute(query, params).instrument(span).await {
            Ok(rows) => Ok(rows),
            Err(BackendError::Query(message)) => {
                error!(
                    error_class = "query",
                    error = %message,
                    query = %query,
                    "Query rejected by datastore"
                );
                Err(QueryFailure::Query(message))
            }
            Err(timeout @ BackendError::Timeout { .. }) => {
                // Acquire failures surface as Connectivity first, so the
                // datastore stays available.
                warn!(
                    error_class = "timeout",
                    error = %timeout,
                    query = %query,
                    "Query exceeded its time bound"
                );
                Err(QueryFailure::Timeout(timeout.to_string()))
            }
            Err(other) => {
                warn!(
                    error_class = "connectivity",
                    error = %other,
                    "Datastore connectivity lost during query"
                );
                *self.availability.lock().await = Some(AvailabilityState::ConfiguredUnreachable);
                Err(QueryFailure::Connectivity(other.to_string()))
            }
        }
    }

    fn backend(&self) -> Option<&Arc<dyn DatastoreBackend>> {
        let profile = self.resolution.profile()?;
        Some(self.backend.get_or_init(|| backend::connect_lazy(profile, &self.settings)))
    }

    async fn probe(&self) -> AvailabilityState {
        let Some(backend) = self.backend() else {
            return AvailabilityState::Unconfigured;
        };

        let span = db_span!("probe", driver = %backend.driver());
        match backend.probe().instrument(span).await {
            Ok(()) => {
                info!(driver = %backend.driver(), "Datastore reachable");
                AvailabilityState::Available
            }
            Err(e) => {
                warn!(
                    driver = %backend.driver(),
                    error = %e,
                    "Datastore probe failed; treating as unreachable"
                );
                AvailabilityState::ConfiguredUnreachable
            }
        }
    }
}
