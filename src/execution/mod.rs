//! # Execution Mode Selector
//!
//! Decides, once and before any side effect, whether a test proceeds in
//! real or mocked mode, is skipped, or fails outright. Skips carry a
//! greppable reason of the form `SKIPPED[<tag>]: <hint>`.

use crate::storage::AvailabilityState;
use std::fmt;
use std::future::Future;
use tracing::{info, warn};

/// How a test body talks to its dependencies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionMode {
    /// Genuine network and database calls
    Real,
    /// Simulated dependencies only
    Mocked,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::Real => f.write_str("real"),
            ExecutionMode::Mocked => f.write_str("mocked"),
        }
    }
}

/// Real infrastructure a test needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Requirement {
    Datastore,
    ImportApi,
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Requirement::Datastore => f.write_str("datastore"),
            Requirement::ImportApi => f.write_str("import-api"),
        }
    }
}

/// What a test says about itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestDeclaration {
    name: String,
    mode: ExecutionMode,
    requirements: Vec<Requirement>,
}

impl TestDeclaration {
    pub fn real(name: impl Into<String>) -> Self {
        Self { name: name.into(), mode: ExecutionMode::Real, requirements: Vec::new() }
    }

    pub fn mocked(name: impl Into<String>) -> Self {
        Self { name: name.into(), mode: ExecutionMode::Mocked, requirements: Vec::new() }
    }

    pub fn requires_datastore(self) -> Self {
        self.requires(Requirement::Datastore)
    }

    pub fn requires_import_api(self) -> Self {
        self.requires(Requirement::ImportApi)
    }

    pub fn requires(mut self, requirement: Requirement) -> Self {
        if !self.requirements.contains(&requirement) {
            self.requirements.push(requirement);
            self.requirements.sort();
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }
}

/// Infrastructure as observed at decision time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InfrastructureState {
    pub datastore: AvailabilityState,
    pub real_api_enabled: bool,
}

impl InfrastructureState {
    pub fn satisfies(&self, requirement: Requirement) -> Result<(), SkipReason> {
        match requirement {
            Requirement::Datastore => match self.datastore {
                AvailabilityState::Available => Ok(()),
                AvailabilityState::Unconfigured => Err(SkipReason::DatastoreUnconfigured),
                AvailabilityState::ConfiguredUnreachable => Err(SkipReason::DatastoreUnreachable),
            },
            Requirement::ImportApi if self.real_api_enabled => Ok(()),
            Requirement::ImportApi => Err(SkipReason::RealApiDisabled),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    DatastoreUnconfigured,
    DatastoreUnreachable,
    RealApiDisabled,
}

impl SkipReason {
    pub fn tag(&self) -> &'static str {
        match self {
            SkipReason::DatastoreUnconfigured => "datastore-unconfigured",
            SkipReason::DatastoreUnreachable => "datastore-unreachable",
            SkipReason::RealApiDisabled => "real-api-disabled",
        }
    }

    pub fn hint(&self) -> &'static str {
        match self {
            SkipReason::DatastoreUnconfigured => {
                "set DB_SERVER, DB_NAME, DB_USER and DB_PASSWORD to run datastore tests"
            }
            SkipReason::DatastoreUnreachable => {
                "datastore is configured but did not answer the connectivity probe"
            }
            SkipReason::RealApiDisabled => {
                "set RUN_REAL_API=1 to run tests against the import service"
            }
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SKIPPED[{}]: {}", self.tag(), self.hint())
    }
}

/// Verdict for one test, computed before the body runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Proceed(ExecutionMode),
    Skip(SkipReason),
    Fail(String),
}

/// Decide how a declared test should run against `infrastructure`
pub fn decide(declaration: &TestDeclaration, infrastructure: &InfrastructureState) -> Decision {
    match declaration.mode() {
        ExecutionMode::Mocked => match declaration.requirements().first() {
            Some(requirement) => Decision::Fail(format!(
                "mocked test '{}' declares a real {} requirement",
                declaration.name(),
                requirement
            )),
            None => Decision::Proceed(ExecutionMode::Mocked),
        },
        ExecutionMode::Real => {
            for requirement in declaration.requirements() {
                if let Err(reason) = infrastructure.satisfies(*requirement) {
                    return Decision::Skip(reason);
                }
            }
            Decision::Proceed(ExecutionMode::Real)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    RunningReal,
    RunningMocked,
    Skipped,
    Completed,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Skipped | RunState::Completed)
    }
}

/// Final result of a [`TestRun`]
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome<T> {
    Skipped(SkipReason),
    Failed(String),
    Completed(T),
}

impl<T> RunOutcome<T> {
    pub fn is_skipped(&self) -> bool {
        matches!(self, RunOutcome::Skipped(_))
    }

    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            RunOutcome::Skipped(reason) => Some(*reason),
            _ => None,
        }
    }

    pub fn completed(self) -> Option<T> {
        match self {
            RunOutcome::Completed(value) => Some(value),
            _ => None,
        }
    }
}

/// One evaluation of one declared test
#[derive(Debug)]
pub struct TestRun {
    declaration: TestDeclaration,
    state: RunState,
}

impl TestRun {
    pub fn new(declaration: TestDeclaration) -> Self {
        Self { declaration, state: RunState::NotStarted }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn declaration(&self) -> &TestDeclaration {
        &self.declaration
    }

    /// Leave `NotStarted`. Later calls return the decision for the current
    /// state without re-evaluating infrastructure.
    pub fn begin(&mut self, infrastructure: &InfrastructureState) -> Decision {
        if self.state != RunState::NotStarted {
            return match self.state {
                RunState::RunningReal => Decision::Proceed(ExecutionMode::Real),
                RunState::RunningMocked => Decision::Proceed(ExecutionMode::Mocked),
                _ => Decision::Fail(format!("test '{}' was already run", self.declaration.name())),
            };
        }

        let decision = decide(&self.declaration, infrastructure);
        self.state = match &decision {
            Decision::Proceed(ExecutionMode::Real) => RunState::RunningReal,
            Decision::Proceed(ExecutionMode::Mocked) => RunState::RunningMocked,
            Decision::Skip(reason) => {
                warn!(test = %self.declaration.name(), "{}", reason);
                RunState::Skipped
            }
            Decision::Fail(reason) => {
                warn!(test = %self.declaration.name(), reason = %reason, "Test declaration rejected");
                RunState::Completed
            }
        };
        decision
    }

    /// Decide, run `body` in the selected mode, and finish. No retry.
    pub async fn execute<F, Fut, T>(
        mut self,
        infrastructure: &InfrastructureState,
        body: F,
    ) -> RunOutcome<T>
    where
        F: FnOnce(ExecutionMode) -> Fut,
        Fut: Future<Output = T>,
    {
        match self.begin(infrastructure) {
            Decision::Skip(reason) => RunOutcome::Skipped(reason),
            Decision::Fail(reason) => RunOutcome::Failed(reason),
            Decision::Proceed(mode) => {
                info!(test = %self.declaration.name(), mode = %mode, "Running test");
                let output = body(mode).await;
                self.state = RunState::Completed;
                RunOutcome::Completed(output)
            }
        }
    }
}
