//! Boundary with the External Generation Engine
//!
//! The controller orchestrates an engine it does not implement. Every call
//! is a blocking request/response exchange that may fail at any time with a
//! communication error.
//!
//! ```text
//! ┌────────────────────┐  list_goals / import_coverage  ┌──────────────┐
//! │ GenerationController│ ─────────────────────────────► │ Generation   │
//! │   + worker thread   │ ◄───────────────────────────── │ Engine       │
//! └────────────────────┘        generate_step           └──────────────┘
//! ```

mod simulated;

pub use simulated::{SimulatedEngine, SimulatedEngineBuilder};

use crate::goal::{CoverageGoal, GoalId};
use crate::imported::ImportedCoverageSource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Result type for engine calls
pub type EngineResult<T> = Result<T, EngineError>;

/// Failure reported by the engine boundary
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The request/response channel failed
    #[error("communication with engine lost: {message}")]
    Communication {
        /// Error message
        message: String,
    },

    /// The engine reported an unrecoverable condition
    #[error("engine failure: {message}")]
    Engine {
        /// Error message
        message: String,
    },
}

impl EngineError {
    /// Create a communication error
    #[must_use]
    pub fn communication(message: impl Into<String>) -> Self {
        Self::Communication {
            message: message.into(),
        }
    }

    /// Create an engine failure
    #[must_use]
    pub fn engine(message: impl Into<String>) -> Self {
        Self::Engine {
            message: message.into(),
        }
    }
}

/// Goal credited as covered by a previously executed source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageCredit {
    /// Goal already satisfied
    pub goal: GoalId,
    /// Source whose execution covered it
    pub source: String,
}

/// One unit of work requested from the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRequest {
    /// Step counter across the session, starting at 1
    pub step: u64,
    /// Targeted goals that are still uncovered
    pub targets: Vec<GoalId>,
}

/// Test case as produced by the engine, before the controller numbers it
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TestCaseDraft {
    /// Goals exercised by the test case
    pub covers: Vec<GoalId>,
    /// Input values by name
    pub inputs: BTreeMap<String, String>,
}

/// What a step produced
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StepOutcome {
    /// New test cases
    pub test_cases: Vec<TestCaseDraft>,
    /// The engine cannot make further progress on the requested targets
    pub exhausted: bool,
}

/// Remote generation and coverage engine
///
/// Implementations must be shareable between the caller thread and the
/// background worker.
pub trait GenerationEngine: Send + Sync {
    /// Fetch the current goal catalog of the project
    fn list_goals(&self) -> EngineResult<Vec<CoverageGoal>>;

    /// Report which goals the given sources already cover
    fn import_coverage(&self, sources: &[ImportedCoverageSource])
        -> EngineResult<Vec<CoverageCredit>>;

    /// Run one generation step towards `request.targets`
    fn generate_step(&self, request: &StepRequest) -> EngineResult<StepOutcome>;

    /// Liveness probe used while a run is paused
    fn ping(&self) -> EngineResult<()> {
        Ok(())
    }
}
