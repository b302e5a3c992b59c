//! goalgen: Coverage-Goal-Driven Test-Data Generation Controller
//!
//! Drives an external test-generation engine through a long-running,
//! pausable background run. The controller tracks which coverage goals are
//! targeted and which are achieved, credits previously measured coverage
//! before generating, and exports test cases and CSV reports once the run
//! halts.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    GOALGEN Architecture                          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Goal       │    │ Generation │    │ External   │            │
//! │   │ Selection  │───►│ Controller │───►│ Engine     │            │
//! │   │ + Imports  │    │ + Worker   │◄───│ (trait)    │            │
//! │   └────────────┘    └─────┬──────┘    └────────────┘            │
//! │                           ▼                                     │
//! │                    ┌────────────┐                               │
//! │                    │ Exporter   │  CSV reports, test cases      │
//! │                    └────────────┘                               │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Progress is observed by polling [`GenerationController::current_status`];
//! [`GenerationController::subscribe`] adds an optional change stream.

#![warn(missing_docs)]

mod artifact;
mod config;
mod controller;
/// Boundary with the external generation engine
pub mod engine;
mod export;
mod goal;
mod imported;
mod result;
mod selection;
mod state;
mod worker;

pub use artifact::{ArtifactSet, GeneratedTestCase, GenerationProgress, GoalStatus};
pub use config::{
    ControllerConfig, ControllerConfigBuilder, DEFAULT_HEARTBEAT_INTERVAL_MS,
    DEFAULT_REPORT_EXTENSION,
};
pub use controller::GenerationController;
pub use engine::{
    CoverageCredit, EngineError, EngineResult, GenerationEngine, SimulatedEngine,
    SimulatedEngineBuilder, StepOutcome, StepRequest, TestCaseDraft,
};
pub use export::{
    render_coverage_results, render_input_specification, resolve_report_path, write_report,
    DirectorySink, ReportKind, TestCaseSink,
};
pub use goal::{CoverageGoal, GoalCatalog, GoalId, GoalKind};
pub use imported::{ImportedCoverageRegistry, ImportedCoverageSource};
pub use result::{GenError, GenResult};
pub use selection::{
    parse_selection_file, read_selection_file, write_selection_file, GoalSelection,
    ImportSummary,
};
pub use state::{RunState, Transition};

/// Common imports for driving a session
pub mod prelude {
    pub use super::controller::GenerationController;
    pub use super::engine::{GenerationEngine, SimulatedEngine};
    pub use super::export::{DirectorySink, ReportKind, TestCaseSink};
    pub use super::goal::{CoverageGoal, GoalId};
    pub use super::imported::ImportedCoverageSource;
    pub use super::result::{GenError, GenResult};
    pub use super::state::RunState;
    pub use super::ControllerConfig;
}
