//! Project fixtures
//!
//! A fixture describes a project for the simulated engine:
//!
//! ```yaml
//! name: checkout-service
//! goals:
//!   - id: G1
//!     description: "amount > 0"
//!   - id: G2
//!     description: "currency == EUR"
//!     kind: condition
//! executions:
//!   nightly: [G2]
//! step_delay_ms: 5
//! ```

use crate::error::{CliError, CliResult};
use goalgen::{CoverageGoal, GoalCatalog, GoalId, SimulatedEngine};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Project under test as seen by the simulated engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectFixture {
    /// Project name
    pub name: String,
    /// Coverage goals of the project
    pub goals: Vec<CoverageGoal>,
    /// Prior executions: source name to the goals it covered
    #[serde(default)]
    pub executions: BTreeMap<String, Vec<GoalId>>,
    /// Simulated latency of a generation step
    #[serde(default)]
    pub step_delay_ms: u64,
}

impl ProjectFixture {
    /// Parse and validate a fixture
    pub fn from_yaml_str(yaml: &str) -> CliResult<Self> {
        let fixture: Self = serde_yaml_ng::from_str(yaml)?;
        fixture.validate()?;
        Ok(fixture)
    }

    /// Load a fixture file
    pub fn load(path: &Path) -> CliResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            CliError::project(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&contents)
    }

    /// Check that the fixture is usable
    pub fn validate(&self) -> CliResult<()> {
        if self.name.trim().is_empty() {
            return Err(CliError::project("project name must not be empty"));
        }
        if self.goals.is_empty() {
            return Err(CliError::project(format!(
                "project '{}' declares no coverage goals",
                self.name
            )));
        }
        let catalog = GoalCatalog::new(self.goals.clone());
        if catalog.len() != self.goals.len() {
            return Err(CliError::project("goal ids must be unique"));
        }
        for (source, goals) in &self.executions {
            let unknown = catalog.unknown(goals);
            if !unknown.is_empty() {
                let ids: Vec<String> = unknown.iter().map(ToString::to_string).collect();
                return Err(CliError::project(format!(
                    "execution '{source}' covers unknown goals: {}",
                    ids.join(", ")
                )));
            }
        }
        Ok(())
    }

    /// Build the engine serving this project
    #[must_use]
    pub fn to_engine(&self) -> SimulatedEngine {
        let mut builder = SimulatedEngine::builder()
            .goals(self.goals.clone())
            .step_delay(Duration::from_millis(self.step_delay_ms));
        for (source, goals) in &self.executions {
            builder = builder.execution(source.clone(), goals.iter().cloned());
        }
        builder.build()
    }
}
