//! In-process engine stand-in.
//!
//! Covers the first requested target on every step and produces one test
//! case for it. Supports per-step latency, scripted failures and severing
//! the channel at runtime.

use super::{
    CoverageCredit, EngineError, EngineResult, GenerationEngine, StepOutcome, StepRequest,
    TestCaseDraft,
};
use crate::goal::{CoverageGoal, GoalId};
use crate::imported::ImportedCoverageSource;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Deterministic engine used by tests and the CLI
#[derive(Debug)]
pub struct SimulatedEngine {
    goals: Vec<CoverageGoal>,
    executions: HashMap<String, Vec<GoalId>>,
    step_delay: Duration,
    fail_at_step: Option<(u64, String)>,
    severed: Mutex<Option<String>>,
    steps_served: AtomicU64,
}

impl SimulatedEngine {
    /// Engine over the given goals with no prior executions
    #[must_use]
    pub fn new(goals: Vec<CoverageGoal>) -> Self {
        Self::builder().goals(goals).build()
    }

    /// Create a builder
    #[must_use]
    pub fn builder() -> SimulatedEngineBuilder {
        SimulatedEngineBuilder::default()
    }

    /// Drop the channel; every later call fails with a communication error
    pub fn sever(&self, message: impl Into<String>) {
        let mut severed = self.severed.lock().unwrap_or_else(PoisonError::into_inner);
        *severed = Some(message.into());
    }

    /// Re-establish a severed channel
    pub fn reconnect(&self) {
        let mut severed = self.severed.lock().unwrap_or_else(PoisonError::into_inner);
        *severed = None;
    }

    /// Number of `generate_step` calls answered so far
    #[must_use]
    pub fn steps_served(&self) -> u64 {
        self.steps_served.load(Ordering::SeqCst)
    }

    fn check_channel(&self) -> EngineResult<()> {
        let severed = self.severed.lock().unwrap_or_else(PoisonError::into_inner);
        match severed.as_ref() {
            Some(message) => Err(EngineError::communication(message.clone())),
            None => Ok(()),
        }
    }

    fn draft_for(step: u64, goal: &GoalId) -> TestCaseDraft {
        let mut inputs = BTreeMap::new();
        let _ = inputs.insert("target".to_string(), goal.to_string());
        let _ = inputs.insert("x".to_string(), ((step * 37) % 101).to_string());
        let _ = inputs.insert("y".to_string(), ((step * 11) % 7).to_string());
        TestCaseDraft {
            covers: vec![goal.clone()],
            inputs,
        }
    }
}

impl GenerationEngine for SimulatedEngine {
    fn list_goals(&self) -> EngineResult<Vec<CoverageGoal>> {
        self.check_channel()?;
        Ok(self.goals.clone())
    }

    fn import_coverage(
        &self,
        sources: &[ImportedCoverageSource],
    ) -> EngineResult<Vec<CoverageCredit>> {
        self.check_channel()?;
        let mut credits = Vec::new();
        for source in sources {
            let Some(goals) = self.executions.get(source.name()) else {
                return Err(EngineError::engine(format!(
                    "no execution results for '{}'",
                    source.name()
                )));
            };
            credits.extend(goals.iter().map(|goal| CoverageCredit {
                goal: goal.clone(),
                source: source.name().to_string(),
            }));
        }
        Ok(credits)
    }

    fn generate_step(&self, request: &StepRequest) -> EngineResult<StepOutcome> {
        self.check_channel()?;
        if !self.step_delay.is_zero() {
            std::thread::sleep(self.step_delay);
        }
        let _ = self.steps_served.fetch_add(1, Ordering::SeqCst);
        // The channel may have been severed while the step was in flight
        self.check_channel()?;

        if let Some((step, message)) = &self.fail_at_step {
            if *step == request.step {
                return Err(EngineError::communication(message.clone()));
            }
        }

        let Some(target) = request
            .targets
            .iter()
            .find(|t| self.goals.iter().any(|g| &g.id == *t))
        else {
            return Ok(StepOutcome {
                test_cases: Vec::new(),
                exhausted: true,
            });
        };

        Ok(StepOutcome {
            test_cases: vec![Self::draft_for(request.step, target)],
            exhausted: false,
        })
    }

    fn ping(&self) -> EngineResult<()> {
        self.check_channel()
    }
}

/// Builder for [`SimulatedEngine`]
#[derive(Debug, Default)]
pub struct SimulatedEngineBuilder {
    goals: Vec<CoverageGoal>,
    executions: HashMap<String, Vec<GoalId>>,
    step_delay: Duration,
    fail_at_step: Option<(u64, String)>,
}

impl SimulatedEngineBuilder {
    /// Set the project goals
    #[must_use]
    pub fn goals(mut self, goals: Vec<CoverageGoal>) -> Self {
        self.goals = goals;
        self
    }

    /// Register a prior execution that covered `goals`
    #[must_use]
    pub fn execution<I, G>(mut self, source: impl Into<String>, goals: I) -> Self
    where
        I: IntoIterator<Item = G>,
        G: Into<GoalId>,
    {
        let _ = self
            .executions
            .insert(source.into(), goals.into_iter().map(Into::into).collect());
        self
    }

    /// Sleep this long inside every step
    #[must_use]
    pub fn step_delay(mut self, delay: Duration) -> Self {
        self.step_delay = delay;
        self
    }

    /// Fail step number `step` with a communication error
    #[must_use]
    pub fn fail_at_step(mut self, step: u64, message: impl Into<String>) -> Self {
        self.fail_at_step = Some((step, message.into()));
        self
    }

    /// Build the engine
    #[must_use]
    pub fn build(self) -> SimulatedEngine {
        SimulatedEngine {
            goals: self.goals,
            executions: self.executions,
            step_delay: self.step_delay,
            fail_at_step: self.fail_at_step,
            severed: Mutex::new(None),
            steps_served: AtomicU64::new(0),
        }
    }
}
