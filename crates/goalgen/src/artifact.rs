//! Generated Artifact Set
//!
//! Test cases and per-goal coverage produced by a session. Exports read a
//! copy; nothing here is consumed by exporting.

use crate::engine::{CoverageCredit, TestCaseDraft};
use crate::goal::GoalId;
use crate::imported::ImportedCoverageSource;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Test case produced by generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedTestCase {
    /// Sequential identifier within the session (`TC-0001`)
    pub id: String,
    /// Goals exercised by this test case
    pub covers: Vec<GoalId>,
    /// Input values by name
    pub inputs: BTreeMap<String, String>,
    /// When the controller received it
    pub generated_at: DateTime<Utc>,
}

/// Coverage status of a single goal
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GoalStatus {
    /// Not covered yet
    #[default]
    Uncovered,
    /// Credited from a previously executed source
    Imported {
        /// Source that covered the goal
        source: String,
    },
    /// Covered by generated test cases
    Covered {
        /// Ids of covering test cases
        test_cases: Vec<String>,
    },
}

impl GoalStatus {
    /// True for imported and generated coverage
    #[must_use]
    pub const fn is_achieved(&self) -> bool {
        !matches!(self, Self::Uncovered)
    }

    /// Label used in reports
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Uncovered => "uncovered",
            Self::Imported { .. } => "imported",
            Self::Covered { .. } => "covered",
        }
    }
}

impl fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Targeted vs achieved counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationProgress {
    /// Goals targeted by the run so far
    pub targeted: usize,
    /// Targeted goals that are covered or imported
    pub achieved: usize,
    /// Targeted goals credited from imported coverage
    pub imported: usize,
    /// Test cases generated
    pub test_cases: usize,
    /// Generation steps completed
    pub steps: u64,
}

impl GenerationProgress {
    /// Achieved share of targeted goals in percent
    #[must_use]
    pub fn percent(&self) -> f64 {
        if self.targeted == 0 {
            return 100.0;
        }
        (self.achieved as f64 / self.targeted as f64) * 100.0
    }
}

/// Everything a session has produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactSet {
    test_cases: Vec<GeneratedTestCase>,
    status: BTreeMap<GoalId, GoalStatus>,
    targeted: BTreeSet<GoalId>,
    steps: u64,
}

impl ArtifactSet {
    /// Empty artifact set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add goals to the targeted set of the run
    pub fn target<'a>(&mut self, goals: impl IntoIterator<Item = &'a GoalId>) {
        for goal in goals {
            let _ = self.targeted.insert(goal.clone());
        }
    }

    /// Credit imported coverage; goals already achieved keep their status
    pub fn credit(&mut self, credits: &[CoverageCredit]) {
        for credit in credits {
            let status = self.status.entry(credit.goal.clone()).or_default();
            if !status.is_achieved() {
                *status = GoalStatus::Imported {
                    source: credit.source.clone(),
                };
            }
        }
    }

    /// Drop imported credit whose source is not in `sources`.
    ///
    /// Generated coverage is kept. Returns the number of goals reset.
    pub fn withdraw_credits(&mut self, sources: &[ImportedCoverageSource]) -> usize {
        let before = self.status.len();
        self.status.retain(|_, status| match status {
            GoalStatus::Imported { source } => {
                sources.iter().any(|kept| kept.name() == source.as_str())
            }
            _ => true,
        });
        before - self.status.len()
    }

    /// Number a batch of engine drafts and record what they cover
    pub fn absorb(&mut self, drafts: Vec<TestCaseDraft>, at: DateTime<Utc>) {
        for draft in drafts {
            let id = format!("TC-{:04}", self.test_cases.len() + 1);
            for goal in &draft.covers {
                let status = self.status.entry(goal.clone()).or_default();
                match status {
                    GoalStatus::Covered { test_cases } => test_cases.push(id.clone()),
                    // Generated coverage supersedes imported credit
                    _ => {
                        *status = GoalStatus::Covered {
                            test_cases: vec![id.clone()],
                        };
                    }
                }
            }
            self.test_cases.push(GeneratedTestCase {
                id,
                covers: draft.covers,
                inputs: draft.inputs,
                generated_at: at,
            });
        }
    }

    /// Count a completed step
    pub fn record_step(&mut self) {
        self.steps += 1;
    }

    /// Steps completed so far
    #[must_use]
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Targeted goals that are neither covered nor imported, in id order
    #[must_use]
    pub fn remaining<'a>(&self, selection: impl IntoIterator<Item = &'a GoalId>) -> Vec<GoalId> {
        selection
            .into_iter()
            .filter(|goal| !self.status_of(goal).is_achieved())
            .cloned()
            .collect()
    }

    /// Coverage status of `goal`
    #[must_use]
    pub fn status_of(&self, goal: &GoalId) -> GoalStatus {
        self.status.get(goal).cloned().unwrap_or_default()
    }

    /// Generated test cases in generation order
    #[must_use]
    pub fn test_cases(&self) -> &[GeneratedTestCase] {
        &self.test_cases
    }

    /// Goals targeted by the run
    #[must_use]
    pub fn targeted(&self) -> &BTreeSet<GoalId> {
        &self.targeted
    }

    /// Snapshot of the counters
    #[must_use]
    pub fn progress(&self) -> GenerationProgress {
        let mut progress = GenerationProgress {
            targeted: self.targeted.len(),
            test_cases: self.test_cases.len(),
            steps: self.steps,
            ..GenerationProgress::default()
        };
        for goal in &self.targeted {
            match self.status_of(goal) {
                GoalStatus::Uncovered => {}
                GoalStatus::Imported { .. } => {
                    progress.achieved += 1;
                    progress.imported += 1;
                }
                GoalStatus::Covered { .. } => progress.achieved += 1,
            }
        }
        progress
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn draft(goals: &[&str]) -> TestCaseDraft {
        TestCaseDraft {
            covers: goals.iter().map(|g| GoalId::new(*g)).collect(),
            inputs: BTreeMap::from([("x".to_string(), "1".to_string())]),
        }
    }

    fn credit(goal: &str, source: &str) -> CoverageCredit {
        CoverageCredit {
            goal: goal.into(),
            source: source.into(),
        }
    }

    #[test]
    fn test_absorb_numbers_test_cases_sequentially() {
        let mut set = ArtifactSet::new();
        set.absorb(vec![draft(&["G1"]), draft(&["G2"])], Utc::now());
        set.absorb(vec![draft(&["G1"])], Utc::now());

        let ids: Vec<&str> = set.test_cases().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["TC-0001", "TC-0002", "TC-0003"]);
        assert_eq!(
            set.status_of(&"G1".into()),
            GoalStatus::Covered {
                test_cases: vec!["TC-0001".into(), "TC-0003".into()]
            }
        );
    }

    #[test]
    fn test_credit_does_not_downgrade_generated_coverage() {
        let mut set = ArtifactSet::new();
        set.absorb(vec![draft(&["G1"])], Utc::now());
        set.credit(&[credit("G1", "nightly"), credit("G2", "nightly")]);

        assert_eq!(set.status_of(&"G1".into()).label(), "covered");
        assert_eq!(
            set.status_of(&"G2".into()),
            GoalStatus::Imported {
                source: "nightly".into()
            }
        );
    }

    #[test]
    fn test_withdraw_credits_of_removed_sources() {
        let mut set = ArtifactSet::new();
        set.absorb(vec![draft(&["G1"])], Utc::now());
        set.credit(&[
            credit("G1", "nightly"),
            credit("G2", "nightly"),
            credit("G3", "smoke"),
        ]);

        let withdrawn = set.withdraw_credits(&[ImportedCoverageSource::new("smoke")]);

        assert_eq!(withdrawn, 1);
        assert_eq!(set.status_of(&"G1".into()).label(), "covered");
        assert_eq!(set.status_of(&"G2".into()), GoalStatus::Uncovered);
        assert_eq!(set.status_of(&"G3".into()).label(), "imported");
        assert_eq!(set.withdraw_credits(&[]), 1);
        assert_eq!(set.status_of(&"G1".into()).label(), "covered");
    }

    #[test]
    fn test_remaining_excludes_achieved_goals() {
        let mut set = ArtifactSet::new();
        let selection: Vec<GoalId> = ["G1", "G2", "G3"].iter().map(|g| GoalId::new(*g)).collect();
        set.credit(&[credit("G2", "smoke")]);
        set.absorb(vec![draft(&["G3"])], Utc::now());

        assert_eq!(set.remaining(&selection), vec![GoalId::new("G1")]);
    }

    #[test]
    fn test_progress_counts_only_targeted_goals() {
        let mut set = ArtifactSet::new();
        let targets = [GoalId::new("G1"), GoalId::new("G2")];
        set.target(&targets);
        set.credit(&[credit("G1", "smoke"), credit("G9", "smoke")]);
        set.absorb(vec![draft(&["G2", "G5"])], Utc::now());
        set.record_step();

        let progress = set.progress();
        assert_eq!(progress.targeted, 2);
        assert_eq!(progress.achieved, 2);
        assert_eq!(progress.imported, 1);
        assert_eq!(progress.test_cases, 1);
        assert_eq!(progress.steps, 1);
        assert!((progress.percent() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_progress_of_empty_set_is_vacuously_complete() {
        assert!((GenerationProgress::default().percent() - 100.0).abs() < f64::EPSILON);
    }
}
