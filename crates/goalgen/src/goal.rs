//! Coverage Goals and the Goal Catalog
//!
//! The catalog is a read-only snapshot of every coverage goal the engine
//! knows for the project. The controller only references goals, it never
//! produces or mutates them.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Stable identifier of a coverage goal
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GoalId(String);

impl GoalId {
    /// Create a goal identifier
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GoalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GoalId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for GoalId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Kind of coverage obligation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalKind {
    /// A decision outcome (branch)
    #[default]
    Decision,
    /// A condition combination inside a decision
    Condition,
    /// A definition/use pair
    DataFlow,
    /// Anything else the engine reports
    Other,
}

impl GoalKind {
    /// Short label used in reports
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Decision => "decision",
            Self::Condition => "condition",
            Self::DataFlow => "data-flow",
            Self::Other => "other",
        }
    }
}

/// One coverage obligation within the project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageGoal {
    /// Stable identifier
    pub id: GoalId,
    /// Human-readable description
    pub description: String,
    /// Kind of obligation
    #[serde(default)]
    pub kind: GoalKind,
}

impl CoverageGoal {
    /// Create a decision goal
    #[must_use]
    pub fn new(id: impl Into<GoalId>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            kind: GoalKind::Decision,
        }
    }

    /// Set the goal kind
    #[must_use]
    pub fn with_kind(mut self, kind: GoalKind) -> Self {
        self.kind = kind;
        self
    }
}

/// Snapshot of all coverage goals known for the project
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoalCatalog {
    goals: Vec<CoverageGoal>,
    index: HashMap<GoalId, usize>,
}

impl GoalCatalog {
    /// Build a snapshot; later duplicates of an id are dropped
    #[must_use]
    pub fn new(goals: Vec<CoverageGoal>) -> Self {
        let mut catalog = Self::default();
        for goal in goals {
            if catalog.index.contains_key(&goal.id) {
                continue;
            }
            let _ = catalog.index.insert(goal.id.clone(), catalog.goals.len());
            catalog.goals.push(goal);
        }
        catalog
    }

    /// Check whether the catalog knows `id`
    #[must_use]
    pub fn contains(&self, id: &GoalId) -> bool {
        self.index.contains_key(id)
    }

    /// Look up a goal
    #[must_use]
    pub fn get(&self, id: &GoalId) -> Option<&CoverageGoal> {
        self.index.get(id).map(|&i| &self.goals[i])
    }

    /// Goals in engine order
    #[must_use]
    pub fn goals(&self) -> &[CoverageGoal] {
        &self.goals
    }

    /// Iterate goals in engine order
    pub fn iter(&self) -> impl Iterator<Item = &CoverageGoal> {
        self.goals.iter()
    }

    /// Number of goals
    #[must_use]
    pub fn len(&self) -> usize {
        self.goals.len()
    }

    /// True when the project has no goals
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.goals.is_empty()
    }

    /// Identifiers from `ids` that the catalog does not know, in input order
    #[must_use]
    pub fn unknown<'a>(&self, ids: impl IntoIterator<Item = &'a GoalId>) -> Vec<GoalId> {
        ids.into_iter()
            .filter(|id| !self.contains(id))
            .cloned()
            .collect()
    }
}
