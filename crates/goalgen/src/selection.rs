//! Goal Selection Store
//!
//! Two loading policies coexist:
//!
//! - an explicit list is strict: any unknown goal rejects the whole list
//! - a selection file is lenient: unknown goals are skipped and reported
//!
//! Selection files hold one goal identifier per line. Blank lines and lines
//! starting with `#` are ignored.

use crate::goal::{GoalCatalog, GoalId};
use crate::result::{GenError, GenResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// Outcome of a lenient selection import
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    /// Number of goals in the new selection
    pub selected: usize,
    /// Identifiers skipped because the catalog does not know them
    pub ignored: Vec<GoalId>,
}

/// Goals targeted by generation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoalSelection {
    goals: BTreeSet<GoalId>,
}

impl GoalSelection {
    /// Empty selection
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a selection where every goal must be in `catalog`
    pub fn strict(
        catalog: &GoalCatalog,
        goals: impl IntoIterator<Item = GoalId>,
    ) -> GenResult<Self> {
        let goals: BTreeSet<GoalId> = goals.into_iter().collect();
        let unknown = catalog.unknown(&goals);
        if !unknown.is_empty() {
            return Err(GenError::UnknownGoals {
                goals: unknown.into_iter().map(|g| g.to_string()).collect(),
            });
        }
        Ok(Self { goals })
    }

    /// Build a selection keeping only goals known to `catalog`
    #[must_use]
    pub fn lenient(
        catalog: &GoalCatalog,
        goals: impl IntoIterator<Item = GoalId>,
    ) -> (Self, ImportSummary) {
        let mut selected = BTreeSet::new();
        let mut ignored = Vec::new();
        for goal in goals {
            if catalog.contains(&goal) {
                let _ = selected.insert(goal);
            } else if !ignored.contains(&goal) {
                ignored.push(goal);
            }
        }
        let summary = ImportSummary {
            selected: selected.len(),
            ignored,
        };
        (Self { goals: selected }, summary)
    }

    /// Selected goals in identifier order
    #[must_use]
    pub fn goals(&self) -> &BTreeSet<GoalId> {
        &self.goals
    }

    /// Check whether `goal` is selected
    #[must_use]
    pub fn contains(&self, goal: &GoalId) -> bool {
        self.goals.contains(goal)
    }

    /// Number of selected goals
    #[must_use]
    pub fn len(&self) -> usize {
        self.goals.len()
    }

    /// True when nothing is selected
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.goals.is_empty()
    }

    /// Render in selection-file format
    #[must_use]
    pub fn to_file_contents(&self) -> String {
        let mut out = String::new();
        for goal in &self.goals {
            out.push_str(goal.as_str());
            out.push('\n');
        }
        out
    }
}

/// Parse selection-file contents into goal identifiers, in file order
#[must_use]
pub fn parse_selection_file(contents: &str) -> Vec<GoalId> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(GoalId::new)
        .collect()
}

/// Read a selection file from disk
pub fn read_selection_file(path: &Path) -> GenResult<Vec<GoalId>> {
    require_path(path)?;
    let contents = fs::read_to_string(path)?;
    Ok(parse_selection_file(&contents))
}

/// Write a selection file to disk, creating parent directories
pub fn write_selection_file(path: &Path, selection: &GoalSelection) -> GenResult<()> {
    require_path(path)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, selection.to_file_contents())?;
    Ok(())
}

pub(crate) fn require_path(path: &Path) -> GenResult<()> {
    if path.as_os_str().is_empty() {
        return Err(GenError::validation("path must not be empty"));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::goal::CoverageGoal;
    use tempfile::TempDir;

    fn catalog() -> GoalCatalog {
        GoalCatalog::new(vec![
            CoverageGoal::new("G1", "a"),
            CoverageGoal::new("G2", "b"),
            CoverageGoal::new("G3", "c"),
        ])
    }

    fn ids(raw: &[&str]) -> Vec<GoalId> {
        raw.iter().map(|s| GoalId::new(*s)).collect()
    }

    // =========================================================================
    // Strict vs lenient policies
    // =========================================================================

    #[test]
    fn test_strict_accepts_known_goals() {
        let selection = GoalSelection::strict(&catalog(), ids(&["G2", "G1", "G2"])).unwrap();
        assert_eq!(selection.len(), 2);
        assert!(selection.contains(&"G1".into()));
    }

    #[test]
    fn test_strict_rejects_unknown_goals() {
        let err = GoalSelection::strict(&catalog(), ids(&["G1", "G7"])).unwrap_err();
        assert!(matches!(err, GenError::UnknownGoals { ref goals } if goals == &["G7"]));
    }

    #[test]
    fn test_lenient_skips_unknown_goals() {
        let (selection, summary) =
            GoalSelection::lenient(&catalog(), ids(&["G1", "G7", "G3", "G7"]));
        assert_eq!(selection.len(), 2);
        assert_eq!(summary.selected, 2);
        assert_eq!(summary.ignored, ids(&["G7"]));
    }

    #[test]
    fn test_same_input_diverges_between_policies() {
        let input = ids(&["G1", "legacy-goal"]);
        assert!(GoalSelection::strict(&catalog(), input.clone()).is_err());
        let (selection, _) = GoalSelection::lenient(&catalog(), input);
        assert_eq!(selection.goals().iter().collect::<Vec<_>>(), [&GoalId::new("G1")]);
    }

    // =========================================================================
    // Selection files
    // =========================================================================

    #[test]
    fn test_parse_skips_blanks_and_comments() {
        let parsed = parse_selection_file("# exported\nG1\n\n  G3  \n#G2\n");
        assert_eq!(parsed, ids(&["G1", "G3"]));
    }

    #[test]
    fn test_file_contents_one_id_per_line() {
        let selection = GoalSelection::strict(&catalog(), ids(&["G3", "G1"])).unwrap();
        assert_eq!(selection.to_file_contents(), "G1\nG3\n");
    }

    #[test]
    fn test_write_then_read_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("selection.txt");
        let selection = GoalSelection::strict(&catalog(), ids(&["G2"])).unwrap();

        write_selection_file(&path, &selection).unwrap();

        assert_eq!(read_selection_file(&path).unwrap(), ids(&["G2"]));
    }

    #[test]
    fn test_empty_path_is_validation_error() {
        let err = read_selection_file(Path::new("")).unwrap_err();
        assert!(err.is_validation());
    }
}
