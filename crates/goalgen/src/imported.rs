//! Imported-Coverage Registry
//!
//! Sources of previously measured coverage. Whatever they cover is credited
//! before the first generation step, so no test case is generated for it.

use crate::result::{GenError, GenResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference to prior execution results (e.g. an execution configuration)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImportedCoverageSource(String);

impl ImportedCoverageSource {
    /// Reference a source by name
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Source name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImportedCoverageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Set of sources credited at the start of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportedCoverageRegistry {
    sources: Vec<ImportedCoverageSource>,
}

impl ImportedCoverageRegistry {
    /// Empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a replacement set without applying it.
    ///
    /// Duplicates collapse, first occurrence wins; blank names are rejected.
    pub fn prepare(
        sources: impl IntoIterator<Item = ImportedCoverageSource>,
    ) -> GenResult<Vec<ImportedCoverageSource>> {
        let mut prepared: Vec<ImportedCoverageSource> = Vec::new();
        for source in sources {
            if source.name().trim().is_empty() {
                return Err(GenError::validation(
                    "imported coverage source name must not be empty",
                ));
            }
            if !prepared.contains(&source) {
                prepared.push(source);
            }
        }
        Ok(prepared)
    }

    /// Replace the whole set with an already prepared one
    pub fn replace(&mut self, sources: Vec<ImportedCoverageSource>) {
        self.sources = sources;
    }

    /// Current sources in insertion order
    #[must_use]
    pub fn sources(&self) -> &[ImportedCoverageSource] {
        &self.sources
    }

    /// True when nothing is imported
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_collapses_duplicates_keeping_order() {
        let prepared = ImportedCoverageRegistry::prepare([
            ImportedCoverageSource::new("regression"),
            ImportedCoverageSource::new("smoke"),
            ImportedCoverageSource::new("regression"),
        ])
        .unwrap();
        let names: Vec<&str> = prepared.iter().map(ImportedCoverageSource::name).collect();
        assert_eq!(names, ["regression", "smoke"]);
    }

    #[test]
    fn test_prepare_rejects_blank_names() {
        let err = ImportedCoverageRegistry::prepare([
            ImportedCoverageSource::new("ok"),
            ImportedCoverageSource::new("  "),
        ])
        .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_replace_is_wholesale() {
        let mut registry = ImportedCoverageRegistry::new();
        registry.replace(vec![ImportedCoverageSource::new("a")]);
        registry.replace(vec![ImportedCoverageSource::new("b")]);
        assert_eq!(registry.sources(), &[ImportedCoverageSource::new("b")]);
        registry.replace(Vec::new());
        assert!(registry.is_empty());
    }
}
