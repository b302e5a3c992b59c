//! Result Exporter
//!
//! Reports are CSV:
//!
//! ```text
//! test_case,input,value                 (input specification overview)
//! goal,description,status,test_cases    (coverage results overview)
//! ```
//!
//! Test cases go to a [`TestCaseSink`]: an in-memory container or a
//! directory of JSON files.

use crate::artifact::{ArtifactSet, GeneratedTestCase, GoalStatus};
use crate::goal::GoalCatalog;
use crate::result::{GenError, GenResult};
use crate::selection::require_path;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Kind of tabular report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportKind {
    /// One row per input value of each generated test case
    InputSpecification,
    /// One row per targeted goal with its coverage status
    CoverageResults,
}

impl ReportKind {
    /// All report kinds
    #[must_use]
    pub const fn all() -> [Self; 2] {
        [Self::InputSpecification, Self::CoverageResults]
    }

    /// Stable short name, also used for default file names
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::InputSpecification => "input-specification",
            Self::CoverageResults => "coverage-results",
        }
    }
}

/// Append `default_ext` when `path` has no extension
#[must_use]
pub fn resolve_report_path(path: &Path, default_ext: &str) -> PathBuf {
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        path.with_extension(default_ext)
    }
}

fn write_input_specification<W: io::Write>(
    writer: &mut csv::Writer<W>,
    test_cases: &[GeneratedTestCase],
) -> GenResult<()> {
    writer.write_record(["test_case", "input", "value"])?;
    for case in test_cases {
        for (name, value) in &case.inputs {
            writer.write_record([case.id.as_str(), name.as_str(), value.as_str()])?;
        }
    }
    Ok(())
}

fn write_coverage_results<W: io::Write>(
    writer: &mut csv::Writer<W>,
    artifacts: &ArtifactSet,
    catalog: &GoalCatalog,
) -> GenResult<()> {
    writer.write_record(["goal", "description", "status", "test_cases"])?;
    for goal in artifacts.targeted() {
        let description = catalog
            .get(goal)
            .map(|g| g.description.as_str())
            .unwrap_or_default();
        let status = artifacts.status_of(goal);
        let detail = match &status {
            GoalStatus::Uncovered => String::new(),
            GoalStatus::Imported { source } => format!("imported:{source}"),
            GoalStatus::Covered { test_cases } => test_cases.join(";"),
        };
        writer.write_record([goal.as_str(), description, status.label(), detail.as_str()])?;
    }
    Ok(())
}

fn write_kind<W: io::Write>(
    writer: &mut csv::Writer<W>,
    kind: ReportKind,
    artifacts: &ArtifactSet,
    catalog: &GoalCatalog,
) -> GenResult<()> {
    match kind {
        ReportKind::InputSpecification => write_input_specification(writer, artifacts.test_cases()),
        ReportKind::CoverageResults => write_coverage_results(writer, artifacts, catalog),
    }
}

fn render_with<F>(fill: F) -> GenResult<String>
where
    F: FnOnce(&mut csv::Writer<Vec<u8>>) -> GenResult<()>,
{
    let mut writer = csv::Writer::from_writer(Vec::new());
    fill(&mut writer)?;
    let bytes = writer
        .into_inner()
        .map_err(|err| GenError::Io(err.into_error()))?;
    String::from_utf8(bytes)
        .map_err(|err| GenError::Io(io::Error::new(io::ErrorKind::InvalidData, err)))
}

/// Render the input specification overview
pub fn render_input_specification(test_cases: &[GeneratedTestCase]) -> GenResult<String> {
    render_with(|writer| write_input_specification(writer, test_cases))
}

/// Render the coverage results overview for the goals targeted by the run
pub fn render_coverage_results(
    artifacts: &ArtifactSet,
    catalog: &GoalCatalog,
) -> GenResult<String> {
    render_with(|writer| write_coverage_results(writer, artifacts, catalog))
}

/// Write a report; returns the path actually written
pub fn write_report(
    kind: ReportKind,
    path: &Path,
    default_ext: &str,
    artifacts: &ArtifactSet,
    catalog: &GoalCatalog,
) -> GenResult<PathBuf> {
    require_path(path)?;
    let target = resolve_report_path(path, default_ext);
    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut writer = csv::Writer::from_path(&target)?;
    write_kind(&mut writer, kind, artifacts, catalog)?;
    writer.flush()?;
    Ok(target)
}

/// Destination for exported test cases
pub trait TestCaseSink {
    /// Receive a copy of the generated test cases
    fn receive(&mut self, test_cases: &[GeneratedTestCase]) -> GenResult<()>;
}

impl TestCaseSink for Vec<GeneratedTestCase> {
    fn receive(&mut self, test_cases: &[GeneratedTestCase]) -> GenResult<()> {
        self.extend_from_slice(test_cases);
        Ok(())
    }
}

/// Writes each test case to `<dir>/<id>.json`
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl DirectorySink {
    /// Sink rooted at `dir`; the directory is created on first export
    pub fn new(dir: impl Into<PathBuf>) -> GenResult<Self> {
        let dir = dir.into();
        if dir.as_os_str().is_empty() {
            return Err(GenError::validation("export directory must not be empty"));
        }
        Ok(Self {
            dir,
            written: Vec::new(),
        })
    }

    /// Target directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Files written by the last export
    #[must_use]
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl TestCaseSink for DirectorySink {
    fn receive(&mut self, test_cases: &[GeneratedTestCase]) -> GenResult<()> {
        fs::create_dir_all(&self.dir)?;
        self.written.clear();
        for case in test_cases {
            let path = self.dir.join(format!("{}.json", case.id));
            fs::write(&path, serde_json::to_string_pretty(case)?)?;
            self.written.push(path);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::engine::{CoverageCredit, TestCaseDraft};
    use crate::goal::{CoverageGoal, GoalId};
    use chrono::Utc;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn artifacts() -> (ArtifactSet, GoalCatalog) {
        let catalog = GoalCatalog::new(vec![
            CoverageGoal::new("G1", "x > 0, true"),
            CoverageGoal::new("G2", "x > 0, false"),
            CoverageGoal::new("G3", "never targeted"),
        ]);
        let mut set = ArtifactSet::new();
        set.target(&[GoalId::new("G1"), GoalId::new("G2")]);
        set.absorb(
            vec![TestCaseDraft {
                covers: vec!["G1".into()],
                inputs: BTreeMap::from([
                    ("x".to_string(), "5".to_string()),
                    ("note".to_string(), "a, \"quoted\" value".to_string()),
                ]),
            }],
            Utc::now(),
        );
        set.credit(&[CoverageCredit {
            goal: "G3".into(),
            source: "smoke".into(),
        }]);
        (set, catalog)
    }

    #[test]
    fn test_resolve_appends_missing_extension() {
        assert_eq!(resolve_report_path(Path::new("out"), "csv"), PathBuf::from("out.csv"));
        assert_eq!(
            resolve_report_path(Path::new("dir/out.txt"), "csv"),
            PathBuf::from("dir/out.txt")
        );
    }

    #[test]
    fn test_fields_with_delimiters_round_trip_through_a_reader() {
        let (mut set, _) = artifacts();
        set.absorb(
            vec![TestCaseDraft {
                covers: vec!["G2".into()],
                inputs: BTreeMap::from([("lines".to_string(), "first\nsecond".to_string())]),
            }],
            Utc::now(),
        );
        let text = render_input_specification(set.test_cases()).unwrap();

        let mut reader = csv::Reader::from_reader(text.as_bytes());
        let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(&rows[0][2], "a, \"quoted\" value");
        assert_eq!(&rows[2][1], "lines");
        assert_eq!(&rows[2][2], "first\nsecond");
    }

    #[test]
    fn test_input_specification_of_no_test_cases_is_header_only() {
        assert_eq!(
            render_input_specification(&[]).unwrap(),
            "test_case,input,value\n"
        );
    }

    #[test]
    fn test_input_specification_rows() {
        let (set, _) = artifacts();
        let csv = render_input_specification(set.test_cases()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "test_case,input,value");
        assert_eq!(lines[1], "TC-0001,note,\"a, \"\"quoted\"\" value\"");
        assert_eq!(lines[2], "TC-0001,x,5");
    }

    #[test]
    fn test_coverage_results_list_only_targeted_goals() {
        let (set, catalog) = artifacts();
        let csv = render_coverage_results(&set, &catalog).unwrap();
        assert_eq!(
            csv,
            "goal,description,status,test_cases\n\
             G1,\"x > 0, true\",covered,TC-0001\n\
             G2,\"x > 0, false\",uncovered,\n"
        );
    }

    #[test]
    fn test_write_report_appends_extension() {
        let dir = TempDir::new().unwrap();
        let (set, catalog) = artifacts();

        let written = write_report(
            ReportKind::CoverageResults,
            &dir.path().join("out"),
            "csv",
            &set,
            &catalog,
        )
        .unwrap();

        assert_eq!(written, dir.path().join("out.csv"));
        assert_eq!(
            fs::read_to_string(written).unwrap(),
            render_coverage_results(&set, &catalog).unwrap()
        );
    }

    #[test]
    fn test_write_report_rejects_empty_path() {
        let (set, catalog) = artifacts();
        let err = write_report(ReportKind::InputSpecification, Path::new(""), "csv", &set, &catalog)
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_directory_sink_writes_json_per_case() {
        let dir = TempDir::new().unwrap();
        let (set, _) = artifacts();
        let mut sink = DirectorySink::new(dir.path().join("cases")).unwrap();

        sink.receive(set.test_cases()).unwrap();

        assert_eq!(sink.written().len(), 1);
        let json = fs::read_to_string(&sink.written()[0]).unwrap();
        let case: GeneratedTestCase = serde_json::from_str(&json).unwrap();
        assert_eq!(case, set.test_cases()[0]);
    }

    #[test]
    fn test_vec_sink_appends() {
        let (set, _) = artifacts();
        let mut sink: Vec<GeneratedTestCase> = Vec::new();
        sink.receive(set.test_cases()).unwrap();
        sink.receive(set.test_cases()).unwrap();
        assert_eq!(sink.len(), 2);
    }
}
