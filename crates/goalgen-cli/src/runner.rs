//! Command handlers

use crate::commands::{GoalsArgs, RunArgs};
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::{progress_line, ProgressReporter};
use crate::project::ProjectFixture;
use goalgen::{
    ControllerConfig, DirectorySink, GenerationController, GenerationProgress,
    ImportedCoverageSource, ReportKind, RunState,
};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::info;

/// File name of the exported selection inside the output directory
pub const SELECTION_FILE: &str = "selection.txt";

/// Directory of exported test cases inside the output directory
pub const TEST_CASE_DIR: &str = "test-cases";

/// Outcome of a `run` invocation
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// State the run halted in
    pub state: RunState,
    /// Final counters
    pub progress: GenerationProgress,
    /// Reports and selection file written
    pub written: Vec<PathBuf>,
    /// Number of test cases exported
    pub exported: usize,
}

/// List the goal catalog of a project
pub fn run_goals(args: &GoalsArgs) -> CliResult<()> {
    let fixture = ProjectFixture::load(&args.project)?;
    let controller = GenerationController::new(
        Arc::new(fixture.to_engine()),
        ControllerConfig::default(),
    );
    let catalog = controller.list_goals()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(catalog.goals())?);
    } else {
        println!("{} ({} goals)", fixture.name, catalog.len());
        for goal in catalog.iter() {
            println!(
                "  {:<8} {:<10} {}",
                goal.id.as_str(),
                goal.kind.label(),
                goal.description
            );
        }
    }

    controller.dispose()?;
    Ok(())
}

/// Run generation to completion (or timeout) and export everything
pub fn run_generation(config: &CliConfig, args: &RunArgs) -> CliResult<RunSummary> {
    if args.poll_ms == 0 {
        return Err(CliError::invalid_argument("--poll-ms must be positive"));
    }
    let fixture = ProjectFixture::load(&args.project)?;
    let controller_config = match &args.config {
        Some(path) => ControllerConfig::load(path)?,
        None => ControllerConfig::default(),
    };
    if !controller_config.halt_on_completion && args.timeout_ms.is_none() {
        return Err(CliError::config(
            "--timeout-ms is required when halt_on_completion is disabled",
        ));
    }

    let mut reporter =
        ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet());
    let controller =
        GenerationController::new(Arc::new(fixture.to_engine()), controller_config);

    select_goals(&controller, args, &reporter)?;
    if !args.import.is_empty() {
        controller
            .set_imported_coverage_sources(args.import.iter().map(ImportedCoverageSource::new))?;
    }

    info!(project = %fixture.name, "starting generation");
    controller.start()?;
    reporter.start_spinner("generating");
    let state = watch(&controller, args, &reporter)?;
    reporter.finish(&state.to_string());

    let summary = export_all(&controller, args, state)?;
    controller.dispose()?;

    if let Some(message) = summary.state.error_message() {
        reporter.failure(message);
        return Err(CliError::generation(message));
    }

    println!("{}: {}", fixture.name, progress_line(&summary.state.to_string(), &summary.progress));
    reporter.success(&format!(
        "{} test cases written to {}",
        summary.exported,
        args.output.join(TEST_CASE_DIR).display()
    ));
    for path in &summary.written {
        reporter.success(&format!("wrote {}", path.display()));
    }
    Ok(summary)
}

fn select_goals(
    controller: &GenerationController,
    args: &RunArgs,
    reporter: &ProgressReporter,
) -> CliResult<()> {
    if let Some(path) = &args.select {
        let summary = controller.import_selection(path)?;
        if !summary.ignored.is_empty() {
            let ids: Vec<String> = summary.ignored.iter().map(ToString::to_string).collect();
            reporter.warning(&format!(
                "skipped unknown goals from {}: {}",
                path.display(),
                ids.join(", ")
            ));
        }
    } else if !args.goal.is_empty() {
        controller.set_selected_goals(args.goal.iter().map(String::as_str))?;
    } else {
        let catalog = controller.list_goals()?;
        controller.set_selected_goals(catalog.iter().map(|goal| goal.id.clone()))?;
    }
    Ok(())
}

/// Poll until the run halts, stopping it once the timeout elapses
fn watch(
    controller: &GenerationController,
    args: &RunArgs,
    reporter: &ProgressReporter,
) -> CliResult<RunState> {
    let poll = Duration::from_millis(args.poll_ms);
    let deadline = args
        .timeout_ms
        .map(|ms| Instant::now() + Duration::from_millis(ms));

    loop {
        let state = controller.current_status()?;
        reporter.update(&state.to_string(), &controller.progress()?);
        if !state.is_active() {
            return Ok(state);
        }
        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            match controller.stop() {
                Ok(()) => info!("timeout elapsed, run stopped"),
                // The run halted on its own in the meantime
                Err(err) if err.is_state() => {}
                Err(err) => return Err(err.into()),
            }
            continue;
        }
        thread::sleep(poll);
    }
}

fn export_all(
    controller: &GenerationController,
    args: &RunArgs,
    state: RunState,
) -> CliResult<RunSummary> {
    fs::create_dir_all(&args.output)?;

    let mut written = Vec::new();
    for kind in ReportKind::all() {
        written.push(controller.export_report(kind, &args.output.join(kind.name()))?);
    }

    let mut sink = DirectorySink::new(args.output.join(TEST_CASE_DIR))?;
    let exported = controller.export_generated_test_cases(&mut sink)?;

    let selection = args.output.join(SELECTION_FILE);
    controller.export_selection(&selection)?;
    written.push(selection);

    Ok(RunSummary {
        state,
        progress: controller.progress()?,
        written,
        exported,
    })
}
