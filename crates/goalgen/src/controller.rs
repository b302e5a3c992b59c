//! Generation Controller
//!
//! Caller-facing surface of a generation session. One mutex guards the whole
//! session; every control signal and configuration change checks its
//! precondition and applies its transition under that lock, so racing
//! signals resolve to a single winner.
//!
//! # Example
//!
//! ```ignore
//! let controller = GenerationController::new(Arc::new(engine), ControllerConfig::default());
//! controller.set_selected_goals(["G1", "G2"])?;
//! controller.start()?;
//! while controller.current_status()?.is_active() {
//!     std::thread::sleep(Duration::from_millis(50));
//! }
//! controller.export_report(ReportKind::CoverageResults, Path::new("out"))?;
//! controller.dispose()?;
//! ```

use crate::artifact::{ArtifactSet, GenerationProgress};
use crate::config::ControllerConfig;
use crate::engine::GenerationEngine;
use crate::export::{write_report, ReportKind, TestCaseSink};
use crate::goal::{GoalCatalog, GoalId};
use crate::imported::{ImportedCoverageRegistry, ImportedCoverageSource};
use crate::result::{GenError, GenResult};
use crate::selection::{
    read_selection_file, write_selection_file, GoalSelection, ImportSummary,
};
use crate::state::{RunState, Transition};
use crate::worker;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use tracing::{debug, info, warn};

/// Mutable state of a session, guarded by [`Shared::session`]
#[derive(Debug, Default)]
pub(crate) struct Session {
    pub(crate) state: RunState,
    pub(crate) disposed: bool,
    /// Incremented whenever a new worker is launched
    pub(crate) epoch: u64,
    pub(crate) catalog: Option<Arc<GoalCatalog>>,
    pub(crate) selection: GoalSelection,
    pub(crate) imported: ImportedCoverageRegistry,
    pub(crate) artifacts: ArtifactSet,
    subscribers: Vec<Sender<RunState>>,
}

impl Session {
    /// Apply a new run state and notify subscribers
    pub(crate) fn set_state(&mut self, next: RunState) {
        info!(from = %self.state, to = %next, "run state changed");
        self.state = next;
        let state = &self.state;
        self.subscribers.retain(|tx| tx.send(state.clone()).is_ok());
    }

    /// True while the worker launched for `epoch` still owns the run
    pub(crate) fn owned_by(&self, epoch: u64) -> bool {
        !self.disposed && self.epoch == epoch && self.state.is_active()
    }
}

/// Session plus the condition variable the worker parks on
#[derive(Debug, Default)]
pub(crate) struct Shared {
    session: Mutex<Session>,
    pub(crate) signal: Condvar,
}

impl Shared {
    pub(crate) fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Controller of one coverage-goal-driven generation session
pub struct GenerationController {
    shared: Arc<Shared>,
    engine: Arc<dyn GenerationEngine>,
    config: ControllerConfig,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for GenerationController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let session = self.shared.lock();
        f.debug_struct("GenerationController")
            .field("state", &session.state)
            .field("disposed", &session.disposed)
            .field("selected", &session.selection.len())
            .field("config", &self.config)
            .finish()
    }
}

impl GenerationController {
    /// Open a session against `engine`
    #[must_use]
    pub fn new(engine: Arc<dyn GenerationEngine>, config: ControllerConfig) -> Self {
        Self {
            shared: Arc::new(Shared::default()),
            engine,
            config,
            worker: Mutex::new(None),
        }
    }

    /// Configuration of this session
    #[must_use]
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    fn guard(&self) -> GenResult<MutexGuard<'_, Session>> {
        let session = self.shared.lock();
        if session.disposed {
            return Err(GenError::Disposed);
        }
        Ok(session)
    }

    fn configurable(&self, operation: &'static str) -> GenResult<MutexGuard<'_, Session>> {
        let session = self.guard()?;
        if !session.state.accepts_configuration() {
            debug!(operation, state = %session.state, "configuration change rejected");
            return Err(GenError::state(operation, session.state.clone()));
        }
        Ok(session)
    }

    fn exportable(&self, operation: &'static str) -> GenResult<MutexGuard<'_, Session>> {
        let session = self.guard()?;
        let allowed = session.state.is_halted()
            || (self.config.allow_paused_export && session.state == RunState::Paused);
        if !allowed {
            return Err(GenError::state(operation, session.state.clone()));
        }
        Ok(session)
    }

    fn fetch_catalog(&self) -> GenResult<Arc<GoalCatalog>> {
        let goals = self.engine.list_goals()?;
        Ok(Arc::new(GoalCatalog::new(goals)))
    }

    /// Snapshot used for validation, fetched from the engine on first use
    fn catalog_snapshot(&self) -> GenResult<Arc<GoalCatalog>> {
        if let Some(catalog) = self.guard()?.catalog.clone() {
            return Ok(catalog);
        }
        let fetched = self.fetch_catalog()?;
        let mut session = self.guard()?;
        Ok(Arc::clone(session.catalog.get_or_insert(fetched)))
    }

    // =========================================================================
    // Coverage goal catalog
    // =========================================================================

    /// Current snapshot of all goals of the project.
    ///
    /// Refreshed from the engine while idle; during an active run the
    /// snapshot taken at start is returned.
    pub fn list_goals(&self) -> GenResult<Arc<GoalCatalog>> {
        {
            let session = self.guard()?;
            if session.state.is_active() {
                return Ok(session.catalog.clone().unwrap_or_default());
            }
        }
        let fetched = self.fetch_catalog()?;
        let mut session = self.guard()?;
        if session.state.is_active() {
            // A run started while the request was in flight; keep its snapshot
            return Ok(session.catalog.clone().unwrap_or_default());
        }
        session.catalog = Some(Arc::clone(&fetched));
        Ok(fetched)
    }

    // =========================================================================
    // Goal selection
    // =========================================================================

    /// Goals currently targeted, in identifier order
    pub fn selected_goals(&self) -> GenResult<Vec<GoalId>> {
        Ok(self.guard()?.selection.goals().iter().cloned().collect())
    }

    /// Replace the selection; every goal must be in the catalog.
    ///
    /// On any error the previous selection is kept.
    pub fn set_selected_goals<I, G>(&self, goals: I) -> GenResult<()>
    where
        I: IntoIterator<Item = G>,
        G: Into<GoalId>,
    {
        drop(self.configurable("change the goal selection")?);
        let catalog = self.catalog_snapshot()?;
        let selection = GoalSelection::strict(&catalog, goals.into_iter().map(Into::into))?;
        let mut session = self.configurable("change the goal selection")?;
        info!(goals = selection.len(), "goal selection replaced");
        session.selection = selection;
        Ok(())
    }

    /// Load a selection file, skipping goals the catalog does not know
    pub fn import_selection(&self, path: &Path) -> GenResult<ImportSummary> {
        drop(self.configurable("import a goal selection")?);
        let ids = read_selection_file(path)?;
        let catalog = self.catalog_snapshot()?;
        let (selection, summary) = GoalSelection::lenient(&catalog, ids);
        let mut session = self.configurable("import a goal selection")?;
        if !summary.ignored.is_empty() {
            warn!(
                ignored = summary.ignored.len(),
                path = %path.display(),
                "selection file names unknown goals"
            );
        }
        session.selection = selection;
        Ok(summary)
    }

    /// Write the selection to a file, one goal per line
    pub fn export_selection(&self, path: &Path) -> GenResult<()> {
        let selection = self.guard()?.selection.clone();
        write_selection_file(path, &selection)
    }

    // =========================================================================
    // Imported coverage
    // =========================================================================

    /// Replace the imported-coverage sources as a whole
    pub fn set_imported_coverage_sources<I>(&self, sources: I) -> GenResult<()>
    where
        I: IntoIterator<Item = ImportedCoverageSource>,
    {
        let mut session = self.configurable("change imported coverage")?;
        let prepared = ImportedCoverageRegistry::prepare(sources)?;
        info!(sources = prepared.len(), "imported coverage sources replaced");
        session.imported.replace(prepared);
        Ok(())
    }

    /// Current imported-coverage sources
    pub fn imported_coverage_sources(&self) -> GenResult<Vec<ImportedCoverageSource>> {
        Ok(self.guard()?.imported.sources().to_vec())
    }

    // =========================================================================
    // State machine
    // =========================================================================

    /// Start, resume or continue generation.
    ///
    /// Returns once the state is `Running`; generation itself proceeds in the
    /// background. Goals credited by a source that is no longer configured go
    /// back to uncovered before the new run imports coverage again.
    ///
    /// With `halt_on_completion`, a run with nothing left to cover (an empty
    /// selection included) moves `Running -> Stopped` without taking a step.
    pub fn start(&self) -> GenResult<()> {
        let needs_catalog = {
            let session = self.guard()?;
            if session.state.next(Transition::Start).is_none() {
                debug!(state = %session.state, "start rejected");
                return Err(GenError::state("start", session.state.clone()));
            }
            session.catalog.is_none()
        };
        let fetched = if needs_catalog {
            Some(self.fetch_catalog()?)
        } else {
            None
        };

        let mut session = self.guard()?;
        let previous = session.state.clone();
        let Some(next) = previous.next(Transition::Start) else {
            return Err(GenError::state("start", previous));
        };
        if let Some(catalog) = fetched {
            let _ = session.catalog.get_or_insert(catalog);
        }

        if previous == RunState::Paused {
            session.set_state(next);
            self.shared.signal.notify_all();
            return Ok(());
        }

        let session = &mut *session;
        let withdrawn = session.artifacts.withdraw_credits(session.imported.sources());
        if withdrawn > 0 {
            info!(withdrawn, "credits of removed coverage sources withdrawn");
        }
        session.artifacts.target(session.selection.goals());
        session.epoch += 1;
        let epoch = session.epoch;
        session.set_state(next);

        let shared = Arc::clone(&self.shared);
        let engine = Arc::clone(&self.engine);
        let config = self.config.clone();
        let spawned = std::thread::Builder::new()
            .name(format!("goalgen-worker-{epoch}"))
            .spawn(move || worker::run(&shared, engine.as_ref(), &config, epoch));
        let handle = match spawned {
            Ok(handle) => handle,
            Err(err) => {
                warn!(error = %err, "failed to launch generation worker");
                session.set_state(previous);
                return Err(err.into());
            }
        };

        let mut slot = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        // A previous worker, if any, exits on its own at the next checkpoint
        *slot = Some(handle);
        Ok(())
    }

    /// Park the worker at its next checkpoint
    pub fn pause(&self) -> GenResult<()> {
        self.signal(Transition::Pause)
    }

    /// Halt the run; artifacts produced so far stay available
    pub fn stop(&self) -> GenResult<()> {
        self.signal(Transition::Stop)
    }

    fn signal(&self, transition: Transition) -> GenResult<()> {
        let mut session = self.guard()?;
        let Some(next) = session.state.next(transition) else {
            debug!(operation = transition.operation(), state = %session.state, "signal rejected");
            return Err(GenError::state(transition.operation(), session.state.clone()));
        };
        session.set_state(next);
        self.shared.signal.notify_all();
        Ok(())
    }

    /// Current run state
    pub fn current_status(&self) -> GenResult<RunState> {
        Ok(self.guard()?.state.clone())
    }

    /// Message recorded when the run failed; `None` in any other state
    pub fn error_message(&self) -> GenResult<Option<String>> {
        Ok(self.guard()?.state.error_message().map(String::from))
    }

    /// Targeted vs achieved counters of the session
    pub fn progress(&self) -> GenResult<GenerationProgress> {
        Ok(self.guard()?.artifacts.progress())
    }

    /// Receive every subsequent run state change.
    ///
    /// Polling through [`current_status`](Self::current_status) keeps
    /// working regardless; the channel closes when the controller is
    /// disposed.
    pub fn subscribe(&self) -> GenResult<Receiver<RunState>> {
        let (tx, rx) = channel();
        self.guard()?.subscribers.push(tx);
        Ok(rx)
    }

    // =========================================================================
    // Result export
    // =========================================================================

    /// Hand a copy of the generated test cases to `sink`; returns how many
    pub fn export_generated_test_cases<S>(&self, sink: &mut S) -> GenResult<usize>
    where
        S: TestCaseSink + ?Sized,
    {
        let cases = self
            .exportable("export test cases")?
            .artifacts
            .test_cases()
            .to_vec();
        sink.receive(&cases)?;
        info!(count = cases.len(), "exported generated test cases");
        Ok(cases.len())
    }

    /// Write a CSV report; returns the path written
    pub fn export_report(&self, kind: ReportKind, path: &Path) -> GenResult<PathBuf> {
        let (artifacts, catalog) = {
            let session = self.exportable("export a report")?;
            (
                session.artifacts.clone(),
                session.catalog.clone().unwrap_or_default(),
            )
        };
        let written = write_report(
            kind,
            path,
            &self.config.report_extension,
            &artifacts,
            &catalog,
        )?;
        info!(report = kind.name(), path = %written.display(), "report exported");
        Ok(written)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Dispose the session; only outside an active run.
    ///
    /// Waits for a worker that is still finishing its last step.
    pub fn dispose(&self) -> GenResult<()> {
        {
            let mut session = self.guard()?;
            if !session.state.allows_dispose() {
                return Err(GenError::state("dispose", session.state.clone()));
            }
            session.disposed = true;
            session.subscribers.clear();
            self.shared.signal.notify_all();
        }
        let handle = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                warn!("generation worker panicked");
            }
        }
        info!("controller disposed");
        Ok(())
    }
}

impl Drop for GenerationController {
    fn drop(&mut self) {
        let mut session = self.shared.lock();
        if !session.disposed {
            session.disposed = true;
            session.subscribers.clear();
            self.shared.signal.notify_all();
        }
    }
}
