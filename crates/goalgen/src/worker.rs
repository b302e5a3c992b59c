//! Background generation worker.
//!
//! The worker never holds the session lock while talking to the engine.
//! Checkpoints sit before and after every engine call; at each one the
//! worker re-reads the run state and either proceeds, parks while paused,
//! or exits once its run is no longer the current one.

use crate::config::ControllerConfig;
use crate::controller::{Session, Shared};
use crate::engine::{EngineError, GenerationEngine, StepRequest};
use crate::state::{RunState, Transition};
use chrono::Utc;
use std::sync::MutexGuard;
use tracing::{debug, info, warn};

/// What a checkpoint decided
enum Checkpoint<'a> {
    /// The run is `Running`; the guard is still held
    Proceed(MutexGuard<'a, Session>),
    /// The run was stopped, failed, restarted or disposed
    Exit,
}

/// Block while paused, probing the engine between waits
fn checkpoint<'a>(
    shared: &'a Shared,
    engine: &dyn GenerationEngine,
    config: &ControllerConfig,
    epoch: u64,
) -> Checkpoint<'a> {
    let mut session = shared.lock();
    loop {
        if !session.owned_by(epoch) {
            return Checkpoint::Exit;
        }
        if session.state == RunState::Running {
            return Checkpoint::Proceed(session);
        }

        let (guard, timeout) = shared
            .signal
            .wait_timeout_while(session, config.heartbeat_interval(), |s| {
                s.owned_by(epoch) && s.state == RunState::Paused
            })
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        session = guard;

        if timeout.timed_out() {
            drop(session);
            let heartbeat = engine.ping();
            session = shared.lock();
            if let Err(err) = heartbeat {
                fail(&mut session, epoch, &err);
                return Checkpoint::Exit;
            }
        }
    }
}

/// Move the run to `Error` unless it already left the worker's hands.
///
/// Only an active run (`Running` or `Paused`) of this epoch can fail.
fn fail(session: &mut Session, epoch: u64, err: &EngineError) {
    if !session.owned_by(epoch) {
        debug!(error = %err, "ignoring failure of a finished run");
        return;
    }
    warn!(error = %err, "generation failed");
    session.set_state(RunState::error(err.to_string()));
}

/// Halt or idle once nothing is left to generate.
///
/// Returns false when the worker should exit.
fn complete<'a>(
    shared: &'a Shared,
    mut session: MutexGuard<'a, Session>,
    config: &ControllerConfig,
    epoch: u64,
) -> bool {
    if config.halt_on_completion {
        if let Some(next) = session.state.next(Transition::Complete) {
            info!(
                steps = session.artifacts.steps(),
                test_cases = session.artifacts.test_cases().len(),
                "generation complete"
            );
            session.set_state(next);
            shared.signal.notify_all();
        }
        return false;
    }
    // Idle at this checkpoint until paused, stopped or disposed
    let _guard = shared
        .signal
        .wait_while(session, |s| s.owned_by(epoch) && s.state == RunState::Running)
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    true
}

/// Worker entry point for run `epoch`
pub(crate) fn run(
    shared: &Shared,
    engine: &dyn GenerationEngine,
    config: &ControllerConfig,
    epoch: u64,
) {
    debug!(epoch, "generation worker started");

    // Warm start from imported coverage
    let sources = match checkpoint(shared, engine, config, epoch) {
        Checkpoint::Proceed(session) => session.imported.sources().to_vec(),
        Checkpoint::Exit => return,
    };
    if !sources.is_empty() {
        let imported = engine.import_coverage(&sources);
        let mut session = shared.lock();
        match imported {
            Ok(credits) if session.owned_by(epoch) => {
                info!(credited = credits.len(), "imported coverage credited");
                session.artifacts.credit(&credits);
            }
            Ok(_) => return,
            Err(err) => {
                fail(&mut session, epoch, &err);
                return;
            }
        }
    }

    loop {
        let session = match checkpoint(shared, engine, config, epoch) {
            Checkpoint::Proceed(session) => session,
            Checkpoint::Exit => break,
        };

        let budget_spent = config
            .max_steps
            .is_some_and(|max| session.artifacts.steps() >= max);
        let targets = session.artifacts.remaining(session.selection.goals());
        if budget_spent || targets.is_empty() {
            if complete(shared, session, config, epoch) {
                continue;
            }
            break;
        }
        let request = StepRequest {
            step: session.artifacts.steps() + 1,
            targets,
        };
        drop(session);

        debug!(step = request.step, targets = request.targets.len(), "generation step");
        let outcome = engine.generate_step(&request);

        let mut session = shared.lock();
        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(err) => {
                fail(&mut session, epoch, &err);
                break;
            }
        };
        if !session.owned_by(epoch) {
            // Stopped while the step was in flight: the artifact set is final
            debug!(step = request.step, "discarding step finished after stop");
            break;
        }
        session.artifacts.absorb(outcome.test_cases, Utc::now());
        session.artifacts.record_step();

        if outcome.exhausted && session.state == RunState::Running {
            if complete(shared, session, config, epoch) {
                continue;
            }
            break;
        }

        if !config.checkpoint_interval().is_zero() {
            let _throttled = shared
                .signal
                .wait_timeout_while(session, config.checkpoint_interval(), |s| {
                    s.owned_by(epoch) && s.state == RunState::Running
                })
                .unwrap_or_else(std::sync::PoisonError::into_inner);
        }
    }

    debug!(epoch, "generation worker exited");
}
