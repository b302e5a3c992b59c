//! Run State of a Generation Session
//!
//! ```text
//! NotStarted --start--> Running --pause--> Paused --start--> Running
//! Running|Paused --stop--> Stopped --start--> Running
//! Running|Paused --failure--> Error
//! ```
//!
//! `Error` is terminal: the only way out is disposing the controller. It is
//! not part of the signal table below; the worker enters it directly from an
//! active state with the engine's message.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Phase of the background generation process
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunState {
    /// No run has been started in this session
    #[default]
    NotStarted,
    /// Generation is proceeding in the background
    Running,
    /// Generation is parked at a checkpoint
    Paused,
    /// Generation halted; artifacts are final until the next start
    Stopped,
    /// Generation terminated abnormally
    Error {
        /// Message recorded when the run failed
        message: String,
    },
}

/// Control signals and internal events that drive the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Caller `start()`
    Start,
    /// Caller `pause()`
    Pause,
    /// Caller `stop()`
    Stop,
    /// Worker reached the end of its targets
    Complete,
}

impl Transition {
    /// Operation name used in state errors
    #[must_use]
    pub const fn operation(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Pause => "pause",
            Self::Stop => "stop",
            Self::Complete => "complete",
        }
    }
}

impl RunState {
    /// Build the error state
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// True while a worker owns the run (`Running` or `Paused`)
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Running | Self::Paused)
    }

    /// True once the run has halted (`Stopped` or `Error`)
    #[must_use]
    pub const fn is_halted(&self) -> bool {
        matches!(self, Self::Stopped | Self::Error { .. })
    }

    /// Selection and imported coverage may only change outside an active run
    #[must_use]
    pub const fn accepts_configuration(&self) -> bool {
        !self.is_active()
    }

    /// The controller may be disposed in `NotStarted`, `Stopped` or `Error`
    #[must_use]
    pub const fn allows_dispose(&self) -> bool {
        !self.is_active()
    }

    /// Message carried by the `Error` state
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error { message } => Some(message),
            _ => None,
        }
    }

    /// State reached by applying `transition`, or `None` if it is illegal here
    #[must_use]
    pub fn next(&self, transition: Transition) -> Option<Self> {
        use Transition::{Complete, Pause, Start, Stop};

        match (self, transition) {
            (Self::NotStarted | Self::Paused | Self::Stopped, Start) => Some(Self::Running),
            (Self::Running, Pause) => Some(Self::Paused),
            (Self::Running | Self::Paused, Stop) => Some(Self::Stopped),
            (Self::Running, Complete) => Some(Self::Stopped),
            _ => None,
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not started"),
            Self::Running => write!(f, "running"),
            Self::Paused => write!(f, "paused"),
            Self::Stopped => write!(f, "stopped"),
            Self::Error { .. } => write!(f, "failed"),
        }
    }
}
