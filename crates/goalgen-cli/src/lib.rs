//! goalgen CLI Library
//!
//! Command-line front end for the goalgen controller: lists the goals of a
//! project fixture and drives a generation run to its exported results.

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

mod commands;
mod config;
mod error;
pub mod logging;
mod output;
pub mod project;
pub mod runner;

pub use commands::{Cli, ColorArg, Commands, GoalsArgs, RunArgs};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::{progress_line, ProgressReporter};
pub use project::ProjectFixture;
pub use runner::{run_generation, run_goals, RunSummary};
