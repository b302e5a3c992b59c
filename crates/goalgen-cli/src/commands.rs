//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// goalgen: drive coverage-goal-driven test-data generation
#[derive(Parser, Debug)]
#[command(name = "goalgen")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the coverage goals of a project
    Goals(GoalsArgs),

    /// Run generation and export the results
    Run(RunArgs),
}

/// Arguments for the goals command
#[derive(Parser, Debug)]
pub struct GoalsArgs {
    /// Project fixture (YAML)
    #[arg(short, long)]
    pub project: PathBuf,

    /// Print the catalog as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Project fixture (YAML)
    #[arg(short, long)]
    pub project: PathBuf,

    /// Controller configuration (YAML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Selection file, one goal per line; unknown goals are skipped
    #[arg(long, conflicts_with = "goal")]
    pub select: Option<PathBuf>,

    /// Goal to target (repeatable); unknown goals are rejected
    #[arg(short, long)]
    pub goal: Vec<String>,

    /// Imported coverage source (repeatable)
    #[arg(short, long)]
    pub import: Vec<String>,

    /// Output directory for reports, test cases and the selection
    #[arg(short, long, default_value = "target/goalgen")]
    pub output: PathBuf,

    /// Status polling interval in milliseconds
    #[arg(long, default_value = "50")]
    pub poll_ms: u64,

    /// Stop the run after this many milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,
}

/// Color argument
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum ColorArg {
    /// Auto-detect
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::unreachable)]
mod tests {
    use super::*;
    use crate::config::ColorChoice;

    #[test]
    fn test_parse_goals_command() {
        let cli = Cli::try_parse_from(["goalgen", "goals", "--project", "p.yaml", "--json"])
            .unwrap();
        match cli.command {
            Commands::Goals(args) => {
                assert_eq!(args.project, PathBuf::from("p.yaml"));
                assert!(args.json);
            }
            Commands::Run(_) => unreachable!("parsed the wrong subcommand"),
        }
    }

    #[test]
    fn test_parse_run_defaults() {
        let cli = Cli::try_parse_from(["goalgen", "run", "-p", "p.yaml"]).unwrap();
        let Commands::Run(args) = cli.command else {
            unreachable!("parsed the wrong subcommand");
        };
        assert_eq!(args.output, PathBuf::from("target/goalgen"));
        assert_eq!(args.poll_ms, 50);
        assert!(args.timeout_ms.is_none());
        assert!(args.goal.is_empty());
        assert!(args.import.is_empty());
    }

    #[test]
    fn test_parse_repeated_goals_and_imports() {
        let cli = Cli::try_parse_from([
            "goalgen", "-vv", "run", "-p", "p.yaml", "-g", "G1", "-g", "G2", "-i", "nightly",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Commands::Run(args) = cli.command else {
            unreachable!("parsed the wrong subcommand");
        };
        assert_eq!(args.goal, ["G1", "G2"]);
        assert_eq!(args.import, ["nightly"]);
    }

    #[test]
    fn test_select_conflicts_with_goal() {
        let parsed = Cli::try_parse_from([
            "goalgen", "run", "-p", "p.yaml", "--select", "s.txt", "-g", "G1",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_color_arg_conversion() {
        assert_eq!(ColorChoice::from(ColorArg::Never), ColorChoice::Never);
        assert_eq!(ColorChoice::from(ColorArg::Always), ColorChoice::Always);
        assert_eq!(ColorChoice::from(ColorArg::default()), ColorChoice::Auto);
    }
}
