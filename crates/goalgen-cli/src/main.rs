//! goalgen CLI: coverage-goal-driven test generation
//!
//! ## Usage
//!
//! ```bash
//! goalgen goals --project checkout.yaml            # List coverage goals
//! goalgen run --project checkout.yaml -g G1 -g G2  # Generate for two goals
//! goalgen run -p checkout.yaml --select goals.txt -i nightly --output out/
//! ```

use clap::Parser;
use goalgen_cli::{
    logging::init_tracing, run_generation, run_goals, Cli, CliConfig, CliResult, Commands,
    Verbosity,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();

    let config = build_config(&cli);
    init_tracing(config.verbosity);

    match cli.command {
        Commands::Goals(args) => run_goals(&args),
        Commands::Run(args) => run_generation(&config, &args).map(|_| ()),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.verbose, cli.quiet))
        .with_color(cli.color.into())
}
