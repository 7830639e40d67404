//! pageflow CLI: validate, plan and run declarative UI flows
//!
//! ## Usage
//!
//! ```bash
//! pageflow validate flows/edit-account.yaml
//! pageflow plan flows/edit-account.yaml --env sandbox.yaml
//! pageflow scenarios --show edit-account
//! pageflow run --scenario edit-account --env sandbox.yaml --format json
//! ```

use clap::Parser;
use pageflow_cli::{
    handlers::{self, execute_plan, execute_scenarios, execute_validate},
    init_tracing, Cli, CliConfig, CliResult, ColorChoice, Commands, RunArgs, Verbosity,
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
    console::set_colors_enabled(config.color.should_color());

    match cli.command {
        Commands::Validate(args) => execute_validate(&config, &args),
        Commands::Plan(args) => execute_plan(&config, &args),
        Commands::Scenarios(args) => execute_scenarios(&config, &args),
        Commands::Run(args) => run_flow(&config, &args),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let verbosity = Verbosity::from_flags(cli.quiet, cli.verbose);
    let color: ColorChoice = cli.color.into();
    CliConfig::new().with_verbosity(verbosity).with_color(color)
}

fn run_flow(config: &CliConfig, args: &RunArgs) -> CliResult<()> {
    let launcher = handlers::run::launcher()?;
    handlers::execute_run(config, args, launcher.as_ref())?;
    Ok(())
}
