//! CLI command definitions using clap

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// pageflow: declarative UI-flow runner
#[derive(Parser, Debug)]
#[command(name = "pageflow")]
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
    /// Parse and check a flow document
    Validate(ValidateArgs),

    /// Print the numbered steps of a flow document
    Plan(PlanArgs),

    /// List the built-in Salesforce scenarios
    Scenarios(ScenariosArgs),

    /// Run a flow document or built-in scenario in Chromium
    Run(RunArgs),
}

/// Arguments for the validate command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Flow document (YAML or JSON)
    pub script: PathBuf,
}

/// Arguments for the plan command
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Flow document (YAML or JSON)
    pub script: PathBuf,

    /// Test environment whose values fill `${var}` placeholders
    #[arg(short, long)]
    pub env: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: PlanFormat,
}

/// Plan output format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlanFormat {
    /// Numbered list
    #[default]
    Text,
    /// JSON array
    Json,
    /// YAML list
    Yaml,
}

/// Arguments for the scenarios command
#[derive(Args, Debug)]
pub struct ScenariosArgs {
    /// Print the steps of one scenario
    #[arg(long, value_name = "NAME")]
    pub show: Option<String>,

    /// Test environment used to build the shown scenario
    #[arg(short, long)]
    pub env: Option<PathBuf>,
}

/// Arguments for the run command
#[derive(Args, Debug)]
#[command(group = clap::ArgGroup::new("flow").required(true).args(["script", "scenario"]))]
pub struct RunArgs {
    /// Flow document (YAML or JSON)
    pub script: Option<PathBuf>,

    /// Built-in scenario name instead of a document
    #[arg(long, value_name = "NAME")]
    pub scenario: Option<String>,

    /// Test environment file
    #[arg(short, long)]
    pub env: PathBuf,

    /// Element and navigation timeout in milliseconds
    #[arg(long, value_name = "N")]
    pub timeout_ms: Option<u64>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Report format
    #[arg(short, long, default_value = "text")]
    pub format: ReportFormat,

    /// Write the JSON report to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Run report format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReportFormat {
    /// Step-by-step text
    #[default]
    Text,
    /// JSON report
    Json,
}

/// Color argument
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
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
