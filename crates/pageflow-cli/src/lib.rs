//! pageflow CLI library
//!
//! Command-line interface for validating, planning and running pageflow
//! flow documents and the built-in Salesforce scenarios.

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::format_push_string)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod config;
mod error;
pub mod handlers;
mod output;

pub use commands::{
    Cli, ColorArg, Commands, PlanArgs, PlanFormat, ReportFormat, RunArgs, ScenariosArgs,
    ValidateArgs,
};
pub use config::{init_tracing, CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::Reporter;
