//! Command handlers - extracted from main.rs for testability
//!
//! Each handler module contains the execution logic for one command, its
//! pure helpers and their tests.

pub mod plan;
pub mod run;
pub mod scenarios;
pub mod validate;

pub use plan::{execute_plan, plan_entries, PlanEntry};
pub use run::{build_script, execute_run, session_config};
pub use scenarios::execute_scenarios;
pub use validate::execute_validate;

use std::path::Path;

use pageflow::{FlowDocument, TestEnvironment};

use crate::error::CliResult;

/// Load a test environment file and apply `PAGEFLOW_*` overrides
pub fn load_environment(path: &Path) -> CliResult<TestEnvironment> {
    let env = TestEnvironment::from_file(path)?.with_env_overrides();
    env.validate()?;
    tracing::debug!(env = %env.name, base_url = %env.base(), "environment loaded");
    Ok(env)
}

/// Load and validate a flow document
pub fn load_document(path: &Path) -> CliResult<FlowDocument> {
    let doc = FlowDocument::from_file(path)?;
    tracing::debug!(name = %doc.name, steps = doc.steps.len(), "document loaded");
    Ok(doc)
}
