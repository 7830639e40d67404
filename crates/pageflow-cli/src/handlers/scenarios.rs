//! `scenarios`: list the built-in Salesforce flows.

use pageflow::salesforce::{find_scenario, SCENARIOS};
use pageflow::TestEnvironment;

use super::load_environment;
use super::plan::{plan_entries, render};
use crate::commands::{PlanFormat, ScenariosArgs};
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::Reporter;

/// Environment with placeholder ids, for showing flows without an org
#[must_use]
pub fn example_environment() -> TestEnvironment {
    TestEnvironment::new("example", "https://example.lightning.force.com")
        .with_account_id("<account_id>")
        .with_contact_id("<contact_id>")
        .with_lead_id("<lead_id>")
        .with_var("contact_name", "<contact_name>")
}

/// Catalog listing, one scenario per line
#[must_use]
pub fn catalog() -> Vec<String> {
    let width = SCENARIOS.iter().map(|s| s.name.len()).max().unwrap_or(0);
    SCENARIOS
        .iter()
        .map(|s| {
            let object = s.record_type.map_or_else(String::new, |t| format!("[{t}] "));
            format!("{:<width$}  {object}{}", s.name, s.summary)
        })
        .collect()
}

/// Execute the scenarios command
pub fn execute_scenarios(config: &CliConfig, args: &ScenariosArgs) -> CliResult<()> {
    let reporter = Reporter::new(config.color.should_color(), config.verbosity.is_quiet());

    let Some(name) = &args.show else {
        reporter.header(&format!("Scenarios ({})", SCENARIOS.len()));
        for line in catalog() {
            reporter.data(&line);
        }
        return Ok(());
    };

    let entry = find_scenario(name)
        .ok_or_else(|| CliError::invalid_argument(format!("unknown scenario '{name}'")))?;
    let env = match &args.env {
        Some(path) => load_environment(path)?,
        None => example_environment(),
    };
    let script = (entry.build)(&env)?;

    reporter.header(&format!("{}: {}", entry.name, entry.summary));
    reporter.data(&render(&plan_entries(&script), PlanFormat::Text)?);
    Ok(())
}
