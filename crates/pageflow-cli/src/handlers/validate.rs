//! `validate`: parse and check a flow document.

use pageflow::FlowDocument;

use super::load_document;
use crate::commands::ValidateArgs;
use crate::config::CliConfig;
use crate::error::CliResult;
use crate::output::Reporter;

/// One-line summary of a valid document
pub fn summarize(doc: &FlowDocument) -> CliResult<String> {
    let vars = doc.variables()?;
    let mut summary = format!(
        "{}: {} pages, {} steps",
        doc.name,
        doc.pages.len(),
        doc.steps.len()
    );
    if !vars.is_empty() {
        let names: Vec<String> = vars.into_iter().collect();
        summary.push_str(&format!(", variables: {}", names.join(", ")));
    }
    Ok(summary)
}

/// Execute the validate command
pub fn execute_validate(config: &CliConfig, args: &ValidateArgs) -> CliResult<()> {
    let doc = load_document(&args.script)?;
    let reporter = Reporter::new(config.color.should_color(), config.verbosity.is_quiet());
    reporter.success(&summarize(&doc)?);
    if config.verbosity.is_verbose() && !doc.description.is_empty() {
        reporter.line(&doc.description);
    }
    Ok(())
}
