//! `plan`: print the numbered steps of a flow document.
//!
//! With `--env` placeholders are filled from the environment; without it
//! they are printed as written.

use std::collections::BTreeMap;

use pageflow::{FlowDocument, FlowScript};
use serde::Serialize;

use super::{load_document, load_environment};
use crate::commands::{PlanArgs, PlanFormat};
use crate::config::CliConfig;
use crate::error::CliResult;
use crate::output::Reporter;

/// One planned step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanEntry {
    /// 1-based position
    pub index: usize,
    /// Action name
    pub action: String,
    /// Step description
    pub description: String,
}

/// Planned steps of a compiled script
#[must_use]
pub fn plan_entries(script: &FlowScript) -> Vec<PlanEntry> {
    script
        .steps()
        .iter()
        .enumerate()
        .map(|(i, step)| PlanEntry {
            index: i + 1,
            action: step.action.name().to_string(),
            description: step.description.clone(),
        })
        .collect()
}

/// Variables mapped to their own placeholder text
fn placeholders(doc: &FlowDocument) -> CliResult<BTreeMap<String, String>> {
    Ok(doc
        .variables()?
        .into_iter()
        .map(|name| {
            let text = format!("${{{name}}}");
            (name, text)
        })
        .collect())
}

/// Render entries in the requested format
pub fn render(entries: &[PlanEntry], format: PlanFormat) -> CliResult<String> {
    Ok(match format {
        PlanFormat::Text => entries
            .iter()
            .map(|e| format!("{:>3}. {}", e.index, e.description))
            .collect::<Vec<_>>()
            .join("\n"),
        PlanFormat::Json => serde_json::to_string_pretty(entries)?,
        PlanFormat::Yaml => serde_yaml_ng::to_string(entries)?,
    })
}

/// Execute the plan command
pub fn execute_plan(config: &CliConfig, args: &PlanArgs) -> CliResult<()> {
    let doc = load_document(&args.script)?;
    let vars = match &args.env {
        Some(path) => load_environment(path)?.vars(),
        None => placeholders(&doc)?,
    };
    let script = doc.compile(&vars)?;
    let entries = plan_entries(&script);

    let reporter = Reporter::new(config.color.should_color(), config.verbosity.is_quiet());
    if args.format == PlanFormat::Text {
        reporter.header(&format!("Plan: {} ({} steps)", script.name(), entries.len()));
    }
    reporter.data(&render(&entries, args.format)?);
    Ok(())
}
