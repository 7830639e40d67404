//! Flow script execution.
//!
//! Steps run strictly in order. The first failing step stops the script:
//! later steps are recorded as not run and the error is wrapped with the
//! step's 1-based position and description.

use crate::assertion::{assert_absent, assert_contains, assert_equal, assert_present};
use crate::capability::Region;
use crate::navigator::Navigator;
use crate::page_object::PageTree;
use crate::result::{FlowError, FlowResult};
use crate::session::Session;
use crate::step::{Action, FlowScript};
use serde::Serialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Outcome of one step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Step completed
    Passed,
    /// Step raised the script's failure
    Failed,
    /// Step was skipped after an earlier failure
    NotRun,
}

/// Per-step record of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    /// 1-based position
    pub index: usize,
    /// Step description
    pub description: String,
    /// Action name
    pub action: String,
    /// Outcome
    pub status: StepStatus,
    /// Time spent on the step
    pub duration_ms: u64,
    /// Failure message, for the failed step
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Report of one script run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Script name
    pub script: String,
    /// Whether every step passed
    pub passed: bool,
    /// Step records in script order
    pub steps: Vec<StepRecord>,
    /// Total run time
    pub duration_ms: u64,
}

impl RunReport {
    /// The failed step, if any
    #[must_use]
    pub fn failed_step(&self) -> Option<&StepRecord> {
        self.steps.iter().find(|s| s.status == StepStatus::Failed)
    }

    /// Number of steps with the given status
    #[must_use]
    pub fn count(&self, status: StepStatus) -> usize {
        self.steps.iter().filter(|s| s.status == status).count()
    }

    /// Pretty JSON rendering
    pub fn to_json(&self) -> FlowResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Text captured by `remember` steps, scoped to one run
#[derive(Debug, Clone, Default)]
struct FlowContext {
    captures: HashMap<String, String>,
}

impl FlowContext {
    fn remember(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let _ = self.captures.insert(key.into(), value.into());
    }

    fn recall(&self, key: &str) -> Option<&str> {
        self.captures.get(key).map(String::as_str)
    }
}

/// Report plus the failure that stopped the run, if any
#[derive(Debug)]
pub struct Execution {
    /// Per-step report
    pub report: RunReport,
    /// `Err` carries the first failure, wrapped with its step position
    pub outcome: FlowResult<()>,
}

/// Runs flow scripts against a session
#[derive(Debug, Clone, Copy, Default)]
pub struct FlowExecutor;

impl FlowExecutor {
    /// Run `script`, returning the report or the first failure
    pub fn run(session: &mut Session, script: &FlowScript) -> FlowResult<RunReport> {
        let Execution { report, outcome } = Self::execute(session, script);
        outcome.map(|()| report)
    }

    /// Run `script`, always producing a report
    pub fn execute(session: &mut Session, script: &FlowScript) -> Execution {
        let mut context = FlowContext::default();
        let start = Instant::now();
        let total = script.len();
        let tree = script.tree();
        let mut steps = Vec::with_capacity(total);
        let mut outcome = Ok(());

        tracing::info!(script = script.name(), steps = total, "running flow");

        for (i, step) in script.steps().iter().enumerate() {
            let index = i + 1;
            let mut record = StepRecord {
                index,
                description: step.description.clone(),
                action: step.action.name().to_string(),
                status: StepStatus::NotRun,
                duration_ms: 0,
                error: None,
            };

            if outcome.is_ok() {
                tracing::info!(step = index, total, description = %step.description, "executing step");
                let step_start = Instant::now();
                let result = perform(session, tree, &step.action, &mut context);
                record.duration_ms = millis(step_start.elapsed());

                match result {
                    Ok(()) => record.status = StepStatus::Passed,
                    Err(e) => {
                        tracing::warn!(step = index, description = %step.description, error = %e, "step failed");
                        record.status = StepStatus::Failed;
                        record.error = Some(e.to_string());
                        outcome = Err(e.at_step(index, step.description.clone()));
                    }
                }
            }

            steps.push(record);
        }

        let report = RunReport {
            script: script.name().to_string(),
            passed: outcome.is_ok(),
            steps,
            duration_ms: millis(start.elapsed()),
        };
        if report.passed {
            tracing::info!(script = script.name(), duration_ms = report.duration_ms, "flow passed");
        }
        Execution { report, outcome }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn perform(
    session: &mut Session,
    tree: &PageTree,
    action: &Action,
    context: &mut FlowContext,
) -> FlowResult<()> {
    match action {
        Action::Navigate { url, expect } => {
            let _ = Navigator::goto(session, tree, url, *expect)?;
        }
        Action::LoadPage { page } => {
            let _ = Navigator::from(session, tree, *page)?;
        }
        Action::Click { target } => {
            Region::of(tree, *target)?.clickable(tree)?.click(session, tree)?;
        }
        Action::SetText { target, text } => {
            Region::of(tree, *target)?
                .text_editable(tree)?
                .set_text(session, tree, text)?;
        }
        Action::SelectIndex { target, index } => {
            Region::of(tree, *target)?
                .selectable(tree)?
                .select_index(session, tree, *index)?;
        }
        Action::WaitForUrl { fragment } => {
            let start = Instant::now();
            if !session.wait_for_url(fragment)? {
                return Err(FlowError::PageLoadTimeout {
                    page: format!("URL containing '{fragment}'"),
                    elapsed_ms: millis(start.elapsed()),
                    timeout_ms: session.config().navigation_timeout_ms,
                });
            }
        }
        Action::AssertText { target, expected } => {
            let actual = Region::of(tree, *target)?.as_presentable().text(session, tree)?;
            assert_equal(
                actual.trim(),
                expected.as_str(),
                &format!("text of {}", tree.path(*target)),
            )?;
        }
        Action::AssertContains { target, expected } => {
            let actual = Region::of(tree, *target)?.as_presentable().text(session, tree)?;
            assert_contains(&actual, expected, &format!("text of {}", tree.path(*target)))?;
        }
        Action::AssertPresent { target } => assert_present(session, tree, *target)?,
        Action::AssertAbsent { target } => assert_absent(session, tree, *target)?,
        Action::AssertCount { target, expected } => {
            let actual = Region::of(tree, *target)?.as_presentable().count(session, tree)?;
            assert_equal(
                &actual,
                expected,
                &format!("elements matching {}", tree.path(*target)),
            )?;
        }
        Action::Remember { target, key } => {
            let text = Region::of(tree, *target)?.as_presentable().text(session, tree)?;
            tracing::debug!(%key, %text, "remembered");
            context.remember(key.clone(), text.trim());
        }
        Action::AssertUnchanged { target, key } => {
            let before = context
                .recall(key)
                .ok_or_else(|| FlowError::invalid_script(format!("nothing remembered as '{key}'")))?
                .to_string();
            let actual = Region::of(tree, *target)?.as_presentable().text(session, tree)?;
            assert_equal(
                actual.trim(),
                before.as_str(),
                &format!("{} changed since it was remembered as '{key}'", tree.path(*target)),
            )?;
        }
        Action::EnsureActive {
            indicator,
            label,
            target,
        } => {
            let current = Region::of(tree, *indicator)?.as_presentable().text(session, tree)?;
            if current.trim().to_lowercase() == label.to_lowercase() {
                tracing::debug!(%label, "already active");
            } else {
                Region::of(tree, *target)?.clickable(tree)?.click(session, tree)?;
            }
        }
    }
    Ok(())
}
