//! Output formatting

use console::{style, Style, Term};
use pageflow::{RunReport, StepStatus};

/// Console reporter for command output
#[derive(Debug)]
pub struct Reporter {
    term: Term,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl Reporter {
    /// Create a new reporter writing to stdout
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stdout(),
            use_color,
            quiet,
        }
    }

    /// Print a plain line
    pub fn line(&self, message: &str) {
        if self.quiet {
            return;
        }
        let _ = self.term.write_line(message);
    }

    /// Print data output; shown even in quiet mode
    pub fn data(&self, message: &str) {
        let _ = self.term.write_line(message);
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }

        let prefix = if self.use_color {
            style("✓").green().bold().to_string()
        } else {
            "PASS".to_string()
        };

        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print a failure message
    pub fn failure(&self, message: &str) {
        // Always print failures, even in quiet mode
        let prefix = if self.use_color {
            style("✗").red().bold().to_string()
        } else {
            "FAIL".to_string()
        };

        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        if self.quiet {
            return;
        }

        let styled = if self.use_color {
            style(title).bold().underlined().to_string()
        } else {
            format!("=== {title} ===")
        };

        let _ = self.term.write_line(&styled);
    }

    /// Print a run report step by step, then the summary
    pub fn report(&self, report: &RunReport) {
        self.header(&format!("Flow: {}", report.script));
        for step in &report.steps {
            let line = format!("{:>3}. {}", step.index, step.description);
            match step.status {
                StepStatus::Passed => self.success(&format!("{line} ({}ms)", step.duration_ms)),
                StepStatus::Failed => {
                    self.failure(&format!("{line} ({}ms)", step.duration_ms));
                    if let Some(error) = &step.error {
                        let _ = self.term.write_line(&format!("       {error}"));
                    }
                }
                StepStatus::NotRun => self.line(&format!("SKIP {line}")),
            }
        }
        self.summary(report);
    }

    /// Print the pass/fail summary line
    pub fn summary(&self, report: &RunReport) {
        let passed = report.count(StepStatus::Passed);
        let failed = report.count(StepStatus::Failed);
        let not_run = report.count(StepStatus::NotRun);
        if self.quiet && failed == 0 {
            return;
        }

        let status = if failed > 0 { "FAILED" } else { "PASSED" };
        let status = if self.use_color {
            let status_style = if failed > 0 {
                Style::new().red().bold()
            } else {
                Style::new().green().bold()
            };
            status_style.apply_to(status).to_string()
        } else {
            status.to_string()
        };

        let _ = self.term.write_line(&format!(
            "{status} {} steps in {}ms ({passed} passed, {failed} failed, {not_run} not run)",
            report.steps.len(),
            report.duration_ms
        ));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use pageflow::StepRecord;

    fn record(index: usize, status: StepStatus) -> StepRecord {
        StepRecord {
            index,
            description: format!("step {index}"),
            action: "click".into(),
            status,
            duration_ms: 1,
            error: (status == StepStatus::Failed).then(|| "boom".to_string()),
        }
    }

    fn report() -> RunReport {
        RunReport {
            script: "demo".into(),
            passed: false,
            steps: vec![
                record(1, StepStatus::Passed),
                record(2, StepStatus::Failed),
                record(3, StepStatus::NotRun),
            ],
            duration_ms: 3,
        }
    }

    #[test]
    fn test_default_reporter() {
        let reporter = Reporter::default();
        assert!(reporter.use_color);
        assert!(!reporter.quiet);
    }

    #[test]
    fn test_messages_do_not_panic() {
        let reporter = Reporter::new(false, false);
        reporter.header("title");
        reporter.success("ok");
        reporter.failure("bad");
        reporter.line("plain");
        reporter.data("data");
    }

    #[test]
    fn test_report_rendering() {
        Reporter::new(false, false).report(&report());
        Reporter::new(true, true).report(&report());
    }
}
