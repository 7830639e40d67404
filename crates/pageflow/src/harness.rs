//! Test harness for running suites of flow scripts.
//!
//! Every case gets a fresh session: the suite's setup script runs first
//! (a login flow, typically), then the case script. The session is closed
//! exactly once per case whatever the outcome.

use std::time::{Duration, Instant};

use crate::config::SessionConfig;
use crate::executor::{Execution, FlowExecutor, RunReport};
use crate::result::FlowError;
use crate::runtime::Launcher;
use crate::session::Session;
use crate::step::FlowScript;

/// A test suite containing multiple cases
#[derive(Debug, Clone)]
pub struct TestSuite {
    /// Suite name
    pub name: String,
    /// Script run before each case, in the case's session
    pub setup: Option<FlowScript>,
    /// Cases in this suite
    pub cases: Vec<TestCase>,
}

impl TestSuite {
    /// Create a new test suite
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            setup: None,
            cases: Vec::new(),
        }
    }

    /// Set the per-case setup script
    #[must_use]
    pub fn with_setup(mut self, setup: FlowScript) -> Self {
        self.setup = Some(setup);
        self
    }

    /// Add a test case
    pub fn add_case(&mut self, case: TestCase) {
        self.cases.push(case);
    }

    /// Add a test case, builder style
    #[must_use]
    pub fn case(mut self, case: TestCase) -> Self {
        self.cases.push(case);
        self
    }

    /// Get the number of cases
    #[must_use]
    pub fn case_count(&self) -> usize {
        self.cases.len()
    }
}

/// A single test case
#[derive(Debug, Clone)]
pub struct TestCase {
    /// Case name
    pub name: String,
    /// Script to run
    pub script: FlowScript,
}

impl TestCase {
    /// Create a new test case
    #[must_use]
    pub fn new(name: impl Into<String>, script: FlowScript) -> Self {
        Self {
            name: name.into(),
            script,
        }
    }
}

/// Result of running a single case
#[derive(Debug, Clone)]
pub struct TestResult {
    /// Case name
    pub name: String,
    /// Whether the case passed
    pub passed: bool,
    /// Error message if failed
    pub error: Option<String>,
    /// Case duration, session start to close
    pub duration: Duration,
    /// Report of the case script; `None` when setup or session start failed
    pub report: Option<RunReport>,
}

impl TestResult {
    /// Create a passing result
    #[must_use]
    pub fn pass(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: true,
            error: None,
            duration: Duration::ZERO,
            report: None,
        }
    }

    /// Create a failing result
    #[must_use]
    pub fn fail(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: false,
            error: Some(error.into()),
            duration: Duration::ZERO,
            report: None,
        }
    }

    /// Set duration
    #[must_use]
    pub const fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Attach the script report
    #[must_use]
    pub fn with_report(mut self, report: RunReport) -> Self {
        self.report = Some(report);
        self
    }
}

/// Results from running a test suite
#[derive(Debug, Clone)]
pub struct SuiteResults {
    /// Suite name
    pub suite_name: String,
    /// Individual case results
    pub results: Vec<TestResult>,
    /// Total duration
    pub duration: Duration,
}

impl SuiteResults {
    /// Check if all cases passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(|r| r.passed)
    }

    /// Count passed cases
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }

    /// Count failed cases
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| !r.passed).count()
    }

    /// Get total case count
    #[must_use]
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// Get failed cases
    #[must_use]
    pub fn failures(&self) -> Vec<&TestResult> {
        self.results.iter().filter(|r| !r.passed).collect()
    }
}

/// Test harness for running suites
#[derive(Debug, Clone, Default)]
pub struct TestHarness {
    /// Whether to stop on first failure
    pub fail_fast: bool,
    /// Configuration each case session is opened with
    pub session_config: SessionConfig,
    /// Base URL relative navigations are joined to
    pub base_url: Option<String>,
}

impl TestHarness {
    /// Create a new test harness
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable fail-fast mode
    #[must_use]
    pub const fn with_fail_fast(mut self) -> Self {
        self.fail_fast = true;
        self
    }

    /// Set the session configuration
    #[must_use]
    pub fn with_session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Set the base URL for every case session
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Run a test suite, one session per case
    #[must_use]
    pub fn run(&self, suite: &TestSuite, launcher: &dyn Launcher) -> SuiteResults {
        let start = Instant::now();
        let mut results = Vec::with_capacity(suite.cases.len());

        tracing::info!(suite = %suite.name, cases = suite.cases.len(), "running suite");

        for case in &suite.cases {
            let result = self.run_case(suite.setup.as_ref(), case, launcher);
            let failed = !result.passed;
            results.push(result);
            if failed && self.fail_fast {
                tracing::warn!(suite = %suite.name, case = %case.name, "fail-fast: stopping suite");
                break;
            }
        }

        SuiteResults {
            suite_name: suite.name.clone(),
            results,
            duration: start.elapsed(),
        }
    }

    fn run_case(
        &self,
        setup: Option<&FlowScript>,
        case: &TestCase,
        launcher: &dyn Launcher,
    ) -> TestResult {
        let start = Instant::now();
        let mut session = match Session::open(self.session_config.clone(), launcher) {
            Ok(session) => session,
            Err(e) => {
                return TestResult::fail(&case.name, e.to_string()).with_duration(start.elapsed())
            }
        };
        if let Some(base_url) = &self.base_url {
            session = session.with_base_url(base_url.clone());
        }

        let outcome = Self::run_scripts(&mut session, setup, &case.script);
        let closed = session.close();
        let duration = start.elapsed();

        let (report, error) = match outcome {
            Ok(Execution { report, outcome }) => (Some(report), outcome.err()),
            Err(e) => (None, Some(e)),
        };
        let error = error.or_else(|| closed.err());

        let mut result = match error {
            None => TestResult::pass(&case.name),
            Some(e) => {
                tracing::warn!(case = %case.name, error = %e, "case failed");
                TestResult::fail(&case.name, e.to_string())
            }
        }
        .with_duration(duration);
        result.report = report;
        result
    }

    /// Run setup then the case script; a setup failure skips the case script.
    fn run_scripts(
        session: &mut Session,
        setup: Option<&FlowScript>,
        script: &FlowScript,
    ) -> Result<Execution, FlowError> {
        if let Some(setup) = setup {
            FlowExecutor::run(session, setup).map_err(|e| FlowError::Setup {
                script: setup.name().to_string(),
                source: Box::new(e),
            })?;
        }
        Ok(FlowExecutor::execute(session, script))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::locator::Locator;
    use crate::mock::{MockElement, MockLauncher, MockRoute, MockSite};
    use crate::page_object::{PageTree, RegionKind};

    fn config() -> SessionConfig {
        SessionConfig::new()
            .element_timeout_ms(20)
            .navigation_timeout_ms(20)
            .poll_interval_ms(1)
    }

    fn site() -> MockSite {
        MockSite::new().route(
            MockRoute::new("/home")
                .element("main", MockElement::new())
                .element("main >> h1", MockElement::with_text("Home")),
        )
    }

    fn script(expected: &str) -> FlowScript {
        let mut tree = PageTree::new();
        let page = tree.root("Home", Locator::new("main"));
        let title = tree.child(page, "title", Locator::new("h1"), RegionKind::Text);
        FlowScript::builder(format!("title is {expected}"), tree)
            .navigate("https://example.test/home", page)
            .assert_text(title, expected)
            .build()
            .unwrap()
    }

    mod suite_tests {
        use super::*;

        #[test]
        fn test_suite_builder() {
            let suite = TestSuite::new("smoke")
                .case(TestCase::new("a", script("Home")))
                .case(TestCase::new("b", script("Home")));
            assert_eq!(suite.case_count(), 2);
            assert!(suite.setup.is_none());
        }

        #[test]
        fn test_result_constructors() {
            let pass = TestResult::pass("ok");
            assert!(pass.passed);
            assert!(pass.error.is_none());

            let fail = TestResult::fail("bad", "boom").with_duration(Duration::from_millis(5));
            assert!(!fail.passed);
            assert_eq!(fail.error.as_deref(), Some("boom"));
            assert_eq!(fail.duration, Duration::from_millis(5));
        }
    }

    mod harness_tests {
        use super::*;

        #[test]
        fn test_each_case_gets_its_own_session() {
            let launcher = MockLauncher::new(site());
            let suite = TestSuite::new("smoke")
                .case(TestCase::new("first", script("Home")))
                .case(TestCase::new("second", script("Home")));

            let results = TestHarness::new().with_session_config(config()).run(&suite, &launcher);

            assert!(results.all_passed());
            assert_eq!(results.total(), 2);
            assert_eq!(launcher.launch_count(), 2);
            assert_eq!(launcher.quit_count(), 2);
            assert!(results.results[0].report.is_some());
        }

        #[test]
        fn test_failures_are_collected() {
            let launcher = MockLauncher::new(site());
            let suite = TestSuite::new("mixed")
                .case(TestCase::new("bad", script("Away")))
                .case(TestCase::new("good", script("Home")));

            let results = TestHarness::new().with_session_config(config()).run(&suite, &launcher);

            assert_eq!(results.passed_count(), 1);
            assert_eq!(results.failed_count(), 1);
            let failure = results.failures()[0];
            assert_eq!(failure.name, "bad");
            assert!(failure.error.as_deref().unwrap().contains("Step 2"));
            assert_eq!(launcher.quit_count(), 2);
        }

        #[test]
        fn test_fail_fast_stops_scheduling() {
            let launcher = MockLauncher::new(site());
            let suite = TestSuite::new("ff")
                .case(TestCase::new("bad", script("Away")))
                .case(TestCase::new("never", script("Home")));

            let results = TestHarness::new()
                .with_fail_fast()
                .with_session_config(config())
                .run(&suite, &launcher);

            assert_eq!(results.total(), 1);
            assert_eq!(launcher.launch_count(), 1);
        }

        #[test]
        fn test_setup_failure_skips_case_script() {
            let launcher = MockLauncher::new(site());
            let suite = TestSuite::new("with setup")
                .with_setup(script("Login"))
                .case(TestCase::new("case", script("Home")));

            let results = TestHarness::new().with_session_config(config()).run(&suite, &launcher);

            let result = &results.results[0];
            assert!(!result.passed);
            assert!(result.report.is_none());
            assert!(result.error.as_deref().unwrap().contains("Setup 'title is Login'"));
            assert_eq!(launcher.quit_count(), 1);
        }

        #[test]
        fn test_setup_failure_keeps_step_and_assertion() {
            let launcher = MockLauncher::new(site());
            let mut session = Session::open(config(), &launcher).unwrap();
            let setup = script("Login");

            let err = TestHarness::run_scripts(&mut session, Some(&setup), &script("Home"))
                .unwrap_err();
            session.close().unwrap();

            assert!(matches!(err, FlowError::Setup { .. }));
            assert_eq!(err.step_index(), Some(2));
            assert!(err.is_assertion());
        }

        #[test]
        fn test_launch_failure_is_reported() {
            let launcher = MockLauncher::failing("no browser");
            let suite = TestSuite::new("down").case(TestCase::new("case", script("Home")));

            let results = TestHarness::new().with_session_config(config()).run(&suite, &launcher);

            assert!(!results.all_passed());
            assert!(results.results[0].error.as_deref().unwrap().contains("no browser"));
        }
    }
}
