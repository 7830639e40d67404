//! `run`: execute a flow document or built-in scenario.

use std::fs;

use pageflow::salesforce::find_scenario;
use pageflow::{
    with_session, Execution, FlowExecutor, FlowScript, Launcher, RunReport, SessionConfig,
    TestEnvironment,
};

use super::{load_document, load_environment};
use crate::commands::{ReportFormat, RunArgs};
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::Reporter;

/// Session configuration for the run's flags
#[must_use]
pub fn session_config(args: &RunArgs) -> SessionConfig {
    let mut config = SessionConfig::new().headless(!args.headed);
    if let Some(timeout_ms) = args.timeout_ms {
        config = config
            .element_timeout_ms(timeout_ms)
            .navigation_timeout_ms(timeout_ms);
    }
    config
}

/// Compile the document or build the scenario the flags name
pub fn build_script(args: &RunArgs, env: &TestEnvironment) -> CliResult<FlowScript> {
    match (&args.script, &args.scenario) {
        (Some(path), None) => {
            let doc = load_document(path)?;
            let vars = env.vars();
            let missing = doc.missing_variables(&vars)?;
            if !missing.is_empty() {
                return Err(CliError::config(format!(
                    "environment '{}' does not define: {}",
                    env.name,
                    missing.join(", ")
                )));
            }
            Ok(doc.compile(&vars)?)
        }
        (None, Some(name)) => {
            let entry = find_scenario(name)
                .ok_or_else(|| CliError::invalid_argument(format!("unknown scenario '{name}'")))?;
            Ok((entry.build)(env)?)
        }
        _ => Err(CliError::invalid_argument(
            "give either a flow document or --scenario",
        )),
    }
}

/// Run the flow with `launcher`, print the report and write `--output`.
///
/// A failed flow still prints and writes its report before the error is
/// returned.
pub fn execute_run(
    config: &CliConfig,
    args: &RunArgs,
    launcher: &dyn Launcher,
) -> CliResult<RunReport> {
    let env = load_environment(&args.env)?;
    let script = build_script(args, &env)?;
    tracing::info!(flow = script.name(), env = %env.name, steps = script.len(), "starting run");

    let Execution { report, outcome } = with_session(session_config(args), launcher, |session| {
        Ok(FlowExecutor::execute(session, &script))
    })?;

    let reporter = Reporter::new(config.color.should_color(), config.verbosity.is_quiet());
    match args.format {
        ReportFormat::Text => reporter.report(&report),
        ReportFormat::Json => reporter.data(&report.to_json()?),
    }
    if let Some(path) = &args.output {
        fs::write(path, report.to_json()?)?;
        tracing::info!(path = %path.display(), "report written");
    }

    match outcome {
        Ok(()) => Ok(report),
        Err(e) => Err(CliError::flow_failed(format!("{}: {e}", report.script))),
    }
}

/// Chromium launcher for the `run` command
#[cfg(feature = "browser")]
pub fn launcher() -> CliResult<Box<dyn Launcher>> {
    Ok(Box::new(pageflow::ChromiumLauncher::new()))
}

/// Chromium launcher for the `run` command
#[cfg(not(feature = "browser"))]
pub fn launcher() -> CliResult<Box<dyn Launcher>> {
    Err(CliError::config(
        "the run command needs Chromium support; rebuild with `--features browser`",
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use pageflow::mock::{MockElement, MockLauncher, MockRoute, MockSite};
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const DOC: &str = r"
name: greeting
pages:
  - id: page
    locator: { css: main }
    kind: page
  - id: title
    parent: page
    locator: { css: h1 }
    kind: text
steps:
  - action: navigate
    url: ${base_url}/hello
    expect: page
  - action: assert_text
    target: title
    expected: ${greeting}
";

    struct Fixture {
        dir: TempDir,
        script: PathBuf,
        env: PathBuf,
    }

    fn fixture(greeting: Option<&str>) -> Fixture {
        let dir = TempDir::new().unwrap();
        let script = dir.path().join("flow.yaml");
        fs::write(&script, DOC).unwrap();

        let env = dir.path().join("env.yaml");
        let mut file = fs::File::create(&env).unwrap();
        writeln!(file, "name: test\nbase_url: https://site.test").unwrap();
        if let Some(greeting) = greeting {
            writeln!(file, "extra:\n  greeting: {greeting}").unwrap();
        }
        Fixture { dir, script, env }
    }

    fn args(fixture: &Fixture) -> RunArgs {
        RunArgs {
            script: Some(fixture.script.clone()),
            scenario: None,
            env: fixture.env.clone(),
            timeout_ms: Some(30),
            headed: false,
            format: ReportFormat::Text,
            output: Some(fixture.dir.path().join("report.json")),
        }
    }

    fn launcher() -> MockLauncher {
        MockLauncher::new(
            MockSite::new().route(
                MockRoute::new("/hello")
                    .element("main", MockElement::new())
                    .element("main >> h1", MockElement::with_text("Hello")),
            ),
        )
    }

    fn quiet() -> CliConfig {
        CliConfig::new().with_verbosity(crate::config::Verbosity::Quiet)
    }

    #[test]
    fn test_session_config_from_flags() {
        let fixture = fixture(None);
        let mut run_args = args(&fixture);
        run_args.headed = true;
        let config = session_config(&run_args);
        assert!(!config.headless);
        assert_eq!(config.element_timeout_ms, 30);
        assert_eq!(config.navigation_timeout_ms, 30);
    }

    #[test]
    fn test_missing_variable_is_reported_before_launch() {
        let fixture = fixture(None);
        let mock = launcher();
        let err = execute_run(&quiet(), &args(&fixture), &mock).unwrap_err();
        assert!(err.to_string().contains("greeting"));
        assert_eq!(mock.launch_count(), 0);
    }

    #[test]
    fn test_passing_run_writes_report() {
        let fixture = fixture(Some("Hello"));
        let mock = launcher();
        let report = execute_run(&quiet(), &args(&fixture), &mock).unwrap();
        assert!(report.passed);
        assert_eq!(mock.quit_count(), 1);

        let written = fs::read_to_string(fixture.dir.path().join("report.json")).unwrap();
        assert!(written.contains("\"passed\": true"));
    }

    #[test]
    fn test_failing_run_is_an_error_with_report() {
        let fixture = fixture(Some("Goodbye"));
        let mock = launcher();
        let err = execute_run(&quiet(), &args(&fixture), &mock).unwrap_err();
        assert!(matches!(err, CliError::FlowFailed { .. }));
        assert!(err.to_string().contains("Step 2"));
        assert_eq!(mock.quit_count(), 1);

        let written = fs::read_to_string(fixture.dir.path().join("report.json")).unwrap();
        assert!(written.contains("\"passed\": false"));
    }

    #[test]
    fn test_scenario_by_name() {
        let fixture = fixture(None);
        let mut run_args = args(&fixture);
        run_args.script = None;
        run_args.scenario = Some("lead-list-view".into());
        let env = load_environment(&fixture.env).unwrap();
        let script = build_script(&run_args, &env).unwrap();
        assert_eq!(script.name(), "lead-list-view");

        run_args.scenario = Some("nope".into());
        assert!(build_script(&run_args, &env).is_err());
    }
}
