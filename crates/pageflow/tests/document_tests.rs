//! Flow documents: loading, interpolation and execution.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::PathBuf;

use pageflow::mock::{MockCall, MockEffect, MockElement, MockLauncher, MockRoute, MockSite};
use pageflow::{with_session, FlowDocument, FlowError, FlowExecutor, SessionConfig, TestEnvironment};

const MODAL: &str = "records-record-action-wrapper";

fn demo(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../demos")
        .join(name)
}

fn env() -> TestEnvironment {
    TestEnvironment::from_file(demo("sandbox.env.yaml")).unwrap()
}

#[test]
fn test_demo_document_validates() {
    let doc = FlowDocument::from_file(demo("edit-account.yaml")).unwrap();
    assert_eq!(doc.name, "edit-account");
    assert_eq!(doc.steps.len(), 6);

    let vars: Vec<String> = doc.variables().unwrap().into_iter().collect();
    assert_eq!(vars, vec!["account_id".to_string(), "base_url".to_string()]);
    assert!(doc.missing_variables(&env().vars()).unwrap().is_empty());
}

#[test]
fn test_compile_fills_placeholders() {
    let doc = FlowDocument::from_file(demo("edit-account.yaml")).unwrap();
    let script = doc.compile(&env().vars()).unwrap();

    assert_eq!(script.len(), 6);
    assert_eq!(
        script.steps()[0].description,
        "navigate to https://example.my.salesforce.com/lightning/r/Account/001000000000001AAA/view and expect home"
    );
    assert_eq!(script.steps()[3].description, "enter the new account name");
}

#[test]
fn test_missing_variable_is_a_config_error() {
    let doc = FlowDocument::from_file(demo("edit-account.yaml")).unwrap();
    let bare = TestEnvironment::new("bare", "https://example.my.salesforce.com");

    assert_eq!(
        doc.missing_variables(&bare.vars()).unwrap(),
        vec!["account_id".to_string()]
    );
    let err = doc.compile(&bare.vars()).unwrap_err();
    assert!(matches!(err, FlowError::Config { .. }));
}

#[test]
fn test_compiled_document_runs_on_mock() {
    let site = MockSite::new().route(
        MockRoute::new("/lightning/r/Account/001000000000001AAA/view")
            .element("one-record-home-flexipage2", MockElement::new())
            .element(
                "button:has-text(\"Edit\")",
                MockElement::new().on_click(MockEffect::Show(MODAL.into())),
            )
            .element(MODAL, MockElement::hidden())
            .element("input:nth(0)", MockElement::new())
            .element(
                "button:has-text(\"Save\")",
                MockElement::new().on_click(MockEffect::Remove(MODAL.into())),
            ),
    );
    let launcher = MockLauncher::new(site);
    let script = FlowDocument::from_file(demo("edit-account.yaml"))
        .unwrap()
        .compile(&env().vars())
        .unwrap();
    let config = SessionConfig::new()
        .element_timeout_ms(40)
        .navigation_timeout_ms(40)
        .poll_interval_ms(2);

    let report = with_session(config, &launcher, |session| FlowExecutor::run(session, &script))
        .unwrap();

    assert!(report.passed);
    let typed: Vec<MockCall> = launcher
        .interactions()
        .into_iter()
        .filter(|c| matches!(c, MockCall::SetText { .. }))
        .collect();
    assert!(matches!(&typed[..], [MockCall::SetText { text, .. }] if text == "Utam"));
    assert_eq!(launcher.quit_count(), 1);
}

#[test]
fn test_json_report_lists_every_step() {
    let launcher = MockLauncher::new(MockSite::new());
    let script = FlowDocument::from_file(demo("edit-account.yaml"))
        .unwrap()
        .compile(&env().vars())
        .unwrap();
    let config = SessionConfig::new()
        .navigation_timeout_ms(10)
        .poll_interval_ms(1);

    let report = with_session(config, &launcher, |session| {
        Ok(FlowExecutor::execute(session, &script).report)
    })
    .unwrap();

    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["passed"], false);
    assert_eq!(json["steps"].as_array().unwrap().len(), 6);
    assert_eq!(json["steps"][0]["status"], "failed");
    assert_eq!(json["steps"][5]["status"], "not_run");
}
