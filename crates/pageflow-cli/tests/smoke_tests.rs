//! Smoke tests for the pageflow CLI
//!
//! These tests verify basic CLI functionality works correctly.

#![allow(deprecated)] // Allow deprecated Command::cargo_bin until assert_cmd is updated
#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Get a command for the pageflow binary
fn pageflow() -> Command {
    let mut cmd = Command::cargo_bin("pageflow").expect("pageflow binary should exist");
    cmd.env_remove("PAGEFLOW_BASE_URL")
        .env_remove("PAGEFLOW_REDIRECT_URL")
        .env_remove("PAGEFLOW_ACCOUNT_ID")
        .env_remove("PAGEFLOW_CONTACT_ID")
        .env_remove("PAGEFLOW_LEAD_ID")
        .env_remove("RUST_LOG");
    cmd
}

fn demo(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../demos")
        .join(name)
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_version_flag() {
    pageflow()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.4.0"));
}

#[test]
fn test_help_flag() {
    pageflow()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("plan"))
        .stdout(predicate::str::contains("scenarios"))
        .stdout(predicate::str::contains("run"));
}

#[test]
fn test_no_args_shows_help() {
    pageflow().assert().failure();
}

#[test]
fn test_run_subcommand_help() {
    pageflow()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--scenario"))
        .stdout(predicate::str::contains("--timeout-ms"));
}

// ============================================================================
// validate
// ============================================================================

#[test]
fn test_validate_demo() {
    pageflow()
        .args(["--color", "never", "validate"])
        .arg(demo("edit-account.yaml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("edit-account: 6 pages, 6 steps"))
        .stdout(predicate::str::contains("account_id"));
}

#[test]
fn test_validate_rejects_unknown_target() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.yaml");
    fs::write(
        &path,
        "name: bad\npages:\n  - id: home\n    locator: { css: main }\nsteps:\n  - action: click\n    target: ghost\n",
    )
    .unwrap();

    pageflow()
        .arg("validate")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"))
        .stderr(predicate::str::contains("ghost"));
}

#[test]
fn test_validate_missing_file() {
    pageflow()
        .args(["validate", "/nonexistent/flow.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

// ============================================================================
// plan
// ============================================================================

#[test]
fn test_plan_without_env_keeps_placeholders() {
    pageflow()
        .args(["--color", "never", "plan"])
        .arg(demo("edit-account.yaml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("1. navigate to ${base_url}/lightning/r/Account/${account_id}/view"))
        .stdout(predicate::str::contains("4. enter the new account name"));
}

#[test]
fn test_plan_with_env_interpolates() {
    pageflow()
        .args(["--color", "never", "plan"])
        .arg(demo("edit-account.yaml"))
        .arg("--env")
        .arg(demo("sandbox.env.yaml"))
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "https://example.my.salesforce.com/lightning/r/Account/001000000000001AAA/view",
        ));
}

#[test]
fn test_plan_env_override() {
    pageflow()
        .env("PAGEFLOW_ACCOUNT_ID", "001OVERRIDE")
        .args(["plan", "--format", "json"])
        .arg(demo("edit-account.yaml"))
        .arg("--env")
        .arg(demo("sandbox.env.yaml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("001OVERRIDE"))
        .stdout(predicate::str::contains("\"action\": \"set_text\""));
}

// ============================================================================
// scenarios
// ============================================================================

#[test]
fn test_scenarios_list() {
    pageflow()
        .args(["--color", "never", "scenarios"])
        .assert()
        .success()
        .stdout(predicate::str::contains("account-creation"))
        .stdout(predicate::str::contains("inline-edit-contact"))
        .stdout(predicate::str::contains("date-time-editing"));
}

#[test]
fn test_scenarios_show() {
    pageflow()
        .args(["--color", "never", "scenarios", "--show", "account-creation"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/lightning/o/Account/home"))
        .stdout(predicate::str::contains("\"Utam\""));
}

#[test]
fn test_scenarios_show_unknown() {
    pageflow()
        .args(["scenarios", "--show", "no-such-flow"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown scenario"));
}

// ============================================================================
// run
// ============================================================================

#[test]
fn test_run_missing_env_file_fails() {
    pageflow()
        .args(["run", "--scenario", "edit-account", "--env", "/nonexistent/env.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}
