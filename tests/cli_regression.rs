// Regression tests for the demo binary: exit codes, output formats, and
// miette-rendered configuration errors.
// Requires: assert_cmd, predicates, tempfile in [dev-dependencies]

use std::fs;

use assert_cmd::Command;
use predicates::{prelude::PredicateBooleanExt, str::contains};

fn demo() -> Command {
    let mut cmd = Command::cargo_bin("bough-demo").unwrap();
    cmd.env_remove("RUST_LOG").arg("--color").arg("never");
    cmd
}

#[test]
fn faulty_cases_make_the_run_fail() {
    demo()
        .assert()
        .code(1)
        .stdout(contains("[FAIL] arithmetic › division by zero"))
        .stdout(contains("SIGNALED"))
        .stdout(contains("Summary:"));
}

#[test]
fn excluding_faulty_cases_makes_the_run_pass() {
    demo()
        .args(["--exclude", "faulty"])
        .assert()
        .success()
        .stdout(contains("[PASS] arithmetic › division (pass 2,"))
        .stdout(contains("- strings › joining (TestCase, tag)"))
        .stdout(contains("[FAIL]").not());
}

#[test]
fn run_only_tags_select_test_cases() {
    demo()
        .args(["--tags", "faulty"])
        .assert()
        .code(1)
        .stdout(contains("- arithmetic › division (TestCase, tag)"))
        .stdout(contains("- strings › trimming (TestCase, tag)"))
        .stdout(contains("Summary: 4 passes"));
}

#[test]
fn json_format_writes_a_single_document() {
    let output = demo()
        .args(["--exclude", "faulty", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["summary"]["failed"], 0);
    assert_eq!(value["skipped"].as_array().map(Vec::len), Some(2));
}

#[test]
fn invalid_tag_is_rendered_as_a_diagnostic() {
    demo()
        .args(["--tags", "not a tag"])
        .assert()
        .code(2)
        .stderr(contains("bough::tags::invalid").or(contains("invalid tag")));
}

#[test]
fn broken_config_file_is_a_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("bough.yaml");
    fs::write(&config, "exclude: [unterminated\n").unwrap();

    demo()
        .arg("--config")
        .arg(&config)
        .assert()
        .code(2)
        .stderr(contains("bough::config").or(contains("help:")));
}

#[test]
fn config_file_and_flags_are_layered() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("bough.yaml");
    let dot = dir.path().join("tree.dot");
    fs::write(&config, "exclude: [faulty]\n").unwrap();

    demo()
        .arg("--config")
        .arg(&config)
        .arg("--dot")
        .arg(&dot)
        .assert()
        .success();
    let graph = fs::read_to_string(&dot).unwrap();
    assert!(graph.contains("SkippedByTag"));
}
