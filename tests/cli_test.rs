//! CLI integration tests for `testintel-cli`.
//!
//! Grounded on the wider example ecosystem's `assert_cmd` + `tempfile`
//! fixture-project convention (one call chain fixture reused across
//! several commands, a fresh `TempDir` per test).
//!
//! Fixture call chain (`src/lib.rs` + `src/tests.rs`):
//!   process() -> validate(), process() -> transform()
//!   test_process() -> process()

use assert_cmd::Command;
use predicates::prelude::*;
use serial_test::serial;
use std::fs;
use tempfile::TempDir;

fn testintel() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("testintel-cli").expect("failed to find testintel-cli binary")
}

fn setup_project() -> TempDir {
    let dir = TempDir::new().expect("failed to create temp dir");
    let src = dir.path().join("src");
    fs::create_dir(&src).expect("failed to create src dir");

    fs::write(
        src.join("lib.rs"),
        r#"
pub fn process(input: i32) -> String {
    let valid = validate(input);
    if valid {
        transform(input)
    } else {
        String::from("invalid")
    }
}

fn validate(input: i32) -> bool {
    input > 0
}

fn transform(input: i32) -> String {
    format!("result: {}", input * 2)
}
"#,
    )
    .expect("failed to write lib.rs");

    fs::write(
        src.join("tests.rs"),
        r#"
fn test_process() {
    let result = process(5);
    assert_eq!(result, "result: 10");
}
"#,
    )
    .expect("failed to write tests.rs");

    dir
}

#[test]
fn help_output_describes_the_core() {
    testintel()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("call graphs"));
}

#[test]
fn version_output() {
    testintel()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("testintel-cli"));
}

#[test]
fn analyze_reports_one_test_candidate() {
    let dir = setup_project();

    let output = testintel()
        .args(["--json", "analyze"])
        .arg(dir.path())
        .assert()
        .success();

    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(stdout.trim())
        .unwrap_or_else(|e| panic!("invalid JSON: {e} -- raw: {stdout}"));

    assert_eq!(parsed["totalMethods"], 4);
    assert_eq!(parsed["testCandidates"], 1);
    assert!(parsed["byTestType"]["Unit"] == 1);
}

#[test]
fn build_graph_counts_nodes_and_edges() {
    let dir = setup_project();

    let output = testintel()
        .args(["--json", "build-graph"])
        .arg(dir.path())
        .assert()
        .success();

    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();

    assert_eq!(parsed["nodeCount"], 4);
    // process -> validate, process -> transform, test_process -> process
    assert_eq!(parsed["edgeCount"], 3);
}

#[test]
fn find_tests_locates_the_test_covering_validate() {
    let dir = setup_project();

    let output = testintel()
        .args(["--json", "find-tests", "validate"])
        .arg(dir.path())
        .assert()
        .success();

    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    let results = parsed["results"].as_array().expect("results array");
    assert_eq!(results.len(), 1);
    assert!(results[0]["testId"].as_str().unwrap().contains("test_process"));
    assert_eq!(results[0]["callPath"].as_array().unwrap().len(), 3);
}

#[test]
fn find_tests_fails_for_an_unmatched_pattern() {
    let dir = setup_project();

    testintel()
        .args(["find-tests", "no_such_method"])
        .arg(dir.path())
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("no_such_method"));
}

#[test]
fn trace_follows_the_test_into_production_code() {
    let dir = setup_project();

    let output = testintel()
        .args(["--json", "trace", "test_process"])
        .arg(dir.path())
        .assert()
        .success();

    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(parsed["totalCalled"], 3);
    assert_eq!(parsed["productionCalled"], 3);
}

#[test]
fn trace_of_an_unknown_test_is_test_not_found() {
    let dir = setup_project();

    testintel()
        .args(["trace", "no_such_test"])
        .arg(dir.path())
        .assert()
        .failure()
        .code(3);
}

#[test]
fn diff_impact_surfaces_the_test_reaching_the_changed_method() {
    let dir = setup_project();
    let diff_path = dir.path().join("change.diff");
    fs::write(
        &diff_path,
        "--- a/src/lib.rs\n+++ b/src/lib.rs\n@@ -11,3 +11,3 @@\n-fn validate(input: i32) -> bool {\n+pub fn validate(input: i32) -> bool {\n     input >= 0\n",
    )
    .unwrap();

    let output = testintel()
        .args(["--json", "diff-impact"])
        .arg(dir.path())
        .args(["--diff-file"])
        .arg(&diff_path)
        .assert()
        .success();

    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    let impacted = parsed["impacted"].as_array().expect("impacted array");
    assert!(!impacted.is_empty());
    assert!(impacted
        .iter()
        .any(|entry| entry["coverage"]["testId"].as_str().unwrap().contains("test_process")));
}

#[test]
fn diff_impact_on_an_empty_diff_yields_nothing() {
    let dir = setup_project();
    let diff_path = dir.path().join("empty.diff");
    fs::write(&diff_path, "").unwrap();

    let output = testintel()
        .args(["--json", "diff-impact"])
        .arg(dir.path())
        .args(["--diff-file"])
        .arg(&diff_path)
        .assert()
        .success();

    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert!(parsed["impacted"].as_array().unwrap().is_empty());
}

#[test]
#[serial]
fn cache_init_then_status_then_clear_round_trips() {
    let dir = setup_project();

    testintel()
        .args(["cache"])
        .arg(dir.path())
        .arg("init")
        .assert()
        .success();

    testintel()
        .args(["cache"])
        .arg(dir.path())
        .arg("status")
        .assert()
        .success();

    testintel()
        .args(["cache"])
        .arg(dir.path())
        .arg("clear")
        .assert()
        .success();
}

#[test]
fn missing_workspace_path_exits_with_the_missing_input_code() {
    testintel()
        .args(["analyze", "/does/not/exist/anywhere"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("workspace invalid"));
}
