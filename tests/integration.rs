//! End-to-end integration tests for the harness CLI
//!
//! These tests run the real `harness` binary against fixture directories,
//! using the `mock_target` binary as the program under test.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{Duration, Instant};

/// Test context with a scratch fixture directory
struct TestContext {
    /// Holds the scratch directory alive for the test's duration
    temp: tempfile::TempDir,
    /// Fixture directory handed to the harness
    suite_dir: PathBuf,
    /// Isolated XDG_CONFIG_HOME so a user config never leaks in
    config_home: PathBuf,
}

impl TestContext {
    fn new() -> Self {
        let temp = tempfile::tempdir().expect("Failed to create temp dir");
        let suite_dir = temp.path().join("suite");
        let config_home = temp.path().join("config");
        fs::create_dir_all(&suite_dir).expect("Failed to create suite dir");
        fs::create_dir_all(&config_home).expect("Failed to create config dir");

        Self {
            temp,
            suite_dir,
            config_home,
        }
    }

    /// Write a fixture pair; `None` leaves the expected file out
    fn fixture(&self, id: &str, input: &str, expected: Option<&str>) {
        fs::write(self.suite_dir.join(format!("{id}.input")), input).unwrap();
        if let Some(expected) = expected {
            fs::write(self.suite_dir.join(format!("{id}.output")), expected).unwrap();
        }
    }

    /// `harness run <mock_target> --dir <suite> [extra] -- <mode>`
    fn run_mock(&self, mode: &str, extra: &[&str]) -> HarnessOutput {
        let mut args = vec!["run", mock_target(), "--dir"];
        let dir = self.suite_dir.to_str().unwrap().to_string();
        args.push(&dir);
        args.extend_from_slice(extra);
        args.push("--");
        args.push(mode);
        self.harness(&args)
    }

    fn harness(&self, args: &[&str]) -> HarnessOutput {
        let output = Command::new(env!("CARGO_BIN_EXE_harness"))
            .args(args)
            .env("XDG_CONFIG_HOME", &self.config_home)
            .env("HOME", self.temp.path())
            .env_remove("RUST_LOG")
            .output()
            .expect("Failed to run harness");
        HarnessOutput::from(output)
    }
}

struct HarnessOutput {
    code: Option<i32>,
    stdout: String,
    stderr: String,
}

impl From<Output> for HarnessOutput {
    fn from(output: Output) -> Self {
        Self {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

fn mock_target() -> &'static str {
    env!("CARGO_BIN_EXE_mock_target")
}

fn bundled_fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

#[test]
fn test_bundled_sum_suite_passes() {
    let ctx = TestContext::new();
    let dir = bundled_fixtures().join("sum");
    let out = ctx.harness(&["run", mock_target(), "--dir", dir.to_str().unwrap(), "--", "sum"]);

    assert_eq!(out.code, Some(0), "stdout: {}\nstderr: {}", out.stdout, out.stderr);
    assert_eq!(
        out.stdout,
        "empty: PASS\nnegatives: PASS\ntest-1: PASS\n3 passed, 0 failed, 0 errors\n"
    );
}

#[test]
fn test_wrong_expectation_shows_diff() {
    let ctx = TestContext::new();
    ctx.fixture("test-1", "2 3 4", Some("10"));

    let out = ctx.run_mock("sum", &[]);

    assert_eq!(out.code, Some(1));
    assert!(out.stdout.contains("test-1: FAIL\n"));
    assert!(out.stdout.contains("    first difference at line 1\n"));
    assert!(out.stdout.contains("    - 10\n"));
    assert!(out.stdout.contains("    + 9\n"));
    assert!(out.stdout.ends_with("0 passed, 1 failed, 0 errors\n"));
}

#[test]
fn test_missing_expected_output_is_warned_and_skipped() {
    let ctx = TestContext::new();
    ctx.fixture("test-1", "2 3 4", Some("9\n"));
    ctx.fixture("test-2", "1 1", None);

    let out = ctx.run_mock("sum", &[]);

    assert_eq!(out.code, Some(0));
    assert!(out.stdout.contains("warning: test-2: no expected output"));
    assert!(!out.stdout.lines().any(|line| line.starts_with("test-2: ")));
    assert!(out.stdout.ends_with("1 passed, 0 failed, 0 errors\n"));
}

#[test]
fn test_discovery_warnings_only_reach_the_report() {
    let ctx = TestContext::new();
    ctx.fixture("test-1", "2 3 4", Some("9\n"));
    ctx.fixture("test-2", "1 1", None);

    let out = ctx.run_mock("sum", &[]);
    assert_eq!(out.stdout.matches("no expected output").count(), 1);
    assert!(!out.stderr.contains("no expected output"), "stderr: {}", out.stderr);

    let out = ctx.run_mock("sum", &["--format", "json"]);
    assert!(out.stderr.is_empty(), "stderr: {}", out.stderr);
    assert!(out.stdout.lines().all(|line| serde_json::from_str::<serde_json::Value>(line).is_ok()));
}

#[test]
fn test_empty_suite_exit_codes() {
    let ctx = TestContext::new();

    let out = ctx.run_mock("sum", &[]);
    assert_eq!(out.code, Some(3));
    assert!(out.stdout.contains("no fixtures found"));

    let out = ctx.run_mock("sum", &["--allow-empty"]);
    assert_eq!(out.code, Some(0));
}

#[test]
fn test_missing_target_is_configuration_error() {
    let ctx = TestContext::new();
    ctx.fixture("t", "", Some(""));
    let dir = ctx.suite_dir.to_str().unwrap();

    let out = ctx.harness(&["run", "/nonexistent/target-program", "--dir", dir]);

    assert_eq!(out.code, Some(2));
    assert!(out.stderr.starts_with("Error: "), "stderr: {}", out.stderr);
    assert!(out.stdout.is_empty());
}

#[test]
fn test_missing_fixture_directory_is_configuration_error() {
    let ctx = TestContext::new();
    let missing = ctx.temp.path().join("no-such-dir");

    let out = ctx.harness(&["run", mock_target(), "--dir", missing.to_str().unwrap()]);

    assert_eq!(out.code, Some(2));
    assert!(out.stderr.contains("Error: "));
}

#[test]
fn test_identical_suffixes_are_rejected() {
    let ctx = TestContext::new();
    ctx.fixture("t", "1", Some("1"));

    let out = ctx.run_mock("sum", &["--input-suffix", ".txt", "--output-suffix", ".txt"]);

    assert_eq!(out.code, Some(2));
}

#[test]
fn test_nonzero_exit_with_matching_output_passes() {
    let ctx = TestContext::new();
    ctx.fixture("noisy", "1 2", Some("3\n"));

    let out = ctx.run_mock("fail", &["--verbose"]);

    assert_eq!(out.code, Some(0), "stdout: {}", out.stdout);
    assert!(out.stdout.contains("noisy: PASS\n"));
}

#[test]
fn test_verbose_failure_shows_stderr_and_exit_code() {
    let ctx = TestContext::new();
    ctx.fixture("noisy", "1 2", Some("4\n"));

    let out = ctx.run_mock("fail", &["--verbose"]);

    assert_eq!(out.code, Some(1));
    assert!(out.stdout.contains("    exit code: 3\n"));
    assert!(out.stdout.contains("| mock_target: something went wrong"));
}

#[test]
fn test_hanging_target_times_out() {
    let ctx = TestContext::new();
    ctx.fixture("stuck", "1", Some("1"));
    ctx.fixture("z-next", "1", Some("1"));

    let started = Instant::now();
    let out = ctx.run_mock("hang", &["--timeout", "1"]);

    assert_eq!(out.code, Some(1));
    assert!(out.stdout.contains("stuck: ERROR\n    timed out after 1s\n"));
    assert!(out.stdout.contains("z-next: ERROR\n"));
    assert!(out.stdout.ends_with("0 passed, 0 failed, 2 errors\n"));
    assert!(started.elapsed() < Duration::from_secs(30));
}

#[test]
fn test_suite_timeout_aborts_session() {
    let ctx = TestContext::new();
    ctx.fixture("a", "", Some(""));
    ctx.fixture("b", "", Some(""));

    let out = ctx.run_mock("hang", &["--timeout", "0", "--suite-timeout", "1"]);

    assert_eq!(out.code, Some(4), "stdout: {}", out.stdout);
    assert!(out.stdout.contains("a: ERROR\n"));
    assert!(out.stdout.contains("ABORTED: suite timed out after 1s, 1 fixture(s) not run\n"));
}

#[test]
fn test_large_output_does_not_stall() {
    let ctx = TestContext::new();
    ctx.fixture("big", "one\ntwo\n", Some("3\n"));

    let out = ctx.run_mock("flood", &["--timeout", "20", "--max-diff-lines", "2"]);

    assert_eq!(out.code, Some(1));
    assert!(out.stdout.contains("big: FAIL\n"));
    assert!(out.stdout.contains("more differing line(s)"));
}

#[test]
fn test_exact_newlines_flag() {
    let ctx = TestContext::new();
    ctx.fixture("t", "4 5", Some("9"));

    assert_eq!(ctx.run_mock("sum", &[]).code, Some(0));

    let out = ctx.run_mock("sum", &["--exact-newlines"]);
    assert_eq!(out.code, Some(1));
    assert!(out.stdout.contains("t: FAIL\n"));
}

#[test]
fn test_parallel_jobs_keep_fixture_order() {
    let ctx = TestContext::new();
    for (i, id) in ["d", "c", "b", "a"].iter().enumerate() {
        ctx.fixture(id, &i.to_string(), Some(&format!("{i}\n")));
    }

    let out = ctx.run_mock("sum", &["--jobs", "4"]);

    assert_eq!(out.code, Some(0));
    assert_eq!(
        out.stdout,
        "a: PASS\nb: PASS\nc: PASS\nd: PASS\n4 passed, 0 failed, 0 errors\n"
    );
}

#[test]
fn test_filter_selects_fixtures() {
    let ctx = TestContext::new();
    ctx.fixture("math-add", "1 1", Some("2"));
    ctx.fixture("math-sub", "1 -1", Some("0"));
    ctx.fixture("other", "1", Some("wrong"));

    let out = ctx.run_mock("sum", &["--filter", "math"]);

    assert_eq!(out.code, Some(0));
    assert!(!out.stdout.contains("other"));
    assert!(out.stdout.ends_with("2 passed, 0 failed, 0 errors\n"));
}

#[test]
fn test_json_report_events() {
    let ctx = TestContext::new();
    ctx.fixture("good", "2 3 4", Some("9"));
    ctx.fixture("bad", "2 3 4", Some("10"));
    ctx.fixture("lonely", "1", None);

    let out = ctx.run_mock("sum", &["--format", "json"]);
    assert_eq!(out.code, Some(1));

    let events: Vec<serde_json::Value> = out
        .stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("each line is a JSON event"))
        .collect();

    let kinds: Vec<&str> = events.iter().map(|e| e["event"].as_str().unwrap()).collect();
    assert_eq!(kinds, vec!["warning", "verdict", "verdict", "summary"]);

    assert_eq!(events[0]["id"], "lonely");
    assert_eq!(events[1]["verdict"]["id"], "bad");
    assert_eq!(events[1]["verdict"]["outcome"], "fail");
    assert_eq!(events[1]["verdict"]["detail"]["first_divergence"], 1);
    assert_eq!(events[2]["verdict"]["outcome"], "pass");
    assert_eq!(events[3]["success"], false);
    assert_eq!(events[3]["summary"]["failed"], 1);
}

#[test]
fn test_suite_config_file() {
    let ctx = TestContext::new();
    fs::write(ctx.suite_dir.join("case.in"), "20 22").unwrap();
    fs::write(ctx.suite_dir.join("case.expected"), "42\n").unwrap();
    fs::write(
        ctx.suite_dir.join("harness.toml"),
        "[fixtures]\ninput_suffix = \".in\"\noutput_suffix = \".expected\"\n\n[run]\ntimeout_secs = 5\n",
    )
    .unwrap();

    let out = ctx.run_mock("sum", &[]);

    assert_eq!(out.code, Some(0), "stdout: {}\nstderr: {}", out.stdout, out.stderr);
    assert!(out.stdout.contains("case: PASS\n"));
}

#[test]
fn test_invalid_config_file() {
    let ctx = TestContext::new();
    ctx.fixture("t", "1", Some("1"));
    fs::write(ctx.suite_dir.join("harness.toml"), "[run]\ntimeout_secs = \"soon\"\n").unwrap();

    let out = ctx.run_mock("sum", &[]);

    assert_eq!(out.code, Some(2));
    assert!(out.stderr.contains("harness.toml"));
}

#[test]
fn test_target_arguments_are_passed_through() {
    let ctx = TestContext::new();
    ctx.fixture("argv", "", Some("--flag\ntwo words\n"));
    let dir = ctx.suite_dir.to_str().unwrap();

    let out = ctx.harness(&[
        "run",
        mock_target(),
        "--dir",
        dir,
        "--",
        "args",
        "--flag",
        "two words",
    ]);

    assert_eq!(out.code, Some(0), "stdout: {}", out.stdout);
    assert!(out.stdout.contains("argv: PASS\n"));
}

#[test]
fn test_echo_keeps_input_bytes() {
    let ctx = TestContext::new();
    ctx.fixture("raw", "keep  spacing\n", Some("keep  spacing\n"));

    let out = ctx.run_mock("echo", &[]);

    assert_eq!(out.code, Some(0), "stdout: {}", out.stdout);
}

#[test]
fn test_list_command() {
    let ctx = TestContext::new();
    ctx.fixture("b", "", Some(""));
    ctx.fixture("a", "", Some(""));
    ctx.fixture("orphan", "", None);

    let out = ctx.harness(&["list", "--dir", ctx.suite_dir.to_str().unwrap()]);

    assert_eq!(out.code, Some(0));
    assert_eq!(out.stdout, "a\nb\n2 fixture(s)\n");
    assert!(out.stderr.contains("warning: orphan: no expected output"));
}
