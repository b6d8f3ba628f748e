//! Per-fixture verdicts and the running summary

use std::time::Duration;

use serde::Serialize;

use super::compare::LineDiff;
use super::process::{ExecutionResult, RunFailure};

/// How many characters of stderr a verdict keeps for diagnosis
const STDERR_EXCERPT_CHARS: usize = 2000;

/// Three-way result of one fixture
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum Outcome {
    Pass,
    /// Output mismatch: an ordinary test result
    Fail(LineDiff),
    /// No output to compare: the run itself went wrong
    RunError(RunFailure),
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Pass => "PASS",
            Outcome::Fail(_) => "FAIL",
            Outcome::RunError(_) => "ERROR",
        }
    }
}

/// The outcome of one fixture plus what was observed while running it
#[derive(Debug, Clone, Serialize)]
pub struct Verdict {
    pub id: String,
    #[serde(flatten)]
    pub outcome: Outcome,
    /// Informational, never part of the pass/fail decision
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
}

impl Verdict {
    /// Verdict for a fixture whose target ran to completion
    pub fn from_execution(result: &ExecutionResult, outcome: Outcome) -> Self {
        Self {
            id: result.id.clone(),
            outcome,
            exit_code: result.exit_code,
            duration_ms: Some(millis(result.duration)),
            stderr: (!result.stderr.is_empty())
                .then(|| crate::common::excerpt(&result.stderr, STDERR_EXCERPT_CHARS)),
        }
    }

    /// Verdict for a fixture that produced nothing to compare
    pub fn run_error(id: &str, failure: RunFailure) -> Self {
        Self {
            id: id.to_string(),
            outcome: Outcome::RunError(failure),
            exit_code: None,
            duration_ms: None,
            stderr: None,
        }
    }

    pub fn passed(&self) -> bool {
        self.outcome == Outcome::Pass
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Aggregate counts, folded one verdict at a time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
}

impl SessionSummary {
    pub fn record(&mut self, verdict: &Verdict) {
        self.total += 1;
        match verdict.outcome {
            Outcome::Pass => self.passed += 1,
            Outcome::Fail(_) => self.failed += 1,
            Outcome::RunError(_) => self.errors += 1,
        }
    }

    /// True iff nothing failed and nothing errored
    pub fn success(&self) -> bool {
        self.failed == 0 && self.errors == 0
    }
}
