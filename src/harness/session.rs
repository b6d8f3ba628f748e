//! Test session orchestration
//!
//! Drives one suite run: discover, run every fixture, stream verdicts to
//! the reporter in fixture order, and fold them into a summary.

use futures_util::stream::{self, StreamExt};

use crate::common::Result;

use super::abort::{AbortReason, AbortSignal};
use super::compare::OutputComparator;
use super::fixture::{FixtureLocator, FixturePair};
use super::process::{ProcessRunner, RunFailure};
use super::report::Reporter;
use super::verdict::{Outcome, SessionSummary, Verdict};

/// Every fixture passed
pub const EXIT_SUCCESS: i32 = 0;
/// At least one fixture failed or errored
pub const EXIT_TESTS_FAILED: i32 = 1;
/// The suite could not run at all
pub const EXIT_CONFIG_ERROR: i32 = 2;
/// The fixture directory held no usable fixture
pub const EXIT_NO_FIXTURES: i32 = 3;
/// Interrupted or suite timeout
pub const EXIT_ABORTED: i32 = 4;

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Discovering,
    Running,
    Finalized,
}

/// How a session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Every discovered fixture has a verdict
    Completed(SessionSummary),
    /// Nothing to run; not the same as "all passed"
    NoFixtures,
    /// Stopped early; `summary` covers the fixtures that did report
    Aborted {
        reason: AbortReason,
        summary: SessionSummary,
        not_run: usize,
    },
}

impl SessionOutcome {
    pub fn success(&self) -> bool {
        matches!(self, SessionOutcome::Completed(summary) if summary.success())
    }

    /// Process exit code for build-system gating
    pub fn exit_code(&self, allow_empty: bool) -> i32 {
        match self {
            SessionOutcome::Completed(summary) if summary.success() => EXIT_SUCCESS,
            SessionOutcome::Completed(_) => EXIT_TESTS_FAILED,
            SessionOutcome::NoFixtures if allow_empty => EXIT_SUCCESS,
            SessionOutcome::NoFixtures => EXIT_NO_FIXTURES,
            SessionOutcome::Aborted { .. } => EXIT_ABORTED,
        }
    }
}

/// One run of a suite against a target
pub struct TestSession<R: Reporter> {
    locator: FixtureLocator,
    runner: ProcessRunner,
    comparator: OutputComparator,
    reporter: R,
    jobs: usize,
    state: SessionState,
}

impl<R: Reporter> TestSession<R> {
    pub fn new(
        locator: FixtureLocator,
        runner: ProcessRunner,
        comparator: OutputComparator,
        reporter: R,
    ) -> Self {
        Self {
            locator,
            runner,
            comparator,
            reporter,
            jobs: 1,
            state: SessionState::Idle,
        }
    }

    /// Run up to `jobs` fixtures at once. Report order is unaffected.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    pub fn into_reporter(self) -> R {
        self.reporter
    }

    /// Run the whole suite
    ///
    /// Returns `Err` only for configuration problems found before any
    /// fixture ran, or when the report itself cannot be written.
    pub async fn run(&mut self, abort: AbortSignal) -> Result<SessionOutcome> {
        self.state = SessionState::Discovering;
        let fixtures = self.locator.discover()?;

        for warning in fixtures.warnings() {
            tracing::debug!("Discovery: {}", warning);
            self.reporter.discovery_warning(warning)?;
        }

        if fixtures.is_empty() {
            tracing::debug!("No fixtures in {}", self.locator.dir().display());
            self.reporter.no_fixtures(self.locator.dir())?;
            self.state = SessionState::Finalized;
            return Ok(SessionOutcome::NoFixtures);
        }

        self.state = SessionState::Running;
        let total = fixtures.len();
        tracing::debug!("Running {} fixture(s) with {} job(s)", total, self.jobs);

        let mut summary = SessionSummary::default();
        let mut cut_short = false;
        {
            let runner = &self.runner;
            let comparator = &self.comparator;
            // `buffered` yields in input order however completions interleave
            let mut verdicts = stream::iter(fixtures.iter())
                .map(|pair| run_fixture(runner, comparator, pair, abort.clone()))
                .buffered(self.jobs);

            while let Some(verdict) = verdicts.next().await {
                let Some(verdict) = verdict else {
                    cut_short = true;
                    continue;
                };
                if matches!(
                    verdict.outcome,
                    Outcome::RunError(RunFailure::Aborted { .. })
                ) {
                    cut_short = true;
                }
                self.reporter.verdict(&verdict)?;
                summary.record(&verdict);
            }
        }

        self.state = SessionState::Finalized;

        if cut_short {
            let reason = abort.reason().unwrap_or(AbortReason::Interrupted);
            let not_run = total - summary.total;
            tracing::debug!("Session aborted ({}), {} fixture(s) not run", reason, not_run);
            self.reporter.aborted(reason, not_run)?;
            self.reporter.summary(&summary)?;
            return Ok(SessionOutcome::Aborted {
                reason,
                summary,
                not_run,
            });
        }

        self.reporter.summary(&summary)?;
        Ok(SessionOutcome::Completed(summary))
    }
}

/// Run and judge one fixture. `None` means it was never started
/// because the session is being aborted.
async fn run_fixture(
    runner: &ProcessRunner,
    comparator: &OutputComparator,
    pair: &FixturePair,
    abort: AbortSignal,
) -> Option<Verdict> {
    if abort.reason().is_some() {
        return None;
    }

    let input = match pair.read_input() {
        Ok(input) => input,
        Err(e) => return Some(Verdict::run_error(&pair.id, RunFailure::fixture(&pair.input, e))),
    };

    let result = match runner.run(&pair.id, input, abort).await {
        Ok(result) => result,
        Err(failure) => {
            tracing::debug!("{}: {}", pair.id, failure);
            return Some(Verdict::run_error(&pair.id, failure));
        }
    };

    let expected = match pair.read_expected() {
        Ok(expected) => expected,
        Err(e) => {
            return Some(Verdict::run_error(
                &pair.id,
                RunFailure::fixture(&pair.expected, e),
            ))
        }
    };

    let outcome = comparator.compare(&expected, &result.stdout);
    Some(Verdict::from_execution(&result, outcome))
}
