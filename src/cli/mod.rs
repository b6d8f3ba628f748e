//! CLI command handling
//!
//! Merges the configuration file with command-line flags, wires the
//! harness components together and maps the result to an exit code.

use std::io::{self, IsTerminal, Write};
use std::time::Duration;

use crate::commands::{Commands, SuiteArgs};
use crate::common::config::{Config, ReportFormat};
use crate::common::{Error, Result};
use crate::harness::session::{EXIT_NO_FIXTURES, EXIT_SUCCESS};
use crate::harness::{
    abort_pair, AbortHandle, AbortReason, FixtureLocator, FixtureNaming, JsonReporter,
    NewlinePolicy, OutputComparator, ProcessRunner, Reporter, TestSession, TextReporter,
};

/// Dispatch a CLI command, returning the process exit code
pub async fn dispatch(command: Commands) -> Result<i32> {
    match command {
        Commands::Run {
            target,
            args,
            suite,
            workdir,
            timeout,
            jobs,
            exact_newlines,
            max_diff_lines,
            format,
            no_color,
            allow_empty,
            suite_timeout,
            verbose,
        } => {
            let dir = suite.dir.clone().unwrap_or_else(Config::default_fixture_dir);
            let config = Config::load(suite.config.as_deref(), &dir)?;

            let timeout = timeout.unwrap_or(config.run.timeout_secs);
            let jobs = jobs.unwrap_or(config.run.jobs);
            if jobs == 0 {
                return Err(Error::Config("jobs must be at least 1".to_string()));
            }

            let newline = if exact_newlines || !config.compare.trailing_newline {
                NewlinePolicy::Exact
            } else {
                NewlinePolicy::Tolerant
            };
            let max_diff_lines = max_diff_lines.unwrap_or(config.compare.max_diff_lines);
            let format = format.unwrap_or(config.report.format);
            let color = !no_color
                && config
                    .report
                    .color
                    .unwrap_or_else(|| io::stdout().is_terminal());
            colored::control::set_override(color);

            let suite_timeout = suite_timeout
                .or(config.run.suite_timeout_secs)
                .and_then(seconds);

            let mut runner = ProcessRunner::new(&target, args)?.with_timeout(seconds(timeout));
            if let Some(workdir) = workdir {
                runner = runner.with_working_dir(workdir);
            }
            let locator = FixtureLocator::new(&dir, naming(&suite, &config)).with_filter(suite.filter);
            let comparator = OutputComparator::new(newline, max_diff_lines);

            let reporter: Box<dyn Reporter> = match format {
                ReportFormat::Text => Box::new(
                    TextReporter::new(io::stdout())
                        .with_color(color)
                        .with_verbose(verbose),
                ),
                ReportFormat::Json => Box::new(JsonReporter::new(io::stdout())),
            };

            tracing::debug!(
                "Running suite {} against {} (jobs: {}, timeout: {}s)",
                dir.display(),
                runner.program().display(),
                jobs,
                timeout
            );

            let (handle, signal) = abort_pair();
            let watcher = tokio::spawn(watch_for_abort(handle, suite_timeout));

            let mut session = TestSession::new(locator, runner, comparator, reporter).with_jobs(jobs);
            let outcome = session.run(signal).await;
            watcher.abort();

            Ok(outcome?.exit_code(allow_empty))
        }

        Commands::List { suite } => {
            let dir = suite.dir.clone().unwrap_or_else(Config::default_fixture_dir);
            let config = Config::load(suite.config.as_deref(), &dir)?;
            let locator = FixtureLocator::new(&dir, naming(&suite, &config)).with_filter(suite.filter);
            list(&locator, &mut io::stdout(), io::stderr())
        }
    }
}

/// Flags win over the configuration file
fn naming(suite: &SuiteArgs, config: &Config) -> FixtureNaming {
    FixtureNaming::new(
        suite
            .input_suffix
            .clone()
            .unwrap_or_else(|| config.fixtures.input_suffix.clone()),
        suite
            .output_suffix
            .clone()
            .unwrap_or_else(|| config.fixtures.output_suffix.clone()),
    )
}

/// Zero means "no limit"
fn seconds(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

/// Print fixture ids to `out`; discovery warnings go to `warnings`
fn list(locator: &FixtureLocator, out: &mut impl Write, warnings: impl Write) -> Result<i32> {
    let fixtures = locator.discover()?;

    let mut reporter = TextReporter::new(warnings);
    for warning in fixtures.warnings() {
        reporter.discovery_warning(warning)?;
    }

    if fixtures.is_empty() {
        writeln!(out, "no fixtures found in {}", locator.dir().display())?;
        return Ok(EXIT_NO_FIXTURES);
    }

    for pair in &fixtures {
        writeln!(out, "{}", pair.id)?;
    }
    writeln!(out, "{} fixture(s)", fixtures.len())?;
    Ok(EXIT_SUCCESS)
}

/// Fire the abort signal on Ctrl-C or when the suite deadline passes
async fn watch_for_abort(handle: AbortHandle, suite_timeout: Option<Duration>) {
    let interrupted = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => AbortReason::Interrupted,
            Err(e) => {
                tracing::warn!("Cannot listen for Ctrl-C: {}", e);
                std::future::pending().await
            }
        }
    };

    let expired = async {
        match suite_timeout {
            Some(limit) => {
                tokio::time::sleep(limit).await;
                AbortReason::suite_timeout(limit)
            }
            None => std::future::pending().await,
        }
    };

    let reason = tokio::select! {
        reason = interrupted => reason,
        reason = expired => reason,
    };
    tracing::debug!("Aborting: {}", reason);
    handle.abort(reason);
}
