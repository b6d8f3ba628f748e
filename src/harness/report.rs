//! Report rendering
//!
//! The only place that writes user-facing output. The session hands every
//! event over as soon as it happens, in fixture order.

use std::io::Write;
use std::path::Path;

use colored::Colorize;
use serde_json::json;

use crate::common::Result;

use super::abort::AbortReason;
use super::compare::{DiffSide, LineDiff};
use super::fixture::DiscoveryWarning;
use super::verdict::{Outcome, SessionSummary, Verdict};

const INDENT: &str = "    ";

/// Receives session events as they happen
pub trait Reporter {
    fn discovery_warning(&mut self, warning: &DiscoveryWarning) -> Result<()>;

    fn verdict(&mut self, verdict: &Verdict) -> Result<()>;

    /// The directory held no usable fixture
    fn no_fixtures(&mut self, dir: &Path) -> Result<()>;

    /// The run was stopped before every fixture had a verdict
    fn aborted(&mut self, reason: AbortReason, not_run: usize) -> Result<()>;

    fn summary(&mut self, summary: &SessionSummary) -> Result<()>;
}

/// Human-readable report, one line per fixture
pub struct TextReporter<W: Write> {
    out: W,
    color: bool,
    verbose: bool,
}

impl<W: Write> TextReporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            color: false,
            verbose: false,
        }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Also show exit code, duration and stderr of failing fixtures
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn label(&self, outcome: &Outcome) -> String {
        let label = outcome.label();
        if !self.color {
            return label.to_string();
        }
        match outcome {
            Outcome::Pass => label.green().bold().to_string(),
            Outcome::Fail(_) => label.red().bold().to_string(),
            Outcome::RunError(_) => label.yellow().bold().to_string(),
        }
    }

    fn write_diff(&mut self, diff: &LineDiff) -> Result<()> {
        writeln!(
            self.out,
            "{}first difference at line {}",
            INDENT, diff.first_divergence
        )?;
        if let Some(note) = &diff.note {
            writeln!(self.out, "{}{}", INDENT, note)?;
        }
        for line in &diff.lines {
            let rendered = match line.side {
                DiffSide::Expected => format!("- {}", line.text),
                DiffSide::Actual => format!("+ {}", line.text),
            };
            let rendered = match (self.color, line.side) {
                (false, _) => rendered,
                (true, DiffSide::Expected) => rendered.red().to_string(),
                (true, DiffSide::Actual) => rendered.green().to_string(),
            };
            writeln!(self.out, "{}{}", INDENT, rendered)?;
        }
        if diff.omitted > 0 {
            writeln!(
                self.out,
                "{}... {} more differing line(s)",
                INDENT, diff.omitted
            )?;
        }
        Ok(())
    }

    fn write_diagnostics(&mut self, verdict: &Verdict) -> Result<()> {
        if let Some(code) = verdict.exit_code {
            writeln!(self.out, "{}exit code: {}", INDENT, code)?;
        }
        if let Some(ms) = verdict.duration_ms {
            writeln!(self.out, "{}duration: {}ms", INDENT, ms)?;
        }
        if let Some(stderr) = &verdict.stderr {
            writeln!(self.out, "{}stderr:", INDENT)?;
            for line in stderr.lines() {
                writeln!(self.out, "{}{}| {}", INDENT, INDENT, line)?;
            }
        }
        Ok(())
    }
}

impl<W: Write> Reporter for TextReporter<W> {
    fn discovery_warning(&mut self, warning: &DiscoveryWarning) -> Result<()> {
        let prefix = if self.color {
            "warning:".yellow().to_string()
        } else {
            "warning:".to_string()
        };
        writeln!(self.out, "{} {}", prefix, warning)?;
        Ok(())
    }

    fn verdict(&mut self, verdict: &Verdict) -> Result<()> {
        let label = self.label(&verdict.outcome);
        writeln!(self.out, "{}: {}", verdict.id, label)?;

        match &verdict.outcome {
            Outcome::Pass => {}
            Outcome::Fail(diff) => self.write_diff(diff)?,
            Outcome::RunError(failure) => writeln!(self.out, "{}{}", INDENT, failure)?,
        }

        if self.verbose && !verdict.passed() {
            self.write_diagnostics(verdict)?;
        }
        self.out.flush()?;
        Ok(())
    }

    fn no_fixtures(&mut self, dir: &Path) -> Result<()> {
        writeln!(self.out, "no fixtures found in {}", dir.display())?;
        self.out.flush()?;
        Ok(())
    }

    fn aborted(&mut self, reason: AbortReason, not_run: usize) -> Result<()> {
        let label = if self.color {
            "ABORTED".red().bold().to_string()
        } else {
            "ABORTED".to_string()
        };
        writeln!(
            self.out,
            "{}: {}, {} fixture(s) not run",
            label, reason, not_run
        )?;
        Ok(())
    }

    fn summary(&mut self, summary: &SessionSummary) -> Result<()> {
        writeln!(
            self.out,
            "{} passed, {} failed, {} errors",
            summary.passed, summary.failed, summary.errors
        )?;
        self.out.flush()?;
        Ok(())
    }
}

/// Machine-readable report: one JSON object per line
pub struct JsonReporter<W: Write> {
    out: W,
}

impl<W: Write> JsonReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, event: serde_json::Value) -> Result<()> {
        serde_json::to_writer(&mut self.out, &event)?;
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write> Reporter for JsonReporter<W> {
    fn discovery_warning(&mut self, warning: &DiscoveryWarning) -> Result<()> {
        let (kind, id) = match warning {
            DiscoveryWarning::MissingExpected { id, .. } => ("missing_expected", Some(id.as_str())),
            DiscoveryWarning::NonUtf8Name { .. } => ("non_utf8_name", None),
        };
        self.emit(json!({
            "event": "warning",
            "kind": kind,
            "id": id,
            "message": warning.to_string(),
        }))
    }

    fn verdict(&mut self, verdict: &Verdict) -> Result<()> {
        let verdict = serde_json::to_value(verdict)?;
        self.emit(json!({ "event": "verdict", "verdict": verdict }))
    }

    fn no_fixtures(&mut self, dir: &Path) -> Result<()> {
        self.emit(json!({ "event": "no_fixtures", "dir": dir.display().to_string() }))
    }

    fn aborted(&mut self, reason: AbortReason, not_run: usize) -> Result<()> {
        self.emit(json!({
            "event": "aborted",
            "reason": reason,
            "message": reason.to_string(),
            "not_run": not_run,
        }))
    }

    fn summary(&mut self, summary: &SessionSummary) -> Result<()> {
        self.emit(json!({
            "event": "summary",
            "summary": summary,
            "success": summary.success(),
        }))
    }
}

impl<R: Reporter + ?Sized> Reporter for Box<R> {
    fn discovery_warning(&mut self, warning: &DiscoveryWarning) -> Result<()> {
        (**self).discovery_warning(warning)
    }

    fn verdict(&mut self, verdict: &Verdict) -> Result<()> {
        (**self).verdict(verdict)
    }

    fn no_fixtures(&mut self, dir: &Path) -> Result<()> {
        (**self).no_fixtures(dir)
    }

    fn aborted(&mut self, reason: AbortReason, not_run: usize) -> Result<()> {
        (**self).aborted(reason, not_run)
    }

    fn summary(&mut self, summary: &SessionSummary) -> Result<()> {
        (**self).summary(summary)
    }
}
