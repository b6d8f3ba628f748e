//! CLI command definitions
//!
//! Defines the clap commands for the harness CLI.

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::common::config::ReportFormat;

#[derive(Subcommand)]
pub enum Commands {
    /// Run every fixture against a target program
    Run {
        /// Program under test (a path, or a name looked up in PATH)
        target: PathBuf,

        /// Arguments to pass to the target
        #[arg(last = true)]
        args: Vec<String>,

        #[command(flatten)]
        suite: SuiteArgs,

        /// Run the target from this directory
        #[arg(long)]
        workdir: Option<PathBuf>,

        /// Per-fixture time limit in seconds (0 disables it)
        #[arg(long, short = 't')]
        timeout: Option<u64>,

        /// Run up to N fixtures at once
        #[arg(long, short = 'j')]
        jobs: Option<usize>,

        /// Compare output byte for byte, including trailing newlines
        #[arg(long)]
        exact_newlines: bool,

        /// Maximum number of differing lines shown per failure
        #[arg(long)]
        max_diff_lines: Option<usize>,

        /// Report format
        #[arg(long, value_enum)]
        format: Option<ReportFormat>,

        /// Disable coloured output
        #[arg(long)]
        no_color: bool,

        /// Treat a suite without fixtures as success
        #[arg(long)]
        allow_empty: bool,

        /// Abort the whole run after this many seconds
        #[arg(long)]
        suite_timeout: Option<u64>,

        /// Show exit code, duration and stderr for failing fixtures
        #[arg(long, short = 'v')]
        verbose: bool,
    },

    /// List discovered fixtures without running anything
    List {
        #[command(flatten)]
        suite: SuiteArgs,
    },
}

impl Commands {
    pub fn verbose(&self) -> bool {
        matches!(self, Commands::Run { verbose: true, .. })
    }
}

/// Options shared by every command that looks at a fixture directory
#[derive(Args, Debug, Clone, Default)]
pub struct SuiteArgs {
    /// Fixture directory (default: tests)
    #[arg(long, short = 'd')]
    pub dir: Option<PathBuf>,

    /// Suffix identifying input files (default: .input)
    #[arg(long)]
    pub input_suffix: Option<String>,

    /// Suffix identifying expected-output files (default: .output)
    #[arg(long)]
    pub output_suffix: Option<String>,

    /// Only fixtures whose identifier contains TEXT
    #[arg(long)]
    pub filter: Option<String>,

    /// Configuration file (default: <dir>/harness.toml, then the user config)
    #[arg(long)]
    pub config: Option<PathBuf>,
}
