//! Fixture harness - black-box tests for command-line programs
//!
//! Pairs input files with expected-output files, feeds each input to a
//! target program on stdin and compares what it prints.

pub mod cli;
pub mod commands;
pub mod common;
pub mod harness;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use harness::{Outcome, SessionOutcome, SessionSummary, TestSession, Verdict};
