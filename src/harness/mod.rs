//! Fixture harness core
//!
//! Discovery, execution, comparison, orchestration and reporting for
//! fixture-based black-box tests. Each stage hands plain values to the
//! next; nothing here prints except a [`Reporter`].

pub mod abort;
pub mod compare;
pub mod fixture;
pub mod process;
pub mod report;
pub mod session;
pub mod verdict;

pub use abort::{abort_pair, AbortHandle, AbortReason, AbortSignal};
pub use compare::{LineDiff, NewlinePolicy, OutputComparator};
pub use fixture::{DiscoveryWarning, FixtureLocator, FixtureNaming, FixturePair, FixtureSet};
pub use process::{ExecutionResult, ProcessRunner, RunFailure};
pub use report::{JsonReporter, Reporter, TextReporter};
pub use session::{SessionOutcome, SessionState, TestSession};
pub use verdict::{Outcome, SessionSummary, Verdict};
