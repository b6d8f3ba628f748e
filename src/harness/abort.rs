//! Suite-wide cancellation
//!
//! One [`AbortHandle`] is held by whoever may stop the run (signal handler,
//! suite timer); every running fixture holds a cloned [`AbortSignal`].

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;

/// Why a session was stopped early
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AbortReason {
    /// Operator pressed Ctrl-C / sent SIGTERM
    Interrupted,
    /// The whole-suite deadline passed
    SuiteTimeout { secs: u64 },
}

impl AbortReason {
    pub fn suite_timeout(limit: Duration) -> Self {
        Self::SuiteTimeout {
            secs: limit.as_secs(),
        }
    }
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interrupted => write!(f, "interrupted"),
            Self::SuiteTimeout { secs } => write!(f, "suite timed out after {}s", secs),
        }
    }
}

/// Trigger side
#[derive(Debug)]
pub struct AbortHandle {
    tx: watch::Sender<Option<AbortReason>>,
}

/// Observer side, cheap to clone
#[derive(Debug, Clone)]
pub struct AbortSignal {
    rx: watch::Receiver<Option<AbortReason>>,
}

/// Create a connected handle/signal pair
pub fn abort_pair() -> (AbortHandle, AbortSignal) {
    let (tx, rx) = watch::channel(None);
    (AbortHandle { tx }, AbortSignal { rx })
}

impl AbortHandle {
    /// Request an abort. The first reason wins.
    pub fn abort(&self, reason: AbortReason) {
        self.tx.send_if_modified(|current| {
            if current.is_none() {
                *current = Some(reason);
                true
            } else {
                false
            }
        });
    }

    pub fn signal(&self) -> AbortSignal {
        AbortSignal {
            rx: self.tx.subscribe(),
        }
    }
}

impl AbortSignal {
    /// A signal that never fires
    pub fn never() -> Self {
        let (_, signal) = abort_pair();
        signal
    }

    /// The reason, if an abort was already requested
    pub fn reason(&self) -> Option<AbortReason> {
        *self.rx.borrow()
    }

    /// Resolve once an abort is requested. Pends forever if the
    /// handle is dropped without aborting.
    pub async fn triggered(&mut self) -> AbortReason {
        let fired = match self.rx.wait_for(Option::is_some).await {
            Ok(reason) => *reason,
            Err(_) => None,
        };
        match fired {
            Some(reason) => reason,
            None => std::future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_signal_fires_with_first_reason() {
        let (handle, mut signal) = abort_pair();
        assert_eq!(signal.reason(), None);

        handle.abort(AbortReason::Interrupted);
        handle.abort(AbortReason::suite_timeout(Duration::from_secs(5)));

        assert_eq!(signal.triggered().await, AbortReason::Interrupted);
        assert_eq!(handle.signal().reason(), Some(AbortReason::Interrupted));
    }

    #[tokio::test]
    async fn test_never_signal_pends() {
        let mut signal = AbortSignal::never();
        let waited =
            tokio::time::timeout(Duration::from_millis(50), signal.triggered()).await;
        assert!(waited.is_err());
        assert_eq!(signal.reason(), None);
    }

    #[test]
    fn test_reason_display() {
        assert_eq!(AbortReason::Interrupted.to_string(), "interrupted");
        assert_eq!(
            AbortReason::suite_timeout(Duration::from_secs(30)).to_string(),
            "suite timed out after 30s"
        );
    }
}
