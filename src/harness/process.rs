//! Target process execution
//!
//! Runs the target once per fixture: input goes to stdin, which is then
//! closed; stdout and stderr are drained by two tasks while the caller
//! waits for the exit, so a chatty child can never fill a pipe and stall.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command};
use tokio::task::JoinHandle;

use crate::common::{Error, Result};

use super::abort::{AbortReason, AbortSignal};

/// Why a fixture could not produce output to compare
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunFailure {
    #[error("failed to launch target: {message}")]
    Launch { message: String },

    #[error("timed out after {}", format_duration(.limit))]
    Timeout { limit: Duration },

    #[error("aborted: {reason}")]
    Aborted { reason: AbortReason },

    #[error("I/O error while talking to target: {message}")]
    Io { message: String },

    #[error("cannot read fixture file '{path}': {message}")]
    Fixture { path: String, message: String },
}

impl RunFailure {
    fn io(context: &str, e: impl std::fmt::Display) -> Self {
        Self::Io {
            message: format!("{}: {}", context, e),
        }
    }

    pub fn fixture(path: &Path, e: io::Error) -> Self {
        Self::Fixture {
            path: path.display().to_string(),
            message: e.to_string(),
        }
    }
}

/// What one run of the target produced
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub id: String,
    pub stdout: Vec<u8>,
    /// Diagnostic only, never compared
    pub stderr: Vec<u8>,
    /// `None` when the process was ended by a signal
    pub exit_code: Option<i32>,
    pub duration: Duration,
}

/// Launches the target program
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    program: PathBuf,
    args: Vec<String>,
    timeout: Option<Duration>,
    working_dir: Option<PathBuf>,
}

impl ProcessRunner {
    /// Resolve the target program
    ///
    /// Bare names are looked up in `PATH`; anything with a path separator
    /// must exist and be executable.
    pub fn new(program: &Path, args: Vec<String>) -> Result<Self> {
        let resolved = which::which(program)
            .map_err(|e| Error::target_not_found(program, describe_which_error(program, e)))?;

        tracing::debug!("Target {} resolved to {}", program.display(), resolved.display());

        Ok(Self {
            program: resolved,
            args,
            timeout: None,
            working_dir: None,
        })
    }

    /// Bound each execution; `None` waits forever
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Run the target once with `input` on stdin
    pub async fn run(
        &self,
        id: &str,
        input: Vec<u8>,
        mut abort: AbortSignal,
    ) -> std::result::Result<ExecutionResult, RunFailure> {
        if let Some(reason) = abort.reason() {
            return Err(RunFailure::Aborted { reason });
        }

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        // Own process group, so a timeout also reaches grandchildren that
        // still hold our pipes open
        #[cfg(unix)]
        cmd.process_group(0);

        let started = Instant::now();
        let mut child = cmd.spawn().map_err(|e| RunFailure::Launch {
            message: format!("{}: {}", self.program.display(), e),
        })?;
        let pid = child.id();
        tracing::debug!("{}: spawned pid {:?}", id, pid);

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| RunFailure::io("stdin", "not captured"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| RunFailure::io("stdout", "not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| RunFailure::io("stderr", "not captured"))?;

        let mut stdout_task = tokio::spawn(drain(stdout));
        let mut stderr_task = tokio::spawn(drain(stderr));

        let finished = {
            let exchange = exchange(&mut child, stdin, input, &mut stdout_task, &mut stderr_task);
            tokio::select! {
                result = with_deadline(self.timeout, exchange) => result,
                reason = abort.triggered() => Err(RunFailure::Aborted { reason }),
            }
        };

        match finished {
            Ok((status, stdout, stderr)) => {
                let duration = started.elapsed();
                tracing::debug!("{}: exited with {} after {:?}", id, status, duration);
                Ok(ExecutionResult {
                    id: id.to_string(),
                    stdout,
                    stderr,
                    exit_code: status.code(),
                    duration,
                })
            }
            Err(failure) => {
                terminate(id, pid, &mut child).await;
                stdout_task.abort();
                stderr_task.abort();
                Err(failure)
            }
        }
    }
}

/// Feed stdin, wait for exit, collect both output buffers
async fn exchange(
    child: &mut Child,
    stdin: ChildStdin,
    input: Vec<u8>,
    stdout_task: &mut JoinHandle<io::Result<Vec<u8>>>,
    stderr_task: &mut JoinHandle<io::Result<Vec<u8>>>,
) -> std::result::Result<(ExitStatus, Vec<u8>, Vec<u8>), RunFailure> {
    write_input(stdin, &input).await?;

    let status = child
        .wait()
        .await
        .map_err(|e| RunFailure::io("waiting for target", e))?;

    let stdout = join_reader("stdout", stdout_task).await?;
    let stderr = join_reader("stderr", stderr_task).await?;

    Ok((status, stdout, stderr))
}

/// Write all input then close the pipe, which is how the child sees EOF.
/// A child that exits without reading closes its end first; that is fine.
async fn write_input(mut stdin: ChildStdin, input: &[u8]) -> std::result::Result<(), RunFailure> {
    let written = match stdin.write_all(input).await {
        Ok(()) => stdin.shutdown().await,
        Err(e) => Err(e),
    };
    match written {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
            tracing::debug!("Target closed stdin before reading all input");
            Ok(())
        }
        Err(e) => Err(RunFailure::io("writing stdin", e)),
    }
}

async fn drain<R: AsyncRead + Unpin>(mut reader: R) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).await?;
    Ok(buf)
}

async fn join_reader(
    name: &str,
    task: &mut JoinHandle<io::Result<Vec<u8>>>,
) -> std::result::Result<Vec<u8>, RunFailure> {
    match task.await {
        Ok(Ok(buf)) => Ok(buf),
        Ok(Err(e)) => Err(RunFailure::io(&format!("reading {}", name), e)),
        Err(e) => Err(RunFailure::io(&format!("reading {}", name), e)),
    }
}

async fn with_deadline<F, T>(
    limit: Option<Duration>,
    fut: F,
) -> std::result::Result<T, RunFailure>
where
    F: std::future::Future<Output = std::result::Result<T, RunFailure>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .unwrap_or(Err(RunFailure::Timeout { limit })),
        None => fut.await,
    }
}

/// Kill the child (and its process group) and reap it
///
/// `pid` is the one recorded at spawn: once the child has been reaped
/// `Child::id` is gone, but its group may still hold our pipes.
async fn terminate(id: &str, pid: Option<u32>, child: &mut Child) {
    #[cfg(unix)]
    if let Some(pid) = pid {
        // Negative pid addresses the whole group created at spawn
        let result = unsafe { libc::kill(-(pid as i32), libc::SIGKILL) };
        if result != 0 {
            tracing::debug!("{}: killpg({}) failed: {}", id, pid, io::Error::last_os_error());
        }
    }
    #[cfg(not(unix))]
    let _ = pid;

    if child.id().is_none() {
        // Already reaped; only the group needed killing
        return;
    }
    if let Err(e) = child.kill().await {
        tracing::warn!("{}: failed to kill target: {}", id, e);
    } else {
        tracing::debug!("{}: target killed", id);
    }
}

fn format_duration(d: &Duration) -> String {
    if d.subsec_nanos() == 0 {
        format!("{}s", d.as_secs())
    } else {
        format!("{}ms", d.as_millis())
    }
}

fn describe_which_error(program: &Path, e: which::Error) -> String {
    if program.exists() {
        format!("not executable ({})", e)
    } else if program.components().count() > 1 {
        "no such file".to_string()
    } else {
        format!("not found in PATH ({})", e)
    }
}
