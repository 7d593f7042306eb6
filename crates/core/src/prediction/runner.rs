//! External prediction process launcher and supervisor.
//!
//! The process is invoked as
//! `program args... fromDate fromTime toDate toTime username token`.
//! A supervisory task owns the child: it logs stderr, watches stdout for the
//! completion signal, waits for exit and reports a [`JobOutcome`]. The
//! caller only gets a [`JobHandle`] back and is never blocked on the
//! process. Dropping the handle leaves the job running.

use std::process::Stdio;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use super::status::JobStatusTable;
use crate::error::CoreError;

/// Program and leading arguments of the external prediction job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for PredictCommand {
    fn default() -> Self {
        Self {
            program: "python3".to_string(),
            args: vec!["./models/model.py".to_string()],
        }
    }
}

/// Requested forecast range, forwarded verbatim as positional arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionWindow {
    pub from_date: String,
    pub from_time: String,
    pub to_date: String,
    pub to_time: String,
}

/// What on stdout counts as the job signalling completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CompletionSignal {
    /// Any stdout line.
    #[default]
    AnyOutput,
    /// Only a stdout line equal to this value once trimmed.
    Sentinel(String),
}

impl CompletionSignal {
    pub fn fires_on(&self, line: &str) -> bool {
        match self {
            Self::AnyOutput => true,
            Self::Sentinel(sentinel) => line.trim() == sentinel,
        }
    }
}

/// Final result reported by the supervisor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// The process ran to exit. `code` is `None` when killed by a signal.
    Exited {
        code: Option<i32>,
        signalled_complete: bool,
    },
    /// The process could not be started.
    SpawnFailed(String),
    /// [`JobHandle::cancel`] killed the process.
    Cancelled,
}

/// Handle to a supervised prediction job.
#[derive(Debug)]
pub struct JobHandle {
    token: String,
    cancel: CancellationToken,
    outcome: oneshot::Receiver<JobOutcome>,
}

impl JobHandle {
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Ask the supervisor to kill the process.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the supervisor to finish.
    pub async fn outcome(self) -> Result<JobOutcome, CoreError> {
        self.outcome.await.map_err(|_| {
            CoreError::Internal("Prediction supervisor stopped without an outcome".into())
        })
    }

    /// Give up the handle, keeping only the token. The job keeps running.
    pub fn into_token(self) -> String {
        self.token
    }
}

/// Launches prediction processes and wires their output into the status table.
#[derive(Debug, Clone)]
pub struct JobRunner {
    command: PredictCommand,
    completion: CompletionSignal,
    jobs: Arc<JobStatusTable>,
}

impl JobRunner {
    pub fn new(
        command: PredictCommand,
        completion: CompletionSignal,
        jobs: Arc<JobStatusTable>,
    ) -> Self {
        Self {
            command,
            completion,
            jobs,
        }
    }

    /// Spawn the process for `(user, token)` under a supervisory task.
    ///
    /// Must be called from within a Tokio runtime. Spawn failures are not
    /// returned here; they surface as [`JobOutcome::SpawnFailed`] and in logs.
    pub fn launch(&self, user: &str, token: &str, window: &PredictionWindow) -> JobHandle {
        let mut cmd = Command::new(&self.command.program);
        cmd.args(&self.command.args)
            .args([
                &window.from_date,
                &window.from_time,
                &window.to_date,
                &window.to_time,
            ])
            .arg(user)
            .arg(token)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let cancel = CancellationToken::new();
        let (tx, rx) = oneshot::channel();

        let supervisor = Supervisor {
            jobs: Arc::clone(&self.jobs),
            completion: self.completion.clone(),
            user: user.to_string(),
            token: token.to_string(),
            cancel: cancel.clone(),
        };
        tokio::spawn(async move {
            let outcome = supervisor.run(cmd).await;
            let _ = tx.send(outcome);
        });

        JobHandle {
            token: token.to_string(),
            cancel,
            outcome: rx,
        }
    }
}

struct Supervisor {
    jobs: Arc<JobStatusTable>,
    completion: CompletionSignal,
    user: String,
    token: String,
    cancel: CancellationToken,
}

impl Supervisor {
    async fn run(self, mut cmd: Command) -> JobOutcome {
        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::error!(
                    user = %self.user,
                    token = %self.token,
                    error = %e,
                    "Failed to start prediction process",
                );
                return JobOutcome::SpawnFailed(e.to_string());
            }
        };
        tracing::info!(
            user = %self.user,
            token = %self.token,
            pid = ?child.id(),
            "Prediction process started",
        );

        let stderr_task = tokio::spawn(log_stderr(child.stderr.take(), self.user.clone()));
        let stdout_task = tokio::spawn(watch_stdout(
            child.stdout.take(),
            Arc::clone(&self.jobs),
            self.completion.clone(),
            self.user.clone(),
            self.token.clone(),
        ));

        let waited = tokio::select! {
            status = child.wait() => Some(status),
            () = self.cancel.cancelled() => None,
        };

        let Some(waited) = waited else {
            stdout_task.abort();
            if let Err(e) = child.kill().await {
                tracing::warn!(user = %self.user, error = %e, "Failed to kill prediction process");
            }
            tracing::info!(user = %self.user, token = %self.token, "Prediction process cancelled");
            return JobOutcome::Cancelled;
        };

        let signalled_complete = stdout_task.await.unwrap_or(false);
        let _ = stderr_task.await;

        match waited {
            Ok(status) => {
                tracing::info!(
                    user = %self.user,
                    token = %self.token,
                    exit_code = ?status.code(),
                    signalled_complete,
                    "Prediction process exited",
                );
                JobOutcome::Exited {
                    code: status.code(),
                    signalled_complete,
                }
            }
            Err(e) => {
                tracing::error!(user = %self.user, error = %e, "Failed waiting on prediction process");
                JobOutcome::Exited {
                    code: None,
                    signalled_complete,
                }
            }
        }
    }
}

/// Read stdout line by line, marking the job complete when the signal fires.
///
/// Lines are decoded lossily and the pipe is drained to EOF, so a job never
/// blocks or dies on a write because of bytes it printed earlier.
/// Returns whether the completion flag was set for this token.
async fn watch_stdout<R: AsyncRead + Unpin>(
    stdout: Option<R>,
    jobs: Arc<JobStatusTable>,
    completion: CompletionSignal,
    user: String,
    token: String,
) -> bool {
    let Some(stdout) = stdout else {
        return false;
    };

    let mut signalled = false;
    let mut reader = BufReader::new(stdout);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = decode_line(&buf);
                tracing::info!(user = %user, output = %line, "Prediction output");
                if !completion.fires_on(&line) {
                    continue;
                }
                if jobs.mark_complete(&user, &token).await {
                    signalled = true;
                } else {
                    tracing::debug!(user = %user, token = %token, "Ignoring output from superseded job");
                }
            }
            Err(e) => {
                tracing::warn!(user = %user, error = %e, "Failed reading prediction output");
                break;
            }
        }
    }
    signalled
}

/// Log every stderr line. Never touches job status.
async fn log_stderr<R: AsyncRead + Unpin>(stderr: Option<R>, user: String) {
    let Some(stderr) = stderr else {
        return;
    };
    let mut reader = BufReader::new(stderr);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                tracing::warn!(user = %user, output = %decode_line(&buf), "Prediction error output");
            }
            Err(e) => {
                tracing::warn!(user = %user, error = %e, "Failed reading prediction error output");
                break;
            }
        }
    }
}

/// Lossy UTF-8 decode with the line terminator stripped.
fn decode_line(buf: &[u8]) -> String {
    let line = buf.strip_suffix(b"\n").unwrap_or(buf);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    String::from_utf8_lossy(line).into_owned()
}
