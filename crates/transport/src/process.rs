//! Helper process lifetime: spawn, graceful termination, exit status.

use std::fmt;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::process::{Child, Command};
use tokio::sync::{Notify, watch};
use tracing::{debug, info, warn};

use crate::error::TransportError;
use crate::lines::{LineSink, LineStream};

/// Boxed input stream of the helper.
pub type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Boxed output or error stream of the helper.
pub type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;

/// How the helper process ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExitInfo {
    /// Exit code, absent when the process was ended by a signal.
    pub code: Option<i32>,
    /// Terminating signal (Unix only).
    pub signal: Option<i32>,
}

impl ExitInfo {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl From<std::process::ExitStatus> for ExitInfo {
    fn from(status: std::process::ExitStatus) -> Self {
        #[cfg(unix)]
        let signal = {
            use std::os::unix::process::ExitStatusExt;
            status.signal()
        };
        #[cfg(not(unix))]
        let signal = None;

        Self {
            code: status.code(),
            signal,
        }
    }
}

impl fmt::Display for ExitInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.code, self.signal) {
            (Some(code), _) => write!(f, "exit code {code}"),
            (None, Some(signal)) => write!(f, "signal {signal}"),
            (None, None) => f.write_str("unknown exit status"),
        }
    }
}

/// Handle on a running helper, shared by everyone who needs to stop it or
/// observe its exit.
#[derive(Clone)]
pub struct ProcessControl {
    pid: Option<u32>,
    terminate: Arc<Notify>,
    exit: watch::Receiver<Option<ExitInfo>>,
}

/// The process side of a [`ProcessControl`]: learns about termination
/// requests and publishes the exit status.
///
/// [`spawn`] drives one from its reaper task; custom transports and tests
/// drive it by hand.
pub struct ProcessMonitor {
    terminate: Arc<Notify>,
    exit: watch::Sender<Option<ExitInfo>>,
}

impl ProcessControl {
    /// Creates a control/monitor pair not tied to any OS process.
    pub fn pair() -> (Self, ProcessMonitor) {
        Self::pair_with_pid(None)
    }

    fn pair_with_pid(pid: Option<u32>) -> (Self, ProcessMonitor) {
        let terminate = Arc::new(Notify::new());
        let (exit_tx, exit_rx) = watch::channel(None);
        (
            Self {
                pid,
                terminate: Arc::clone(&terminate),
                exit: exit_rx,
            },
            ProcessMonitor {
                terminate,
                exit: exit_tx,
            },
        )
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Asks the process to terminate gracefully. Does not wait.
    pub fn request_terminate(&self) {
        self.terminate.notify_one();
    }

    /// Exit status, if the process has already exited.
    pub fn exit_info(&self) -> Option<ExitInfo> {
        *self.exit.borrow()
    }

    /// Waits until the process has exited.
    pub async fn wait(&self) -> Result<ExitInfo, TransportError> {
        let mut exit = self.exit.clone();
        let status = exit
            .wait_for(Option::is_some)
            .await
            .map_err(|_| TransportError::Detached)?;
        (*status).ok_or(TransportError::Detached)
    }

    /// Requests termination and waits for the exit status.
    pub async fn terminate(&self) -> Result<ExitInfo, TransportError> {
        self.request_terminate();
        self.wait().await
    }
}

impl ProcessMonitor {
    /// Resolves on the next termination request.
    pub async fn terminate_requested(&self) {
        self.terminate.notified().await;
    }

    /// Publishes the exit status to every [`ProcessControl`].
    pub fn report_exit(&self, info: ExitInfo) {
        self.exit.send_replace(Some(info));
    }

    /// Resolves once every [`ProcessControl`] has been dropped.
    pub async fn abandoned(&self) {
        self.exit.closed().await;
    }
}

/// The three framed streams of a helper plus its control handle.
pub struct ProcessIo {
    pub stdin: LineSink<BoxedWriter>,
    pub stdout: LineStream<BoxedReader>,
    pub stderr: LineStream<BoxedReader>,
    pub control: ProcessControl,
}

impl ProcessIo {
    /// Assembles a transport from arbitrary byte streams.
    pub fn new(
        stdin: impl AsyncWrite + Send + Unpin + 'static,
        stdout: impl AsyncRead + Send + Unpin + 'static,
        stderr: impl AsyncRead + Send + Unpin + 'static,
        control: ProcessControl,
    ) -> Self {
        Self {
            stdin: LineSink::new(Box::new(stdin) as BoxedWriter),
            stdout: LineStream::new(Box::new(stdout) as BoxedReader),
            stderr: LineStream::new(Box::new(stderr) as BoxedReader),
            control,
        }
    }
}

/// Spawns the helper with all three streams piped and no arguments.
///
/// Must be called from within a tokio runtime: the child is handed to a
/// reaper task that reports its exit status.
pub fn spawn(executable: &Path) -> Result<ProcessIo, TransportError> {
    let mut child = Command::new(executable)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| TransportError::Spawn {
            path: executable.to_path_buf(),
            source,
        })?;

    let stdin = child.stdin.take().ok_or(TransportError::MissingPipe("stdin"))?;
    let stdout = child
        .stdout
        .take()
        .ok_or(TransportError::MissingPipe("stdout"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or(TransportError::MissingPipe("stderr"))?;

    let pid = child.id();
    info!(pid, path = %executable.display(), "tray process spawned");

    let (control, monitor) = ProcessControl::pair_with_pid(pid);
    tokio::spawn(reap(child, monitor));

    Ok(ProcessIo::new(stdin, stdout, stderr, control))
}

/// Owns the child until it exits, forwarding termination requests.
///
/// If every control handle is dropped while the child still runs, the child
/// is asked to terminate as well.
async fn reap(mut child: Child, monitor: ProcessMonitor) {
    let pid = child.id();
    let mut abandoned = false;

    let status = loop {
        tokio::select! {
            status = child.wait() => break status,
            () = monitor.terminate_requested() => {
                signal_terminate(pid).await;
            }
            () = monitor.abandoned(), if !abandoned => {
                debug!(pid, "all tray handles dropped, terminating process");
                abandoned = true;
                signal_terminate(pid).await;
            }
        }
    };

    let info = match status {
        Ok(status) => ExitInfo::from(status),
        Err(e) => {
            warn!(pid, "failed to wait for tray process: {e}");
            ExitInfo::default()
        }
    };
    info!(pid, status = %info, "tray process exited");
    monitor.report_exit(info);
}

async fn signal_terminate(pid: Option<u32>) {
    let Some(pid) = pid else {
        debug!("tray process already reaped, nothing to signal");
        return;
    };
    if let Err(e) = terminate_pid(pid).await {
        warn!(pid, "{e}");
    }
}

/// Sends SIGTERM via `kill`.
#[cfg(unix)]
async fn terminate_pid(pid: u32) -> Result<(), TransportError> {
    let output = Command::new("kill")
        .args(["-TERM", &pid.to_string()])
        .output()
        .await
        .map_err(|e| TransportError::Terminate(format!("failed to run kill: {e}")))?;

    if !output.status.success() {
        return Err(TransportError::Terminate(format!("kill -TERM {pid} failed")));
    }
    Ok(())
}

/// Asks the process to close via `taskkill` without `/F`.
#[cfg(windows)]
async fn terminate_pid(pid: u32) -> Result<(), TransportError> {
    let output = Command::new("taskkill")
        .args(["/PID", &pid.to_string()])
        .output()
        .await
        .map_err(|e| TransportError::Terminate(format!("failed to run taskkill: {e}")))?;

    if !output.status.success() {
        return Err(TransportError::Terminate(format!(
            "taskkill /PID {pid} failed"
        )));
    }
    Ok(())
}
