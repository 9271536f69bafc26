//! Child process supervision.
//!
//! A decrypted command runs either attached or detached:
//!
//! - **Attached**: the child inherits our standard streams. Two tasks run
//!   until it exits. The exit task owns the child: it awaits the exit status,
//!   delivers relayed signals while the child is still unreaped, and fires a
//!   one-shot completion channel once it has the status. The forwarding task
//!   relays SIGINT and SIGTERM received by this process to the exit task
//!   until that channel fires. [`AttachedChild::wait`] returns only after
//!   both tasks have finished.
//! - **Detached**: the child is started in its own process group with stdin
//!   detached, and the caller gets its pid back immediately. The runtime
//!   reaps it in the background once it exits.

use std::ffi::OsStr;
use std::io;
use std::process::{ExitStatus, Stdio};

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::{CmdsafeError, Result};

/// How a command is launched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Wait for the child and report its exit status.
    #[default]
    Attached,
    /// Start the child and return without waiting.
    Detached,
}

/// How an attached child finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildExit {
    /// Exit code, or `128 + signal` if the child was killed by a signal.
    pub code: i32,
    /// The terminating signal, if any.
    pub signal: Option<i32>,
}

impl ChildExit {
    pub fn success(&self) -> bool {
        self.code == 0
    }

    fn from_status(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return Self { code, signal: None };
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return Self {
                    code: 128 + signal,
                    signal: Some(signal),
                };
            }
        }
        Self {
            code: 1,
            signal: None,
        }
    }
}

/// Result of [`ProcessSupervisor::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Exited(ChildExit),
    Detached { pid: u32 },
}

impl RunOutcome {
    /// The exit code this process should report for the run.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::Exited(exit) => exit.code,
            RunOutcome::Detached { .. } => 0,
        }
    }
}

/// Signals relayed to an attached child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardedSignal {
    Interrupt,
    Terminate,
}

impl ForwardedSignal {
    #[cfg(unix)]
    pub fn as_raw(self) -> libc::c_int {
        match self {
            ForwardedSignal::Interrupt => libc::SIGINT,
            ForwardedSignal::Terminate => libc::SIGTERM,
        }
    }
}

/// Starts and monitors the process for one saved command.
#[derive(Debug, Clone)]
pub struct ProcessSupervisor {
    handle: String,
}

impl ProcessSupervisor {
    /// `handle` names the saved command in errors and logs.
    pub fn new(handle: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
        }
    }

    pub fn handle(&self) -> &str {
        &self.handle
    }

    /// Launch the command in the requested mode.
    ///
    /// Attached runs resolve once the child has exited; detached runs resolve
    /// as soon as the child has been started.
    pub async fn run<I, S>(&self, executable: &str, args: I, mode: RunMode) -> Result<RunOutcome>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        match mode {
            RunMode::Attached => {
                let child = self.spawn_attached(executable, args).await?;
                Ok(RunOutcome::Exited(child.wait().await?))
            }
            RunMode::Detached => {
                let pid = self.spawn_detached(executable, args).await?;
                Ok(RunOutcome::Detached { pid })
            }
        }
    }

    /// Start the child with inherited stdio and begin forwarding signals.
    ///
    /// Signal handlers are installed before the child is spawned, so a signal
    /// arriving right after launch is not lost.
    pub async fn spawn_attached<I, S>(&self, executable: &str, args: I) -> Result<AttachedChild>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        #[cfg(unix)]
        let signals = SignalStreams::register().map_err(|source| self.start_error(source))?;

        let mut child = tokio::process::Command::new(executable)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| self.start_error(source))?;
        let pid = child.id().ok_or_else(|| {
            self.start_error(io::Error::other("child exited before its pid was read"))
        })?;
        tracing::debug!(handle = %self.handle, pid, "started attached child");

        let (done_tx, done_rx) = oneshot::channel::<()>();
        let (relay_tx, relay_rx) = mpsc::unbounded_channel::<ForwardedSignal>();

        let exit_task = tokio::spawn(await_exit(child, relay_rx, done_tx));

        #[cfg(unix)]
        let forward_task = tokio::spawn(forward_signals(signals, relay_tx, done_rx));
        #[cfg(not(unix))]
        let forward_task = tokio::spawn(async move {
            drop(relay_tx);
            let _ = done_rx.await;
        });

        Ok(AttachedChild {
            handle: self.handle.clone(),
            pid,
            exit_task,
            forward_task,
        })
    }

    /// Start the child in its own process group and return its pid.
    ///
    /// The child keeps our stdout and stderr but gets a null stdin. It is not
    /// waited on here; the handle is dropped into the runtime, which reaps
    /// the child in the background when it exits, so a long-lived caller does
    /// not accumulate zombies.
    pub async fn spawn_detached<I, S>(&self, executable: &str, args: I) -> Result<u32>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut command = tokio::process::Command::new(executable);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        #[cfg(unix)]
        command.process_group(0);

        let child = command.spawn().map_err(|source| self.start_error(source))?;
        let pid = child.id().ok_or_else(|| {
            self.start_error(io::Error::other("child exited before its pid was read"))
        })?;
        tracing::debug!(handle = %self.handle, pid, "started detached child");
        Ok(pid)
    }

    fn start_error(&self, source: io::Error) -> CmdsafeError {
        CmdsafeError::ProcessStart {
            handle: self.handle.clone(),
            source,
        }
    }
}

/// A running attached child and its supervising tasks.
#[derive(Debug)]
pub struct AttachedChild {
    handle: String,
    pid: u32,
    exit_task: JoinHandle<(io::Result<ExitStatus>, usize)>,
    forward_task: JoinHandle<()>,
}

impl AttachedChild {
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Wait for the child to exit and for signal forwarding to stop.
    pub async fn wait(self) -> Result<ChildExit> {
        let (status, forwarded) = self
            .exit_task
            .await
            .map_err(|e| wait_error(&self.handle, io::Error::other(e)))?;
        let status = status.map_err(|source| wait_error(&self.handle, source))?;

        self.forward_task
            .await
            .map_err(|e| wait_error(&self.handle, io::Error::other(e)))?;

        let exit = ChildExit::from_status(status);
        tracing::debug!(
            handle = %self.handle,
            code = exit.code,
            signal = ?exit.signal,
            forwarded,
            "attached child exited"
        );
        Ok(exit)
    }
}

fn wait_error(handle: &str, source: io::Error) -> CmdsafeError {
    CmdsafeError::ProcessWait {
        handle: handle.to_string(),
        source,
    }
}

#[cfg(unix)]
struct SignalStreams {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl SignalStreams {
    fn register() -> io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }
}

/// Own `child` until it exits, delivering relayed signals to it meanwhile.
///
/// Signals are only delivered while `child.id()` is still `Some`, i.e. before
/// the child has been reaped, so a recycled pid is never signalled. Returns
/// the exit status and how many signals were delivered.
async fn await_exit(
    mut child: tokio::process::Child,
    mut relayed: mpsc::UnboundedReceiver<ForwardedSignal>,
    done: oneshot::Sender<()>,
) -> (io::Result<ExitStatus>, usize) {
    let mut delivered = 0;
    let status = loop {
        tokio::select! {
            biased;
            status = child.wait() => break status,
            Some(signal) = relayed.recv() => {
                if let Some(pid) = child.id() {
                    if deliver(pid, signal) {
                        delivered += 1;
                    }
                }
            }
        }
    };
    // The forwarder may already be gone if the runtime is shutting down.
    let _ = done.send(());
    (status, delivered)
}

#[cfg(unix)]
fn deliver(pid: u32, signal: ForwardedSignal) -> bool {
    let Ok(target) = libc::pid_t::try_from(pid) else {
        tracing::warn!(pid, "child pid out of range, signal not forwarded");
        return false;
    };
    // SAFETY: kill(2) has no memory-safety preconditions.
    let rc = unsafe { libc::kill(target, signal.as_raw()) };
    if rc == 0 {
        tracing::debug!(pid, ?signal, "forwarded signal to child");
        true
    } else {
        tracing::warn!(
            pid,
            ?signal,
            error = %io::Error::last_os_error(),
            "failed to forward signal to child"
        );
        false
    }
}

#[cfg(not(unix))]
fn deliver(_pid: u32, _signal: ForwardedSignal) -> bool {
    false
}

/// Relay received signals to the exit task until `done` fires.
#[cfg(unix)]
async fn forward_signals(
    mut signals: SignalStreams,
    relay: mpsc::UnboundedSender<ForwardedSignal>,
    mut done: oneshot::Receiver<()>,
) {
    loop {
        let signal = tokio::select! {
            biased;
            _ = &mut done => break,
            Some(()) = signals.interrupt.recv() => ForwardedSignal::Interrupt,
            Some(()) = signals.terminate.recv() => ForwardedSignal::Terminate,
        };
        if relay.send(signal).is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_mode_default_is_attached() {
        assert_eq!(RunMode::default(), RunMode::Attached);
    }

    #[test]
    fn test_outcome_exit_codes() {
        let exited = RunOutcome::Exited(ChildExit {
            code: 37,
            signal: None,
        });
        assert_eq!(exited.exit_code(), 37);
        assert_eq!(RunOutcome::Detached { pid: 1234 }.exit_code(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_from_signal_status() {
        use std::os::unix::process::ExitStatusExt;

        // Raw wait status for "terminated by SIGKILL".
        let exit = ChildExit::from_status(ExitStatus::from_raw(libc::SIGKILL));
        assert_eq!(exit.signal, Some(libc::SIGKILL));
        assert_eq!(exit.code, 128 + libc::SIGKILL);
        assert!(!exit.success());
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_from_code_status() {
        use std::os::unix::process::ExitStatusExt;

        // Raw wait status for "exited with 3".
        let exit = ChildExit::from_status(ExitStatus::from_raw(3 << 8));
        assert_eq!(exit, ChildExit { code: 3, signal: None });
    }

    #[cfg(unix)]
    #[test]
    fn test_forwarded_signal_numbers() {
        assert_eq!(ForwardedSignal::Interrupt.as_raw(), libc::SIGINT);
        assert_eq!(ForwardedSignal::Terminate.as_raw(), libc::SIGTERM);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_relayed_signal_reaches_running_child() {
        let child = tokio::process::Command::new("sleep")
            .arg("5")
            .spawn()
            .unwrap();
        let (relay_tx, relay_rx) = mpsc::unbounded_channel();
        let (done_tx, done_rx) = oneshot::channel();
        relay_tx.send(ForwardedSignal::Terminate).unwrap();

        let (status, delivered) = await_exit(child, relay_rx, done_tx).await;
        let exit = ChildExit::from_status(status.unwrap());
        assert_eq!(exit.signal, Some(libc::SIGTERM));
        assert_eq!(delivered, 1);
        assert!(done_rx.await.is_ok());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_no_signal_after_child_exit() {
        let child = tokio::process::Command::new("true").spawn().unwrap();
        // Let the child exit before anything is relayed.
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;

        let (relay_tx, relay_rx) = mpsc::unbounded_channel();
        let (done_tx, _done_rx) = oneshot::channel();
        relay_tx.send(ForwardedSignal::Interrupt).unwrap();
        drop(relay_tx);

        let (status, delivered) = await_exit(child, relay_rx, done_tx).await;
        assert!(status.unwrap().success());
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn test_attached_true_succeeds() {
        let supervisor = ProcessSupervisor::new("ok");
        let outcome = supervisor
            .run("true", Vec::<String>::new(), RunMode::Attached)
            .await
            .unwrap();
        assert_eq!(outcome.exit_code(), 0);
    }

    #[tokio::test]
    async fn test_missing_executable_names_handle() {
        let supervisor = ProcessSupervisor::new("ghost");
        let err = supervisor
            .run("/nonexistent/cmdsafe-test-binary", ["x"], RunMode::Attached)
            .await
            .unwrap_err();
        match err {
            CmdsafeError::ProcessStart { handle, .. } => assert_eq!(handle, "ghost"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
