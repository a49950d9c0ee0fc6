// src/exec/runner.rs

//! Single external process runner.
//!
//! Both output pipes are drained concurrently with waiting for the process
//! to exit. Draining one pipe after the other can deadlock as soon as the
//! child fills the OS buffer of the pipe nobody is reading.
//!
//! Nothing in here returns `Err`: failing to start or await the child is
//! reported through [`ProcessInvocationResult::exception`].

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::AcsBuildError;
use crate::result::{ProcessInvocationResult, TaskException};

/// Bound on decoded lines buffered between the pipe pumps and the consumer.
const LINE_CHANNEL_CAPACITY: usize = 256;

/// Writer a captured stream is copied into.
pub type Sink<'a> = dyn AsyncWrite + Unpin + Send + 'a;

/// Which pipe a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

/// Program, arguments and working directory of one invocation.
#[derive(Debug, Clone)]
pub struct ProcessSpec {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub working_dir: Option<PathBuf>,
}

impl ProcessSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: Option<&Path>) -> Self {
        self.working_dir = dir.map(Path::to_path_buf);
        self
    }

    fn command(&self, capture_stdout: bool, capture_stderr: bool) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(if capture_stdout { Stdio::piped() } else { Stdio::null() })
            .stderr(if capture_stderr { Stdio::piped() } else { Stdio::null() })
            .kill_on_drop(true);

        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        // Own process group, so cancellation can take down the whole tree.
        #[cfg(unix)]
        cmd.process_group(0);

        cmd
    }

    fn spawn(&self, capture_stdout: bool, capture_stderr: bool) -> anyhow::Result<Child> {
        info!(command = %self, "starting process");
        self.command(capture_stdout, capture_stderr)
            .spawn()
            .with_context(|| format!("starting process {}", self.program.display()))
    }
}

impl fmt::Display for ProcessSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Run a process, copying stdout / stderr into the given sinks.
///
/// A `None` sink means the stream is not captured at all (redirected to the
/// null device) rather than captured and thrown away.
pub async fn run_process(
    spec: &ProcessSpec,
    stdout: Option<&mut Sink<'_>>,
    stderr: Option<&mut Sink<'_>>,
    cancel: &CancellationToken,
) -> ProcessInvocationResult {
    let mut child = match spec.spawn(stdout.is_some(), stderr.is_some()) {
        Ok(child) => child,
        Err(err) => {
            warn!(command = %spec, error = %err, "failed to start process");
            return ProcessInvocationResult::failed(err);
        }
    };

    let out_pipe = child.stdout.take();
    let err_pipe = child.stderr.take();

    tokio::select! {
        (out_res, err_res, status) = async {
            tokio::join!(pump(out_pipe, stdout), pump(err_pipe, stderr), child.wait())
        } => {
            let mut result = exit_result(spec, status);
            for (stream, res) in [("stdout", out_res), ("stderr", err_res)] {
                if let Err(err) = res {
                    warn!(command = %spec, stream, error = %err, "failed to drain process output");
                    if result.exception.is_none() {
                        result.exception = Some(TaskException::new(
                            anyhow::Error::new(err)
                                .context(format!("reading {stream} of {}", spec.program.display())),
                        ));
                    }
                }
            }
            result
        }

        _ = cancel.cancelled() => {
            kill_process_tree(spec, &mut child).await;
            ProcessInvocationResult::failed(AcsBuildError::Cancelled.into())
        }
    }
}

/// Line-oriented variant of [`run_process`].
///
/// Both pipes are always captured. Each pump decodes lines (lossy UTF-8,
/// trailing `\r\n` stripped) and feeds them through a bounded channel; the
/// callback runs on the caller's task, in arrival order, while the process is
/// still running.
pub async fn run_process_lines<F>(
    spec: &ProcessSpec,
    cancel: &CancellationToken,
    mut on_line: F,
) -> ProcessInvocationResult
where
    F: FnMut(StreamKind, &str) + Send,
{
    let mut child = match spec.spawn(true, true) {
        Ok(child) => child,
        Err(err) => {
            warn!(command = %spec, error = %err, "failed to start process");
            return ProcessInvocationResult::failed(err);
        }
    };

    let (tx, mut rx) = mpsc::channel::<(StreamKind, String)>(LINE_CHANNEL_CAPACITY);

    let mut pumps = Vec::new();
    if let Some(out) = child.stdout.take() {
        pumps.push(tokio::spawn(pump_lines(out, StreamKind::Stdout, tx.clone())));
    }
    if let Some(err) = child.stderr.take() {
        pumps.push(tokio::spawn(pump_lines(err, StreamKind::Stderr, tx.clone())));
    }
    // Only the pumps hold senders now: the channel closes once both hit EOF.
    drop(tx);

    tokio::select! {
        status = async {
            while let Some((kind, line)) = rx.recv().await {
                on_line(kind, &line);
            }
            child.wait().await
        } => {
            let mut result = exit_result(spec, status);
            for pump in pumps {
                let pump_res = match pump.await {
                    Ok(res) => res.map_err(anyhow::Error::new),
                    Err(join_err) => Err(anyhow::Error::new(join_err)),
                };
                if let Err(err) = pump_res {
                    warn!(command = %spec, error = %err, "failed to drain process output");
                    if result.exception.is_none() {
                        result.exception = Some(TaskException::new(err));
                    }
                }
            }
            result
        }

        _ = cancel.cancelled() => {
            kill_process_tree(spec, &mut child).await;
            for pump in pumps {
                pump.abort();
            }
            ProcessInvocationResult::failed(AcsBuildError::Cancelled.into())
        }
    }
}

/// Captured output of [`run_captured`].
#[derive(Debug, Clone, Default)]
pub struct CapturedOutput {
    pub result: ProcessInvocationResult,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CapturedOutput {
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Run a process and buffer both streams in memory.
pub async fn run_captured(spec: &ProcessSpec, cancel: &CancellationToken) -> CapturedOutput {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let result = run_process(
        spec,
        Some(&mut stdout as &mut Sink<'_>),
        Some(&mut stderr as &mut Sink<'_>),
        cancel,
    )
    .await;
    CapturedOutput {
        result,
        stdout,
        stderr,
    }
}

async fn pump<R>(pipe: Option<R>, sink: Option<&mut Sink<'_>>) -> std::io::Result<u64>
where
    R: AsyncRead + Unpin,
{
    match (pipe, sink) {
        (Some(mut reader), Some(writer)) => {
            let copied = tokio::io::copy(&mut reader, &mut *writer).await?;
            writer.flush().await?;
            Ok(copied)
        }
        _ => Ok(0),
    }
}

async fn pump_lines<R>(
    pipe: R,
    kind: StreamKind,
    tx: mpsc::Sender<(StreamKind, String)>,
) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(pipe);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let read = reader.read_until(b'\n', &mut buf).await?;
        if read == 0 {
            return Ok(());
        }
        while matches!(buf.last(), Some(b'\n' | b'\r')) {
            buf.pop();
        }
        let line = String::from_utf8_lossy(&buf).into_owned();
        if tx.send((kind, line)).await.is_err() {
            // Consumer went away (cancelled); keep draining so the child
            // never blocks on a full pipe.
            debug!(?kind, "line consumer closed; discarding remaining output");
            tokio::io::copy(&mut reader, &mut tokio::io::sink()).await?;
            return Ok(());
        }
    }
}

fn exit_result(
    spec: &ProcessSpec,
    status: std::io::Result<ExitStatus>,
) -> ProcessInvocationResult {
    match status {
        Ok(status) => {
            let code = status.code();
            info!(
                command = %spec,
                exit_code = ?code,
                success = status.success(),
                "process exited"
            );
            ProcessInvocationResult::exited(code)
        }
        Err(err) => {
            warn!(command = %spec, error = %err, "failed waiting for process");
            ProcessInvocationResult::failed(
                anyhow::Error::new(err)
                    .context(format!("waiting for process {}", spec.program.display())),
            )
        }
    }
}

async fn kill_process_tree(spec: &ProcessSpec, child: &mut Child) {
    info!(command = %spec, "cancellation requested; killing process");

    if let Some(pid) = child.id() {
        if !kill_process_group(pid) {
            debug!(command = %spec, pid, "killpg failed; killing the child only");
        }
    }

    if let Err(e) = child.kill().await {
        debug!(command = %spec, error = %e, "failed to kill child process (already exited?)");
    }
}

#[cfg(unix)]
fn kill_process_group(pid: u32) -> bool {
    // SAFETY: `pid` is our own child, which leads its process group
    // (`process_group(0)` at spawn) and has not been reaped yet.
    unsafe { libc::killpg(pid as libc::pid_t, libc::SIGKILL) == 0 }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: u32) -> bool {
    false
}
