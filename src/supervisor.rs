// ABOUTME: Spawns the game server and wires its stdio to the event detector, terminal, and logger
// ABOUTME: One task per stream: stdout feeds the dispatcher, stderr is logged, stdin is a command queue

use anyhow::{Context, Result};
use std::io::BufRead;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::Level;
use whosin_core::launch::LaunchSpec;
use whosin_core::{EventDispatcher, NotificationSink};

const READ_BUFFER_SIZE: usize = 8 * 1024;

/// Queued console commands waiting for the stdin writer
const CONSOLE_QUEUE_DEPTH: usize = 64;

/// Console command that makes a Bedrock server save the world and exit
pub const STOP_COMMAND: &str = "stop\n";

/// Handle for writing console commands to the server's stdin.
///
/// Commands from every clone are written in the order they are queued. Each
/// command should carry its own trailing newline.
#[derive(Debug, Clone)]
pub struct ServerConsole {
    tx: mpsc::Sender<String>,
}

impl ServerConsole {
    /// Create a console handle and the receiving end a stdin writer drains
    pub fn channel(depth: usize) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(depth);
        (Self { tx }, rx)
    }

    pub async fn send(&self, command: impl Into<String>) -> Result<()> {
        self.tx
            .send(command.into())
            .await
            .ok()
            .context("Server stdin is closed")
    }

    /// Blocking variant for use outside the async runtime
    pub fn blocking_send(&self, command: impl Into<String>) -> Result<()> {
        self.tx
            .blocking_send(command.into())
            .ok()
            .context("Server stdin is closed")
    }
}

/// Launches the server process and owns its stream wiring
pub struct ProcessSupervisor {
    launch: LaunchSpec,
    echo_output: bool,
}

impl ProcessSupervisor {
    pub fn new(launch: LaunchSpec) -> Self {
        Self {
            launch,
            echo_output: true,
        }
    }

    /// Whether server stdout/stderr is copied to this process's terminal
    pub fn echo_output(mut self, echo: bool) -> Self {
        self.echo_output = echo;
        self
    }

    /// Spawn the server and start the stream tasks.
    ///
    /// `dispatcher` is moved into the stdout task, which is its only owner.
    pub fn spawn<S>(self, dispatcher: EventDispatcher<S>) -> Result<RunningServer>
    where
        S: NotificationSink + Send + 'static,
    {
        let launch = &self.launch;
        tracing::info!(
            program = %launch.program.display(),
            working_dir = %launch.working_dir.display(),
            "Server spawning..."
        );

        let mut command = Command::new(&launch.program);
        command
            .args(&launch.args)
            .current_dir(&launch.working_dir)
            .envs(launch.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command.spawn().with_context(|| {
            format!(
                "Failed to spawn server executable {}",
                launch.program.display()
            )
        })?;
        let stdout = child.stdout.take().context("Failed to capture stdout")?;
        let stderr = child.stderr.take().context("Failed to capture stderr")?;
        let stdin = child.stdin.take().context("Failed to capture stdin")?;
        tracing::info!(pid = ?child.id(), "Server process started");

        let (console, rx) = ServerConsole::channel(CONSOLE_QUEUE_DEPTH);

        Ok(RunningServer {
            child,
            console,
            stdout_task: tokio::spawn(pump_stdout(stdout, dispatcher, self.echo_output)),
            stderr_task: tokio::spawn(pump_stderr(stderr, self.echo_output)),
            stdin_task: tokio::spawn(write_stdin(stdin, rx)),
        })
    }
}

/// A spawned server with its stream tasks
pub struct RunningServer {
    child: Child,
    console: ServerConsole,
    stdout_task: JoinHandle<()>,
    stderr_task: JoinHandle<()>,
    stdin_task: JoinHandle<()>,
}

impl RunningServer {
    pub fn console(&self) -> ServerConsole {
        self.console.clone()
    }

    /// Wait until the server process exits, without tearing down the stream tasks.
    ///
    /// Cancel safe: dropping this future leaves the server running and owned by `self`.
    pub async fn exited(&mut self) -> Result<ExitStatus> {
        self.child
            .wait()
            .await
            .context("Failed to wait for server process")
    }

    /// Wait for the server to exit and report the exit status.
    ///
    /// Remaining stdout is drained through the dispatcher before returning.
    pub async fn wait(mut self) -> Result<ExitStatus> {
        let status = self.exited().await?;
        Ok(self.finish(status).await)
    }

    /// Ask the server to shut down through its console and wait up to `grace` for it.
    ///
    /// The process is killed only if it is still running once `grace` has elapsed.
    pub async fn stop(mut self, grace: Duration) -> Result<ExitStatus> {
        tracing::info!(grace_secs = grace.as_secs_f64(), "Stopping server");
        if let Err(e) = self.console.send(STOP_COMMAND).await {
            tracing::warn!(error = %e, "Failed to send stop command to server");
        }

        let status = match tokio::time::timeout(grace, self.child.wait()).await {
            Ok(status) => status.context("Failed to wait for server process")?,
            Err(_) => {
                tracing::warn!(
                    pid = ?self.child.id(),
                    "Server did not stop in time, killing it"
                );
                self.child
                    .kill()
                    .await
                    .context("Failed to kill server process")?;
                self.exited().await?
            }
        };

        Ok(self.finish(status).await)
    }

    async fn finish(self, status: ExitStatus) -> ExitStatus {
        self.stdin_task.abort();
        if let Err(e) = self.stdout_task.await {
            tracing::warn!(error = %e, "Server stdout task ended abnormally");
        }
        if let Err(e) = self.stderr_task.await {
            tracing::warn!(error = %e, "Server stderr task ended abnormally");
        }

        report_exit(&status);
        status
    }
}

/// How a server exit is classified for reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerExit {
    /// Exit code 0
    Clean,
    /// Any other exit code
    Failed(i32),
    /// Terminated by a signal, no exit code
    Killed,
}

impl ServerExit {
    pub fn from_status(status: &ExitStatus) -> Self {
        match status.code() {
            Some(0) => ServerExit::Clean,
            Some(code) => ServerExit::Failed(code),
            None => ServerExit::Killed,
        }
    }

    /// Log level the exit is reported at
    pub fn level(&self) -> Level {
        match self {
            ServerExit::Clean => Level::INFO,
            ServerExit::Failed(_) | ServerExit::Killed => Level::ERROR,
        }
    }
}

/// Log the exit status: info for success, error otherwise
pub fn report_exit(status: &ExitStatus) {
    match ServerExit::from_status(status) {
        ServerExit::Clean => tracing::info!(code = 0, "Server process exited"),
        ServerExit::Failed(code) => tracing::error!(code, "Server process exited"),
        ServerExit::Killed => {
            tracing::error!(status = %status, "Server process terminated without exit code")
        }
    }
}

/// Forward operator terminal lines to the server console.
///
/// Runs on a dedicated thread because terminal reads block; the thread ends at
/// EOF or once the server's stdin closes.
pub fn spawn_operator_input(console: ServerConsole) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to read operator input");
                    break;
                }
            };
            if console.blocking_send(format!("{}\n", line)).is_err() {
                break;
            }
        }
        tracing::debug!("Operator input closed");
    })
}

async fn pump_stdout<S: NotificationSink>(
    mut stdout: ChildStdout,
    mut dispatcher: EventDispatcher<S>,
    echo: bool,
) {
    let mut buf = vec![0u8; READ_BUFFER_SIZE];
    let mut terminal = tokio::io::stdout();

    loop {
        let n = match stdout.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read server stdout");
                break;
            }
        };

        if echo {
            echo_chunk(&mut terminal, &buf[..n], "stdout").await;
        }

        dispatcher.on_chunk(&buf[..n]);
    }

    let pending = dispatcher.pending();
    if !pending.is_empty() {
        tracing::debug!(pending = %pending, "Server stdout closed mid-line");
    }
}

async fn pump_stderr(mut stderr: ChildStderr, echo: bool) {
    let mut buf = vec![0u8; READ_BUFFER_SIZE];
    let mut terminal = tokio::io::stderr();

    loop {
        let n = match stderr.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read server stderr");
                break;
            }
        };

        if echo {
            echo_chunk(&mut terminal, &buf[..n], "stderr").await;
        }

        let text = String::from_utf8_lossy(&buf[..n]);
        let text = text.trim_end();
        if !text.is_empty() {
            tracing::error!(stderr = %text, "Server stderr");
        }
    }
}

/// Copy a chunk of server output to this process's terminal.
///
/// A closed or broken terminal must not stop the pump, so failures are only logged.
async fn echo_chunk<W: AsyncWrite + Unpin>(terminal: &mut W, bytes: &[u8], stream: &str) {
    if let Err(e) = terminal.write_all(bytes).await {
        tracing::debug!(stream, error = %e, "Failed to echo server output");
        return;
    }
    if let Err(e) = terminal.flush().await {
        tracing::debug!(stream, error = %e, "Failed to flush echoed server output");
    }
}

async fn write_stdin(mut stdin: ChildStdin, mut commands: mpsc::Receiver<String>) {
    while let Some(command) = commands.recv().await {
        if let Err(e) = stdin.write_all(command.as_bytes()).await {
            tracing::error!(error = %e, "Failed to write to server stdin");
            break;
        }
        if let Err(e) = stdin.flush().await {
            tracing::error!(error = %e, "Failed to flush server stdin");
            break;
        }
    }
}
