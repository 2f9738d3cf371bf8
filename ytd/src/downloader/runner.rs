//! Process runner for the external downloader.
//!
//! [`ProcessRunner::run`] starts the tool and exposes stdout and stderr as a
//! single ordered stream of text records. Which stream the tool writes its
//! progress to depends on the environment, so both are merged. Ordering
//! across the two streams is best effort; ordering within one is preserved.
//!
//! [`ProcessRunner::capture`] is the buffered variant for one-shot calls.

use async_trait::async_trait;
use tokio::io::AsyncRead;
use tokio::process::Child;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, trace, warn};

use super::output::RecordReader;
use crate::{Error, Result};

/// Capacity of the merged line channel.
const LINE_CHANNEL_CAPACITY: usize = 256;

/// Exit status of a streamed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessExit {
    /// Exit code, `None` if the process was killed by a signal or could not be waited on.
    pub code: Option<i32>,
}

impl ProcessExit {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Merged output of a running process.
///
/// Lines are a lazy, single-pass sequence that ends once the process has
/// closed both output streams. [`ProcessOutput::wait`] then yields its exit.
pub struct ProcessOutput {
    lines: mpsc::Receiver<String>,
    exit: oneshot::Receiver<ProcessExit>,
}

impl ProcessOutput {
    /// Assemble an output from a line channel and an exit channel.
    pub fn from_parts(lines: mpsc::Receiver<String>, exit: oneshot::Receiver<ProcessExit>) -> Self {
        Self { lines, exit }
    }

    /// Next output line, or `None` once the process closed its output.
    pub async fn next_line(&mut self) -> Option<String> {
        self.lines.recv().await
    }

    /// Wait for the process to exit.
    pub async fn wait(self) -> ProcessExit {
        self.exit.await.unwrap_or(ProcessExit { code: None })
    }
}

/// Runs the external downloader.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Name of the tool, used for logs and errors.
    fn program(&self) -> &str;

    /// Start the tool and stream its merged output.
    ///
    /// Fails only when the process cannot be started.
    async fn run(&self, args: &[String]) -> Result<ProcessOutput>;

    /// Run the tool to completion and return its stdout.
    ///
    /// A non-zero exit is reported as [`Error::ToolFailed`].
    async fn capture(&self, args: &[String]) -> Result<Vec<u8>>;
}

/// [`ProcessRunner`] backed by `tokio::process`.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    program: String,
}

impl CommandRunner {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn launch_error(&self, source: std::io::Error) -> Error {
        Error::ToolLaunch {
            tool: self.program.clone(),
            source,
        }
    }
}

#[async_trait]
impl ProcessRunner for CommandRunner {
    fn program(&self) -> &str {
        &self.program
    }

    async fn run(&self, args: &[String]) -> Result<ProcessOutput> {
        debug!(program = %self.program, ?args, "Spawning downloader");

        let mut child = process_utils::tool_command(&self.program)
            .args(args)
            .spawn()
            .map_err(|e| self.launch_error(e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Other(format!("Failed to capture {} stdout", self.program)))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::Other(format!("Failed to capture {} stderr", self.program)))?;

        let (line_tx, line_rx) = mpsc::channel(LINE_CHANNEL_CAPACITY);
        tokio::spawn(forward_records(stdout, "stdout", line_tx.clone()));
        tokio::spawn(forward_records(stderr, "stderr", line_tx));

        Ok(ProcessOutput::from_parts(line_rx, spawn_process_waiter(child)))
    }

    async fn capture(&self, args: &[String]) -> Result<Vec<u8>> {
        debug!(program = %self.program, ?args, "Running downloader");

        let output = process_utils::tool_command(&self.program)
            .args(args)
            .output()
            .await
            .map_err(|e| self.launch_error(e))?;

        if !output.status.success() {
            return Err(Error::ToolFailed {
                tool: self.program.clone(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output.stdout)
    }
}

/// Forward every record of one output stream into the merged channel.
async fn forward_records<R>(stream: R, name: &'static str, tx: mpsc::Sender<String>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = RecordReader::new(stream);
    loop {
        match reader.next_record().await {
            Ok(Some(line)) => {
                trace!(stream = name, %line, "Downloader output");
                if tx.send(line).await.is_err() {
                    // Consumer gone: drain so the child never blocks on a full pipe.
                    while let Ok(Some(_)) = reader.next_record().await {}
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                error!(stream = name, "Error reading downloader output: {}", e);
                break;
            }
        }
    }
}

/// Spawn a task that waits for the process to exit and reports its code.
fn spawn_process_waiter(mut child: Child) -> oneshot::Receiver<ProcessExit> {
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let code = match child.wait().await {
            Ok(status) => {
                if let Some(c) = status.code()
                    && c != 0
                {
                    warn!("Process exited with code: {}", c);
                }
                status.code()
            }
            Err(e) => {
                error!("Error waiting for process: {}", e);
                None
            }
        };
        let _ = tx.send(ProcessExit { code });
    });

    rx
}
