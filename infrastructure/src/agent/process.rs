//! Agent CLI subprocess transport.
//!
//! Spawns the agent CLI and speaks the newline-delimited JSON protocol over
//! its stdio. A background reader task is the single owner of the child's
//! stdout: it decodes each line with [`wire::decode_line`] and forwards the
//! events over an unbounded channel, so [`next_event`](ProcessTransport::next_event)
//! is a plain channel receive and stays cancel-safe. Writes go through a
//! mutex-serialized buffered writer, independent of the reader.

use crate::agent::error::AgentCliError;
use crate::agent::wire;
use async_trait::async_trait;
use std::process::Stdio;
use tether_application::ports::transport::{AgentTransport, TransportError};
use tether_domain::{InboundEvent, OutboundMessage};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

/// Transport over an agent CLI child process (killed on Drop to prevent
/// orphans).
pub struct ProcessTransport {
    child: Child,
    writer: Mutex<BufWriter<ChildStdin>>,
    events: Mutex<mpsc::UnboundedReceiver<InboundEvent>>,
    _reader_handle: JoinHandle<()>,
}

impl ProcessTransport {
    /// Spawn the agent CLI and wire up both stdio directions.
    pub fn spawn(program: &str, args: &[String]) -> Result<Self, AgentCliError> {
        debug!("Spawning agent CLI: {} {}", program, args.join(" "));

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());

        // Linux: request kernel to send SIGTERM to child when parent dies.
        // This catches cases where Drop doesn't run (SIGKILL, OOM kill).
        #[cfg(target_os = "linux")]
        unsafe {
            cmd.pre_exec(|| {
                libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGTERM);
                Ok(())
            });
        }

        let mut child = cmd.spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or(AgentCliError::MissingPipe("stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or(AgentCliError::MissingPipe("stdout"))?;

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let reader_handle = tokio::spawn(Self::reader_loop(stdout, event_tx));

        Ok(Self {
            child,
            writer: Mutex::new(BufWriter::new(stdin)),
            events: Mutex::new(event_rx),
            _reader_handle: reader_handle,
        })
    }

    /// Background reader loop — single owner of the child's stdout.
    ///
    /// Runs until the pipe closes or an I/O error occurs. Lines that are
    /// not valid JSON are logged and skipped; everything else (including
    /// unknown frames) is forwarded as an event. When the loop exits, the
    /// sender drops and the consumer observes end of stream.
    async fn reader_loop(stdout: ChildStdout, event_tx: mpsc::UnboundedSender<InboundEvent>) {
        let mut lines = BufReader::new(stdout).lines();

        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    debug!("Reader loop: agent stdout closed");
                    break;
                }
                Err(e) => {
                    warn!("Reader loop: read error: {}", e);
                    break;
                }
            };

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            trace!("Agent frame: {}", trimmed);

            let event = match wire::decode_line(trimmed) {
                Ok(event) => event,
                Err(e) => {
                    warn!("Reader loop: skipping malformed frame: {} — {}", e, trimmed);
                    continue;
                }
            };

            if event_tx.send(event).is_err() {
                debug!("Reader loop: event consumer gone, stopping");
                break;
            }
        }
    }

    async fn write_line(&self, line: &str) -> std::io::Result<()> {
        let mut writer = self.writer.lock().await;
        writer.write_all(line.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await
    }

    /// Pid of the child process, if still running.
    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }
}

#[async_trait]
impl AgentTransport for ProcessTransport {
    async fn send(&self, message: &OutboundMessage) -> Result<(), TransportError> {
        let line = wire::encode_message(message)
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        self.write_line(&line)
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }

    async fn next_event(&self) -> Result<Option<InboundEvent>, TransportError> {
        // recv() is cancel-safe, and so is holding the lock across it: a
        // cancelled wait releases the lock without consuming an event.
        Ok(self.events.lock().await.recv().await)
    }

    async fn cancel(&self) -> Result<(), TransportError> {
        self.write_line(&wire::encode_cancel())
            .await
            .map_err(|_| TransportError::CancelUnacknowledged)
    }
}

impl Drop for ProcessTransport {
    fn drop(&mut self) {
        let _ = self.child.start_kill();
    }
}
