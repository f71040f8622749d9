use super::error::TransportError;
use crate::config::ServerConfig;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, BufWriter, Lines,
};
use tokio::process::{Child, ChildStderr, Command};
use tokio::sync::{Mutex as AsyncMutex, MutexGuard, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Receives the tool server's stderr, one line per message.
pub type DiagnosticSink = mpsc::UnboundedSender<String>;

const STOP_GRACE: Duration = Duration::from_millis(500);

type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

struct Channel {
    reader: Lines<BufReader<BoxedReader>>,
    writer: BufWriter<BoxedWriter>,
}

impl Channel {
    fn new(reader: BoxedReader, writer: BoxedWriter) -> Self {
        Self {
            reader: BufReader::new(reader).lines(),
            writer: BufWriter::new(writer),
        }
    }
}

/// Line-oriented channel to a tool server over its stdin/stdout.
///
/// stderr is drained in the background so a chatty server can never block on a
/// full pipe. Lines go to the diagnostic sink when one is attached and to the
/// log otherwise.
pub struct Transport {
    name: String,
    server: Option<ServerConfig>,
    diagnostics: Option<DiagnosticSink>,
    child: AsyncMutex<Option<Child>>,
    channel: AsyncMutex<Option<Channel>>,
    drain: AsyncMutex<Option<JoinHandle<()>>>,
}

impl Transport {
    pub fn new(server: ServerConfig) -> Self {
        Self {
            name: server.name.clone(),
            server: Some(server),
            diagnostics: None,
            child: AsyncMutex::new(None),
            channel: AsyncMutex::new(None),
            drain: AsyncMutex::new(None),
        }
    }

    /// Wraps an already connected stream pair. There is no process behind it,
    /// so `start` is a no-op and `stop` only closes the streams.
    pub fn attach<R, W>(name: impl Into<String>, reader: R, writer: W) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            name: name.into(),
            server: None,
            diagnostics: None,
            child: AsyncMutex::new(None),
            channel: AsyncMutex::new(Some(Channel::new(Box::new(reader), Box::new(writer)))),
            drain: AsyncMutex::new(None),
        }
    }

    pub fn with_diagnostics(mut self, sink: Option<DiagnosticSink>) -> Self {
        self.diagnostics = sink;
        self
    }

    pub fn server_name(&self) -> &str {
        &self.name
    }

    pub async fn is_running(&self) -> bool {
        self.channel.lock().await.is_some()
    }

    /// Spawns the configured command with piped stdio. Calling it on a running
    /// transport does nothing.
    pub async fn start(&self) -> Result<(), TransportError> {
        let mut child_slot = self.child.lock().await;
        if child_slot.is_some() {
            return Ok(());
        }

        let Some(server) = &self.server else {
            return if self.channel.lock().await.is_some() {
                Ok(())
            } else {
                Err(self.not_started())
            };
        };

        let mut command = Command::new(&server.command);
        command
            .args(&server.args)
            .envs(&server.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &server.workdir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|source| TransportError::Spawn {
            server: self.name.clone(),
            source,
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| self.missing_pipe("stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| self.missing_pipe("stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| self.missing_pipe("stderr"))?;

        *self.channel.lock().await = Some(Channel::new(Box::new(stdout), Box::new(stdin)));
        *self.drain.lock().await = Some(spawn_stderr_drain(
            self.name.clone(),
            stderr,
            self.diagnostics.clone(),
        ));

        info!(
            server = %self.name,
            pid = ?child.id(),
            command = %server.command.display(),
            "Tool server started"
        );
        *child_slot = Some(child);
        Ok(())
    }

    /// Exclusive access to the channel. Holding the guard across a write and the
    /// matching read keeps request/response pairs from interleaving.
    pub async fn channel(&self) -> Result<ChannelGuard<'_>, TransportError> {
        let channel = self.channel.lock().await;
        if channel.is_none() {
            return Err(self.not_started());
        }
        Ok(ChannelGuard {
            server: &self.name,
            channel,
        })
    }

    pub async fn send_line(&self, line: &str) -> Result<(), TransportError> {
        self.channel().await?.send_line(line).await
    }

    pub async fn receive_line(&self) -> Result<String, TransportError> {
        self.channel().await?.receive_line().await
    }

    /// Closes stdin, kills the child and waits for it. Safe to call repeatedly
    /// and never fails; problems are logged.
    pub async fn stop(&self) {
        // EOF on stdin first, for servers that exit on their own.
        match self.channel.try_lock() {
            Ok(mut channel) => {
                channel.take();
            }
            Err(_) => debug!(server = %self.name, "exchange in flight while stopping"),
        }

        let child = self.child.lock().await.take();
        if let Some(mut child) = child {
            if let Err(err) = child.kill().await {
                debug!(server = %self.name, %err, "tool server already gone");
            }
            match child.wait().await {
                Ok(status) => info!(server = %self.name, %status, "Tool server stopped"),
                Err(err) => warn!(server = %self.name, %err, "failed to reap tool server"),
            }
        }

        match tokio::time::timeout(STOP_GRACE, self.channel.lock()).await {
            Ok(mut channel) => {
                channel.take();
            }
            Err(_) => warn!(server = %self.name, "channel still busy after stop"),
        }

        let drain = self.drain.lock().await.take();
        if let Some(mut handle) = drain {
            if tokio::time::timeout(STOP_GRACE, &mut handle).await.is_err() {
                debug!(server = %self.name, "stderr drain did not finish; aborting");
                handle.abort();
            }
        }
    }

    fn not_started(&self) -> TransportError {
        TransportError::NotStarted {
            server: self.name.clone(),
        }
    }

    fn missing_pipe(&self, stream: &'static str) -> TransportError {
        TransportError::MissingPipe {
            server: self.name.clone(),
            stream,
        }
    }
}

pub struct ChannelGuard<'a> {
    server: &'a str,
    channel: MutexGuard<'a, Option<Channel>>,
}

impl ChannelGuard<'_> {
    /// Writes `line` plus a newline and flushes.
    pub async fn send_line(&mut self, line: &str) -> Result<(), TransportError> {
        let server = self.server;
        let channel = self.channel.as_mut().ok_or_else(|| TransportError::NotStarted {
            server: server.to_string(),
        })?;
        let io = |source| TransportError::Io {
            server: server.to_string(),
            source,
        };

        channel.writer.write_all(line.as_bytes()).await.map_err(io)?;
        channel.writer.write_all(b"\n").await.map_err(io)?;
        channel.writer.flush().await.map_err(io)
    }

    /// Reads one line without its terminator. End of stream is `Closed`.
    pub async fn receive_line(&mut self) -> Result<String, TransportError> {
        let server = self.server;
        let channel = self.channel.as_mut().ok_or_else(|| TransportError::NotStarted {
            server: server.to_string(),
        })?;

        match channel.reader.next_line().await {
            Ok(Some(line)) => Ok(line),
            Ok(None) => Err(TransportError::Closed {
                server: server.to_string(),
            }),
            Err(source) => Err(TransportError::Io {
                server: server.to_string(),
                source,
            }),
        }
    }
}

fn spawn_stderr_drain(
    server: String,
    stderr: ChildStderr,
    sink: Option<DiagnosticSink>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(stderr).lines();
        let mut sink = sink;
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let line = line.trim_end();
                    if line.is_empty() {
                        continue;
                    }
                    if let Some(tx) = &sink {
                        if tx.send(line.to_string()).is_ok() {
                            continue;
                        }
                        sink = None;
                    }
                    warn!(server = %server, line, "tool server stderr");
                }
                Ok(None) => break,
                Err(err) => {
                    debug!(server = %server, %err, "stderr drain stopped");
                    break;
                }
            }
        }
    })
}
