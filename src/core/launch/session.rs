use std::collections::VecDeque;
use std::process::ExitStatus;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::events::{EventEmitter, LauncherEvent};

const KEPT_LINES: usize = 200;
const CRASH_TAIL_LINES: usize = 30;

/// Output and lifecycle of a running game, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    /// A stdout line.
    Data(String),
    /// A stderr line.
    Debug(String),
    Exited(Option<i32>),
}

/// Bounded history of recent output lines.
#[derive(Debug)]
pub struct RecentLines {
    lines: VecDeque<String>,
    capacity: usize,
}

impl RecentLines {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, line: String) {
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    /// The last `n` lines joined with newlines.
    pub fn tail(&self, n: usize) -> String {
        let skip = self.lines.len().saturating_sub(n);
        self.lines
            .iter()
            .skip(skip)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// One running game process. Output is fanned out to subscribers as
/// [`GameEvent`]s; the session ends when the process exits.
pub struct GameSession {
    version: String,
    child: Child,
    subscribers: Vec<mpsc::UnboundedSender<GameEvent>>,
    events: EventEmitter,
}

impl GameSession {
    pub fn spawn(mut command: Command, version: &str, events: EventEmitter) -> LauncherResult<Self> {
        let child = command.spawn().map_err(|e| {
            let message = format!("Failed to start {}: {}", version, e);
            error!("{}", message);
            events.emit(LauncherEvent::GameError {
                message: message.clone(),
            });
            LauncherError::JavaExecution(message)
        })?;
        info!("Started {} (pid {:?})", version, child.id());

        Ok(Self {
            version: version.to_string(),
            child,
            subscribers: Vec::new(),
            events,
        })
    }

    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<GameEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    /// Stream output until the process exits. A non-zero exit code or death by
    /// signal becomes [`LauncherError::GameCrashed`] with the last lines of output.
    pub async fn run(mut self) -> LauncherResult<Option<i32>> {
        let (line_tx, mut line_rx) = mpsc::unbounded_channel();
        if let Some(stdout) = self.child.stdout.take() {
            pump_lines(stdout, line_tx.clone(), GameEvent::Data);
        }
        if let Some(stderr) = self.child.stderr.take() {
            pump_lines(stderr, line_tx.clone(), GameEvent::Debug);
        }
        drop(line_tx);

        let mut recent = RecentLines::new(KEPT_LINES);
        while let Some(event) = line_rx.recv().await {
            match &event {
                GameEvent::Data(line) => {
                    info!("[mc:{}][stdout] {}", self.version, line);
                    recent.push(line.clone());
                }
                GameEvent::Debug(line) => {
                    warn!("[mc:{}][stderr] {}", self.version, line);
                    recent.push(line.clone());
                }
                GameEvent::Exited(_) => {}
            }
            self.publish(event);
        }

        let status = self.child.wait().await.map_err(|e| {
            let message = format!("Lost track of {}: {}", self.version, e);
            self.events.emit(LauncherEvent::GameError {
                message: message.clone(),
            });
            LauncherError::JavaExecution(message)
        })?;
        let code = status.code();
        let signal = terminating_signal(&status);
        info!("{} exited with {:?} (signal {:?})", self.version, code, signal);

        self.events.emit(LauncherEvent::GameClosed { code });
        self.publish(GameEvent::Exited(code));

        if status.success() {
            return Ok(code);
        }
        Err(LauncherError::GameCrashed {
            code,
            signal,
            tail: recent.tail(CRASH_TAIL_LINES),
        })
    }

    fn publish(&mut self, event: GameEvent) {
        self.subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }
}

fn pump_lines<R>(
    reader: R,
    tx: mpsc::UnboundedSender<GameEvent>,
    wrap: fn(String) -> GameEvent,
) where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    if tx.send(wrap(decode_line(&buf))).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("Game output stream failed: {}", e);
                    break;
                }
            }
        }
    });
}

/// The JVM writes the platform code page, so invalid UTF-8 is replaced
/// rather than ending the stream.
fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

#[cfg(unix)]
fn terminating_signal(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn terminating_signal(_status: &ExitStatus) -> Option<i32> {
    None
}
