use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::StreamExt;
use serde::Serialize;
use sha1::{Digest, Sha1};
use tokio::io::AsyncWriteExt;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::events::{EventEmitter, LauncherEvent};

use super::throttle::RateLimiter;
use super::transport::Transport;

/// Category of a transferred file, reported with every progress event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssetKind {
    VersionJson,
    ClientJar,
    Native,
    AssetIndex,
    Asset,
    Library,
}

/// One file to fetch. Consumed by exactly one [`TransferEngine::transfer`] call.
#[derive(Debug, Clone)]
pub struct TransferTask {
    pub source_url: String,
    pub destination: PathBuf,
    pub display_name: String,
    pub kind: AssetKind,
    pub allow_retry: bool,
}

impl TransferTask {
    pub fn new(
        source_url: impl Into<String>,
        destination: impl Into<PathBuf>,
        kind: AssetKind,
    ) -> Self {
        let destination = destination.into();
        let display_name = destination
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Self {
            source_url: source_url.into(),
            destination,
            display_name,
            kind,
            allow_retry: true,
        }
    }
}

/// Payload emitted for every received chunk. `total` is `None` when the
/// server did not announce a length; treat that as indeterminate progress.
#[derive(Debug, Clone, Serialize)]
pub struct TransferProgress {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AssetKind,
    pub current: u64,
    pub total: Option<u64>,
}

/// Result of a transfer. Never an `Err`: transient failures are absorbed here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    Completed,
    /// The server answered 404. Not retried.
    NotFound,
    /// Transport or write failure after the retry budget was spent.
    Failed { reason: String },
}

impl TransferOutcome {
    pub fn failed(&self) -> bool {
        !matches!(self, TransferOutcome::Completed)
    }

    /// Convert into a stage-level error for callers that must abort.
    pub fn into_result(self, task: &TransferTask) -> LauncherResult<()> {
        match self {
            TransferOutcome::Completed => Ok(()),
            TransferOutcome::NotFound => Err(LauncherError::NotFound {
                url: task.source_url.clone(),
            }),
            TransferOutcome::Failed { reason } => Err(LauncherError::Transfer {
                name: task.display_name.clone(),
                reason,
            }),
        }
    }
}

enum AttemptError {
    Transport(LauncherError),
    Write(LauncherError),
}

enum AttemptEnd {
    Written,
    NotFound,
}

/// Streams single files to disk, pacing chunk reads against a
/// [`RateLimiter`] and retrying at most once.
pub struct TransferEngine {
    transport: Arc<dyn Transport>,
    limiter: Box<dyn RateLimiter>,
    events: EventEmitter,
}

impl TransferEngine {
    pub fn new(
        transport: Arc<dyn Transport>,
        limiter: Box<dyn RateLimiter>,
        events: EventEmitter,
    ) -> Self {
        Self {
            transport,
            limiter,
            events,
        }
    }

    /// Read a small document into memory, such as a manifest. Neither paced
    /// nor retried.
    pub async fn fetch_bytes(&self, url: &str) -> LauncherResult<Vec<u8>> {
        let response = self.transport.open(url).await?;
        if !(200..300).contains(&response.status) {
            return Err(LauncherError::DownloadFailed {
                url: url.to_string(),
                status: response.status,
            });
        }

        let mut body = response.body;
        let mut bytes = Vec::new();
        while let Some(chunk) = body.next().await {
            bytes.extend_from_slice(&chunk?);
        }
        Ok(bytes)
    }

    pub async fn transfer(&self, mut task: TransferTask) -> TransferOutcome {
        loop {
            let error = match self.attempt(&task).await {
                Ok(AttemptEnd::Written) => {
                    self.events.emit(LauncherEvent::Downloaded {
                        name: task.display_name.clone(),
                    });
                    debug!("Downloaded: {} -> {:?}", task.source_url, task.destination);
                    return TransferOutcome::Completed;
                }
                Ok(AttemptEnd::NotFound) => {
                    self.events.log(format!(
                        "Failed to download {} due to: File not found...",
                        task.source_url
                    ));
                    return TransferOutcome::NotFound;
                }
                Err(AttemptError::Transport(error)) => error,
                Err(AttemptError::Write(error)) => {
                    remove_partial(&task.destination).await;
                    error
                }
            };

            self.events.log(format!(
                "Failed to download asset to {:?} due to\n{}. Retrying... {}",
                task.destination, error, task.allow_retry
            ));

            if !task.allow_retry {
                warn!("Giving up on {}: {}", task.source_url, error);
                remove_partial(&task.destination).await;
                return TransferOutcome::Failed {
                    reason: error.to_string(),
                };
            }
            task.allow_retry = false;
        }
    }

    async fn attempt(&self, task: &TransferTask) -> Result<AttemptEnd, AttemptError> {
        if let Some(parent) = task.destination.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| {
                    AttemptError::Write(LauncherError::Io {
                        path: parent.to_path_buf(),
                        source,
                    })
                })?;
        }

        let mut last_chunk = Instant::now();
        let response = self
            .transport
            .open(&task.source_url)
            .await
            .map_err(AttemptError::Transport)?;

        if response.status == 404 {
            return Ok(AttemptEnd::NotFound);
        }
        if !(200..300).contains(&response.status) {
            return Err(AttemptError::Transport(LauncherError::DownloadFailed {
                url: task.source_url.clone(),
                status: response.status,
            }));
        }

        let total = response.content_length;
        let mut body = response.body;
        let io_error = |source: std::io::Error| {
            AttemptError::Write(LauncherError::Io {
                path: task.destination.clone(),
                source,
            })
        };

        // Scoped so the handle is closed before the file is reported done.
        {
            let mut file = tokio::fs::File::create(&task.destination)
                .await
                .map_err(io_error)?;
            let mut received = 0_u64;

            while let Some(chunk) = body.next().await {
                let chunk = chunk.map_err(AttemptError::Transport)?;
                let now = Instant::now();
                let pause = self
                    .limiter
                    .pause_after(chunk.len(), now.saturating_duration_since(last_chunk));
                last_chunk = now + pause;

                file.write_all(&chunk).await.map_err(io_error)?;
                received += chunk.len() as u64;
                self.events
                    .emit(LauncherEvent::DownloadStatus(TransferProgress {
                        name: task.display_name.clone(),
                        kind: task.kind,
                        current: received,
                        total,
                    }));

                if !pause.is_zero() {
                    tokio::time::sleep_until(last_chunk).await;
                }
            }

            file.flush().await.map_err(io_error)?;
        }

        Ok(AttemptEnd::Written)
    }
}

async fn remove_partial(path: &Path) {
    if tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
    {
        let _ = tokio::fs::remove_file(path).await;
    }
}

/// Lowercase hex SHA-1 of the file at `path`, or `None` if it cannot be read.
pub async fn file_sha1(path: &Path) -> Option<String> {
    let bytes = tokio::fs::read(path).await.ok()?;
    let mut hasher = Sha1::new();
    hasher.update(&bytes);
    Some(hex::encode(hasher.finalize()))
}

/// Whether `path` already holds a file with the expected SHA-1.
pub async fn file_matches_sha1(path: &Path, expected: &str) -> bool {
    file_sha1(path)
        .await
        .is_some_and(|actual| actual.eq_ignore_ascii_case(expected))
}
