use std::path::Path;

use tracing::{debug, warn};

use crate::core::downloader::{file_matches_sha1, file_sha1, AssetKind, TransferEngine, TransferTask};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::events::EventEmitter;
use crate::core::paths::LauncherPaths;

/// Everything a stage needs for one install invocation. The engine carries
/// the throttle chosen for this invocation only.
pub struct InstallContext<'a> {
    pub version_id: &'a str,
    pub paths: &'a LauncherPaths,
    pub engine: &'a TransferEngine,
    pub events: &'a EventEmitter,
}

impl InstallContext<'_> {
    /// Transfer one file; anything but a completed transfer is an error.
    pub async fn fetch(&self, task: TransferTask) -> LauncherResult<()> {
        let outcome = self.engine.transfer(task.clone()).await;
        outcome.into_result(&task)
    }

    /// Like [`fetch`](Self::fetch) but skips files already on disk with the
    /// expected SHA-1. Without a checksum, any existing file counts.
    pub async fn fetch_verified(
        &self,
        url: &str,
        destination: &Path,
        sha1: Option<&str>,
        kind: AssetKind,
    ) -> LauncherResult<bool> {
        self.fetch_task_verified(TransferTask::new(url, destination, kind), sha1)
            .await
    }

    /// Returns whether the file had to be transferred. A fresh download that
    /// does not match `sha1` is deleted and reported as a mismatch.
    pub async fn fetch_task_verified(
        &self,
        task: TransferTask,
        sha1: Option<&str>,
    ) -> LauncherResult<bool> {
        let present = match sha1 {
            Some(expected) => file_matches_sha1(&task.destination, expected).await,
            None => tokio::fs::metadata(&task.destination).await.is_ok(),
        };
        if present {
            debug!("Up to date: {:?}", task.destination);
            return Ok(false);
        }

        let destination = task.destination.clone();
        self.fetch(task).await?;
        if let Some(expected) = sha1 {
            check_sha1(&destination, expected).await?;
        }
        Ok(true)
    }
}

async fn check_sha1(path: &Path, expected: &str) -> LauncherResult<()> {
    let actual = file_sha1(path).await.unwrap_or_default();
    if actual.eq_ignore_ascii_case(expected) {
        return Ok(());
    }

    warn!("SHA-1 mismatch for {:?}, removing it", path);
    let _ = tokio::fs::remove_file(path).await;
    Err(LauncherError::Sha1Mismatch {
        path: path.to_path_buf(),
        expected: expected.to_string(),
        actual,
    })
}
