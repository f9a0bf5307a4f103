use std::path::PathBuf;
use thiserror::Error;

use crate::core::install::InstallStage;

/// Central error type for the entire launcher backend.
/// Every module returns `Result<T, LauncherError>`.
#[derive(Debug, Error)]
pub enum LauncherError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download failed for {url}: HTTP {status}")]
    DownloadFailed { url: String, status: u16 },

    #[error("File not found upstream: {url}")]
    NotFound { url: String },

    #[error("Transfer of {name} failed: {reason}")]
    Transfer { name: String, reason: String },

    // ── Integrity ───────────────────────────────────────
    #[error("SHA-1 mismatch for {path:?}: expected {expected}, got {actual}")]
    Sha1Mismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    // ── Maven ───────────────────────────────────────────
    #[error("Invalid Maven coordinate: {0}")]
    InvalidMavenCoordinate(String),

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Versions / install ──────────────────────────────
    #[error("Minecraft version {0} not found")]
    VersionNotFound(String),

    #[error("Install stage `{stage}` failed: {source}")]
    InstallStage {
        stage: InstallStage,
        source: Box<LauncherError>,
    },

    // ── Java / game process ─────────────────────────────
    #[error("Java execution failed: {0}")]
    JavaExecution(String),

    #[error("Game exited unexpectedly (code {code:?}, signal {signal:?})\n\nLast output:\n{tail}")]
    GameCrashed {
        code: Option<i32>,
        signal: Option<i32>,
        tail: String,
    },

    // ── Archive ─────────────────────────────────────────
    #[error("Zip extraction error: {0}")]
    Zip(#[from] zip::result::ZipError),

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type LauncherResult<T> = Result<T, LauncherError>;

impl From<std::io::Error> for LauncherError {
    fn from(source: std::io::Error) -> Self {
        LauncherError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

impl LauncherError {
    /// The install stage this error aborted, if any.
    pub fn failed_stage(&self) -> Option<InstallStage> {
        match self {
            LauncherError::InstallStage { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}
