use serde::Serialize;
use tokio::sync::mpsc;

use crate::core::downloader::TransferProgress;
use crate::core::install::InstallStage;

/// Events published to whatever front end is attached to the launcher.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LauncherEvent {
    Log { message: String },
    DownloadStatus(TransferProgress),
    Downloaded { name: String },
    Installing { version: String, step: InstallStage },
    Installed { version: String },
    GameClosed { code: Option<i32> },
    GameError { message: String },
}

/// Fire-and-forget event sink. A detached emitter silently drops everything,
/// and a closed receiver never fails the sender.
#[derive(Debug, Clone, Default)]
pub struct EventEmitter {
    tx: Option<mpsc::UnboundedSender<LauncherEvent>>,
}

impl EventEmitter {
    pub fn new(tx: mpsc::UnboundedSender<LauncherEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    pub fn channel() -> (Self, mpsc::UnboundedReceiver<LauncherEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    pub fn detached() -> Self {
        Self { tx: None }
    }

    pub fn emit(&self, event: LauncherEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }

    pub fn log(&self, message: impl Into<String>) {
        self.emit(LauncherEvent::Log {
            message: message.into(),
        });
    }
}
