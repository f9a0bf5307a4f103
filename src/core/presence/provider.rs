use tokio::sync::mpsc::UnboundedSender;
use tracing::info;

use super::machine::PresenceActivity;

#[derive(Debug, thiserror::Error)]
pub enum PresenceError {
    #[error("presence channel closed")]
    ChannelClosed,

    #[error("presence provider {0} unavailable")]
    Unavailable(&'static str),
}

/// A sink for presence activities, such as a rich-presence RPC bridge.
pub trait PresenceProvider: Send + Sync {
    fn name(&self) -> &'static str;

    fn publish(&self, activity: &PresenceActivity) -> Result<(), PresenceError>;
}

/// Writes each activity to the log.
pub struct LogPresenceProvider;

impl PresenceProvider for LogPresenceProvider {
    fn name(&self) -> &'static str {
        "log"
    }

    fn publish(&self, activity: &PresenceActivity) -> Result<(), PresenceError> {
        info!(
            "[presence] {} | {} ({})",
            activity.details, activity.state, activity.large_image_text
        );
        Ok(())
    }
}

/// Forwards activities to whatever task owns the receiving end, typically an
/// RPC client connection.
pub struct ChannelPresenceProvider {
    tx: UnboundedSender<PresenceActivity>,
}

impl ChannelPresenceProvider {
    pub fn new(tx: UnboundedSender<PresenceActivity>) -> Self {
        Self { tx }
    }
}

impl PresenceProvider for ChannelPresenceProvider {
    fn name(&self) -> &'static str {
        "channel"
    }

    fn publish(&self, activity: &PresenceActivity) -> Result<(), PresenceError> {
        self.tx
            .send(activity.clone())
            .map_err(|_| PresenceError::ChannelClosed)
    }
}
