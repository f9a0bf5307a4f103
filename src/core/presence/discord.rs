//! Discord Rich Presence bridge built on `discord-sdk`.

use std::time::{Duration, SystemTime};

use discord_sdk::{
    activity::{ActivityBuilder, Assets, Button},
    wheel::{UserState, Wheel},
    Discord, Subscriptions,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::machine::PresenceActivity;
use super::provider::{PresenceError, PresenceProvider};

/// Discord application the launcher publishes as.
pub const DISCORD_CLIENT_ID: i64 = 1412969394291740784;

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Queues activities for a background task that owns the Discord connection.
/// When Discord is not running the task ends and publishing reports
/// [`PresenceError::ChannelClosed`], which the state machine ignores.
pub struct DiscordPresenceProvider {
    tx: mpsc::UnboundedSender<PresenceActivity>,
}

impl DiscordPresenceProvider {
    /// Start connecting in the background. Needs a running tokio runtime.
    pub fn connect(client_id: i64) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_discord_task(client_id, rx));
        Self { tx }
    }
}

impl PresenceProvider for DiscordPresenceProvider {
    fn name(&self) -> &'static str {
        "discord"
    }

    fn publish(&self, activity: &PresenceActivity) -> Result<(), PresenceError> {
        self.tx
            .send(activity.clone())
            .map_err(|_| PresenceError::ChannelClosed)
    }
}

async fn run_discord_task(client_id: i64, mut rx: mpsc::UnboundedReceiver<PresenceActivity>) {
    let (wheel, handler) = Wheel::new(Box::new(|err| {
        warn!("Discord error: {:?}", err);
    }));
    let mut user_spoke = wheel.user();

    let discord = match Discord::new(client_id, Subscriptions::ACTIVITY, Box::new(handler)) {
        Ok(discord) => discord,
        Err(e) => {
            warn!("Discord not available: {:?}", e);
            return;
        }
    };

    let handshake = tokio::time::timeout(HANDSHAKE_TIMEOUT, async {
        if user_spoke.0.changed().await.is_err() {
            return Err("connection closed".to_string());
        }
        match &*user_spoke.0.borrow() {
            UserState::Connected(user) => Ok(user.username.clone()),
            UserState::Disconnected(err) => Err(format!("{:?}", err)),
        }
    })
    .await;
    match handshake {
        Ok(Ok(username)) => info!("Discord Rich Presence connected as {}", username),
        Ok(Err(e)) => {
            warn!("Discord disconnected: {}", e);
            return;
        }
        Err(_) => {
            warn!("Discord handshake timed out");
            return;
        }
    }

    while let Some(activity) = rx.recv().await {
        if let Err(e) = discord.update_activity(discord_activity(&activity)).await {
            debug!("Failed to update Discord activity: {:?}", e);
        }
    }

    if let Err(e) = discord.clear_activity().await {
        debug!("Failed to clear Discord activity: {:?}", e);
    }
    discord.disconnect().await;
    info!("Discord Rich Presence disconnected");
}

fn discord_activity(activity: &PresenceActivity) -> ActivityBuilder {
    let builder = ActivityBuilder::new()
        .details(activity.details.clone())
        .state(activity.state.clone())
        .assets(Assets::default().large(
            activity.large_image_key.clone(),
            Some(activity.large_image_text.clone()),
        ))
        .start_timestamp(SystemTime::from(activity.start_timestamp));

    activity.buttons.iter().fold(builder, |builder, button| {
        builder.button(Button {
            label: button.label.clone(),
            url: button.url.clone(),
        })
    })
}
