//! Rich-presence inference from game log output.

pub mod discord;
pub mod driver;
pub mod machine;
pub mod provider;
pub mod rules;
pub mod state;

pub use discord::{DiscordPresenceProvider, DISCORD_CLIENT_ID};
pub use driver::drive_presence;
pub use machine::{Branding, PresenceActivity, PresenceButton, PresenceConfig, PresenceStateMachine};
pub use provider::{ChannelPresenceProvider, LogPresenceProvider, PresenceError, PresenceProvider};
pub use state::{Dimension, Phase, PresenceContext};
