use reqwest::Client;
use tracing::info;

use crate::core::error::LauncherResult;
use crate::core::events::EventEmitter;
use crate::core::http::build_http_client;
use crate::core::paths::LauncherPaths;

use super::settings::SettingsStore;

/// Everything one launcher process shares between commands.
pub struct AppState {
    pub paths: LauncherPaths,
    pub http_client: Client,
    pub settings: SettingsStore,
    pub events: EventEmitter,
}

impl AppState {
    pub fn new(paths: LauncherPaths, events: EventEmitter) -> LauncherResult<Self> {
        paths.ensure_data_dir()?;
        let http_client = build_http_client()?;
        let settings = SettingsStore::load(paths.settings_file());
        info!(
            "Launcher state ready (game dir {:?}, data dir {:?})",
            paths.game_dir(),
            paths.data_dir()
        );

        Ok(Self {
            paths,
            http_client,
            settings,
            events,
        })
    }

    /// State rooted at the platform default directories.
    pub fn from_environment(events: EventEmitter) -> LauncherResult<Self> {
        Self::new(LauncherPaths::resolve(), events)
    }
}
