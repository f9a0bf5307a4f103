use std::path::{Path, PathBuf};

use crate::core::error::{LauncherError, LauncherResult};

const APP_DIR_NAME: &str = "PifoLauncher";
const GAME_DIR_NAME: &str = ".minecraft";
const GAME_DIR_ENV: &str = "PIFO_MINECRAFT_DIR";

/// Filesystem layout of the game root and the launcher's own data directory.
#[derive(Debug, Clone)]
pub struct LauncherPaths {
    game_dir: PathBuf,
    data_dir: PathBuf,
}

impl LauncherPaths {
    /// Resolve paths from the environment: `PIFO_MINECRAFT_DIR` wins, then the
    /// platform default game directory.
    pub fn resolve() -> Self {
        let game_dir = std::env::var_os(GAME_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(default_game_dir);
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR_NAME);
        Self { game_dir, data_dir }
    }

    pub fn with_roots(game_dir: impl Into<PathBuf>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            game_dir: game_dir.into(),
            data_dir: data_dir.into(),
        }
    }

    pub fn game_dir(&self) -> &Path {
        &self.game_dir
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn settings_file(&self) -> PathBuf {
        self.data_dir.join("settings.json")
    }

    pub fn versions_dir(&self) -> PathBuf {
        self.game_dir.join("versions")
    }

    pub fn version_dir(&self, version_id: &str) -> PathBuf {
        self.versions_dir().join(version_id)
    }

    pub fn version_json(&self, version_id: &str) -> PathBuf {
        self.version_dir(version_id)
            .join(format!("{version_id}.json"))
    }

    pub fn version_jar(&self, version_id: &str) -> PathBuf {
        self.version_dir(version_id).join(format!("{version_id}.jar"))
    }

    pub fn libraries_dir(&self) -> PathBuf {
        self.game_dir.join("libraries")
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.game_dir.join("assets")
    }

    pub fn natives_dir(&self, version_id: &str) -> PathBuf {
        self.game_dir.join("natives").join(version_id)
    }

    /// Scratch natives directory rebuilt before every launch.
    pub fn launch_natives_dir(&self, version_id: &str) -> PathBuf {
        self.game_dir.join("natives").join(format!("{version_id}-run"))
    }

    pub fn runtime_dir(&self) -> PathBuf {
        self.game_dir.join("runtime")
    }

    pub fn ensure_data_dir(&self) -> LauncherResult<()> {
        std::fs::create_dir_all(&self.data_dir).map_err(|source| LauncherError::Io {
            path: self.data_dir.clone(),
            source,
        })
    }
}

fn default_game_dir() -> PathBuf {
    let base = if cfg!(windows) {
        dirs::data_dir()
    } else {
        dirs::home_dir()
    };
    base.unwrap_or_else(|| PathBuf::from(".")).join(GAME_DIR_NAME)
}
