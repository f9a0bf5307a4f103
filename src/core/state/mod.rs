pub mod app_state;
pub mod settings;

pub use app_state::AppState;
pub use settings::{LauncherSettings, SettingsPatch, SettingsStore};
