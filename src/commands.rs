//! Operations the front end drives. Each takes the shared [`AppState`] and
//! reports through its event emitter.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::core::auth::OfflineIdentity;
use crate::core::downloader::Throttle;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::events::LauncherEvent;
use crate::core::install::{InstallOrchestrator, MojangInstaller};
use crate::core::java::{locate_runtime, required_runtime_major, RuntimeLocator};
use crate::core::launch::{prepare_launch, GameSession, LaunchOptions, MemoryBounds};
use crate::core::presence::{drive_presence, PresenceConfig, PresenceProvider, PresenceStateMachine};
use crate::core::state::{AppState, LauncherSettings, SettingsPatch};
use crate::core::version::{fetch_remote_versions, list_installed_versions, VersionSummary};

pub type SharedState = Arc<Mutex<AppState>>;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstalledVersion {
    pub id: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Default)]
pub struct InstallRequest {
    pub version: String,
    pub throttle_kbps: u64,
    pub display_name: Option<String>,
}

#[derive(Default)]
pub struct PlayRequest {
    /// Defaults to the first installed version.
    pub version: Option<String>,
    pub username: Option<String>,
    pub memory_mb: Option<u32>,
    /// Receives presence activities for this session; `None` disables presence.
    pub presence: Option<Box<dyn PresenceProvider>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JavaReport {
    pub version: String,
    pub required_major: u32,
    pub executable: Option<PathBuf>,
    pub bundled: Vec<(PathBuf, u32)>,
}

pub async fn list_versions(state: &SharedState) -> Vec<InstalledVersion> {
    let state = state.lock().await;
    list_installed_versions(&state.paths.versions_dir())
        .into_iter()
        .map(|id| InstalledVersion {
            display_name: state.settings.display_name(&id).to_string(),
            id,
        })
        .collect()
}

pub async fn remote_versions(state: &SharedState) -> Vec<VersionSummary> {
    let client = state.lock().await.http_client.clone();
    fetch_remote_versions(&client).await
}

/// Install a version, then store its display name and announce it.
pub async fn install_version(state: &SharedState, request: InstallRequest) -> LauncherResult<()> {
    let (paths, client, events) = {
        let state = state.lock().await;
        (
            state.paths.clone(),
            state.http_client.clone(),
            state.events.clone(),
        )
    };

    let orchestrator = InstallOrchestrator::http(
        MojangInstaller::new(),
        paths,
        client,
        events.clone(),
    );
    orchestrator
        .install_version(&request.version, Throttle::from_kbps(request.throttle_kbps))
        .await?;

    if let Some(name) = request.display_name.as_deref() {
        let mut state = state.lock().await;
        if !state.settings.set_version_display_name(&request.version, name) {
            warn!("Display name for {} was not saved", request.version);
        }
    }
    events.emit(LauncherEvent::Installed {
        version: request.version,
    });
    Ok(())
}

/// Launch a version and wait for the game to exit. Returns the exit code.
pub async fn play(state: &SharedState, request: PlayRequest) -> LauncherResult<Option<i32>> {
    let (paths, events, options) = {
        let mut state = state.lock().await;
        if !state.paths.game_dir().is_dir() {
            return Err(LauncherError::Other(format!(
                "Game directory not found: {:?}",
                state.paths.game_dir()
            )));
        }

        let version = match request.version {
            Some(version) => version,
            None => list_installed_versions(&state.paths.versions_dir())
                .into_iter()
                .next()
                .ok_or_else(|| LauncherError::Other("No installed versions".into()))?,
        };

        let saved = state.settings.get().clone();
        let identity =
            OfflineIdentity::resolve(request.username.as_deref(), saved.username.as_deref());
        if request.username.is_some() && saved.username.as_deref() != Some(identity.username.as_str()) {
            state.settings.merge(SettingsPatch {
                username: Some(identity.username.clone()),
                ..Default::default()
            });
        }

        let options = LaunchOptions {
            version,
            identity,
            memory: MemoryBounds::from_setting(request.memory_mb.or(saved.memory_mb)),
            java_path: None,
        };
        (state.paths.clone(), state.events.clone(), options)
    };

    info!(
        "Playing {} as {} ({} MiB)",
        options.version, options.identity.username, options.memory.max_mb
    );
    events.log(format!("Launching {}", options.version));

    let plan = prepare_launch(&paths, &options).await.map_err(|e| {
        events.emit(LauncherEvent::GameError {
            message: e.to_string(),
        });
        e
    })?;
    let mut session = GameSession::spawn(plan.command(), &plan.selector.selected, events)?;

    let presence = request.presence.map(|provider| {
        let mut machine =
            PresenceStateMachine::new(PresenceConfig::default(), &plan.selector.selected, provider);
        machine.reset();
        tokio::spawn(drive_presence(machine, session.subscribe()))
    });

    let outcome = session.run().await;
    if let Some(handle) = presence {
        if let Err(e) = handle.await {
            warn!("Presence task ended abnormally: {}", e);
        }
    }
    outcome
}

/// Runtime the launcher would pick for `version`, plus every bundled one.
pub async fn locate_java(state: &SharedState, version: &str) -> LauncherResult<JavaReport> {
    let game_dir = state.lock().await.paths.game_dir().to_path_buf();
    let target = version.to_string();

    tokio::task::spawn_blocking(move || {
        let bundled = RuntimeLocator::default()
            .survey(&game_dir)
            .into_iter()
            .map(|c| (c.executable_path, c.detected_major))
            .collect();
        JavaReport {
            required_major: required_runtime_major(&target),
            executable: locate_runtime(&game_dir, &target),
            bundled,
            version: target,
        }
    })
    .await
    .map_err(|e| LauncherError::Other(format!("Task join error: {}", e)))
}

pub async fn get_settings(state: &SharedState) -> LauncherSettings {
    state.lock().await.settings.get().clone()
}

pub async fn update_settings(
    state: &SharedState,
    patch: SettingsPatch,
) -> LauncherResult<LauncherSettings> {
    let mut state = state.lock().await;
    if !state.settings.merge(patch) {
        return Err(LauncherError::Other("Could not save settings".into()));
    }
    Ok(state.settings.get().clone())
}
