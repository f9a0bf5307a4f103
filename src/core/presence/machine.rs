use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use super::provider::PresenceProvider;
use super::rules::{dimension_signals, phase_signals, DimensionSignal, PhaseSignal};
use super::state::{Dimension, Observable, Phase, PresenceContext};

pub const LAUNCHER_LABEL: &str = "PifoLauncher - Version 0.1.1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresenceButton {
    pub label: String,
    pub url: String,
}

/// Static fields shared by every activity.
#[derive(Debug, Clone)]
pub struct Branding {
    pub app_label: String,
    pub image_key: String,
    pub buttons: Vec<PresenceButton>,
}

impl Default for Branding {
    fn default() -> Self {
        Self {
            app_label: LAUNCHER_LABEL.to_string(),
            image_key: "minecraft".to_string(),
            buttons: vec![
                PresenceButton {
                    label: "Download PifoLauncher".to_string(),
                    url: "https://github.com/EtliBiftek/PifoLacher".to_string(),
                },
                PresenceButton {
                    label: "About Pifo".to_string(),
                    url: "https://etlibiftek.github.io/About/".to_string(),
                },
            ],
        }
    }
}

/// Tuning for the dimension heuristics. The defaults fit the log text of
/// current release clients.
#[derive(Debug, Clone)]
pub struct PresenceConfig {
    /// How long after a strong dimension signal weak ones are ignored.
    pub weak_signal_guard: Duration,
    /// Weak signals may only move the player back to the overworld.
    pub weak_signals_overworld_only: bool,
    /// Numeric id weak signals must carry to count as the overworld.
    pub overworld_id: i64,
    pub default_world_name: String,
    pub branding: Branding,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            weak_signal_guard: Duration::from_millis(3000),
            weak_signals_overworld_only: true,
            overworld_id: 0,
            default_world_name: "World".to_string(),
            branding: Branding::default(),
        }
    }
}

/// One outbound presence update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceActivity {
    pub phase: Phase,
    pub details: String,
    pub state: String,
    pub large_image_key: String,
    pub large_image_text: String,
    pub start_timestamp: DateTime<Utc>,
    pub buttons: Vec<PresenceButton>,
}

/// Infers what the player is doing from game log lines and publishes an
/// activity whenever that changes. One machine per game session.
pub struct PresenceStateMachine {
    config: PresenceConfig,
    version: String,
    context: PresenceContext,
    last_broadcast: Observable,
    provider: Box<dyn PresenceProvider>,
}

impl PresenceStateMachine {
    pub fn new(
        config: PresenceConfig,
        version: impl Into<String>,
        provider: Box<dyn PresenceProvider>,
    ) -> Self {
        let context = PresenceContext::idle(&config.default_world_name);
        let last_broadcast = context.observable();
        Self {
            config,
            version: version.into(),
            context,
            last_broadcast,
            provider,
        }
    }

    pub fn context(&self) -> &PresenceContext {
        &self.context
    }

    /// Feed one log line. Returns whether a broadcast was attempted.
    pub fn observe(&mut self, line: &str) -> bool {
        self.observe_at(line, Instant::now())
    }

    pub fn observe_at(&mut self, line: &str, now: Instant) -> bool {
        self.apply_phase_rules(line, now);
        if self.context.phase == Phase::Singleplayer {
            self.apply_dimension_rules(line, now);
        }

        let observable = self.context.observable();
        if observable == self.last_broadcast {
            return false;
        }
        self.last_broadcast = observable;
        self.broadcast();
        true
    }

    /// Back to idle after the game process ends. Always broadcasts.
    pub fn reset(&mut self) {
        self.context = PresenceContext::idle(&self.config.default_world_name);
        self.last_broadcast = self.context.observable();
        self.broadcast();
    }

    fn apply_phase_rules(&mut self, line: &str, now: Instant) {
        for signal in phase_signals(line) {
            if self.apply_phase_signal(signal, now) {
                break;
            }
        }
    }

    /// Returns false when the signal does not apply in the current phase.
    fn apply_phase_signal(&mut self, signal: PhaseSignal, now: Instant) -> bool {
        let ctx = &mut self.context;
        match signal {
            PhaseSignal::ClientReady => {
                if !matches!(ctx.phase, Phase::Idle | Phase::MainMenu) {
                    return false;
                }
                ctx.phase = Phase::MainMenu;
            }
            PhaseSignal::LevelPrepared { world } => {
                if ctx.phase == Phase::Multiplayer {
                    return false;
                }
                ctx.phase = Phase::Singleplayer;
                ctx.world_name = world;
                ctx.dimension = Dimension::Overworld;
                ctx.last_strong_update = Some(now);
            }
            PhaseSignal::IntegratedServer => {
                if matches!(ctx.phase, Phase::Singleplayer | Phase::Multiplayer) {
                    return false;
                }
                ctx.phase = Phase::Singleplayer;
                ctx.dimension = Dimension::Overworld;
            }
            PhaseSignal::Connecting => {
                if ctx.phase == Phase::Singleplayer {
                    return false;
                }
                ctx.phase = Phase::Multiplayer;
            }
            PhaseSignal::Disconnected => ctx.phase = Phase::MainMenu,
            PhaseSignal::ServerStopping => {
                if ctx.phase == Phase::Idle {
                    return false;
                }
                ctx.phase = Phase::MainMenu;
            }
        }
        true
    }

    fn apply_dimension_rules(&mut self, line: &str, now: Instant) {
        for signal in dimension_signals(line) {
            if self.apply_dimension_signal(signal, now) {
                break;
            }
        }
    }

    fn apply_dimension_signal(&mut self, signal: DimensionSignal, now: Instant) -> bool {
        match signal {
            DimensionSignal::Strong(dimension) => {
                self.context.dimension = dimension;
                self.context.last_strong_update = Some(now);
                true
            }
            DimensionSignal::StartRegion(id) => {
                let Some(dimension) = self.weak_dimension(id) else {
                    return false;
                };
                self.context.dimension = dimension;
                true
            }
            DimensionSignal::Loading(id) => {
                let Some(dimension) = self.weak_dimension(id) else {
                    return false;
                };
                let guarded = self
                    .context
                    .last_strong_update
                    .is_some_and(|at| now.saturating_duration_since(at) <= self.config.weak_signal_guard);
                if guarded {
                    debug!("Ignoring weak dimension signal inside guard window");
                    return false;
                }
                self.context.dimension = dimension;
                true
            }
        }
    }

    /// The dimension a weak signal may move the player to, if any.
    fn weak_dimension(&self, id: i64) -> Option<Dimension> {
        if id == self.config.overworld_id {
            Some(Dimension::Overworld)
        } else if self.config.weak_signals_overworld_only {
            None
        } else {
            Some(Dimension::from_numeric_id(id))
        }
    }

    fn activity(&self) -> PresenceActivity {
        let branding = &self.config.branding;
        let versioned = format!("Version: {} | {}", self.version, branding.app_label);
        let (details, state, image_text) = match self.context.phase {
            Phase::Idle => (
                "Waiting to launch".to_string(),
                branding.app_label.clone(),
                "Minecraft Launcher".to_string(),
            ),
            Phase::MainMenu => ("In the main menu".to_string(), versioned, self.version.clone()),
            Phase::Singleplayer => (
                "Playing singleplayer".to_string(),
                versioned,
                format!("{} | {}", self.context.world_name, self.context.dimension),
            ),
            Phase::Multiplayer => (
                "Playing multiplayer".to_string(),
                versioned,
                "Multiplayer".to_string(),
            ),
        };

        PresenceActivity {
            phase: self.context.phase,
            details,
            state,
            large_image_key: branding.image_key.clone(),
            large_image_text: image_text,
            start_timestamp: Utc::now(),
            buttons: branding.buttons.clone(),
        }
    }

    fn broadcast(&self) {
        let activity = self.activity();
        if let Err(err) = self.provider.publish(&activity) {
            debug!("Presence provider {} failed: {}", self.provider.name(), err);
        }
    }
}
