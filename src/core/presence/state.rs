use std::fmt;
use std::time::Instant;

use serde::Serialize;

/// What the player is doing, as far as the log tells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    MainMenu,
    Singleplayer,
    Multiplayer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    #[default]
    Overworld,
    Nether,
    End,
}

impl Dimension {
    /// Legacy numeric ids: `-1` nether, `1` end, anything else overworld.
    pub fn from_numeric_id(id: i64) -> Self {
        match id {
            -1 => Dimension::Nether,
            1 => Dimension::End,
            _ => Dimension::Overworld,
        }
    }

    /// Namespaced ids such as `the_nether`, matched loosely.
    pub fn from_name(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        if lower.contains("nether") {
            Dimension::Nether
        } else if lower.contains("end") {
            Dimension::End
        } else {
            Dimension::Overworld
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Dimension::Overworld => "Overworld",
            Dimension::Nether => "Nether",
            Dimension::End => "End",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Session state scraped from one game process.
#[derive(Debug, Clone)]
pub struct PresenceContext {
    pub phase: Phase,
    pub world_name: String,
    pub dimension: Dimension,
    pub last_strong_update: Option<Instant>,
}

impl PresenceContext {
    pub fn idle(default_world_name: &str) -> Self {
        Self {
            phase: Phase::Idle,
            world_name: default_world_name.to_string(),
            dimension: Dimension::Overworld,
            last_strong_update: None,
        }
    }

    /// The part of the state a broadcast shows. World and dimension only
    /// count while in singleplayer.
    pub fn observable(&self) -> Observable {
        match self.phase {
            Phase::Singleplayer => Observable {
                phase: self.phase,
                world: Some(self.world_name.clone()),
                dimension: Some(self.dimension),
            },
            phase => Observable {
                phase,
                world: None,
                dimension: None,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observable {
    pub phase: Phase,
    pub world: Option<String>,
    pub dimension: Option<Dimension>,
}
