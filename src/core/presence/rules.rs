//! Log patterns the presence machine reacts to.

use std::sync::LazyLock;

use regex::Regex;

use super::state::Dimension;

fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("valid presence pattern")
}

static CLIENT_READY: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"Setting user:|LWJGL|Backend library: LWJGL"));
static LEVEL_PREPARED: LazyLock<Regex> = LazyLock::new(|| pattern(r#"Preparing level "(.+?)""#));
static INTEGRATED_SERVER: LazyLock<Regex> = LazyLock::new(|| {
    pattern(
        r"Starting integrated minecraft server|Integrated server|Preparing spawn area|Preparing start region|Joining world|Loaded world",
    )
});
static CONNECTING: LazyLock<Regex> = LazyLock::new(|| pattern(r"Connecting to .*,|Channel connected"));
static DISCONNECTED: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"Disconnected from server|Stopping connecting|Lost connection"));
static SERVER_STOPPING: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"Stopping integrated server|Stopping server"));

static SWITCHING_DIMENSION: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"Switching dimension to (-?\d+)"));
static CHANGING_DIMENSION: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"Changing dimension for .* from (-?\d+) to (-?\d+)"));
static NAMED_DIMENSION: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r"(?i)dimension (?:to|set to) minecraft:(the_nether|overworld|the_end)")
});
static START_REGION: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"Preparing start region for level (-?\d+)"));
static LOADING_DIMENSION: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"Loading dimension (-?\d+)"));

/// Phase-level meaning of a line, checked in this order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseSignal {
    ClientReady,
    LevelPrepared { world: String },
    IntegratedServer,
    Connecting,
    Disconnected,
    ServerStopping,
}

/// Dimension hint carried by a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionSignal {
    /// Explicit switch; always applied.
    Strong(Dimension),
    /// Start region being prepared, with the raw level id. Ambiguous because
    /// servers pre-warm.
    StartRegion(i64),
    /// A dimension being loaded, with the raw id. Ambiguous and guarded by
    /// recency.
    Loading(i64),
}

/// Every phase signal the line matches, in rule order.
pub fn phase_signals(line: &str) -> Vec<PhaseSignal> {
    let mut signals = Vec::new();
    if CLIENT_READY.is_match(line) {
        signals.push(PhaseSignal::ClientReady);
    }
    if let Some(caps) = LEVEL_PREPARED.captures(line) {
        signals.push(PhaseSignal::LevelPrepared {
            world: caps[1].to_string(),
        });
    }
    if INTEGRATED_SERVER.is_match(line) {
        signals.push(PhaseSignal::IntegratedServer);
    }
    if CONNECTING.is_match(line) {
        signals.push(PhaseSignal::Connecting);
    }
    if DISCONNECTED.is_match(line) {
        signals.push(PhaseSignal::Disconnected);
    }
    if SERVER_STOPPING.is_match(line) {
        signals.push(PhaseSignal::ServerStopping);
    }
    signals
}

/// Dimension signals the line carries, strong ones first.
pub fn dimension_signals(line: &str) -> Vec<DimensionSignal> {
    let mut signals = Vec::new();
    if let Some(id) = SWITCHING_DIMENSION.captures(line).and_then(|c| numeric(&c[1])) {
        signals.push(DimensionSignal::Strong(Dimension::from_numeric_id(id)));
    }
    if let Some(id) = CHANGING_DIMENSION.captures(line).and_then(|c| numeric(&c[2])) {
        signals.push(DimensionSignal::Strong(Dimension::from_numeric_id(id)));
    }
    if let Some(caps) = NAMED_DIMENSION.captures(line) {
        signals.push(DimensionSignal::Strong(Dimension::from_name(&caps[1])));
    }
    if let Some(id) = START_REGION.captures(line).and_then(|c| numeric(&c[1])) {
        signals.push(DimensionSignal::StartRegion(id));
    }
    if let Some(id) = LOADING_DIMENSION.captures(line).and_then(|c| numeric(&c[1])) {
        signals.push(DimensionSignal::Loading(id));
    }
    signals
}

fn numeric(raw: &str) -> Option<i64> {
    raw.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_phase_markers() {
        assert_eq!(
            phase_signals("[Render thread/INFO]: Setting user: Steve"),
            vec![PhaseSignal::ClientReady]
        );
        assert_eq!(
            phase_signals(r#"[Server thread/INFO]: Preparing level "New World""#),
            vec![PhaseSignal::LevelPrepared {
                world: "New World".into()
            }]
        );
        assert_eq!(
            phase_signals("Connecting to mc.example.net, 25565"),
            vec![PhaseSignal::Connecting]
        );
        assert_eq!(
            phase_signals("Stopping integrated server"),
            vec![PhaseSignal::ServerStopping]
        );
        assert!(phase_signals("Reloading ResourceManager").is_empty());
    }

    #[test]
    fn recognises_dimension_markers() {
        assert_eq!(
            dimension_signals("Switching dimension to -1"),
            vec![DimensionSignal::Strong(Dimension::Nether)]
        );
        assert_eq!(
            dimension_signals("Changing dimension for Steve from 0 to 1"),
            vec![DimensionSignal::Strong(Dimension::End)]
        );
        assert_eq!(
            dimension_signals("Player dimension set to minecraft:THE_NETHER"),
            vec![DimensionSignal::Strong(Dimension::Nether)]
        );
        assert_eq!(
            dimension_signals("Preparing start region for level 0"),
            vec![DimensionSignal::StartRegion(0)]
        );
        assert_eq!(
            dimension_signals("Loading dimension -1"),
            vec![DimensionSignal::Loading(-1)]
        );
        assert_eq!(
            dimension_signals("Loading dimension 7"),
            vec![DimensionSignal::Loading(7)]
        );
    }
}
