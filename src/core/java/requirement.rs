use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static VERSION_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\.(\d+)(?:\.(\d+))?").expect("valid version regex"));

/// `major.minor.patch` read from the front of a game version id.
///
/// Ids that do not start with a dotted version (snapshots such as `24w14a`,
/// arbitrary custom names) parse as `0.0.0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct VersionSpec {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl VersionSpec {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    pub fn parse(raw: &str) -> Self {
        let Some(caps) = VERSION_PREFIX.captures(raw) else {
            return Self::default();
        };
        let number = |idx: usize| {
            caps.get(idx)
                .and_then(|m| m.as_str().parse::<u32>().ok())
                .unwrap_or(0)
        };
        Self::new(number(1), number(2), number(3))
    }
}

/// First game version that needs Java 21.
pub const JAVA_21_SINCE: VersionSpec = VersionSpec::new(1, 20, 5);
/// First game version that needs Java 17.
pub const JAVA_17_SINCE: VersionSpec = VersionSpec::new(1, 18, 0);

/// Minimum Java major required to run the given game version.
pub fn required_runtime_major(version: &str) -> u32 {
    let spec = VersionSpec::parse(version);
    if spec >= JAVA_21_SINCE {
        21
    } else if spec >= JAVA_17_SINCE {
        17
    } else {
        8
    }
}

/// Whether a runtime of `installed` major satisfies `required`.
///
/// The 17 tier accepts anything newer; the 8 and 21 tiers want an exact
/// match because older mod loaders break on newer class file versions.
pub fn satisfies_requirement(installed: u32, required: u32) -> bool {
    match required {
        17 => installed >= 17,
        _ => installed == required,
    }
}
