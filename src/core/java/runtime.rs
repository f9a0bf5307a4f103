use std::path::{Component, Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::requirement::{required_runtime_major, satisfies_requirement};

static VERSION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"version\s+"(\d+)(?:\.(\d+))?"#).expect("valid java version regex")
});

/// Windowed launcher binary; preferred because it does not open a console.
#[cfg(windows)]
pub const WINDOWED_JAVA: &str = "javaw.exe";
#[cfg(not(windows))]
pub const WINDOWED_JAVA: &str = "java";

/// Console launcher binary, kept only as a last resort.
#[cfg(windows)]
pub const CONSOLE_JAVA: &str = "java.exe";
#[cfg(not(windows))]
pub const CONSOLE_JAVA: &str = "java";

/// Name the system runtime is probed under when resolved through `PATH`.
#[cfg(windows)]
pub const PATH_JAVA: &str = "javaw";
#[cfg(not(windows))]
pub const PATH_JAVA: &str = "java";

/// Reports the Java major of an executable. `0` means unknown or not runnable.
pub trait JavaProbe: Send + Sync {
    fn major_version(&self, executable: &Path) -> u32;
}

/// Probes by running `<exe> -version` and reading the banner.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandProbe;

impl JavaProbe for CommandProbe {
    #[instrument(level = "debug", skip(self))]
    fn major_version(&self, executable: &Path) -> u32 {
        let mut command = Command::new(executable);
        command.arg("-version");
        hide_console(&mut command);

        match command.output() {
            Ok(output) => {
                let banner = format!(
                    "{}\n{}",
                    String::from_utf8_lossy(&output.stderr),
                    String::from_utf8_lossy(&output.stdout)
                );
                parse_reported_major(&banner)
            }
            Err(err) => {
                debug!("Java probe failed for {:?}: {}", executable, err);
                0
            }
        }
    }
}

#[cfg(windows)]
fn hide_console(command: &mut Command) {
    use std::os::windows::process::CommandExt;
    const CREATE_NO_WINDOW: u32 = 0x0800_0000;
    command.creation_flags(CREATE_NO_WINDOW);
}

#[cfg(not(windows))]
fn hide_console(_command: &mut Command) {}

/// Major number from a `java -version` banner.
///
/// Legacy `1.x` banners report `x`, so Java 8 (`"1.8.0_392"`) reads as 8.
pub fn parse_reported_major(banner: &str) -> u32 {
    let Some(caps) = VERSION_LINE.captures(banner) else {
        return 0;
    };
    let first = caps
        .get(1)
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .unwrap_or(0);
    if first == 1 {
        caps.get(2)
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .unwrap_or(first)
    } else {
        first
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuntimeCandidate {
    pub executable_path: PathBuf,
    pub detected_major: u32,
}

/// Executables found under `<root>/runtime`.
#[derive(Debug, Default, Clone)]
pub struct DiscoveredRuntimes {
    /// Windowed binaries sitting in a `bin` directory, in walk order.
    pub windowed: Vec<PathBuf>,
    /// Last console binary seen in a `bin` directory.
    pub console: Option<PathBuf>,
}

/// Walks `runtime_dir` iteratively. Unreadable directories are skipped.
pub fn discover_runtimes(runtime_dir: &Path) -> DiscoveredRuntimes {
    let mut found = DiscoveredRuntimes::default();
    let mut stack = vec![runtime_dir.to_path_buf()];

    while let Some(dir) = stack.pop() {
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) => {
                debug!("Skipping unreadable directory {:?}: {}", dir, err);
                continue;
            }
        };

        for entry in entries.filter_map(Result::ok) {
            let path = entry.path();
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if file_type.is_dir() {
                stack.push(path);
                continue;
            }
            // Any non-directory entry counts, symlinks included.
            if !inside_bin_dir(runtime_dir, &path) {
                continue;
            }

            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.eq_ignore_ascii_case(WINDOWED_JAVA) {
                found.windowed.push(path.clone());
            }
            if name.eq_ignore_ascii_case(CONSOLE_JAVA) {
                found.console = Some(path);
            }
        }
    }

    found
}

fn inside_bin_dir(root: &Path, file: &Path) -> bool {
    let relative = file.strip_prefix(root).unwrap_or(file);
    let Some(parent) = relative.parent() else {
        return false;
    };
    parent.components().any(|component| match component {
        Component::Normal(segment) => segment.to_string_lossy().eq_ignore_ascii_case("bin"),
        _ => false,
    })
}

/// Picks the runtime for a required major among probed candidates.
///
/// 21 and 8 need an exact match; 17 takes an exact 17 and otherwise a 21.
pub fn select_candidate(candidates: &[RuntimeCandidate], required: u32) -> Option<&RuntimeCandidate> {
    let exact = |major: u32| candidates.iter().find(|c| c.detected_major == major);
    match required {
        17 => exact(17).or_else(|| exact(21)),
        major => exact(major),
    }
}

/// Finds a Java executable for a game version, looking at the system runtime
/// on `PATH` and at bundled runtimes under `<root>/runtime`.
pub struct RuntimeLocator<P: JavaProbe = CommandProbe> {
    probe: P,
}

impl Default for RuntimeLocator<CommandProbe> {
    fn default() -> Self {
        Self::new(CommandProbe)
    }
}

impl<P: JavaProbe> RuntimeLocator<P> {
    pub fn new(probe: P) -> Self {
        Self { probe }
    }

    /// Every bundled runtime with its detected major.
    pub fn survey(&self, root_dir: &Path) -> Vec<RuntimeCandidate> {
        discover_runtimes(&root_dir.join("runtime"))
            .windowed
            .into_iter()
            .map(|executable_path| {
                let detected_major = self.probe.major_version(&executable_path);
                RuntimeCandidate {
                    executable_path,
                    detected_major,
                }
            })
            .collect()
    }

    /// Executable to launch `target_version` with, or `None` when nothing
    /// usable exists. A bare [`PATH_JAVA`] result means "the system runtime".
    pub fn locate(&self, root_dir: &Path, target_version: &str) -> Option<PathBuf> {
        let runtime_dir = root_dir.join("runtime");
        if !runtime_dir.is_dir() {
            warn!("No runtime directory at {:?}", runtime_dir);
            return None;
        }

        let discovered = discover_runtimes(&runtime_dir);
        let required = required_runtime_major(target_version);

        let system_major = self.probe.major_version(Path::new(PATH_JAVA));
        if satisfies_requirement(system_major, required) {
            info!(
                "Using system Java {} for {} (needs {})",
                system_major, target_version, required
            );
            return Some(PathBuf::from(PATH_JAVA));
        }

        let candidates: Vec<RuntimeCandidate> = discovered
            .windowed
            .into_iter()
            .map(|executable_path| {
                let detected_major = self.probe.major_version(&executable_path);
                RuntimeCandidate {
                    executable_path,
                    detected_major,
                }
            })
            .collect();

        if let Some(chosen) = select_candidate(&candidates, required) {
            info!(
                "Using bundled Java {} at {:?} for {}",
                chosen.detected_major, chosen.executable_path, target_version
            );
            return Some(chosen.executable_path.clone());
        }

        if let Some(console) = discovered.console {
            warn!(
                "No Java {} found; falling back to {:?}",
                required, console
            );
            return Some(console);
        }

        None
    }
}

/// [`RuntimeLocator::locate`] with the real `-version` probe.
pub fn locate_runtime(root_dir: &Path, target_version: &str) -> Option<PathBuf> {
    RuntimeLocator::default().locate(root_dir, target_version)
}
