//! Turns an installed version into a ready-to-spawn game command.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info, instrument};

use crate::core::auth::OfflineIdentity;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::java::{locate_runtime, PATH_JAVA};
use crate::core::paths::LauncherPaths;
use crate::core::version::VersionJson;

use super::classpath::{build_classpath, classpath_separator, safe_path_str};
use super::natives::{extract_natives, native_jars};

pub const LAUNCHER_NAME: &str = "PifoLauncher";
pub const LAUNCHER_VERSION: &str = "0.1.1";

const DEFAULT_MAX_MB: u32 = 2048;
const FLOOR_MAX_MB: u32 = 1024;
const MIN_MB: u32 = 512;

/// Heap limits passed as `-Xmx` / `-Xms`, in MiB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryBounds {
    pub max_mb: u32,
    pub min_mb: u32,
}

impl MemoryBounds {
    /// Saved setting, defaulting to 2048 and never below 1024.
    pub fn from_setting(memory_mb: Option<u32>) -> Self {
        Self {
            max_mb: memory_mb.unwrap_or(DEFAULT_MAX_MB).max(FLOOR_MAX_MB),
            min_mb: MIN_MB,
        }
    }
}

/// The version the user picked and the vanilla version underneath it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionSelector {
    pub selected: String,
    /// Drives runtime choice, asset index and the fallback jar.
    pub base: String,
    pub custom: bool,
}

impl VersionSelector {
    /// A selection is custom when its JSON inherits from another version or
    /// declares an id other than its directory name.
    pub fn resolve(paths: &LauncherPaths, selected: &str) -> Self {
        let base = std::fs::read_to_string(paths.version_json(selected))
            .ok()
            .and_then(|raw| serde_json::from_str::<serde_json::Value>(&raw).ok())
            .and_then(|json| {
                let declared = |key: &str| {
                    json.get(key)
                        .and_then(|v| v.as_str())
                        .map(str::to_string)
                        .filter(|s| !s.is_empty())
                };
                declared("inheritsFrom").or_else(|| declared("id").filter(|id| id != selected))
            });

        match base {
            Some(base) => Self {
                selected: selected.to_string(),
                base,
                custom: true,
            },
            None => Self {
                selected: selected.to_string(),
                base: selected.to_string(),
                custom: false,
            },
        }
    }
}

/// Version JSON to launch with; custom versions are merged over their base.
pub fn load_launch_version(
    paths: &LauncherPaths,
    selector: &VersionSelector,
) -> LauncherResult<VersionJson> {
    let selected_path = paths.version_json(&selector.selected);
    if !selected_path.exists() {
        return Err(LauncherError::VersionNotFound(selector.selected.clone()));
    }
    if !selector.custom {
        return VersionJson::load(&selected_path);
    }

    let child = read_json_value(&selected_path)?;
    let parent_path = paths.version_json(&selector.base);
    if !parent_path.exists() {
        debug!(
            "Base {} of {} is not installed, launching unmerged",
            selector.base, selector.selected
        );
        return Ok(serde_json::from_value(child)?);
    }

    let parent = read_json_value(&parent_path)?;
    let merged = VersionJson::merge_with_parent_json(&child, &parent);
    Ok(serde_json::from_value(merged)?)
}

fn read_json_value(path: &Path) -> LauncherResult<serde_json::Value> {
    let raw = std::fs::read_to_string(path).map_err(|source| LauncherError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&raw)?)
}

#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub version: String,
    pub identity: OfflineIdentity,
    pub memory: MemoryBounds,
    /// Skips runtime discovery when set.
    pub java_path: Option<PathBuf>,
}

/// Everything needed to start one game process.
#[derive(Debug, Clone)]
pub struct LaunchPlan {
    pub selector: VersionSelector,
    pub java: PathBuf,
    pub game_dir: PathBuf,
    pub natives_dir: PathBuf,
    pub jvm_args: Vec<String>,
    pub main_class: String,
    pub game_args: Vec<String>,
}

impl LaunchPlan {
    /// Arguments after the executable, in order.
    pub fn arguments(&self) -> Vec<String> {
        let mut args = self.jvm_args.clone();
        args.push(self.main_class.clone());
        args.extend(self.game_args.iter().cloned());
        args
    }

    pub fn command(&self) -> Command {
        let mut cmd = Command::new(&self.java);
        cmd.args(self.arguments());
        cmd.current_dir(&self.game_dir);
        configure_native_library_env(&mut cmd, &self.natives_dir);
        configure_platform_spawn(&mut cmd);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        debug!("Command (copy/paste): {}", format_command_for_logs(&self.java, &self.arguments()));
        cmd
    }
}

/// Resolve the version, unpack fresh natives, pick a runtime and build the
/// argument lists.
#[instrument(skip(paths, options), fields(version = %options.version))]
pub async fn prepare_launch(
    paths: &LauncherPaths,
    options: &LaunchOptions,
) -> LauncherResult<LaunchPlan> {
    let selector = VersionSelector::resolve(paths, &options.version);
    if selector.custom {
        info!("{} is a custom version based on {}", selector.selected, selector.base);
    }
    let version = load_launch_version(paths, &selector)?;
    if version.main_class.is_empty() {
        return Err(LauncherError::Other(format!(
            "{} declares no main class",
            selector.selected
        )));
    }

    let client_jar = [&selector.selected, &selector.base]
        .into_iter()
        .map(|id| paths.version_jar(id))
        .find(|jar| jar.exists())
        .ok_or_else(|| {
            LauncherError::Other(format!("Client jar for {} is not installed", selector.base))
        })?;

    let libraries_dir = paths.libraries_dir();
    let natives_dir = paths.launch_natives_dir(&selector.selected);
    extract_natives(native_jars(&version, &libraries_dir), &natives_dir).await?;

    let java = match &options.java_path {
        Some(path) => path.clone(),
        None => {
            let game_dir = paths.game_dir().to_path_buf();
            let base = selector.base.clone();
            tokio::task::spawn_blocking(move || locate_runtime(&game_dir, &base))
                .await
                .map_err(|e| LauncherError::Other(format!("Task join error: {}", e)))?
                .unwrap_or_else(|| PathBuf::from(PATH_JAVA))
        }
    };

    let classpath = build_classpath(&version, &libraries_dir, &client_jar);
    if classpath.trim().is_empty() {
        return Err(LauncherError::Other("Empty classpath".into()));
    }

    let vars = LaunchVariables {
        identity: &options.identity,
        version_name: &selector.selected,
        version_type: version.version_type.as_deref().unwrap_or("release"),
        assets_index: version.asset_index_id().unwrap_or(&selector.base),
        game_dir: safe_path_str(paths.game_dir()),
        assets_root: safe_path_str(&paths.assets_dir()),
        natives_dir: safe_path_str(&natives_dir),
        library_dir: safe_path_str(&libraries_dir),
        classpath: &classpath,
    };

    let mut jvm_args = vec![
        format!("-Xmx{}M", options.memory.max_mb),
        format!("-Xms{}M", options.memory.min_mb),
    ];
    let declared_jvm = version.jvm_arguments();
    if declared_jvm.is_empty() {
        jvm_args.push(format!("-Djava.library.path={}", vars.natives_dir));
        jvm_args.push("-cp".into());
        jvm_args.push(classpath.clone());
    } else {
        jvm_args.extend(vars.resolve_all(&declared_jvm));
    }

    let game_args = vars.resolve_all(&version.game_arguments());

    info!("Launching {} with Java {:?}", selector.selected, java);
    Ok(LaunchPlan {
        selector,
        java,
        game_dir: paths.game_dir().to_path_buf(),
        natives_dir,
        jvm_args,
        main_class: version.main_class.clone(),
        game_args,
    })
}

/// Values for `${...}` placeholders in version arguments.
struct LaunchVariables<'a> {
    identity: &'a OfflineIdentity,
    version_name: &'a str,
    version_type: &'a str,
    assets_index: &'a str,
    game_dir: String,
    assets_root: String,
    natives_dir: String,
    library_dir: String,
    classpath: &'a str,
}

impl LaunchVariables<'_> {
    fn resolve(&self, arg: &str) -> String {
        arg.replace("${auth_player_name}", &self.identity.username)
            .replace("${version_name}", self.version_name)
            .replace("${game_directory}", &self.game_dir)
            .replace("${assets_root}", &self.assets_root)
            .replace("${game_assets}", &self.assets_root)
            .replace("${assets_index_name}", self.assets_index)
            .replace("${auth_uuid}", &self.identity.uuid_simple())
            .replace("${auth_access_token}", &self.identity.access_token)
            .replace("${auth_session}", &self.identity.access_token)
            .replace("${user_type}", &self.identity.user_type)
            .replace("${version_type}", self.version_type)
            .replace("${user_properties}", "{}")
            .replace("${natives_directory}", &self.natives_dir)
            .replace("${launcher_name}", LAUNCHER_NAME)
            .replace("${launcher_version}", LAUNCHER_VERSION)
            .replace("${classpath_separator}", classpath_separator())
            .replace("${classpath}", self.classpath)
            .replace("${library_directory}", &self.library_dir)
            .replace("${clientid}", "")
            .replace("${auth_xuid}", "")
    }

    /// Resolve every argument. One that still holds a placeholder is dropped
    /// together with the option naming it.
    fn resolve_all(&self, raw_args: &[String]) -> Vec<String> {
        let mut resolved = Vec::with_capacity(raw_args.len());
        for arg in raw_args {
            let value = self.resolve(arg);
            if value.contains("${") {
                debug!("Dropping unresolved argument {:?}", arg);
                drop_dangling_option(&mut resolved);
                continue;
            }
            resolved.push(value);
        }
        resolved
    }
}

fn drop_dangling_option(args: &mut Vec<String>) {
    if args.last().is_some_and(|last| last.starts_with('-')) {
        let _ = args.pop();
    }
}

fn configure_native_library_env(cmd: &mut Command, natives_dir: &Path) {
    let native_path = safe_path_str(natives_dir);

    if cfg!(target_os = "windows") {
        cmd.env("PATH", append_env_path("PATH", &native_path));
    } else if cfg!(target_os = "linux") {
        cmd.env("LD_LIBRARY_PATH", append_env_path("LD_LIBRARY_PATH", &native_path));
    } else if cfg!(target_os = "macos") {
        cmd.env("DYLD_LIBRARY_PATH", append_env_path("DYLD_LIBRARY_PATH", &native_path));
    }
}

fn configure_platform_spawn(cmd: &mut Command) {
    #[cfg(target_os = "windows")]
    {
        const CREATE_NO_WINDOW: u32 = 0x08000000;
        cmd.creation_flags(CREATE_NO_WINDOW);
        cmd.env_remove("WT_SESSION");
        cmd.env_remove("TERM");
    }
    #[cfg(not(target_os = "windows"))]
    let _ = cmd;
}

fn append_env_path(var_name: &str, value: &str) -> String {
    let separator = if cfg!(target_os = "windows") { ";" } else { ":" };
    match std::env::var(var_name) {
        Ok(existing) if !existing.trim().is_empty() => format!("{}{}{}", value, separator, existing),
        _ => value.to_string(),
    }
}

fn format_command_for_logs(program: &Path, args: &[String]) -> String {
    std::iter::once(shell_escape(&program.to_string_lossy()))
        .chain(args.iter().map(|arg| shell_escape(arg)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn shell_escape(raw: &str) -> String {
    if raw.is_empty() {
        return "\"\"".to_string();
    }

    if raw.chars().all(|ch| {
        ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | '/' | ':' | '\\' | '=')
    }) {
        return raw.to_string();
    }

    format!("\"{}\"", raw.replace('"', "\\\""))
}
