// ─── Version File ───
// Parses a Mojang version JSON and evaluates OS rules for libraries.

use std::path::Path;

use serde::Deserialize;

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::maven::{MavenArtifact, MOJANG_LIBRARIES};

/// A fully parsed Mojang version JSON.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionJson {
    pub id: Option<String>,
    #[serde(default)]
    pub main_class: String,
    #[serde(default)]
    pub inherits_from: Option<String>,
    #[serde(default)]
    pub libraries: Vec<LibraryEntry>,
    pub downloads: Option<VersionDownloads>,
    #[serde(default)]
    pub asset_index: Option<AssetIndexInfo>,
    /// Asset index id for legacy files without an `assetIndex` block.
    #[serde(default)]
    pub assets: Option<String>,
    #[serde(default)]
    pub arguments: Option<Arguments>,
    /// Legacy `minecraftArguments` field (pre-1.13).
    #[serde(default)]
    pub minecraft_arguments: Option<String>,
    #[serde(default, rename = "type")]
    pub version_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VersionDownloads {
    pub client: Option<DownloadArtifact>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DownloadArtifact {
    pub sha1: String,
    #[serde(default)]
    pub size: u64,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetIndexInfo {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub sha1: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Arguments {
    #[serde(default)]
    pub game: Vec<serde_json::Value>,
    #[serde(default)]
    pub jvm: Vec<serde_json::Value>,
}

// ─── Library Entry with Rules ───

#[derive(Debug, Clone, Deserialize)]
pub struct LibraryEntry {
    pub name: String,
    #[serde(default)]
    pub downloads: Option<LibraryDownloads>,
    /// Repository base for loader libraries that only carry a coordinate.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub rules: Option<Vec<LibraryRule>>,
    #[serde(default)]
    pub natives: Option<serde_json::Value>,
    #[serde(default)]
    pub extract: Option<ExtractRules>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LibraryDownloads {
    pub artifact: Option<LibDownloadArtifact>,
    #[serde(default)]
    pub classifiers: Option<std::collections::HashMap<String, LibDownloadArtifact>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LibDownloadArtifact {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub sha1: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractRules {
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// A library file resolved to a download location and a local path
/// relative to `libraries/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryFile {
    pub url: String,
    pub relative_path: String,
    pub sha1: Option<String>,
}

// ─── OS Rule Evaluation ───

#[derive(Debug, Clone, Deserialize)]
pub struct LibraryRule {
    pub action: RuleAction,
    #[serde(default)]
    pub os: Option<OsRule>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    Disallow,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OsRule {
    #[serde(default)]
    pub name: Option<String>,
}

impl LibraryEntry {
    /// Evaluate whether this library should be included for the current OS.
    ///
    /// No rules means allowed. Otherwise start disallowed and let every rule
    /// whose OS matches (or that names no OS) set the state in order.
    pub fn is_allowed_for_current_os(&self) -> bool {
        let rules = match &self.rules {
            Some(r) => r,
            None => return true,
        };

        let current_os = current_os_name();
        let mut allowed = false;

        for rule in rules {
            let os_matches = match rule.os.as_ref().and_then(|os| os.name.as_deref()) {
                None => true,
                Some(name) => name == current_os,
            };

            if os_matches {
                allowed = rule.action == RuleAction::Allow;
            }
        }

        allowed
    }

    /// Classifier key of this library's natives for the current OS.
    pub fn native_classifier_for_current_os(&self) -> Option<String> {
        let natives = self.natives.as_ref()?;
        let os = current_os_name();
        natives.as_object()?.get(os)?.as_str().map(|s| {
            let arch = if cfg!(target_pointer_width = "64") {
                "64"
            } else {
                "32"
            };
            s.replace("${arch}", arch)
        })
    }

    /// The main jar of this library, if it has one.
    pub fn artifact_file(&self) -> Option<LibraryFile> {
        if let Some(artifact) = self.downloads.as_ref().and_then(|d| d.artifact.as_ref()) {
            if artifact.url.is_empty() {
                return None;
            }
            let relative_path = match &artifact.path {
                Some(path) => path.clone(),
                None => self.coordinate_path()?,
            };
            return Some(LibraryFile {
                url: artifact.url.clone(),
                relative_path,
                sha1: artifact.sha1.clone(),
            });
        }

        // Loader libraries: coordinate plus repository base.
        if self.downloads.is_none() && self.natives.is_none() {
            let artifact = MavenArtifact::parse(&self.name).ok()?;
            let repo = self.url.as_deref().unwrap_or(MOJANG_LIBRARIES);
            return Some(LibraryFile {
                url: artifact.url(repo),
                relative_path: artifact.repository_path(),
                sha1: None,
            });
        }

        None
    }

    /// The natives jar of this library for the current OS.
    pub fn native_file(&self) -> Option<LibraryFile> {
        let classifier = self.native_classifier_for_current_os()?;
        let native = self
            .downloads
            .as_ref()?
            .classifiers
            .as_ref()?
            .get(&classifier)?;
        let relative_path = match &native.path {
            Some(path) => path.clone(),
            None => MavenArtifact::parse(&self.name)
                .ok()?
                .with_classifier(classifier)
                .repository_path(),
        };
        Some(LibraryFile {
            url: native.url.clone(),
            relative_path,
            sha1: native.sha1.clone(),
        })
    }

    /// Whether `entry_name` inside the natives jar should be skipped.
    pub fn excludes(&self, entry_name: &str) -> bool {
        self.extract
            .as_ref()
            .map(|rules| rules.exclude.iter().any(|prefix| entry_name.starts_with(prefix.as_str())))
            .unwrap_or(false)
    }

    fn coordinate_path(&self) -> Option<String> {
        MavenArtifact::parse(&self.name)
            .ok()
            .map(|artifact| artifact.repository_path())
    }
}

/// Get the Mojang OS name for the current platform.
pub fn current_os_name() -> &'static str {
    if cfg!(target_os = "windows") {
        "windows"
    } else if cfg!(target_os = "macos") {
        "osx"
    } else {
        "linux"
    }
}

impl VersionJson {
    pub fn parse(raw: &str) -> LauncherResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn load(path: &Path) -> LauncherResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| LauncherError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw)
    }

    /// Libraries that apply to the current OS.
    pub fn allowed_libraries(&self) -> impl Iterator<Item = &LibraryEntry> {
        self.libraries.iter().filter(|lib| lib.is_allowed_for_current_os())
    }

    pub fn client_download(&self) -> Option<&DownloadArtifact> {
        self.downloads.as_ref()?.client.as_ref()
    }

    /// Asset index id, falling back to the legacy `assets` field.
    pub fn asset_index_id(&self) -> Option<&str> {
        self.asset_index
            .as_ref()
            .map(|info| info.id.as_str())
            .or(self.assets.as_deref())
    }

    /// Game arguments for the current OS. Feature-gated entries are skipped.
    pub fn game_arguments(&self) -> Vec<String> {
        match &self.arguments {
            Some(args) => args.game.iter().flat_map(extract_argument_values).collect(),
            None => match &self.minecraft_arguments {
                Some(s) => s.split_whitespace().map(|s| s.to_string()).collect(),
                None => vec![],
            },
        }
    }

    /// JVM arguments for the current OS. Empty for legacy files.
    pub fn jvm_arguments(&self) -> Vec<String> {
        match &self.arguments {
            Some(args) => args.jvm.iter().flat_map(extract_argument_values).collect(),
            None => vec![],
        }
    }

    /// Build a merged version JSON with `parent_json` as base and this version
    /// overriding matching keys. Library lists are concatenated child first.
    pub fn merge_with_parent_json(
        current_json: &serde_json::Value,
        parent_json: &serde_json::Value,
    ) -> serde_json::Value {
        let mut merged = parent_json.clone();

        if let Some(obj) = current_json.as_object() {
            for (k, v) in obj {
                match (k.as_str(), v, parent_json.get(k)) {
                    ("libraries", serde_json::Value::Array(child), Some(serde_json::Value::Array(parent))) => {
                        let mut libraries = child.clone();
                        libraries.extend(parent.iter().cloned());
                        merged[k] = serde_json::Value::Array(libraries);
                    }
                    ("arguments", serde_json::Value::Object(child), Some(serde_json::Value::Object(parent))) => {
                        let mut arguments = serde_json::Map::new();
                        for key in ["game", "jvm"] {
                            let mut values = parent
                                .get(key)
                                .and_then(|v| v.as_array())
                                .cloned()
                                .unwrap_or_default();
                            if let Some(extra) = child.get(key).and_then(|v| v.as_array()) {
                                values.extend(extra.iter().cloned());
                            }
                            arguments.insert(key.to_string(), serde_json::Value::Array(values));
                        }
                        merged[k] = serde_json::Value::Object(arguments);
                    }
                    _ => merged[k] = v.clone(),
                }
            }
        }

        merged
    }
}

fn extract_argument_values(value: &serde_json::Value) -> Vec<String> {
    if let Some(arg) = value.as_str() {
        return vec![arg.to_string()];
    }

    let Some(obj) = value.as_object() else {
        return vec![];
    };

    if let Some(rules) = obj.get("rules").and_then(|r| r.as_array()) {
        if !rules_allow_current_os(rules) {
            return vec![];
        }
    }

    match obj.get("value") {
        Some(serde_json::Value::String(s)) => vec![s.clone()],
        Some(serde_json::Value::Array(arr)) => arr
            .iter()
            .filter_map(|v| v.as_str().map(ToString::to_string))
            .collect(),
        _ => vec![],
    }
}

fn rules_allow_current_os(rules: &[serde_json::Value]) -> bool {
    let mut allowed = false;
    let current_os = current_os_name();

    for rule in rules {
        // Feature rules (demo mode, custom resolution) are never enabled.
        if rule.get("features").is_some() {
            return false;
        }

        let action = rule
            .get("action")
            .and_then(|v| v.as_str())
            .unwrap_or("disallow");

        let os_matches = match rule
            .get("os")
            .and_then(|os| os.get("name"))
            .and_then(|name| name.as_str())
        {
            None => true,
            Some(name) => name == current_os,
        };

        if os_matches {
            allowed = action == "allow";
        }
    }

    allowed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library(json: serde_json::Value) -> LibraryEntry {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn no_rules_means_allowed() {
        let lib = library(serde_json::json!({ "name": "test:lib:1.0" }));
        assert!(lib.is_allowed_for_current_os());
    }

    #[test]
    fn allow_only_current_os() {
        let lib = library(serde_json::json!({
            "name": "test:lib:1.0",
            "rules": [{ "action": "allow", "os": { "name": current_os_name() } }]
        }));
        assert!(lib.is_allowed_for_current_os());
    }

    #[test]
    fn disallow_current_os() {
        let lib = library(serde_json::json!({
            "name": "test:lib:1.0",
            "rules": [
                { "action": "allow" },
                { "action": "disallow", "os": { "name": current_os_name() } }
            ]
        }));
        assert!(!lib.is_allowed_for_current_os());
    }

    #[test]
    fn artifact_file_prefers_declared_download() {
        let lib = library(serde_json::json!({
            "name": "com.mojang:brigadier:1.0.18",
            "downloads": { "artifact": {
                "path": "com/mojang/brigadier/1.0.18/brigadier-1.0.18.jar",
                "sha1": "c1ef1234",
                "size": 10,
                "url": "https://libraries.minecraft.net/com/mojang/brigadier/1.0.18/brigadier-1.0.18.jar"
            }}
        }));
        let file = lib.artifact_file().unwrap();
        assert_eq!(file.relative_path, "com/mojang/brigadier/1.0.18/brigadier-1.0.18.jar");
        assert_eq!(file.sha1.as_deref(), Some("c1ef1234"));
    }

    #[test]
    fn loader_library_resolves_from_coordinate() {
        let lib = library(serde_json::json!({
            "name": "net.fabricmc:fabric-loader:0.15.11",
            "url": "https://maven.fabricmc.net/"
        }));
        let file = lib.artifact_file().unwrap();
        assert_eq!(
            file.url,
            "https://maven.fabricmc.net/net/fabricmc/fabric-loader/0.15.11/fabric-loader-0.15.11.jar"
        );
        assert_eq!(
            file.relative_path,
            "net/fabricmc/fabric-loader/0.15.11/fabric-loader-0.15.11.jar"
        );
        assert_eq!(file.sha1, None);
    }

    #[test]
    fn native_file_uses_os_classifier() {
        let os = current_os_name();
        let classifier = format!("natives-{os}");
        let lib = library(serde_json::json!({
            "name": "org.lwjgl.lwjgl:lwjgl-platform:2.9.4",
            "natives": { os: classifier },
            "extract": { "exclude": ["META-INF/"] },
            "downloads": { "classifiers": { classifier.clone(): {
                "path": format!("org/lwjgl/lwjgl/lwjgl-platform/2.9.4/lwjgl-platform-2.9.4-{classifier}.jar"),
                "sha1": "abcd",
                "url": "https://libraries.minecraft.net/native.jar"
            }}}
        }));

        let native = lib.native_file().unwrap();
        assert!(native.relative_path.ends_with(&format!("{classifier}.jar")));
        assert!(lib.artifact_file().is_none());
        assert!(lib.excludes("META-INF/MANIFEST.MF"));
        assert!(!lib.excludes("liblwjgl.so"));
    }

    #[test]
    fn argument_object_rules_apply_to_current_os() {
        let parsed: VersionJson = serde_json::from_value(serde_json::json!({
            "id": "test",
            "mainClass": "net.minecraft.client.main.Main",
            "arguments": {
                "game": [
                    "--username",
                    "${auth_player_name}",
                    {
                        "rules": [{"action": "allow", "os": {"name": current_os_name()}}],
                        "value": ["--os-flag"]
                    },
                    {
                        "rules": [{"action": "allow", "features": {"is_demo_user": true}}],
                        "value": "--demo"
                    }
                ]
            }
        }))
        .unwrap();

        let game_args = parsed.game_arguments();
        assert_eq!(
            game_args,
            vec!["--username", "${auth_player_name}", "--os-flag"]
        );
    }

    #[test]
    fn legacy_arguments_split_on_whitespace() {
        let parsed = VersionJson::parse(
            r#"{"mainClass":"net.minecraft.client.Minecraft","assets":"legacy",
                "minecraftArguments":"--username ${auth_player_name} --version ${version_name}"}"#,
        )
        .unwrap();
        assert_eq!(parsed.game_arguments().len(), 4);
        assert!(parsed.jvm_arguments().is_empty());
        assert_eq!(parsed.asset_index_id(), Some("legacy"));
    }

    #[test]
    fn merge_with_parent_json_overrides_parent_fields() {
        let parent = serde_json::json!({
            "id": "1.20.1",
            "mainClass": "parent.Main",
            "libraries": [{"name": "a:b:1.0"}],
            "arguments": { "game": ["--parent"], "jvm": ["-Dparent"] }
        });
        let current = serde_json::json!({
            "id": "fabric-loader-1.20.1",
            "inheritsFrom": "1.20.1",
            "mainClass": "child.Main",
            "libraries": [{"name": "c:d:2.0"}],
            "arguments": { "game": ["--child"] }
        });

        let merged = VersionJson::merge_with_parent_json(&current, &parent);

        assert_eq!(merged["mainClass"], "child.Main");
        assert_eq!(merged["id"], "fabric-loader-1.20.1");
        assert_eq!(merged["libraries"][0]["name"], "c:d:2.0");
        assert_eq!(merged["libraries"][1]["name"], "a:b:1.0");
        assert_eq!(merged["arguments"]["game"], serde_json::json!(["--parent", "--child"]));
        assert_eq!(merged["arguments"]["jvm"], serde_json::json!(["-Dparent"]));
    }
}
