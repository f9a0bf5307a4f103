// ─── Version Manifest ───
// Fetches the Mojang version manifest and summarises it for listings.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::error::{LauncherError, LauncherResult};

pub const VERSION_MANIFEST_URL: &str =
    "https://piston-meta.mojang.com/mc/game/version_manifest_v2.json";

/// Top-level Mojang version manifest.
#[derive(Debug, Deserialize)]
pub struct VersionManifest {
    pub versions: Vec<VersionEntry>,
}

/// A single entry in the manifest.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub version_type: String,
    pub release_time: String,
    pub url: String,
    #[serde(default)]
    pub sha1: Option<String>,
}

/// What listings show for a remote version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionSummary {
    pub id: String,
    #[serde(rename = "type")]
    pub version_type: String,
    pub release_time: String,
}

impl From<&VersionEntry> for VersionSummary {
    fn from(entry: &VersionEntry) -> Self {
        Self {
            id: entry.id.clone(),
            version_type: entry.version_type.clone(),
            release_time: entry.release_time.clone(),
        }
    }
}

impl VersionManifest {
    pub async fn fetch(client: &reqwest::Client) -> LauncherResult<Self> {
        info!("Fetching Minecraft version manifest...");

        let response = client.get(VERSION_MANIFEST_URL).send().await?;
        if !response.status().is_success() {
            return Err(LauncherError::DownloadFailed {
                url: VERSION_MANIFEST_URL.to_string(),
                status: response.status().as_u16(),
            });
        }
        let manifest: VersionManifest = response.json().await?;

        info!("Loaded {} versions from manifest", manifest.versions.len());
        Ok(manifest)
    }

    pub fn parse(raw: &[u8]) -> LauncherResult<Self> {
        Ok(serde_json::from_slice(raw)?)
    }

    /// Find a specific version entry by ID (e.g. "1.20.4").
    pub fn find_version(&self, id: &str) -> Option<&VersionEntry> {
        self.versions.iter().find(|v| v.id == id)
    }

    pub fn summaries(&self) -> Vec<VersionSummary> {
        self.versions.iter().map(VersionSummary::from).collect()
    }
}

/// Every version Mojang publishes, newest first. Any failure yields an empty
/// list so that callers can still show what is installed locally.
pub async fn fetch_remote_versions(client: &reqwest::Client) -> Vec<VersionSummary> {
    match VersionManifest::fetch(client).await {
        Ok(manifest) => manifest.summaries(),
        Err(err) => {
            warn!("Version manifest unavailable: {}", err);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_manifest_entry() {
        let json = r#"{
            "id": "1.20.4",
            "type": "release",
            "releaseTime": "2023-12-07T12:56:20+00:00",
            "url": "https://example.com/1.20.4.json",
            "sha1": "abc123"
        }"#;
        let entry: VersionEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.id, "1.20.4");
        assert_eq!(entry.version_type, "release");
        assert_eq!(entry.release_time, "2023-12-07T12:56:20+00:00");
    }

    #[test]
    fn summaries_keep_manifest_order_and_shape() {
        let manifest: VersionManifest = serde_json::from_value(serde_json::json!({
            "latest": { "release": "1.20.4", "snapshot": "24w03a" },
            "versions": [
                { "id": "24w03a", "type": "snapshot", "releaseTime": "2024-01-17", "url": "u1" },
                { "id": "1.20.4", "type": "release", "releaseTime": "2023-12-07", "url": "u2" }
            ]
        }))
        .unwrap();

        let summaries = manifest.summaries();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].id, "24w03a");
        assert!(manifest.find_version("1.20.4").is_some());
        assert!(manifest.find_version("1.0").is_none());

        let json = serde_json::to_value(&summaries[1]).unwrap();
        assert_eq!(json["type"], "release");
        assert_eq!(json["releaseTime"], "2023-12-07");
    }
}
