use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::core::downloader::{AssetKind, TransferTask};
use crate::core::error::{LauncherError, LauncherResult};

pub const RESOURCES_URL: &str = "https://resources.download.minecraft.net";

/// Top-level asset index JSON structure.
#[derive(Debug, Deserialize)]
pub struct AssetIndex {
    pub objects: HashMap<String, AssetObject>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetObject {
    pub hash: String,
    #[serde(default)]
    pub size: u64,
}

/// One asset object resolved to its download and on-disk location.
#[derive(Debug, Clone)]
pub struct AssetFetch {
    pub task: TransferTask,
    pub sha1: String,
}

impl AssetIndex {
    pub fn load(path: &Path) -> LauncherResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| LauncherError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Fetches for every object, ordered by logical name so repeated installs
    /// walk the index in the same order.
    pub fn fetches(&self, assets_dir: &Path) -> Vec<AssetFetch> {
        let mut names: Vec<&String> = self.objects.keys().collect();
        names.sort();

        names
            .into_iter()
            .filter_map(|name| {
                let object = &self.objects[name];
                if object.hash.len() < 2 || !object.hash.is_ascii() {
                    return None;
                }
                let mut task = TransferTask::new(
                    object_url(&object.hash),
                    object_path(assets_dir, &object.hash),
                    AssetKind::Asset,
                );
                task.display_name = name.clone();
                Some(AssetFetch {
                    task,
                    sha1: object.hash.clone(),
                })
            })
            .collect()
    }
}

/// `assets/indexes/<id>.json`
pub fn index_path(assets_dir: &Path, index_id: &str) -> PathBuf {
    assets_dir.join("indexes").join(format!("{index_id}.json"))
}

/// `assets/objects/<first two hex chars>/<hash>`
pub fn object_path(assets_dir: &Path, hash: &str) -> PathBuf {
    assets_dir.join("objects").join(&hash[..2]).join(hash)
}

pub fn object_url(hash: &str) -> String {
    format!("{}/{}/{}", RESOURCES_URL, &hash[..2], hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn objects_map_to_hash_prefixed_paths() {
        let index: AssetIndex = serde_json::from_value(serde_json::json!({
            "objects": {
                "minecraft/sounds/b.ogg": { "hash": "bd0f0c3e6c8e4bd5b6f0a2e8fd0c56e1e7f4b2a9", "size": 10 },
                "minecraft/lang/a.json": { "hash": "0a1b2c3d4e5f60718293a4b5c6d7e8f901234567", "size": 5 },
                "broken": { "hash": "x" }
            }
        }))
        .unwrap();

        let assets = PathBuf::from("/mc/assets");
        let fetches = index.fetches(&assets);

        assert_eq!(fetches.len(), 2);
        assert_eq!(fetches[0].task.display_name, "minecraft/lang/a.json");
        assert_eq!(
            fetches[0].task.destination,
            assets
                .join("objects")
                .join("0a")
                .join("0a1b2c3d4e5f60718293a4b5c6d7e8f901234567")
        );
        assert_eq!(
            fetches[1].task.source_url,
            "https://resources.download.minecraft.net/bd/bd0f0c3e6c8e4bd5b6f0a2e8fd0c56e1e7f4b2a9"
        );
        assert_eq!(index_path(&assets, "17"), assets.join("indexes").join("17.json"));
    }
}
