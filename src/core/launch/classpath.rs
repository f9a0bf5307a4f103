use std::collections::HashSet;
use std::path::Path;

use tracing::{debug, warn};

use crate::core::version::VersionJson;

/// Classpath for `version`: every allowed library artifact that exists under
/// `libraries_dir`, then the client jar. Duplicates keep their first position.
pub fn build_classpath(version: &VersionJson, libraries_dir: &Path, client_jar: &Path) -> String {
    let mut entries = Vec::new();

    for file in version.allowed_libraries().filter_map(|lib| lib.artifact_file()) {
        let jar = libraries_dir.join(&file.relative_path);
        if jar.exists() {
            entries.push(safe_path_str(&jar));
        } else {
            warn!("Library missing from classpath: {:?}", jar);
        }
    }
    entries.push(safe_path_str(client_jar));

    dedup_preserving_order(&mut entries);
    debug!("Classpath has {} entries", entries.len());
    entries.join(classpath_separator())
}

/// Platform-specific Java classpath separator.
pub fn classpath_separator() -> &'static str {
    if cfg!(target_os = "windows") {
        ";"
    } else {
        ":"
    }
}

fn dedup_preserving_order(entries: &mut Vec<String>) {
    let mut seen = HashSet::new();
    entries.retain(|entry| {
        let key = if cfg!(target_os = "windows") {
            entry.to_lowercase()
        } else {
            entry.clone()
        };
        seen.insert(key)
    });
}

/// Path as a launch argument, without the `\\?\` prefix canonicalisation adds
/// on Windows.
pub fn safe_path_str(path: &Path) -> String {
    let resolved = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let text = resolved.to_string_lossy().to_string();

    #[cfg(target_os = "windows")]
    {
        // Java reports ClassNotFoundException for extended-length classpath
        // entries even when the jars exist.
        if let Some(stripped) = text.strip_prefix(r"\\?\") {
            return stripped.to_string();
        }
    }

    text
}
