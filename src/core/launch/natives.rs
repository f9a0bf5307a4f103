use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::version::VersionJson;

/// A downloaded natives jar and the entry prefixes it asks not to extract.
#[derive(Debug, Clone)]
pub struct NativeJar {
    pub path: PathBuf,
    pub exclude: Vec<String>,
}

/// Natives jars of `version` for the current OS, located under `libraries_dir`.
pub fn native_jars(version: &VersionJson, libraries_dir: &Path) -> Vec<NativeJar> {
    version
        .allowed_libraries()
        .filter_map(|lib| {
            let file = lib.native_file()?;
            Some(NativeJar {
                path: libraries_dir.join(&file.relative_path),
                exclude: lib
                    .extract
                    .as_ref()
                    .map(|rules| rules.exclude.clone())
                    .unwrap_or_default(),
            })
        })
        .collect()
}

/// Unpack every jar into `dest`, wiping `dest` first. Missing or unreadable
/// jars are skipped. Returns the number of files written.
pub async fn extract_natives(jars: Vec<NativeJar>, dest: &Path) -> LauncherResult<usize> {
    if tokio::fs::metadata(dest).await.is_ok() {
        tokio::fs::remove_dir_all(dest)
            .await
            .map_err(|source| LauncherError::Io {
                path: dest.to_path_buf(),
                source,
            })?;
    }
    tokio::fs::create_dir_all(dest)
        .await
        .map_err(|source| LauncherError::Io {
            path: dest.to_path_buf(),
            source,
        })?;

    let dest_dir = dest.to_path_buf();
    let written = tokio::task::spawn_blocking(move || {
        jars.iter()
            .map(|jar| extract_jar(jar, &dest_dir))
            .sum::<usize>()
    })
    .await
    .map_err(|e| LauncherError::Other(format!("Task join error: {}", e)))?;

    info!("Extracted {} native files into {:?}", written, dest);
    Ok(written)
}

fn extract_jar(jar: &NativeJar, dest_dir: &Path) -> usize {
    let file = match std::fs::File::open(&jar.path) {
        Ok(file) => file,
        Err(e) => {
            debug!("Native jar {:?} not available: {}", jar.path, e);
            return 0;
        }
    };
    let mut archive = match zip::ZipArchive::new(file) {
        Ok(a) => a,
        Err(e) => {
            warn!("Cannot open native JAR {:?}: {}", jar.path, e);
            return 0;
        }
    };

    let mut written = 0;
    for i in 0..archive.len() {
        let Ok(mut entry) = archive.by_index(i) else {
            continue;
        };
        let name = entry.name().to_string();
        if entry.is_dir()
            || name.starts_with("META-INF")
            || jar.exclude.iter().any(|prefix| name.starts_with(prefix.as_str()))
        {
            continue;
        }
        let Some(relative) = entry.enclosed_name() else {
            warn!("Skipping unsafe native entry {}", name);
            continue;
        };

        let target = dest_dir.join(relative);
        if let Some(parent) = target.parent() {
            if std::fs::create_dir_all(parent).is_err() {
                continue;
            }
        }
        let mut out = match std::fs::File::create(&target) {
            Ok(file) => file,
            Err(_) => continue,
        };
        if std::io::copy(&mut entry, &mut out).is_ok() {
            debug!("Extracted native: {}", name);
            written += 1;
        }
    }
    written
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use zip::write::SimpleFileOptions;

    use super::*;

    fn write_jar(path: &Path, entries: &[(&str, &[u8])]) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let file = std::fs::File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        for (name, body) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(body).unwrap();
        }
        zip.finish().unwrap();
    }

    #[tokio::test]
    async fn extracts_fresh_and_honours_excludes() {
        let root = std::env::temp_dir().join(format!("natives-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&root);
        let jar = root.join("libs/lwjgl-natives.jar");
        write_jar(
            &jar,
            &[
                ("liblwjgl.so", b"elf"),
                ("META-INF/MANIFEST.MF", b"Manifest-Version: 1.0"),
                ("skip/me.txt", b"x"),
            ],
        );
        let dest = root.join("natives/1.12.2-run");
        std::fs::create_dir_all(&dest).unwrap();
        std::fs::write(dest.join("stale.dll"), b"old").unwrap();

        let jars = vec![
            NativeJar {
                path: jar,
                exclude: vec!["skip/".into()],
            },
            NativeJar {
                path: root.join("libs/missing.jar"),
                exclude: vec![],
            },
        ];
        let written = extract_natives(jars, &dest).await.unwrap();

        assert_eq!(written, 1);
        assert!(dest.join("liblwjgl.so").exists());
        assert!(!dest.join("stale.dll").exists());
        assert!(!dest.join("META-INF").exists());
        assert!(!dest.join("skip").exists());

        let _ = std::fs::remove_dir_all(&root);
    }
}
