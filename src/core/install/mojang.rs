use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::core::assets::asset_index::{self, AssetIndex};
use crate::core::downloader::AssetKind;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::launch::natives::{extract_natives, native_jars};
use crate::core::version::{VersionJson, VersionManifest, VERSION_MANIFEST_URL};

use super::backend::StageBackend;
use super::context::InstallContext;

/// Installs from Mojang's manifest, libraries and resources hosts. Every
/// request goes through the install's [`TransferEngine`](crate::core::downloader::TransferEngine).
pub struct MojangInstaller {
    manifest_url: String,
}

impl Default for MojangInstaller {
    fn default() -> Self {
        Self::new()
    }
}

impl MojangInstaller {
    pub fn new() -> Self {
        Self::with_manifest_url(VERSION_MANIFEST_URL)
    }

    pub fn with_manifest_url(url: impl Into<String>) -> Self {
        Self {
            manifest_url: url.into(),
        }
    }

    async fn manifest(&self, ctx: &InstallContext<'_>) -> LauncherResult<VersionManifest> {
        let raw = ctx.engine.fetch_bytes(&self.manifest_url).await?;
        VersionManifest::parse(&raw)
    }
}

#[async_trait]
impl StageBackend for MojangInstaller {
    async fn fetch_metadata(&self, ctx: &InstallContext<'_>) -> LauncherResult<VersionJson> {
        let json_path = ctx.paths.version_json(ctx.version_id);
        let on_disk = tokio::fs::metadata(&json_path).await.is_ok();

        match self.manifest(ctx).await {
            Ok(manifest) => match manifest.find_version(ctx.version_id) {
                Some(entry) => {
                    ctx.fetch_verified(
                        &entry.url,
                        &json_path,
                        entry.sha1.as_deref(),
                        AssetKind::VersionJson,
                    )
                    .await?;
                }
                // Loader profiles written by external installers.
                None if on_disk => debug!("{} not in manifest, using local JSON", ctx.version_id),
                None => return Err(LauncherError::VersionNotFound(ctx.version_id.to_string())),
            },
            Err(err) if on_disk => {
                warn!("Manifest unavailable ({}), using local {:?}", err, json_path);
            }
            Err(err) => return Err(err),
        }

        VersionJson::load(&json_path)
    }

    async fn fetch_client_jar(
        &self,
        ctx: &InstallContext<'_>,
        version: &VersionJson,
    ) -> LauncherResult<()> {
        let Some(client) = version.client_download() else {
            debug!("{} declares no client jar", ctx.version_id);
            return Ok(());
        };
        ctx.fetch_verified(
            &client.url,
            &ctx.paths.version_jar(ctx.version_id),
            Some(&client.sha1),
            AssetKind::ClientJar,
        )
        .await?;
        info!("Downloaded client jar for {}", ctx.version_id);
        Ok(())
    }

    async fn fetch_natives(
        &self,
        ctx: &InstallContext<'_>,
        version: &VersionJson,
    ) -> LauncherResult<()> {
        let libraries_dir = ctx.paths.libraries_dir();
        for file in version.allowed_libraries().filter_map(|lib| lib.native_file()) {
            ctx.fetch_verified(
                &file.url,
                &libraries_dir.join(&file.relative_path),
                file.sha1.as_deref(),
                AssetKind::Native,
            )
            .await?;
        }

        let jars = native_jars(version, &libraries_dir);
        if !jars.is_empty() {
            extract_natives(jars, &ctx.paths.natives_dir(ctx.version_id)).await?;
        }
        Ok(())
    }

    async fn fetch_assets(
        &self,
        ctx: &InstallContext<'_>,
        version: &VersionJson,
    ) -> LauncherResult<()> {
        let Some(info) = version.asset_index.as_ref() else {
            debug!("{} has no asset index", ctx.version_id);
            return Ok(());
        };

        let assets_dir = ctx.paths.assets_dir();
        let index_path = asset_index::index_path(&assets_dir, &info.id);
        ctx.fetch_verified(
            &info.url,
            &index_path,
            info.sha1.as_deref(),
            AssetKind::AssetIndex,
        )
        .await?;

        let index = AssetIndex::load(&index_path)?;
        let fetches = index.fetches(&assets_dir);
        let total = fetches.len();
        let mut fetched = 0_usize;

        for fetch in fetches {
            if ctx.fetch_task_verified(fetch.task, Some(&fetch.sha1)).await? {
                fetched += 1;
            }
        }

        info!(
            "Assets for {}: {} fetched, {} already present",
            ctx.version_id,
            fetched,
            total - fetched
        );
        Ok(())
    }

    async fn fetch_libraries(
        &self,
        ctx: &InstallContext<'_>,
        version: &VersionJson,
    ) -> LauncherResult<()> {
        let libraries_dir = ctx.paths.libraries_dir();
        let mut fetched = 0_usize;

        for file in version.allowed_libraries().filter_map(|lib| lib.artifact_file()) {
            if ctx
                .fetch_verified(
                    &file.url,
                    &libraries_dir.join(&file.relative_path),
                    file.sha1.as_deref(),
                    AssetKind::Library,
                )
                .await?
            {
                fetched += 1;
            }
        }

        info!("Libraries for {}: {} fetched", ctx.version_id, fetched);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    use futures_util::{stream, StreamExt};
    use sha1::{Digest, Sha1};
    use zip::write::SimpleFileOptions;

    use super::*;
    use crate::core::assets::asset_index::object_url;
    use crate::core::downloader::{Throttle, Transport, TransportResponse};
    use crate::core::events::{EventEmitter, LauncherEvent};
    use crate::core::install::{InstallOrchestrator, InstallStage};
    use crate::core::paths::LauncherPaths;

    const MANIFEST: &str = "https://meta.test/version_manifest_v2.json";
    const VERSION_URL: &str = "https://meta.test/1.20.1.json";
    const CLIENT_URL: &str = "https://files.test/client.jar";
    const NATIVES_URL: &str = "https://files.test/lwjgl-natives.jar";
    const INDEX_URL: &str = "https://meta.test/indexes/5.json";
    const LIBRARY_URL: &str = "https://files.test/lib-1.0.jar";

    enum Route {
        Body(Vec<u8>),
        Status(u16),
    }

    /// Answers by exact URL; anything unrouted is a connection failure.
    #[derive(Default)]
    struct RoutedTransport {
        routes: Mutex<HashMap<String, Route>>,
        opened: Mutex<Vec<String>>,
    }

    impl RoutedTransport {
        fn route(&self, url: &str, route: Route) {
            self.routes.lock().unwrap().insert(url.to_string(), route);
        }

        fn take_opened(&self) -> Vec<String> {
            std::mem::take(&mut *self.opened.lock().unwrap())
        }
    }

    #[async_trait]
    impl Transport for RoutedTransport {
        async fn open(&self, url: &str) -> LauncherResult<TransportResponse> {
            self.opened.lock().unwrap().push(url.to_string());
            match self.routes.lock().unwrap().get(url) {
                Some(Route::Body(body)) => Ok(TransportResponse {
                    status: 200,
                    content_length: Some(body.len() as u64),
                    body: stream::iter(vec![Ok::<_, LauncherError>(body.clone())]).boxed(),
                }),
                Some(Route::Status(status)) => Ok(TransportResponse {
                    status: *status,
                    content_length: None,
                    body: stream::empty().boxed(),
                }),
                None => Err(LauncherError::Other(format!("connection refused: {url}"))),
            }
        }
    }

    fn sha1_hex(bytes: &[u8]) -> String {
        hex::encode(Sha1::digest(bytes))
    }

    fn natives_jar() -> Vec<u8> {
        let mut zip = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        zip.start_file("liblwjgl.so", SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"elf").unwrap();
        zip.finish().unwrap().into_inner()
    }

    /// Routes for a complete 1.20.1 install.
    fn serve_release(transport: &RoutedTransport) {
        let natives = natives_jar();
        let natives_entry = serde_json::json!({
            "url": NATIVES_URL,
            "sha1": sha1_hex(&natives),
        });
        let asset = b"icon bytes".to_vec();
        let asset_hash = sha1_hex(&asset);
        let index = serde_json::to_vec(&serde_json::json!({
            "objects": { "icons/icon.png": { "hash": asset_hash, "size": asset.len() } }
        }))
        .unwrap();
        let client = b"client jar".to_vec();
        let library = b"library jar".to_vec();

        let version = serde_json::to_vec(&serde_json::json!({
            "id": "1.20.1",
            "mainClass": "net.minecraft.client.main.Main",
            "downloads": { "client": { "url": CLIENT_URL, "sha1": sha1_hex(&client) } },
            "assetIndex": { "id": "5", "url": INDEX_URL, "sha1": sha1_hex(&index) },
            "libraries": [
                {
                    "name": "com.example:lib:1.0",
                    "downloads": { "artifact": {
                        "path": "com/example/lib/1.0/lib-1.0.jar",
                        "url": LIBRARY_URL,
                        "sha1": sha1_hex(&library),
                    } }
                },
                {
                    "name": "org.lwjgl:lwjgl:3.3.1",
                    "natives": {
                        "linux": "natives-linux",
                        "osx": "natives-macos",
                        "windows": "natives-windows"
                    },
                    "downloads": { "classifiers": {
                        "natives-linux": natives_entry,
                        "natives-macos": natives_entry,
                        "natives-windows": natives_entry,
                    } }
                }
            ]
        }))
        .unwrap();
        let manifest = serde_json::to_vec(&serde_json::json!({
            "versions": [{
                "id": "1.20.1",
                "type": "release",
                "releaseTime": "2023-06-12T13:25:51+00:00",
                "url": VERSION_URL,
                "sha1": sha1_hex(&version),
            }]
        }))
        .unwrap();

        transport.route(MANIFEST, Route::Body(manifest));
        transport.route(VERSION_URL, Route::Body(version));
        transport.route(CLIENT_URL, Route::Body(client));
        transport.route(NATIVES_URL, Route::Body(natives));
        transport.route(INDEX_URL, Route::Body(index));
        transport.route(&object_url(&asset_hash), Route::Body(asset));
        transport.route(LIBRARY_URL, Route::Body(library));
    }

    fn temp_paths(test: &str) -> (PathBuf, LauncherPaths) {
        let root = std::env::temp_dir().join(format!("mojang-{test}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&root);
        let paths = LauncherPaths::with_roots(root.join("game"), root.join("data"));
        (root, paths)
    }

    fn installer(
        paths: &LauncherPaths,
        transport: &Arc<RoutedTransport>,
        events: EventEmitter,
    ) -> InstallOrchestrator<MojangInstaller> {
        InstallOrchestrator::new(
            MojangInstaller::with_manifest_url(MANIFEST),
            paths.clone(),
            transport.clone(),
            events,
        )
    }

    fn write_local_json(paths: &LauncherPaths, id: &str) {
        let json = paths.version_json(id);
        std::fs::create_dir_all(json.parent().unwrap()).unwrap();
        std::fs::write(
            json,
            format!(r#"{{"id":"{id}","mainClass":"net.fabricmc.loader.impl.launch.knot.KnotClient"}}"#),
        )
        .unwrap();
    }

    fn stage_source(err: LauncherError) -> (InstallStage, LauncherError) {
        match err {
            LauncherError::InstallStage { stage, source } => (stage, *source),
            other => panic!("expected a stage error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn installs_every_stage_then_skips_verified_files() {
        let (root, paths) = temp_paths("full");
        let transport = Arc::new(RoutedTransport::default());
        serve_release(&transport);
        let (events, mut rx) = EventEmitter::channel();
        let orchestrator = installer(&paths, &transport, events);

        orchestrator
            .install_version("1.20.1", Throttle::from_kbps(4096))
            .await
            .unwrap();

        assert_eq!(std::fs::read(paths.version_jar("1.20.1")).unwrap(), b"client jar");
        assert_eq!(
            std::fs::read(paths.libraries_dir().join("com/example/lib/1.0/lib-1.0.jar")).unwrap(),
            b"library jar"
        );
        assert_eq!(
            std::fs::read(paths.natives_dir("1.20.1").join("liblwjgl.so")).unwrap(),
            b"elf"
        );
        assert!(paths.assets_dir().join("indexes").join("5.json").is_file());

        let mut opened = transport.take_opened();
        opened.sort();
        assert_eq!(opened.len(), 7);
        assert!(opened.contains(&LIBRARY_URL.to_string()));

        let mut kinds = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let LauncherEvent::DownloadStatus(progress) = event {
                kinds.push(progress.kind);
            }
        }
        for kind in [AssetKind::Native, AssetKind::Asset, AssetKind::Library] {
            assert!(kinds.contains(&kind), "no progress for {kind:?}");
        }

        orchestrator
            .install_version("1.20.1", Throttle::Unlimited)
            .await
            .unwrap();
        assert_eq!(transport.take_opened(), vec![MANIFEST.to_string()]);
        assert!(paths.natives_dir("1.20.1").join("liblwjgl.so").is_file());

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn unreachable_manifest_falls_back_to_local_json() {
        let (root, paths) = temp_paths("offline");
        let transport = Arc::new(RoutedTransport::default());
        write_local_json(&paths, "fabric-1.20.1");
        let orchestrator = installer(&paths, &transport, EventEmitter::detached());

        orchestrator
            .install_version("fabric-1.20.1", Throttle::Unlimited)
            .await
            .unwrap();
        assert_eq!(transport.take_opened(), vec![MANIFEST.to_string()]);

        let err = orchestrator
            .install_version("1.19.4", Throttle::Unlimited)
            .await
            .unwrap_err();
        let (stage, source) = stage_source(err);
        assert_eq!(stage, InstallStage::Metadata);
        assert!(matches!(source, LauncherError::Other(_)));

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn unlisted_version_needs_a_local_json() {
        let (root, paths) = temp_paths("unlisted");
        let transport = Arc::new(RoutedTransport::default());
        transport.route(MANIFEST, Route::Body(br#"{"versions":[]}"#.to_vec()));
        write_local_json(&paths, "fabric-1.20.1");
        let orchestrator = installer(&paths, &transport, EventEmitter::detached());

        orchestrator
            .install_version("fabric-1.20.1", Throttle::Unlimited)
            .await
            .unwrap();

        let err = orchestrator
            .install_version("1.19.4", Throttle::Unlimited)
            .await
            .unwrap_err();
        let (stage, source) = stage_source(err);
        assert_eq!(stage, InstallStage::Metadata);
        assert!(matches!(source, LauncherError::VersionNotFound(id) if id == "1.19.4"));

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn missing_library_fails_the_libraries_stage() {
        let (root, paths) = temp_paths("404");
        let transport = Arc::new(RoutedTransport::default());
        serve_release(&transport);
        transport.route(LIBRARY_URL, Route::Status(404));
        let orchestrator = installer(&paths, &transport, EventEmitter::detached());

        let err = orchestrator
            .install_version("1.20.1", Throttle::Unlimited)
            .await
            .unwrap_err();
        let (stage, source) = stage_source(err);
        assert_eq!(stage, InstallStage::Libraries);
        assert!(matches!(source, LauncherError::NotFound { url } if url == LIBRARY_URL));
        assert!(paths.version_jar("1.20.1").is_file());

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn corrupt_download_is_removed_and_reported() {
        let (root, paths) = temp_paths("corrupt");
        let transport = Arc::new(RoutedTransport::default());
        serve_release(&transport);
        transport.route(LIBRARY_URL, Route::Body(b"tampered".to_vec()));
        let orchestrator = installer(&paths, &transport, EventEmitter::detached());

        let err = orchestrator
            .install_version("1.20.1", Throttle::Unlimited)
            .await
            .unwrap_err();
        let (stage, source) = stage_source(err);
        assert_eq!(stage, InstallStage::Libraries);
        match source {
            LauncherError::Sha1Mismatch { actual, .. } => assert_eq!(actual, sha1_hex(b"tampered")),
            other => panic!("expected a checksum error, got {other:?}"),
        }
        assert!(!paths
            .libraries_dir()
            .join("com/example/lib/1.0/lib-1.0.jar")
            .exists());

        let _ = std::fs::remove_dir_all(&root);
    }
}
