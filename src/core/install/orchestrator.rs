use std::future::Future;
use std::sync::Arc;

use tracing::{error, info, instrument};

use crate::core::downloader::{HttpTransport, Throttle, TransferEngine, Transport};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::events::{EventEmitter, LauncherEvent};
use crate::core::paths::LauncherPaths;

use super::backend::StageBackend;
use super::context::InstallContext;
use super::InstallStage;

/// Runs the install stages in order against a [`StageBackend`].
pub struct InstallOrchestrator<B: StageBackend> {
    backend: B,
    paths: LauncherPaths,
    transport: Arc<dyn Transport>,
    events: EventEmitter,
}

impl<B: StageBackend> InstallOrchestrator<B> {
    pub fn new(
        backend: B,
        paths: LauncherPaths,
        transport: Arc<dyn Transport>,
        events: EventEmitter,
    ) -> Self {
        Self {
            backend,
            paths,
            transport,
            events,
        }
    }

    pub fn http(
        backend: B,
        paths: LauncherPaths,
        client: reqwest::Client,
        events: EventEmitter,
    ) -> Self {
        Self::new(backend, paths, Arc::new(HttpTransport::new(client)), events)
    }

    /// Install `version_id`, stopping at the first failed stage. Files from
    /// finished stages stay on disk, so calling again resumes the work.
    #[instrument(skip(self))]
    pub async fn install_version(&self, version_id: &str, throttle: Throttle) -> LauncherResult<()> {
        info!("Installing {} ({:?})", version_id, throttle);

        let engine = TransferEngine::new(
            self.transport.clone(),
            throttle.limiter(),
            self.events.clone(),
        );
        let ctx = InstallContext {
            version_id,
            paths: &self.paths,
            engine: &engine,
            events: &self.events,
        };

        let version = self
            .stage(&ctx, InstallStage::Metadata, self.backend.fetch_metadata(&ctx))
            .await?;

        let jar_present = tokio::fs::metadata(self.paths.version_jar(version_id))
            .await
            .is_ok();
        if jar_present {
            self.announce(version_id, InstallStage::Jar);
            info!("Client jar for {} already present, skipping", version_id);
        } else {
            self.stage(
                &ctx,
                InstallStage::Jar,
                self.backend.fetch_client_jar(&ctx, &version),
            )
            .await?;
        }

        self.stage(
            &ctx,
            InstallStage::Natives,
            self.backend.fetch_natives(&ctx, &version),
        )
        .await?;
        self.stage(
            &ctx,
            InstallStage::Assets,
            self.backend.fetch_assets(&ctx, &version),
        )
        .await?;
        self.stage(
            &ctx,
            InstallStage::Libraries,
            self.backend.fetch_libraries(&ctx, &version),
        )
        .await?;

        info!("Installed {}", version_id);
        Ok(())
    }

    async fn stage<T>(
        &self,
        ctx: &InstallContext<'_>,
        stage: InstallStage,
        work: impl Future<Output = LauncherResult<T>>,
    ) -> LauncherResult<T> {
        self.announce(ctx.version_id, stage);
        work.await.map_err(|source| {
            error!("Stage {} failed for {}: {}", stage, ctx.version_id, source);
            LauncherError::InstallStage {
                stage,
                source: Box::new(source),
            }
        })
    }

    fn announce(&self, version_id: &str, stage: InstallStage) {
        self.events.emit(LauncherEvent::Installing {
            version: version_id.to_string(),
            step: stage,
        });
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::core::downloader::TransportResponse;
    use crate::core::version::VersionJson;

    struct NoNetwork;

    #[async_trait]
    impl Transport for NoNetwork {
        async fn open(&self, url: &str) -> LauncherResult<TransportResponse> {
            Err(LauncherError::Other(format!("unexpected request to {url}")))
        }
    }

    #[derive(Default)]
    struct RecordingBackend {
        calls: Mutex<Vec<InstallStage>>,
        fail_at: Option<InstallStage>,
    }

    impl RecordingBackend {
        fn record(&self, stage: InstallStage) -> LauncherResult<()> {
            self.calls.lock().unwrap().push(stage);
            if self.fail_at == Some(stage) {
                return Err(LauncherError::NotFound {
                    url: format!("https://example.invalid/{stage}"),
                });
            }
            Ok(())
        }

        fn calls(&self) -> Vec<InstallStage> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl StageBackend for RecordingBackend {
        async fn fetch_metadata(&self, _ctx: &InstallContext<'_>) -> LauncherResult<VersionJson> {
            self.record(InstallStage::Metadata)?;
            VersionJson::parse(r#"{"id":"1.20.1","mainClass":"net.minecraft.client.main.Main"}"#)
        }

        async fn fetch_client_jar(
            &self,
            ctx: &InstallContext<'_>,
            _version: &VersionJson,
        ) -> LauncherResult<()> {
            self.record(InstallStage::Jar)?;
            let jar = ctx.paths.version_jar(ctx.version_id);
            std::fs::create_dir_all(jar.parent().unwrap()).unwrap();
            std::fs::write(jar, b"jar").unwrap();
            Ok(())
        }

        async fn fetch_natives(
            &self,
            _ctx: &InstallContext<'_>,
            _version: &VersionJson,
        ) -> LauncherResult<()> {
            self.record(InstallStage::Natives)
        }

        async fn fetch_assets(
            &self,
            _ctx: &InstallContext<'_>,
            _version: &VersionJson,
        ) -> LauncherResult<()> {
            self.record(InstallStage::Assets)
        }

        async fn fetch_libraries(
            &self,
            _ctx: &InstallContext<'_>,
            _version: &VersionJson,
        ) -> LauncherResult<()> {
            self.record(InstallStage::Libraries)
        }
    }

    fn temp_paths(test: &str) -> (PathBuf, LauncherPaths) {
        let root = std::env::temp_dir().join(format!("install-{test}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&root);
        let paths = LauncherPaths::with_roots(root.join("game"), root.join("data"));
        (root, paths)
    }

    fn announced(rx: &mut tokio::sync::mpsc::UnboundedReceiver<LauncherEvent>) -> Vec<InstallStage> {
        let mut steps = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let LauncherEvent::Installing { step, .. } = event {
                steps.push(step);
            }
        }
        steps
    }

    #[tokio::test]
    async fn stages_run_in_order_and_jar_is_skipped_on_reinstall() {
        let (root, paths) = temp_paths("order");
        let (events, mut rx) = EventEmitter::channel();
        let orchestrator = InstallOrchestrator::new(
            RecordingBackend::default(),
            paths,
            Arc::new(NoNetwork),
            events,
        );

        orchestrator
            .install_version("1.20.1", Throttle::Unlimited)
            .await
            .unwrap();
        assert_eq!(orchestrator.backend.calls(), InstallStage::ORDER.to_vec());
        assert_eq!(announced(&mut rx), InstallStage::ORDER.to_vec());

        orchestrator
            .install_version("1.20.1", Throttle::from_kbps(512))
            .await
            .unwrap();
        let second_run = orchestrator.backend.calls()[5..].to_vec();
        assert_eq!(
            second_run,
            vec![
                InstallStage::Metadata,
                InstallStage::Natives,
                InstallStage::Assets,
                InstallStage::Libraries,
            ]
        );
        // The jar step is still announced, just not fetched.
        assert_eq!(announced(&mut rx), InstallStage::ORDER.to_vec());

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn failing_stage_aborts_the_rest_and_is_named() {
        let (root, paths) = temp_paths("fail");
        let backend = RecordingBackend {
            fail_at: Some(InstallStage::Natives),
            ..Default::default()
        };
        let orchestrator =
            InstallOrchestrator::new(backend, paths.clone(), Arc::new(NoNetwork), EventEmitter::detached());

        let err = orchestrator
            .install_version("1.20.1", Throttle::Unlimited)
            .await
            .unwrap_err();

        assert_eq!(err.failed_stage(), Some(InstallStage::Natives));
        assert!(err.to_string().contains("natives"));
        assert_eq!(
            orchestrator.backend.calls(),
            vec![InstallStage::Metadata, InstallStage::Jar, InstallStage::Natives]
        );
        // Earlier stages keep their output.
        assert!(paths.version_jar("1.20.1").exists());

        let _ = std::fs::remove_dir_all(&root);
    }
}
