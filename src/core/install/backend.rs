use async_trait::async_trait;

use crate::core::error::LauncherResult;
use crate::core::version::VersionJson;

use super::context::InstallContext;

/// Does the work of each install stage. The orchestrator owns ordering,
/// status events and error attribution; a backend only fetches.
#[async_trait]
pub trait StageBackend: Send + Sync {
    /// Resolve and store the version JSON.
    async fn fetch_metadata(&self, ctx: &InstallContext<'_>) -> LauncherResult<VersionJson>;

    async fn fetch_client_jar(
        &self,
        ctx: &InstallContext<'_>,
        version: &VersionJson,
    ) -> LauncherResult<()>;

    async fn fetch_natives(
        &self,
        ctx: &InstallContext<'_>,
        version: &VersionJson,
    ) -> LauncherResult<()>;

    async fn fetch_assets(
        &self,
        ctx: &InstallContext<'_>,
        version: &VersionJson,
    ) -> LauncherResult<()>;

    async fn fetch_libraries(
        &self,
        ctx: &InstallContext<'_>,
        version: &VersionJson,
    ) -> LauncherResult<()>;
}
