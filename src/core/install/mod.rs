mod backend;
mod context;
mod mojang;
mod orchestrator;

use std::fmt;

use serde::Serialize;

pub use backend::StageBackend;
pub use context::InstallContext;
pub use mojang::MojangInstaller;
pub use orchestrator::InstallOrchestrator;

/// Ordered phases of installing a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallStage {
    Metadata,
    Jar,
    Natives,
    Assets,
    Libraries,
}

impl InstallStage {
    pub const ORDER: [InstallStage; 5] = [
        InstallStage::Metadata,
        InstallStage::Jar,
        InstallStage::Natives,
        InstallStage::Assets,
        InstallStage::Libraries,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            InstallStage::Metadata => "metadata",
            InstallStage::Jar => "jar",
            InstallStage::Natives => "natives",
            InstallStage::Assets => "assets",
            InstallStage::Libraries => "libraries",
        }
    }
}

impl fmt::Display for InstallStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
