// ─── PifoLauncher Core ───
//
//   core/
//     version/   : Mojang manifest, version JSON, installed versions
//     maven/     : Artifact coordinates
//     downloader/: Throttled transfers with one retry
//     assets/    : Asset index and object paths
//     install/   : Staged install pipeline
//     java/      : Runtime requirement and executable discovery
//     launch/    : Classpath, natives, command building, game session
//     presence/  : Log-driven rich presence
//     state/     : Settings and shared application state

pub mod assets;
pub mod auth;
pub mod downloader;
pub mod error;
pub mod events;
pub mod http;
pub mod install;
pub mod java;
pub mod launch;
pub mod maven;
pub mod paths;
pub mod presence;
pub mod state;
pub mod version;
