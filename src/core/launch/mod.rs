pub mod classpath;
pub mod command;
pub mod natives;
pub mod session;

pub use classpath::{build_classpath, classpath_separator, safe_path_str};
pub use command::{
    load_launch_version, prepare_launch, LaunchOptions, LaunchPlan, MemoryBounds,
    VersionSelector,
};
pub use natives::{extract_natives, native_jars, NativeJar};
pub use session::{GameEvent, GameSession, RecentLines};
