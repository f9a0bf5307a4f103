pub mod requirement;
pub mod runtime;

pub use requirement::{required_runtime_major, satisfies_requirement, VersionSpec};
pub use runtime::{
    locate_runtime, CommandProbe, JavaProbe, RuntimeCandidate, RuntimeLocator, PATH_JAVA,
};
