pub mod installed;
pub mod manifest;
pub mod version_file;

pub use installed::{list_installed_versions, natural_cmp};
pub use manifest::{
    fetch_remote_versions, VersionEntry, VersionManifest, VersionSummary, VERSION_MANIFEST_URL,
};
pub use version_file::{LibraryEntry, LibraryFile, VersionJson};
