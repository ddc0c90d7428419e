//! Artifact store abstraction.
//!
//! The cleaning stage reads its input from, and publishes its output to, an
//! artifact store. The store is reached only through [`ArtifactStore`], so the
//! transform itself never touches it and tests can swap in any backend.
//!
//! [`LocalArtifactStore`] keeps versioned artifacts in a directory tree.

mod local;

pub use local::LocalArtifactStore;

use crate::error::Result;
use crate::types::{ArtifactHandle, ArtifactSpec};
use std::path::{Path, PathBuf};

/// Alias resolved when a reference carries no explicit version.
pub const LATEST_ALIAS: &str = "latest";

/// Backend that stores named, versioned artifacts.
pub trait ArtifactStore: Send + Sync {
    /// Resolve `name` (optionally `name:alias`) to a local file path.
    fn fetch(&self, name: &str) -> Result<PathBuf>;

    /// Store `file` as a new version of `spec.name`.
    fn publish(&self, spec: &ArtifactSpec, file: &Path) -> Result<ArtifactHandle>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}

/// Which version of an artifact a reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionSelector {
    Latest,
    Exact(u32),
}

/// Split `name:alias` into its name and version selector.
///
/// Unknown aliases are kept as part of the name, so `weird:name` is looked up
/// literally.
pub fn parse_reference(reference: &str) -> (&str, VersionSelector) {
    if let Some((name, alias)) = reference.rsplit_once(':') {
        if alias == LATEST_ALIAS {
            return (name, VersionSelector::Latest);
        }
        if let Some(version) = alias.strip_prefix('v').and_then(|v| v.parse::<u32>().ok()) {
            return (name, VersionSelector::Exact(version));
        }
    }
    (reference, VersionSelector::Latest)
}
