//! Filesystem-backed artifact store.
//!
//! Layout under the root directory:
//!
//! ```text
//! <root>/<name>/v1/<file>
//! <root>/<name>/v1/metadata.json
//! <root>/<name>/v2/...
//! ```
//!
//! A plain file at `<root>/<name>` is treated as an unversioned raw input and
//! returned as-is by `fetch`.

use super::{ArtifactStore, VersionSelector, parse_reference};
use crate::error::{CleaningError, Result, ResultExt};
use crate::types::{ArtifactHandle, ArtifactSpec};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const METADATA_FILE: &str = "metadata.json";

/// Metadata written next to every published version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub name: String,
    #[serde(rename = "type")]
    pub artifact_type: String,
    pub description: String,
    pub version: u32,
    pub file: String,
    pub created_at: DateTime<Utc>,
}

/// Artifact store rooted at a local directory.
#[derive(Debug, Clone)]
pub struct LocalArtifactStore {
    root: PathBuf,
}

impl LocalArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn artifact_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn version_dir(&self, name: &str, version: u32) -> PathBuf {
        self.artifact_dir(name).join(format!("v{}", version))
    }

    /// Published versions of `name`, ascending.
    pub fn versions(&self, name: &str) -> Result<Vec<u32>> {
        let dir = self.artifact_dir(name);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut versions: Vec<u32> = fs::read_dir(&dir)
            .context(format!("Listing {}", dir.display()))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().join(METADATA_FILE).is_file())
            .filter_map(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .and_then(|s| s.strip_prefix('v'))
                    .and_then(|v| v.parse::<u32>().ok())
            })
            .collect();

        versions.sort_unstable();
        Ok(versions)
    }

    /// Read the metadata of one published version.
    pub fn metadata(&self, name: &str, version: u32) -> Result<ArtifactMetadata> {
        let path = self.version_dir(name, version).join(METADATA_FILE);
        let file = File::open(&path).context(format!("Opening {}", path.display()))?;
        let metadata = serde_json::from_reader(BufReader::new(file))?;
        Ok(metadata)
    }

    fn validate_name(name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(CleaningError::Usage("artifact name must not be empty".to_string()));
        }
        if name.contains('/') || name.contains('\\') || name == "." || name == ".." {
            return Err(CleaningError::Usage(format!(
                "artifact name '{}' must not contain path separators",
                name
            )));
        }
        Ok(())
    }
}

impl ArtifactStore for LocalArtifactStore {
    fn fetch(&self, reference: &str) -> Result<PathBuf> {
        let (name, selector) = parse_reference(reference);
        Self::validate_name(name)?;

        let raw = self.artifact_dir(name);
        if raw.is_file() {
            if selector != VersionSelector::Latest {
                return Err(CleaningError::ArtifactNotFound(reference.to_string()));
            }
            debug!("Resolved {} to raw file {}", reference, raw.display());
            return Ok(raw);
        }

        let versions = self.versions(name)?;
        let version = match selector {
            VersionSelector::Latest => versions.last().copied(),
            VersionSelector::Exact(v) => versions.contains(&v).then_some(v),
        }
        .ok_or_else(|| CleaningError::ArtifactNotFound(reference.to_string()))?;

        let metadata = self.metadata(name, version)?;
        let path = self.version_dir(name, version).join(&metadata.file);
        if !path.is_file() {
            return Err(CleaningError::ArtifactNotFound(reference.to_string()));
        }

        debug!("Resolved {} to {}", reference, path.display());
        Ok(path)
    }

    fn publish(&self, spec: &ArtifactSpec, file: &Path) -> Result<ArtifactHandle> {
        Self::validate_name(&spec.name)?;

        if !file.is_file() {
            return Err(CleaningError::Usage(format!(
                "cannot publish {}: not a file",
                file.display()
            )));
        }
        if self.artifact_dir(&spec.name).is_file() {
            return Err(CleaningError::Usage(format!(
                "artifact name '{}' is taken by a raw file",
                spec.name
            )));
        }

        let file_name = file
            .file_name()
            .and_then(|s| s.to_str())
            .ok_or_else(|| CleaningError::Usage(format!("invalid file name: {}", file.display())))?
            .to_string();

        let version = self.versions(&spec.name)?.last().map_or(1, |v| v + 1);
        let dir = self.version_dir(&spec.name, version);
        fs::create_dir_all(&dir).context(format!("Creating {}", dir.display()))?;

        let target = dir.join(&file_name);
        fs::copy(file, &target).context(format!("Copying {}", file.display()))?;

        let metadata = ArtifactMetadata {
            name: spec.name.clone(),
            artifact_type: spec.artifact_type.clone(),
            description: spec.description.clone(),
            version,
            file: file_name,
            created_at: Utc::now(),
        };
        // Metadata last: a version without it is invisible to `versions`.
        let metadata_file = File::create(dir.join(METADATA_FILE))
            .context(format!("Creating metadata in {}", dir.display()))?;
        serde_json::to_writer_pretty(metadata_file, &metadata)?;

        info!(
            "Published {}:v{} ({}) -> {}",
            spec.name,
            version,
            spec.artifact_type,
            target.display()
        );

        Ok(ArtifactHandle {
            name: spec.name.clone(),
            artifact_type: spec.artifact_type.clone(),
            version,
            path: target,
        })
    }

    fn name(&self) -> &str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn scratch_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_publish_then_fetch_latest() {
        let root = tempdir().unwrap();
        let work = tempdir().unwrap();
        let store = LocalArtifactStore::new(root.path());
        let file = scratch_file(work.path(), "clean_sample.csv", "price\n100\n");

        let spec = ArtifactSpec::new("clean_sample.csv", "clean_sample", "Cleaned data");
        let handle = store.publish(&spec, &file).unwrap();

        assert_eq!(handle.version, 1);
        assert_eq!(handle.artifact_type, "clean_sample");

        let fetched = store.fetch("clean_sample.csv:latest").unwrap();
        assert_eq!(fetched, handle.path);
        assert_eq!(fs::read_to_string(fetched).unwrap(), "price\n100\n");
    }

    #[test]
    fn test_publish_increments_versions() {
        let root = tempdir().unwrap();
        let work = tempdir().unwrap();
        let store = LocalArtifactStore::new(root.path());
        let spec = ArtifactSpec::new("clean_sample.csv", "clean_sample", "Cleaned data");

        let first = scratch_file(work.path(), "a.csv", "v1");
        let second = scratch_file(work.path(), "b.csv", "v2");
        store.publish(&spec, &first).unwrap();
        let handle = store.publish(&spec, &second).unwrap();

        assert_eq!(handle.version, 2);
        assert_eq!(store.versions("clean_sample.csv").unwrap(), vec![1, 2]);
        assert_eq!(
            fs::read_to_string(store.fetch("clean_sample.csv").unwrap()).unwrap(),
            "v2"
        );
        assert_eq!(
            fs::read_to_string(store.fetch("clean_sample.csv:v1").unwrap()).unwrap(),
            "v1"
        );
    }

    #[test]
    fn test_metadata_is_written() {
        let root = tempdir().unwrap();
        let work = tempdir().unwrap();
        let store = LocalArtifactStore::new(root.path());
        let file = scratch_file(work.path(), "clean_sample.csv", "x");

        let spec = ArtifactSpec::new("clean_sample.csv", "clean_sample", "Data with outliers removed");
        store.publish(&spec, &file).unwrap();

        let metadata = store.metadata("clean_sample.csv", 1).unwrap();
        assert_eq!(metadata.description, "Data with outliers removed");
        assert_eq!(metadata.file, "clean_sample.csv");
        assert_eq!(metadata.version, 1);
    }

    #[test]
    fn test_fetch_raw_file() {
        let root = tempdir().unwrap();
        let raw = scratch_file(root.path(), "sample.csv", "price\n1\n");
        let store = LocalArtifactStore::new(root.path());

        assert_eq!(store.fetch("sample.csv:latest").unwrap(), raw);
        assert!(store.fetch("sample.csv:v1").is_err());
    }

    #[test]
    fn test_fetch_missing_artifact() {
        let root = tempdir().unwrap();
        let store = LocalArtifactStore::new(root.path());

        let err = store.fetch("nothing.csv:latest").unwrap_err();
        assert_eq!(err.error_code(), "ARTIFACT_NOT_FOUND");
        assert!(err.to_string().contains("nothing.csv:latest"));
    }

    #[test]
    fn test_fetch_missing_version() {
        let root = tempdir().unwrap();
        let work = tempdir().unwrap();
        let store = LocalArtifactStore::new(root.path());
        let file = scratch_file(work.path(), "a.csv", "x");
        store
            .publish(&ArtifactSpec::new("a.csv", "raw", "d"), &file)
            .unwrap();

        let err = store.fetch("a.csv:v7").unwrap_err();
        assert_eq!(err.error_code(), "ARTIFACT_NOT_FOUND");
    }

    #[test]
    fn test_publish_rejects_path_names() {
        let root = tempdir().unwrap();
        let work = tempdir().unwrap();
        let store = LocalArtifactStore::new(root.path());
        let file = scratch_file(work.path(), "a.csv", "x");

        let err = store
            .publish(&ArtifactSpec::new("../escape", "raw", "d"), &file)
            .unwrap_err();
        assert_eq!(err.error_code(), "USAGE_ERROR");
    }

    #[test]
    fn test_publish_missing_file() {
        let root = tempdir().unwrap();
        let store = LocalArtifactStore::new(root.path());

        let err = store
            .publish(
                &ArtifactSpec::new("a.csv", "raw", "d"),
                &root.path().join("missing.csv"),
            )
            .unwrap_err();
        assert_eq!(err.error_code(), "USAGE_ERROR");
        assert!(store.versions("a.csv").unwrap().is_empty());
    }
}
