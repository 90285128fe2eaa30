//! External tool capabilities.
//!
//! Every side effect outside the local filesystem goes through the
//! [`Toolchain`] trait: the package tool that resolves released artifacts,
//! the version-control client, the container engine and the HTTPS client.
//! [`ProcessToolchain`] drives the real CLIs; tests substitute a recorder.

mod process;
#[cfg(test)]
pub(crate) mod recording;

pub use process::ProcessToolchain;

use anyhow::Result;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::arch::Architecture;

/// Released artifact coordinate in `group:artifact:version:packaging[:classifier]` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactCoordinate {
    pub group: String,
    pub artifact: String,
    pub version: String,
    pub packaging: String,
    pub classifier: Option<String>,
}

impl ArtifactCoordinate {
    /// Trino server tarball for `version`.
    pub fn server(group: &str, version: &str) -> Self {
        Self {
            group: group.to_string(),
            artifact: "trino-server".to_string(),
            version: version.to_string(),
            packaging: "tar.gz".to_string(),
            classifier: None,
        }
    }

    /// Executable Trino CLI jar for `version`.
    pub fn cli(group: &str, version: &str) -> Self {
        Self {
            group: group.to_string(),
            artifact: "trino-cli".to_string(),
            version: version.to_string(),
            packaging: "jar".to_string(),
            classifier: Some("executable".to_string()),
        }
    }

    pub fn file_name(&self) -> String {
        match &self.classifier {
            Some(classifier) => format!(
                "{}-{}-{}.{}",
                self.artifact, self.version, classifier, self.packaging
            ),
            None => format!("{}-{}.{}", self.artifact, self.version, self.packaging),
        }
    }

    /// Location of this artifact inside a local repository cache.
    pub fn repository_path(&self, local_repository: &Path) -> PathBuf {
        let mut path = local_repository.to_path_buf();
        for segment in self.group.split('.') {
            path.push(segment);
        }
        path.join(&self.artifact)
            .join(&self.version)
            .join(self.file_name())
    }
}

impl fmt::Display for ArtifactCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.group, self.artifact, self.version, self.packaging
        )?;
        if let Some(classifier) = &self.classifier {
            write!(f, ":{classifier}")?;
        }
        Ok(())
    }
}

/// Parameters of one platform-specific image build.
#[derive(Debug, Clone)]
pub struct ImageBuild {
    pub context: PathBuf,
    pub dockerfile: PathBuf,
    pub arch: Architecture,
    pub tag: String,
    pub build_args: Vec<(String, String)>,
}

pub trait Toolchain {
    /// Download `coordinate` into the local cache and return its path.
    fn fetch_artifact(&self, coordinate: &ArtifactCoordinate) -> Result<PathBuf>;

    /// Shallow, blob-filtered checkout of `reference` limited to `paths`.
    fn checkout_subtree(
        &self,
        repository: &str,
        reference: &str,
        paths: &[&str],
        destination: &Path,
    ) -> Result<()>;

    /// Build an image and return its tag.
    fn build_image(&self, build: &ImageBuild) -> Result<String>;

    /// One-line description of a local image (tags and id).
    fn describe_image(&self, tag: &str) -> Result<String>;

    /// Run the upstream container test from `script_dir` against `tag`.
    fn smoke_test(&self, script_dir: &Path, tag: &str, arch: Architecture) -> Result<()>;

    fn tag_image(&self, source: &str, target: &str) -> Result<()>;

    fn push_image(&self, tag: &str) -> Result<()>;

    /// Create (or replace) a manifest list referencing `images`.
    fn create_manifest(&self, name: &str, images: &[String]) -> Result<()>;

    fn push_manifest(&self, name: &str) -> Result<()>;

    /// Fetch a URL and return the response body.
    fn http_get(&self, url: &str) -> Result<String>;
}
