//! Run configuration.
//!
//! A [`RunConfig`] is built once from the command line (plus an optional
//! TOML file) and passed by reference to every pipeline step. Nothing
//! below reads the process working directory or environment on its own.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::arch::ArchitectureSet;

pub const DEFAULT_IMAGE_NAME: &str = "trino";
pub const DEFAULT_PUBLISH_NAMESPACE: &str = "ghcr.io/trino-slim";
pub const DEFAULT_UPSTREAM_REPOSITORY: &str = "https://github.com/trinodb/trino.git";
pub const DEFAULT_ARTIFACT_GROUP: &str = "io.trino";
pub const DEFAULT_ALLOWED_PLUGINS: [&str; 2] = ["jmx", "tpch"];
pub const DEFAULT_ALLOWED_CATALOGS: [&str; 2] = ["jmx.properties", "tpch.properties"];
pub const DEFAULT_JDK_FEATURE_VERSION: u32 = 22;

/// Which [`crate::jdk::JdkSource`] resolves the JDK download links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JdkStrategy {
    /// Property files checked out from upstream `core/jdk`.
    Catalog,
    /// Adoptium release-metadata API.
    Adoptium,
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub release: String,
    pub architectures: ArchitectureSet,
    pub jdk_release: Option<String>,
    /// Parent directory for the upstream checkout and the build context.
    pub work_dir: PathBuf,
    pub image_name: String,
    pub publish_namespace: String,
    pub upstream_repository: String,
    pub artifact_group: String,
    pub allowed_plugins: [String; 2],
    pub allowed_catalogs: [String; 2],
    pub jdk_strategy: JdkStrategy,
    pub jdk_feature_version: u32,
}

impl RunConfig {
    pub fn new(
        release: impl Into<String>,
        architectures: ArchitectureSet,
        work_dir: PathBuf,
    ) -> Self {
        Self {
            release: release.into(),
            architectures,
            jdk_release: None,
            work_dir,
            image_name: DEFAULT_IMAGE_NAME.to_string(),
            publish_namespace: DEFAULT_PUBLISH_NAMESPACE.to_string(),
            upstream_repository: DEFAULT_UPSTREAM_REPOSITORY.to_string(),
            artifact_group: DEFAULT_ARTIFACT_GROUP.to_string(),
            allowed_plugins: DEFAULT_ALLOWED_PLUGINS.map(String::from),
            allowed_catalogs: DEFAULT_ALLOWED_CATALOGS.map(String::from),
            jdk_strategy: JdkStrategy::Catalog,
            jdk_feature_version: DEFAULT_JDK_FEATURE_VERSION,
        }
    }

    /// Apply overrides from a TOML file on top of the current values.
    pub fn apply_file(&mut self, path: &Path) -> Result<()> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config '{}'", path.display()))?;
        let parsed: ConfigToml = toml::from_str(&raw)
            .with_context(|| format!("parsing config '{}'", path.display()))?;
        self.apply(parsed)
            .with_context(|| format!("invalid config '{}'", path.display()))
    }

    fn apply(&mut self, file: ConfigToml) -> Result<()> {
        if let Some(image_name) = file.image_name {
            self.image_name = non_empty(image_name, "image_name")?;
        }
        if let Some(namespace) = file.publish_namespace {
            let namespace = non_empty(namespace, "publish_namespace")?;
            self.publish_namespace = namespace.trim_end_matches('/').to_string();
        }
        if let Some(repository) = file.upstream_repository {
            self.upstream_repository = non_empty(repository, "upstream_repository")?;
        }
        if let Some(group) = file.artifact_group {
            self.artifact_group = non_empty(group, "artifact_group")?;
        }
        if let Some(plugins) = file.allowed_plugins {
            self.allowed_plugins = exactly_two(plugins, "allowed_plugins")?;
        }
        if let Some(catalogs) = file.allowed_catalogs {
            self.allowed_catalogs = exactly_two(catalogs, "allowed_catalogs")?;
        }
        if let Some(strategy) = file.jdk_strategy {
            self.jdk_strategy = strategy;
        }
        if let Some(version) = file.jdk_feature_version {
            self.jdk_feature_version = version;
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigToml {
    image_name: Option<String>,
    publish_namespace: Option<String>,
    upstream_repository: Option<String>,
    artifact_group: Option<String>,
    allowed_plugins: Option<Vec<String>>,
    allowed_catalogs: Option<Vec<String>>,
    jdk_strategy: Option<JdkStrategy>,
    jdk_feature_version: Option<u32>,
}

fn non_empty(value: String, field: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        bail!("{field} must not be empty");
    }
    Ok(trimmed.to_string())
}

fn exactly_two(values: Vec<String>, field: &str) -> Result<[String; 2]> {
    let values = values
        .into_iter()
        .map(|value| non_empty(value, field))
        .collect::<Result<Vec<_>>>()?;
    match <[String; 2]>::try_from(values) {
        Ok(pair) if pair[0] != pair[1] => Ok(pair),
        Ok(_) => bail!("{field} must name two different entries"),
        Err(values) => bail!(
            "{field} must contain exactly two entries, got {}",
            values.len()
        ),
    }
}
