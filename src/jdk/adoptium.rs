use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use super::JdkSource;
use crate::arch::Architecture;
use crate::toolchain::Toolchain;

const API_BASE: &str = "https://api.adoptium.net/v3";

#[derive(Debug, Deserialize)]
struct ReleaseNames {
    releases: Vec<String>,
}

/// Resolves the first GA Temurin release of a feature version through the
/// Adoptium API. Matching depends on the API's ascending sort order.
pub struct AdoptiumApi<'a> {
    toolchain: &'a dyn Toolchain,
    feature_version: u32,
    release_override: Option<String>,
}

impl<'a> AdoptiumApi<'a> {
    pub fn new(
        toolchain: &'a dyn Toolchain,
        feature_version: u32,
        release_override: Option<String>,
    ) -> Self {
        Self {
            toolchain,
            feature_version,
            release_override,
        }
    }
}

/// Release-names query for GA builds above `feature_version`, oldest first.
pub fn release_names_url(feature_version: u32) -> String {
    format!(
        "{API_BASE}/info/release_names?heap_size=normal&image_type=jdk&os=linux&page=0\
         &page_size=20&project=jdk&release_type=ga&semver=false&sort_method=DEFAULT\
         &sort_order=ASC&vendor=eclipse&version=%28{feature_version}%2C%5D"
    )
}

impl JdkSource for AdoptiumApi<'_> {
    fn release(&self) -> Result<String> {
        if let Some(release) = &self.release_override {
            return Ok(release.trim().to_string());
        }

        let url = release_names_url(self.feature_version);
        let body = self
            .toolchain
            .http_get(&url)
            .context("querying Adoptium release names")?;
        let names: ReleaseNames =
            serde_json::from_str(&body).context("parsing Adoptium release names")?;
        debug!("Adoptium returned {} release names", names.releases.len());

        let needle = format!("jdk-{}", self.feature_version);
        names
            .releases
            .into_iter()
            .find(|name| name.contains(&needle))
            .with_context(|| {
                format!(
                    "no GA Temurin release matching '{}' in Adoptium response",
                    needle
                )
            })
    }

    fn download_link(&self, release: &str, arch: Architecture) -> Result<String> {
        Ok(format!(
            "{API_BASE}/binary/version/{release}/linux/{}/jdk/hotspot/normal/eclipse?project=jdk",
            arch.temurin_name()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolchain::recording::{Call, RecordingToolchain};
    use std::path::PathBuf;

    fn toolchain_with(body: &str) -> RecordingToolchain {
        let mut toolchain = RecordingToolchain::new(PathBuf::from("/m2"), PathBuf::from("/src"));
        toolchain
            .http_responses
            .insert(release_names_url(22), body.to_string());
        toolchain
    }

    #[test]
    fn picks_first_release_containing_feature_version() {
        let toolchain = toolchain_with(
            r#"{"releases":["jdk-22+36","jdk-22.0.1+8","jdk-23+37"]}"#,
        );
        let api = AdoptiumApi::new(&toolchain, 22, None);
        assert_eq!(api.release().unwrap(), "jdk-22+36");
        assert_eq!(
            toolchain.calls(),
            vec![Call::HttpGet(release_names_url(22))]
        );
    }

    #[test]
    fn no_matching_release_fails() {
        let toolchain = toolchain_with(r#"{"releases":["jdk-23+37"]}"#);
        let api = AdoptiumApi::new(&toolchain, 22, None);
        assert!(api.release().is_err());
    }

    #[test]
    fn malformed_response_fails() {
        let toolchain = toolchain_with("<html>rate limited</html>");
        let api = AdoptiumApi::new(&toolchain, 22, None);
        assert!(api.release().is_err());
    }

    #[test]
    fn override_skips_the_query() {
        let toolchain = toolchain_with("{}");
        let api = AdoptiumApi::new(&toolchain, 22, Some("jdk-22.0.2+9".to_string()));
        assert_eq!(api.release().unwrap(), "jdk-22.0.2+9");
        assert!(toolchain.calls().is_empty());
    }

    #[test]
    fn download_link_uses_temurin_architecture_names() {
        let toolchain = toolchain_with("{}");
        let api = AdoptiumApi::new(&toolchain, 22, None);
        assert_eq!(
            api.download_link("jdk-22+36", Architecture::Arm64).unwrap(),
            "https://api.adoptium.net/v3/binary/version/jdk-22+36/linux/aarch64/jdk/hotspot/normal/eclipse?project=jdk"
        );
    }
}
