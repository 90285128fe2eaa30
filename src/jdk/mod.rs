//! JDK release resolution.
//!
//! The image build needs a JDK release identifier (`JDK_VERSION`) and, per
//! architecture, a download link for that release (`JDK_DOWNLOAD_LINK`).
//! Two interchangeable sources provide them:
//!
//! - [`JdkCatalog`] reads the pinned lookup table shipped in the upstream
//!   repository under `core/jdk`. Deterministic and offline after checkout.
//! - [`AdoptiumApi`] asks the Adoptium release-metadata API for the first GA
//!   release of a feature version and derives Temurin binary URLs.

mod adoptium;
mod catalog;

pub use adoptium::{release_names_url, AdoptiumApi};
pub use catalog::{parse_properties, JdkCatalog, DISTRIBUTION_URL_KEY};

use anyhow::{Context, Result};
use tracing::info;

use crate::arch::{Architecture, ArchitectureSet};

pub trait JdkSource {
    /// Release identifier to build with, e.g. `jdk-22.0.1+8`.
    fn release(&self) -> Result<String>;

    /// Download link of `release` for `arch`.
    fn download_link(&self, release: &str, arch: Architecture) -> Result<String>;
}

/// A JDK release with a download link for every requested architecture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedJdk {
    pub release: String,
    links: Vec<(Architecture, String)>,
}

impl ResolvedJdk {
    pub fn link(&self, arch: Architecture) -> Option<&str> {
        self.links
            .iter()
            .find(|(candidate, _)| *candidate == arch)
            .map(|(_, link)| link.as_str())
    }
}

/// Resolve the release and every link up front so an unsupported
/// architecture fails the run before any image is built.
pub fn resolve(source: &dyn JdkSource, architectures: &ArchitectureSet) -> Result<ResolvedJdk> {
    let release = source.release().context("resolving JDK release")?;
    let mut links = Vec::with_capacity(architectures.len());
    for arch in architectures.iter() {
        let link = source
            .download_link(&release, arch)
            .with_context(|| format!("resolving {release} download link for {arch}"))?;
        info!("JDK {release} for {arch}: {link}");
        links.push((arch, link));
    }
    Ok(ResolvedJdk { release, links })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;

    struct Fixed;

    impl JdkSource for Fixed {
        fn release(&self) -> Result<String> {
            Ok("jdk-22.0.1+8".to_string())
        }

        fn download_link(&self, release: &str, arch: Architecture) -> Result<String> {
            if arch == Architecture::Ppc64le {
                bail!("no {arch} build");
            }
            Ok(format!("https://jdk.example/{release}/{arch}"))
        }
    }

    #[test]
    fn resolve_collects_a_link_per_architecture() {
        let archs = ArchitectureSet::parse("amd64,arm64").unwrap();
        let resolved = resolve(&Fixed, &archs).unwrap();
        assert_eq!(resolved.release, "jdk-22.0.1+8");
        assert_eq!(
            resolved.link(Architecture::Arm64),
            Some("https://jdk.example/jdk-22.0.1+8/arm64")
        );
        assert_eq!(resolved.link(Architecture::Ppc64le), None);
    }

    #[test]
    fn resolve_fails_on_any_unsupported_architecture() {
        let err = resolve(&Fixed, &ArchitectureSet::default()).unwrap_err();
        assert!(format!("{err:#}").contains("ppc64le"));
    }
}
