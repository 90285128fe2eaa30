//! Image naming.

use crate::arch::Architecture;
use crate::config::RunConfig;

/// Alias manifest published next to the versioned one.
pub const LATEST_TAG: &str = "latest";

#[derive(Debug, Clone, Copy)]
pub struct ImageNames<'a> {
    name: &'a str,
    namespace: &'a str,
    release: &'a str,
}

impl<'a> ImageNames<'a> {
    pub fn new(config: &'a RunConfig) -> Self {
        Self {
            name: &config.image_name,
            namespace: &config.publish_namespace,
            release: &config.release,
        }
    }

    /// Tag produced by the local build, e.g. `trino:450-amd64`.
    pub fn local(&self, arch: Architecture) -> String {
        format!("{}:{}-{}", self.name, self.release, arch)
    }

    /// Tag pushed to the registry, e.g. `ghcr.io/acme/trino:450-amd64`.
    pub fn published(&self, arch: Architecture) -> String {
        format!("{}/{}", self.namespace, self.local(arch))
    }

    /// Manifest lists to publish: the release and [`LATEST_TAG`].
    pub fn manifests(&self) -> [String; 2] {
        [
            format!("{}/{}:{}", self.namespace, self.name, self.release),
            format!("{}/{}:{}", self.namespace, self.name, LATEST_TAG),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::ArchitectureSet;
    use std::path::PathBuf;

    #[test]
    fn names_derive_from_release_and_architecture() {
        let mut config = RunConfig::new("450", ArchitectureSet::default(), PathBuf::from("/w"));
        config.publish_namespace = "registry.example.com/data".to_string();
        let names = ImageNames::new(&config);

        assert_eq!(names.local(Architecture::Arm64), "trino:450-arm64");
        assert_eq!(
            names.published(Architecture::Amd64),
            "registry.example.com/data/trino:450-amd64"
        );
        assert_eq!(
            names.manifests(),
            [
                "registry.example.com/data/trino:450".to_string(),
                "registry.example.com/data/trino:latest".to_string()
            ]
        );
    }
}
