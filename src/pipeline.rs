//! The build-and-publish run.
//!
//! Steps run strictly in order and the first error ends the run. Scratch
//! directories (upstream checkout, build context) are scoped to this call
//! and removed however it returns. Images already pushed stay pushed.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use tracing::{info, warn};

use crate::arch::{Architecture, ArchitectureSet};
use crate::config::{JdkStrategy, RunConfig};
use crate::context::BuildContext;
use crate::image::ImageNames;
use crate::jdk::{self, AdoptiumApi, JdkCatalog, JdkSource, ResolvedJdk};
use crate::toolchain::{ArtifactCoordinate, ImageBuild, Toolchain};

pub const UPSTREAM_DOCKER_DIR: &str = "core/docker";
pub const UPSTREAM_JDK_DIR: &str = "core/jdk";
const DOCKERFILE: &str = "Dockerfile";

/// Run every step for `config`. `host` selects the smoke-tested image.
pub fn run(
    config: &RunConfig,
    toolchain: &dyn Toolchain,
    host: Option<Architecture>,
) -> Result<()> {
    info!(
        "building {} {} for {}",
        config.image_name, config.release, config.architectures
    );

    let server_coordinate = ArtifactCoordinate::server(&config.artifact_group, &config.release);
    let server_archive = toolchain.fetch_artifact(&server_coordinate)?;
    info!("server archive: {}", server_archive.display());
    let cli_coordinate = ArtifactCoordinate::cli(&config.artifact_group, &config.release);
    let cli_jar = toolchain.fetch_artifact(&cli_coordinate)?;
    info!("CLI jar: {}", cli_jar.display());

    let checkout = checkout_upstream(config, toolchain)?;
    let docker_dir = checkout.path().join(UPSTREAM_DOCKER_DIR);

    let jdk = resolve_jdk(config, toolchain, checkout.path())?;
    info!("using JDK {}", jdk.release);

    let names = ImageNames::new(config);
    let context = BuildContext::assemble(config, &server_archive, &cli_jar, &docker_dir)?;
    build_images(config, toolchain, &context, &docker_dir, &jdk, names)?;
    context.close()?;

    smoke_test(&config.architectures, toolchain, &docker_dir, host, names)?;
    publish(&config.architectures, toolchain, names)?;

    checkout.close().context("removing upstream checkout")?;
    info!("published {}", names.manifests().join(" and "));
    Ok(())
}

fn checkout_upstream(config: &RunConfig, toolchain: &dyn Toolchain) -> Result<TempDir> {
    fs::create_dir_all(&config.work_dir)
        .with_context(|| format!("creating work directory '{}'", config.work_dir.display()))?;
    let checkout = tempfile::Builder::new()
        .prefix("trino-src-")
        .tempdir_in(&config.work_dir)
        .with_context(|| {
            format!(
                "creating checkout directory under '{}'",
                config.work_dir.display()
            )
        })?;

    info!(
        "checking out {} at {}",
        config.upstream_repository, config.release
    );
    toolchain.checkout_subtree(
        &config.upstream_repository,
        &config.release,
        &[UPSTREAM_DOCKER_DIR, UPSTREAM_JDK_DIR],
        checkout.path(),
    )?;

    let dockerfile = checkout.path().join(UPSTREAM_DOCKER_DIR).join(DOCKERFILE);
    if !dockerfile.is_file() {
        bail!(
            "upstream checkout of '{}' has no {}",
            config.release,
            dockerfile.display()
        );
    }
    Ok(checkout)
}

fn resolve_jdk(
    config: &RunConfig,
    toolchain: &dyn Toolchain,
    checkout: &Path,
) -> Result<ResolvedJdk> {
    let source: Box<dyn JdkSource + '_> = match config.jdk_strategy {
        JdkStrategy::Catalog => Box::new(JdkCatalog::new(
            checkout.join(UPSTREAM_JDK_DIR),
            config.jdk_release.clone(),
        )),
        JdkStrategy::Adoptium => Box::new(AdoptiumApi::new(
            toolchain,
            config.jdk_feature_version,
            config.jdk_release.clone(),
        )),
    };
    jdk::resolve(source.as_ref(), &config.architectures)
}

fn build_images(
    config: &RunConfig,
    toolchain: &dyn Toolchain,
    context: &BuildContext,
    docker_dir: &Path,
    jdk: &ResolvedJdk,
    names: ImageNames<'_>,
) -> Result<()> {
    for arch in config.architectures.iter() {
        let link = jdk
            .link(arch)
            .with_context(|| format!("no JDK download link resolved for {arch}"))?;
        let build = ImageBuild {
            context: context.path().to_path_buf(),
            dockerfile: docker_dir.join(DOCKERFILE),
            arch,
            tag: names.local(arch),
            build_args: vec![
                ("TRINO_VERSION".to_string(), config.release.clone()),
                ("JDK_VERSION".to_string(), jdk.release.clone()),
                ("JDK_DOWNLOAD_LINK".to_string(), link.to_string()),
            ],
        };

        info!("building {} with JDK {}", build.tag, jdk.release);
        let tag = toolchain.build_image(&build)?;
        let description = toolchain.describe_image(&tag)?;
        info!("Built {description}");
    }
    Ok(())
}

/// The one image worth smoke testing: the host's own architecture, if it
/// was built and can run here.
pub fn smoke_test_target(
    architectures: &ArchitectureSet,
    host: Option<Architecture>,
) -> Option<Architecture> {
    host.filter(|arch| architectures.contains(*arch) && arch.smoke_testable())
}

fn smoke_test(
    architectures: &ArchitectureSet,
    toolchain: &dyn Toolchain,
    docker_dir: &Path,
    host: Option<Architecture>,
    names: ImageNames<'_>,
) -> Result<()> {
    let Some(arch) = smoke_test_target(architectures, host) else {
        let host = host.map_or("unknown", Architecture::as_str);
        warn!("skipping smoke test: no testable image for host architecture {host}");
        return Ok(());
    };
    let tag = names.local(arch);
    info!("smoke testing {tag}");
    toolchain.smoke_test(docker_dir, &tag, arch)
}

fn publish(
    architectures: &ArchitectureSet,
    toolchain: &dyn Toolchain,
    names: ImageNames<'_>,
) -> Result<()> {
    let mut published = Vec::with_capacity(architectures.len());
    for arch in architectures.iter() {
        let target = names.published(arch);
        toolchain.tag_image(&names.local(arch), &target)?;
        info!("pushing {target}");
        toolchain.push_image(&target)?;
        published.push(target);
    }

    for manifest in names.manifests() {
        info!("pushing manifest {manifest}");
        toolchain.create_manifest(&manifest, &published)?;
        toolchain.push_manifest(&manifest)?;
    }
    Ok(())
}
