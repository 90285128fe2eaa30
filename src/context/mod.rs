//! Container build context assembly.
//!
//! The context is a scratch directory owned by one run. It is laid out the
//! way the upstream `core/docker/Dockerfile` expects:
//!
//! ```text
//! <context>/
//!   trino-server-<version>/        extracted server, pruned plugins, upstream bin/
//!   default/etc/catalog/           upstream defaults, pruned catalogs
//!   trino-cli-<version>-executable.jar
//! ```
//!
//! The directory lives in a [`tempfile::TempDir`], so it is removed on every
//! exit path, including early returns and panics.

pub mod prune;

use anyhow::{bail, Context, Result};
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

use crate::config::RunConfig;

pub const PLUGIN_DIR: &str = "plugin";
pub const CATALOG_DIR: &str = "default/etc/catalog";

pub struct BuildContext {
    dir: TempDir,
    server_dir: PathBuf,
}

impl BuildContext {
    /// Create a fresh context for `config.release`.
    ///
    /// `docker_dir` is the upstream `core/docker` checkout providing `bin/`
    /// and `default/`.
    pub fn assemble(
        config: &RunConfig,
        server_archive: &Path,
        cli_jar: &Path,
        docker_dir: &Path,
    ) -> Result<Self> {
        fs::create_dir_all(&config.work_dir).with_context(|| {
            format!("creating work directory '{}'", config.work_dir.display())
        })?;
        let dir = tempfile::Builder::new()
            .prefix("trino-build-")
            .tempdir_in(&config.work_dir)
            .with_context(|| {
                format!(
                    "creating build context under '{}'",
                    config.work_dir.display()
                )
            })?;
        info!("assembling build context in {}", dir.path().display());

        let server_dir = extract_server(server_archive, dir.path(), &config.release)?;
        copy_dir_recursive(&docker_dir.join("bin"), &server_dir.join("bin"))?;
        copy_dir_recursive(&docker_dir.join("default"), &dir.path().join("default"))?;

        let cli_target = dir
            .path()
            .join(format!("trino-cli-{}-executable.jar", config.release));
        fs::copy(cli_jar, &cli_target)
            .with_context(|| format!("copying CLI jar '{}'", cli_jar.display()))?;

        let context = Self { dir, server_dir };
        context.prune(&config.allowed_plugins, &config.allowed_catalogs)?;
        Ok(context)
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn server_dir(&self) -> &Path {
        &self.server_dir
    }

    /// Drop every plugin and catalog not allow-listed, then check that
    /// exactly the allowed entries remain.
    pub fn prune(&self, plugins: &[String], catalogs: &[String]) -> Result<()> {
        let plugin_root = self.server_dir.join(PLUGIN_DIR);
        let catalog_root = self.path().join(CATALOG_DIR);

        let removed = prune::prune_to(&plugin_root, plugins)?;
        info!(
            "removed {} plugins, kept {}",
            removed.len(),
            plugins.join(", ")
        );
        debug!("removed plugins: {}", removed.join(", "));

        let removed = prune::prune_to(&catalog_root, catalogs)?;
        info!(
            "removed {} catalogs, kept {}",
            removed.len(),
            catalogs.join(", ")
        );

        prune::ensure_only(&plugin_root, plugins)?;
        prune::ensure_only(&catalog_root, catalogs)
    }

    /// Remove the context now, reporting failures instead of ignoring them.
    pub fn close(self) -> Result<()> {
        let path = self.dir.path().to_path_buf();
        self.dir
            .close()
            .with_context(|| format!("removing build context '{}'", path.display()))
    }
}

/// Unpack the server tarball into the empty `dest` and return the server root.
///
/// The archive must hold `trino-server-<release>/` and nothing beside it.
fn extract_server(archive: &Path, dest: &Path, release: &str) -> Result<PathBuf> {
    let file = File::open(archive)
        .with_context(|| format!("opening server archive '{}'", archive.display()))?;
    tar::Archive::new(GzDecoder::new(file))
        .unpack(dest)
        .with_context(|| format!("unpacking '{}'", archive.display()))?;

    let root_name = format!("trino-server-{release}");
    let server_dir = dest.join(&root_name);
    if !server_dir.is_dir() {
        bail!(
            "server archive '{}' did not contain {}/",
            archive.display(),
            root_name
        );
    }
    let stray: Vec<String> = prune::top_level_names(dest)?
        .into_iter()
        .filter(|name| *name != root_name)
        .collect();
    if !stray.is_empty() {
        bail!(
            "server archive '{}' has unexpected top-level entries beside {}/: {}",
            archive.display(),
            root_name,
            stray.join(", ")
        );
    }
    Ok(server_dir)
}

/// Recursively copy a directory, preserving symlinks.
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<()> {
    if !src.is_dir() {
        bail!("expected directory '{}'", src.display());
    }
    if !dst.exists() {
        fs::create_dir_all(dst)
            .with_context(|| format!("Failed to create directory: {}", dst.display()))?;
    }

    for entry in fs::read_dir(src)
        .with_context(|| format!("Failed to read directory: {}", src.display()))?
    {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        let file_type = entry.file_type()?;

        if file_type.is_symlink() {
            let target = fs::read_link(&src_path)?;
            if dst_path.exists() || dst_path.is_symlink() {
                fs::remove_file(&dst_path)?;
            }
            std::os::unix::fs::symlink(&target, &dst_path)
                .with_context(|| format!("Failed to create symlink: {}", dst_path.display()))?;
        } else if file_type.is_dir() {
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            fs::copy(&src_path, &dst_path)
                .with_context(|| format!("Failed to copy file: {}", src_path.display()))?;
        }
    }

    Ok(())
}
