//! In-memory [`Toolchain`] that records calls instead of running tools.

use anyhow::{bail, Context, Result};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::{ArtifactCoordinate, ImageBuild, Toolchain};
use crate::arch::Architecture;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Fetch(String),
    Checkout {
        reference: String,
        paths: Vec<String>,
    },
    Build {
        tag: String,
        arch: Architecture,
        build_args: Vec<(String, String)>,
        /// Entries under `plugin/` and `default/etc/catalog/` at build time.
        plugins: Vec<String>,
        catalogs: Vec<String>,
    },
    SmokeTest(String),
    Tag(String, String),
    Push(String),
    CreateManifest(String, Vec<String>),
    PushManifest(String),
    HttpGet(String),
}

pub(crate) struct RecordingToolchain {
    pub(crate) local_repository: PathBuf,
    /// Tree copied into the destination on checkout.
    pub(crate) upstream: PathBuf,
    pub(crate) http_responses: BTreeMap<String, String>,
    pub(crate) calls: RefCell<Vec<Call>>,
}

impl RecordingToolchain {
    pub(crate) fn new(local_repository: PathBuf, upstream: PathBuf) -> Self {
        Self {
            local_repository,
            upstream,
            http_responses: BTreeMap::new(),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }
}

fn sorted_names(dir: &Path) -> Result<Vec<String>> {
    let mut names = fs::read_dir(dir)
        .with_context(|| format!("reading '{}'", dir.display()))?
        .map(|entry| Ok(entry?.file_name().to_string_lossy().into_owned()))
        .collect::<Result<Vec<_>>>()?;
    names.sort();
    Ok(names)
}

impl Toolchain for RecordingToolchain {
    fn fetch_artifact(&self, coordinate: &ArtifactCoordinate) -> Result<PathBuf> {
        self.record(Call::Fetch(coordinate.to_string()));
        let path = coordinate.repository_path(&self.local_repository);
        if !path.is_file() {
            bail!("no cached artifact {coordinate}");
        }
        Ok(path)
    }

    fn checkout_subtree(
        &self,
        _repository: &str,
        reference: &str,
        paths: &[&str],
        destination: &Path,
    ) -> Result<()> {
        self.record(Call::Checkout {
            reference: reference.to_string(),
            paths: paths.iter().map(|p| p.to_string()).collect(),
        });
        for path in paths {
            let source = self.upstream.join(path);
            if source.is_dir() {
                crate::context::copy_dir_recursive(&source, &destination.join(path))?;
            }
        }
        Ok(())
    }

    fn build_image(&self, build: &ImageBuild) -> Result<String> {
        let server = fs::read_dir(&build.context)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .find(|path| {
                path.is_dir()
                    && path
                        .file_name()
                        .is_some_and(|name| name.to_string_lossy().starts_with("trino-server-"))
            })
            .context("no server tree in build context")?;
        self.record(Call::Build {
            tag: build.tag.clone(),
            arch: build.arch,
            build_args: build.build_args.clone(),
            plugins: sorted_names(&server.join("plugin"))?,
            catalogs: sorted_names(&build.context.join("default/etc/catalog"))?,
        });
        Ok(build.tag.clone())
    }

    fn describe_image(&self, tag: &str) -> Result<String> {
        Ok(format!("[{tag}] sha256:0000"))
    }

    fn smoke_test(&self, _script_dir: &Path, tag: &str, _arch: Architecture) -> Result<()> {
        self.record(Call::SmokeTest(tag.to_string()));
        Ok(())
    }

    fn tag_image(&self, source: &str, target: &str) -> Result<()> {
        self.record(Call::Tag(source.to_string(), target.to_string()));
        Ok(())
    }

    fn push_image(&self, tag: &str) -> Result<()> {
        self.record(Call::Push(tag.to_string()));
        Ok(())
    }

    fn create_manifest(&self, name: &str, images: &[String]) -> Result<()> {
        self.record(Call::CreateManifest(name.to_string(), images.to_vec()));
        Ok(())
    }

    fn push_manifest(&self, name: &str) -> Result<()> {
        self.record(Call::PushManifest(name.to_string()));
        Ok(())
    }

    fn http_get(&self, url: &str) -> Result<String> {
        self.record(Call::HttpGet(url.to_string()));
        self.http_responses
            .get(url)
            .cloned()
            .with_context(|| format!("no canned response for {url}"))
    }
}
