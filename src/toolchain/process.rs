use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

use super::{ArtifactCoordinate, ImageBuild, Toolchain};
use crate::arch::Architecture;

/// Environment variable naming the local artifact cache, skipping the `mvn` query.
pub const LOCAL_REPOSITORY_ENV: &str = "MAVEN_LOCAL_REPOSITORY";

/// [`Toolchain`] backed by `mvn`, `git`, `docker`, `bash` and `curl`.
#[derive(Debug, Default, Clone)]
pub struct ProcessToolchain;

impl ProcessToolchain {
    pub fn new() -> Self {
        Self
    }

    /// Local artifact cache root: the environment override, else what `mvn`
    /// reports, else `~/.m2/repository`.
    fn local_repository(&self) -> Result<PathBuf> {
        let configured = std::env::var(LOCAL_REPOSITORY_ENV).ok();
        if let Some(path) = env_repository(configured.as_deref()) {
            return Ok(path);
        }

        let output = capture(Command::new("mvn").args([
            "-B",
            "help:evaluate",
            "-Dexpression=settings.localRepository",
            "-q",
            "-DforceStdout",
        ]))?;
        reported_repository(&output, dirs::home_dir())
    }
}

impl Toolchain for ProcessToolchain {
    fn fetch_artifact(&self, coordinate: &ArtifactCoordinate) -> Result<PathBuf> {
        run(Command::new("mvn").args([
            "-B".to_string(),
            "-C".to_string(),
            "dependency:get".to_string(),
            "-Dtransitive=false".to_string(),
            format!("-Dartifact={coordinate}"),
        ]))
        .with_context(|| format!("fetching artifact {coordinate}"))?;

        locate_fetched(coordinate, &self.local_repository()?)
    }

    fn checkout_subtree(
        &self,
        repository: &str,
        reference: &str,
        paths: &[&str],
        destination: &Path,
    ) -> Result<()> {
        run(Command::new("git")
            .args([
                "clone",
                "--quiet",
                "--depth",
                "1",
                "--filter=blob:none",
                "--sparse",
                "--branch",
                reference,
                repository,
            ])
            .arg(destination))
        .with_context(|| format!("cloning {repository} at '{reference}'"))?;

        run(Command::new("git")
            .arg("-C")
            .arg(destination)
            .args(["sparse-checkout", "set"])
            .args(paths))
        .with_context(|| format!("checking out {} from {repository}", paths.join(", ")))
    }

    fn build_image(&self, build: &ImageBuild) -> Result<String> {
        let mut command = Command::new("docker");
        command
            .arg("build")
            .arg(&build.context)
            .args(["--progress=plain", "--pull", "--platform"])
            .arg(build.arch.platform())
            .arg("-f")
            .arg(&build.dockerfile)
            .arg("-t")
            .arg(&build.tag);
        for (key, value) in &build.build_args {
            command.arg("--build-arg").arg(format!("{key}={value}"));
        }
        run(&mut command).with_context(|| format!("building image {}", build.tag))?;
        Ok(build.tag.clone())
    }

    fn describe_image(&self, tag: &str) -> Result<String> {
        let output = capture(Command::new("docker").args([
            "image",
            "inspect",
            "-f",
            "{{.RepoTags}} {{.Id}}",
            tag,
        ]))?;
        Ok(output.trim().to_string())
    }

    fn smoke_test(&self, script_dir: &Path, tag: &str, arch: Architecture) -> Result<()> {
        run(Command::new("bash")
            .args([
                "-c",
                "set -euo pipefail; source container-test.sh; test_container \"$1\" \"$2\"",
                "container-test",
                tag,
            ])
            .arg(arch.platform())
            .current_dir(script_dir))
        .with_context(|| format!("smoke testing {tag}"))
    }

    fn tag_image(&self, source: &str, target: &str) -> Result<()> {
        run(Command::new("docker").args(["tag", source, target]))
    }

    fn push_image(&self, tag: &str) -> Result<()> {
        run(Command::new("docker").args(["push", tag]))
    }

    fn create_manifest(&self, name: &str, images: &[String]) -> Result<()> {
        run(Command::new("docker")
            .args(["manifest", "create", "--amend", name])
            .args(images))
    }

    fn push_manifest(&self, name: &str) -> Result<()> {
        run(Command::new("docker").args(["manifest", "push", name]))
    }

    fn http_get(&self, url: &str) -> Result<String> {
        capture(Command::new("curl").args([
            "-fsSL",
            "-H",
            "accept: application/json",
            url,
        ]))
        .with_context(|| format!("requesting {url}"))
    }
}

fn env_repository(value: Option<&str>) -> Option<PathBuf> {
    value
        .map(str::trim)
        .filter(|path| !path.is_empty())
        .map(PathBuf::from)
}

/// `mvn` may print `[WARNING]` lines around the value. The last other line
/// is used when it is an absolute path.
fn reported_repository(output: &str, home: Option<PathBuf>) -> Result<PathBuf> {
    let reported = output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('['))
        .last()
        .filter(|line| Path::new(line).is_absolute());
    if let Some(path) = reported {
        return Ok(PathBuf::from(path));
    }

    let home = home.context("resolving home directory for ~/.m2/repository")?;
    Ok(home.join(".m2").join("repository"))
}

fn locate_fetched(coordinate: &ArtifactCoordinate, local_repository: &Path) -> Result<PathBuf> {
    let path = coordinate.repository_path(local_repository);
    if !path.is_file() {
        bail!(
            "artifact {} was fetched but is missing from the local repository: {}",
            coordinate,
            path.display()
        );
    }
    Ok(path)
}

fn render(command: &Command) -> String {
    std::iter::once(command.get_program())
        .chain(command.get_args())
        .map(|part| part.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Run with inherited stdio; long builds stream their progress to the terminal.
fn run(command: &mut Command) -> Result<()> {
    let rendered = render(command);
    debug!("running: {rendered}");
    let status = command
        .status()
        .with_context(|| format!("spawning `{rendered}`"))?;
    if !status.success() {
        bail!("`{rendered}` failed with status {status}");
    }
    Ok(())
}

fn capture(command: &mut Command) -> Result<String> {
    let rendered = render(command);
    debug!("running: {rendered}");
    let output = command
        .output()
        .with_context(|| format!("spawning `{rendered}`"))?;
    if output.status.success() {
        return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    bail!(
        "`{}` failed with status {}: {}\n{}",
        rendered,
        output.status,
        stdout.trim(),
        stderr.trim()
    )
}
