//! Command-line parsing.
//!
//! Flags follow `getopts` conventions: `-r 450` and `-r450` are both
//! accepted, and parsing stops at the first problem.

use std::path::PathBuf;
use thiserror::Error;

use crate::arch::ArchitectureSet;

pub fn usage() -> &'static str {
    "Usage: trino-slim -r <release> [-a <architectures>] [-j <jdk release>] [-c <config>] [-h]\n\
     Builds slim Trino container images with two plugins and publishes a multi-arch manifest.\n\
     \n\
     \x20 -r  release version to build, e.g. 450 (required)\n\
     \x20 -a  comma-separated architectures (default: amd64,arm64,ppc64le)\n\
     \x20 -j  JDK release to bundle instead of the one pinned upstream\n\
     \x20 -c  TOML file overriding image, registry and allow-list settings\n\
     \x20 -h  show this help\n\
     \n\
     The built image is smoke tested once, for the host architecture, and only\n\
     when -a includes it. Otherwise, and on ppc64le hosts, the smoke test is\n\
     skipped with a warning."
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UsageError {
    #[error("release version is required (-r)")]
    MissingRelease,
    #[error("unknown option '{0}'")]
    UnknownOption(String),
    #[error("option '-{0}' requires a value")]
    MissingValue(char),
    #[error("unexpected argument '{0}'")]
    UnexpectedArgument(String),
    #[error("invalid -a value: {0}")]
    InvalidArchitectures(String),
}

impl UsageError {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::MissingRelease => 2,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub release: String,
    pub architectures: ArchitectureSet,
    pub jdk_release: Option<String>,
    pub config_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Help,
    Run(CliArgs),
}

/// Parse arguments, excluding the program name.
pub fn parse_args<I, S>(args: I) -> Result<Invocation, UsageError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut args = args.into_iter().map(Into::into);
    let mut release = None;
    let mut architectures = None;
    let mut jdk_release = None;
    let mut config_file = None;

    while let Some(arg) = args.next() {
        let mut chars = arg.chars();
        let flag = match (chars.next(), chars.next()) {
            (Some('-'), Some(flag)) => flag,
            _ => return Err(UsageError::UnexpectedArgument(arg)),
        };
        if flag == 'h' && arg.len() == 2 {
            return Ok(Invocation::Help);
        }
        if !matches!(flag, 'a' | 'r' | 'j' | 'c') {
            return Err(UsageError::UnknownOption(arg));
        }

        let inline: String = chars.collect();
        let value = if inline.is_empty() {
            args.next().ok_or(UsageError::MissingValue(flag))?
        } else {
            inline
        };

        match flag {
            'a' => {
                let parsed = ArchitectureSet::parse(&value)
                    .map_err(|err| UsageError::InvalidArchitectures(err.to_string()))?;
                architectures = Some(parsed);
            }
            'r' => release = Some(value),
            'j' => jdk_release = Some(value),
            _ => config_file = Some(PathBuf::from(value)),
        }
    }

    let release = release
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or(UsageError::MissingRelease)?;

    Ok(Invocation::Run(CliArgs {
        release,
        architectures: architectures.unwrap_or_default(),
        jdk_release,
        config_file,
    }))
}
