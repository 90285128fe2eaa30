//! Target CPU architectures.
//!
//! Architecture names follow the container platform convention (`amd64`,
//! `arm64`, `ppc64le`). They are used verbatim in image tags, in
//! `--platform linux/<arch>` and as file names inside the JDK catalog.

use anyhow::{bail, Result};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Architecture {
    Amd64,
    Arm64,
    Ppc64le,
}

/// Architectures built when `-a` is not given.
pub const DEFAULT_ARCHITECTURES: &[Architecture] = &[
    Architecture::Amd64,
    Architecture::Arm64,
    Architecture::Ppc64le,
];

impl Architecture {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim() {
            "amd64" => Ok(Self::Amd64),
            "arm64" => Ok(Self::Arm64),
            "ppc64le" => Ok(Self::Ppc64le),
            other => bail!(
                "unsupported architecture '{}'; expected one of: {}",
                other,
                DEFAULT_ARCHITECTURES
                    .iter()
                    .map(|arch| arch.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }

    /// Normalize a `uname -m` style machine name.
    pub fn from_machine(machine: &str) -> Option<Self> {
        match machine.trim() {
            "x86_64" | "amd64" => Some(Self::Amd64),
            "aarch64" | "arm64" => Some(Self::Arm64),
            "ppc64le" | "powerpc64le" => Some(Self::Ppc64le),
            _ => None,
        }
    }

    /// Architecture of the machine running this process.
    pub fn host() -> Option<Self> {
        let machine = match std::env::consts::ARCH {
            "powerpc64" if cfg!(target_endian = "little") => "ppc64le",
            other => other,
        };
        Self::from_machine(machine)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Amd64 => "amd64",
            Self::Arm64 => "arm64",
            Self::Ppc64le => "ppc64le",
        }
    }

    /// Container platform string, e.g. `linux/arm64`.
    pub fn platform(self) -> String {
        format!("linux/{}", self.as_str())
    }

    /// Architecture name used by Temurin binary download URLs.
    pub fn temurin_name(self) -> &'static str {
        match self {
            Self::Amd64 => "x64",
            Self::Arm64 => "aarch64",
            Self::Ppc64le => "ppc64le",
        }
    }

    /// Images for this architecture cannot be smoke-tested under emulation.
    pub fn smoke_testable(self) -> bool {
        !matches!(self, Self::Ppc64le)
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered set of requested architectures; first occurrence wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchitectureSet(Vec<Architecture>);

impl ArchitectureSet {
    /// Parse a comma-separated list such as `amd64,arm64`.
    pub fn parse(list: &str) -> Result<Self> {
        let mut archs = Vec::new();
        for part in list.split(',') {
            if part.trim().is_empty() {
                continue;
            }
            let arch = Architecture::parse(part)?;
            if !archs.contains(&arch) {
                archs.push(arch);
            }
        }
        if archs.is_empty() {
            bail!("architecture list '{}' names no architectures", list);
        }
        Ok(Self(archs))
    }

    pub fn iter(&self) -> impl Iterator<Item = Architecture> + '_ {
        self.0.iter().copied()
    }

    pub fn contains(&self, arch: Architecture) -> bool {
        self.0.contains(&arch)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for ArchitectureSet {
    fn default() -> Self {
        Self(DEFAULT_ARCHITECTURES.to_vec())
    }
}

impl fmt::Display for ArchitectureSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = self.0.iter().map(|a| a.as_str()).collect::<Vec<_>>();
        f.write_str(&names.join(","))
    }
}
