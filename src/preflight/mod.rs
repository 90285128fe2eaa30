//! Preflight checks for build validation.
//!
//! Validates that the host has every external tool the run will invoke
//! before anything is downloaded.
//!
//! # Example
//!
//! ```rust
//! use trino_slim::preflight::{command_exists, check_required_tools};
//!
//! if !command_exists("docker") {
//!     println!("container engine not installed");
//! }
//!
//! let tools = &[("git", "git"), ("mvn", "maven")];
//! if let Err(e) = check_required_tools(tools) {
//!     eprintln!("{}", e);
//! }
//! ```

use anyhow::{bail, Result};

use crate::config::JdkStrategy;

/// Check if a command exists on the host system.
pub fn command_exists(cmd: &str) -> bool {
    which::which(cmd).is_ok()
}

/// Tools every run needs.
///
/// Each tuple is (command_name, package_name).
pub const REQUIRED_TOOLS: &[(&str, &str)] = &[
    ("mvn", "maven"),
    ("git", "git"),
    ("docker", "docker"),
    ("bash", "bash"),
];

/// Extra tools for the Adoptium API strategy.
pub const ADOPTIUM_TOOLS: &[(&str, &str)] = &[("curl", "curl")];

/// Check that specific tools are available.
///
/// # Returns
///
/// * `Ok(())` if all tools are found
/// * `Err` with list of missing tools and their packages
pub fn check_required_tools(tools: &[(&str, &str)]) -> Result<()> {
    let missing = tools
        .iter()
        .filter(|(tool, _)| !command_exists(tool))
        .collect::<Vec<_>>();

    if !missing.is_empty() {
        let msg = missing
            .iter()
            .map(|(t, p)| format!("  {} (install: {})", t, p))
            .collect::<Vec<_>>()
            .join("\n");
        bail!("Missing required host tools:\n{}", msg);
    }

    Ok(())
}

/// Check every tool needed for a run resolving JDKs with `strategy`.
pub fn check_host_tools(strategy: JdkStrategy) -> Result<()> {
    match strategy {
        JdkStrategy::Catalog => check_required_tools(REQUIRED_TOOLS),
        JdkStrategy::Adoptium => {
            let tools = REQUIRED_TOOLS
                .iter()
                .chain(ADOPTIUM_TOOLS)
                .copied()
                .collect::<Vec<_>>();
            check_required_tools(&tools)
        }
    }
}
