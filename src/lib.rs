//! Slim multi-architecture Trino container images.
//!
//! Takes a released Trino server and CLI, strips the server down to two
//! plugins and two catalogs, and rebuilds the image for each requested CPU
//! architecture with the upstream project's own container definition:
//!
//! - **Artifacts** - server tarball and executable CLI jar from the local
//!   artifact cache, fetched by coordinate
//! - **Upstream resources** - `core/docker` and `core/jdk` from a shallow,
//!   sparse checkout of the release tag
//! - **JDK resolution** - pinned lookup table or Adoptium API, see [`jdk`]
//! - **Build context** - extracted, pruned scratch tree, see [`context`]
//! - **Publishing** - per-architecture tags plus versioned and `latest`
//!   manifest lists
//!
//! # Architecture
//!
//! ```text
//! cli ──> RunConfig ──> pipeline::run
//!                           │
//!                           ├── Toolchain (mvn, git, docker, curl)
//!                           ├── JdkSource (JdkCatalog | AdoptiumApi)
//!                           ├── BuildContext (extract, copy, prune)
//!                           └── ImageNames (local, published, manifests)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use trino_slim::{pipeline, Architecture, ArchitectureSet, ProcessToolchain, RunConfig};
//!
//! let archs = ArchitectureSet::parse("amd64,arm64")?;
//! let config = RunConfig::new("450", archs, std::env::current_dir()?);
//! pipeline::run(&config, &ProcessToolchain::new(), Architecture::host())?;
//! ```

pub mod arch;
pub mod cli;
pub mod config;
pub mod context;
pub mod image;
pub mod jdk;
pub mod pipeline;
pub mod preflight;
pub mod toolchain;

pub use arch::{Architecture, ArchitectureSet};
pub use config::{JdkStrategy, RunConfig};
pub use toolchain::{ProcessToolchain, Toolchain};
