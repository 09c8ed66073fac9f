//! Package-manager backend abstraction.
//!
//! The orchestrator never talks to npm directly; it goes through [`Backend`],
//! which exposes the three capabilities it needs: load the runtime
//! configuration, look a package up in the registry, and run one install.

mod npm;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

pub use npm::NpmBackend;

/// Registry document for a single package (the subset we read).
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct PackageInfo {
    pub name: String,
    #[serde(rename = "dist-tags", default)]
    pub dist_tags: BTreeMap<String, String>,
}

impl PackageInfo {
    /// Version the `latest` dist-tag points at, if published.
    pub fn latest(&self) -> Option<&str> {
        self.dist_tags.get("latest").map(String::as_str)
    }
}

/// Registry lookup failures callers need to tell apart.
#[derive(Debug)]
pub enum RegistryError {
    /// The registry has no package with this name.
    NotFound(String),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::NotFound(id) => write!(f, "404 Not Found: {}", id),
        }
    }
}

impl std::error::Error for RegistryError {}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Backend: Send + Sync {
    /// Initialize the backend. Idempotent: after the first success this
    /// returns immediately.
    async fn load(&self) -> Result<()>;

    /// Silent lookup of a single package. A package the registry does not
    /// know must fail with [`RegistryError::NotFound`].
    async fn view(&self, id: &str) -> Result<PackageInfo>;

    /// Install `specs` in one invocation, into `target` when given.
    async fn install(&self, target: Option<PathBuf>, specs: Vec<String>) -> Result<()>;
}
