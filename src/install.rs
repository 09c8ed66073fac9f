//! Install orchestration: decide what to install, then run exactly one
//! install through the backend.

use anyhow::Result;
use log::{debug, info};
use std::fmt;
use std::path::PathBuf;

use crate::aggregate::run_all;
use crate::backend::Backend;
use crate::manifest::Manifest;
use crate::probe::probe;
use crate::runtime::Runtime;

/// The package manager's own package. Never installed by us: it is the tool
/// doing the installing.
pub const PACKAGE_MANAGER: &str = "npm";

/// A package to install, rendered as `name@range` (or just `name`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencySpec {
    pub name: String,
    pub range: Option<String>,
}

impl DependencySpec {
    pub fn new(name: impl Into<String>, range: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            range: Some(range.into()),
        }
    }

    /// A spec without a range; the backend picks its default tag.
    pub fn bare(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            range: None,
        }
    }
}

impl fmt::Display for DependencySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.range {
            Some(range) => write!(f, "{}@{}", self.name, range),
            None => write!(f, "{}", self.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallRequest {
    /// Install the `dependencies` of `<dir>/package.json` into `dir`.
    Manifest { dir: PathBuf },
    /// Install whichever `candidates` the registry knows.
    List {
        target: Option<PathBuf>,
        candidates: Vec<String>,
    },
    /// Nothing to do.
    Empty,
}

impl InstallRequest {
    /// Build a request from an optional directory and an optional package list.
    /// A package list always makes a `List` request, with the directory (if
    /// any) as its target.
    pub fn from_args(dir: Option<PathBuf>, packages: Option<Vec<String>>) -> Self {
        match (dir, packages) {
            (target, Some(candidates)) => InstallRequest::List { target, candidates },
            (Some(dir), None) => InstallRequest::Manifest { dir },
            (None, None) => InstallRequest::Empty,
        }
    }
}

/// Dependency specs of a manifest, minus the package manager itself.
pub fn manifest_specs(manifest: &Manifest) -> Vec<DependencySpec> {
    manifest
        .dependencies
        .iter()
        .filter(|(name, _)| name.as_str() != PACKAGE_MANAGER)
        .map(|(name, range)| DependencySpec::new(name, range))
        .collect()
}

/// Resolve `request` to a dependency list and install it in one backend call.
///
/// An empty request, a missing manifest, and an empty candidate list complete
/// successfully without touching the backend. A failed registry lookup for any
/// candidate aborts the whole request before anything is installed.
#[tracing::instrument(skip(backend, runtime))]
pub async fn install_packages<B, R>(backend: &B, runtime: &R, request: InstallRequest) -> Result<()>
where
    B: Backend + ?Sized,
    R: Runtime + ?Sized,
{
    let (target, specs) = match request {
        InstallRequest::Empty => {
            debug!("Empty install request");
            return Ok(());
        }
        InstallRequest::Manifest { dir } => {
            let path = Manifest::path_in(&dir);
            if !runtime.exists(&path) {
                info!("No manifest at {}, nothing to install", path.display());
                return Ok(());
            }
            let manifest = Manifest::load(runtime, &path)?;
            (Some(dir), manifest_specs(&manifest))
        }
        InstallRequest::List { target, candidates } => {
            if candidates.is_empty() {
                debug!("No candidates to install");
                return Ok(());
            }
            let total = candidates.len();
            let verified = run_all(candidates, |id| {
                let id = id.clone();
                async move { probe(backend, &id).await }
            })
            .await?;
            debug!("{} of {} candidate(s) found in registry", verified.len(), total);
            (target, verified.into_iter().map(DependencySpec::bare).collect())
        }
    };

    execute(backend, target, specs).await
}

async fn execute<B: Backend + ?Sized>(
    backend: &B,
    target: Option<PathBuf>,
    specs: Vec<DependencySpec>,
) -> Result<()> {
    backend.load().await?;

    let args: Vec<String> = specs.iter().map(ToString::to_string).collect();
    info!("Installing [{}]", args.join(", "));
    backend.install(target, args).await
}
