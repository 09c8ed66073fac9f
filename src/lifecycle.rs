//! Keep the application's backends and app plugins up to date.
//!
//! Both operations compute their candidates from [`Settings`], leave alone any
//! package whose install directory is a git checkout, and hand the rest to
//! [`install_packages`] as a single list request.

use anyhow::Result;
use log::{debug, info};
use std::path::{Path, PathBuf};

use crate::backend::Backend;
use crate::config::Settings;
use crate::install::{InstallRequest, install_packages};
use crate::runtime::Runtime;

/// Engine backend followed by service backends, first occurrence wins.
pub fn backend_candidates(settings: &Settings) -> Vec<String> {
    let mut candidates: Vec<String> = Vec::new();
    for name in settings.engine.iter().chain(settings.services.iter()) {
        if !candidates.contains(name) {
            candidates.push(name.clone());
        }
    }
    candidates
}

/// Where `package` ends up when installed under `target`.
pub fn install_dir(target: &Path, package: &str) -> PathBuf {
    target.join("node_modules").join(package)
}

fn without_git_managed<R: Runtime + ?Sized>(
    runtime: &R,
    target: &Path,
    candidates: Vec<String>,
) -> Vec<String> {
    candidates
        .into_iter()
        .filter(|name| {
            let dir = install_dir(target, name);
            if runtime.exists(&dir.join(".git")) {
                info!("{} is managed by git, skipping ({})", name, dir.display());
                false
            } else {
                true
            }
        })
        .collect()
}

async fn update<B, R>(backend: &B, runtime: &R, target: PathBuf, candidates: Vec<String>) -> Result<()>
where
    B: Backend + ?Sized,
    R: Runtime + ?Sized,
{
    let candidates = without_git_managed(runtime, &target, candidates);
    debug!("Updating {:?} in {}", candidates, target.display());

    let request = InstallRequest::List {
        target: Some(target),
        candidates,
    };
    install_packages(backend, runtime, request).await
}

/// Install or update the engine and service backends into `src_root`.
#[tracing::instrument(skip(backend, runtime, settings))]
pub async fn update_backends<B, R>(backend: &B, runtime: &R, settings: &Settings) -> Result<()>
where
    B: Backend + ?Sized,
    R: Runtime + ?Sized,
{
    update(
        backend,
        runtime,
        settings.src_root.clone(),
        backend_candidates(settings),
    )
    .await
}

/// Install or update the app plugins into the apps directory.
#[tracing::instrument(skip(backend, runtime, settings))]
pub async fn update_plugins<B, R>(backend: &B, runtime: &R, settings: &Settings) -> Result<()>
where
    B: Backend + ?Sized,
    R: Runtime + ?Sized,
{
    update(backend, runtime, settings.apps_dir(), settings.apps.clone()).await
}
