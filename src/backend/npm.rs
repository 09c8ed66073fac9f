//! npm backend: registry lookups over HTTP, installs through the `npm` CLI.

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, info};
use reqwest::{
    Client,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use std::env;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Arc, OnceLock};
use tokio::process::Command;
use tokio::sync::OnceCell;

use crate::config::Settings;
use crate::http::{HttpClient, NonRetryableError};

use super::{Backend, PackageInfo, RegistryError};

static SHARED: OnceLock<Arc<NpmBackend>> = OnceLock::new();

/// Lines of npm's stderr kept in an install error.
const STDERR_TAIL_LINES: usize = 20;

pub struct NpmBackend {
    http: HttpClient,
    registry: String,
    npm: PathBuf,
    /// npm version, set once the first `load` succeeds.
    loaded: OnceCell<String>,
}

impl NpmBackend {
    /// Build a backend; `NPM_TOKEN`, when set, authenticates registry lookups.
    pub fn new(settings: &Settings) -> Result<Self> {
        Self::with_token(settings, env::var("NPM_TOKEN").ok().as_deref())
    }

    fn with_token(settings: &Settings, token: Option<&str>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(token) = token {
            let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", token))?;
            auth_value.set_sensitive(true);
            headers.insert(AUTHORIZATION, auth_value);
            debug!("Using NPM_TOKEN for registry authentication");
        }

        let client = Client::builder()
            .user_agent(concat!("npmi/", env!("NPMI_VERSION")))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http: HttpClient::new(client),
            registry: settings.registry_url().to_string(),
            npm: settings.npm.clone(),
            loaded: OnceCell::new(),
        })
    }

    /// Process-wide backend. The first caller's settings win; the instance is
    /// never torn down.
    pub fn shared(settings: &Settings) -> Result<Arc<Self>> {
        if let Some(backend) = SHARED.get() {
            return Ok(Arc::clone(backend));
        }
        let backend = Arc::new(Self::new(settings)?);
        Ok(Arc::clone(SHARED.get_or_init(|| backend)))
    }

    /// npm version reported during `load`, if loaded.
    pub fn npm_version(&self) -> Option<&str> {
        self.loaded.get().map(String::as_str)
    }

    fn package_url(&self, id: &str) -> String {
        format!("{}/{}", self.registry, escape_package_name(id))
    }

    async fn detect_npm(&self) -> Result<String> {
        debug!("Probing {:?} --version", self.npm);
        let output = Command::new(&self.npm)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.npm.display()))?;

        if !output.status.success() {
            anyhow::bail!(
                "{} --version exited with {}",
                self.npm.display(),
                output.status
            );
        }

        let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
        info!("Using npm {}", version);
        Ok(version)
    }
}

/// Scoped names keep their `@` but need the slash escaped in registry URLs.
fn escape_package_name(id: &str) -> String {
    if id.starts_with('@') {
        id.replacen('/', "%2f", 1)
    } else {
        id.to_string()
    }
}

fn install_args(target: Option<&PathBuf>, specs: &[String]) -> Vec<String> {
    let mut args = vec![
        "install".to_string(),
        "--no-audit".to_string(),
        "--no-fund".to_string(),
    ];
    if let Some(target) = target {
        args.push("--prefix".to_string());
        args.push(target.display().to_string());
    }
    args.extend(specs.iter().cloned());
    args
}

#[async_trait]
impl Backend for NpmBackend {
    #[tracing::instrument(skip(self))]
    async fn load(&self) -> Result<()> {
        self.loaded
            .get_or_try_init(|| self.detect_npm())
            .await
            .map(|_| ())
    }

    #[tracing::instrument(skip(self))]
    async fn view(&self, id: &str) -> Result<PackageInfo> {
        self.http
            .get_json::<PackageInfo>(&self.package_url(id))
            .await
            .map_err(|e| {
                if matches!(
                    e.downcast_ref::<NonRetryableError>(),
                    Some(NonRetryableError::NotFound)
                ) {
                    RegistryError::NotFound(id.to_string()).into()
                } else {
                    e
                }
            })
    }

    #[tracing::instrument(skip(self))]
    async fn install(&self, target: Option<PathBuf>, specs: Vec<String>) -> Result<()> {
        // A bare `npm install` would install the whole package.json
        if specs.is_empty() {
            debug!("No packages to install, not running npm");
            return Ok(());
        }

        let args = install_args(target.as_ref(), &specs);
        debug!("Running {} {}", self.npm.display(), args.join(" "));

        let output = Command::new(&self.npm)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.npm.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let lines: Vec<&str> = stderr.lines().collect();
            let tail = lines[lines.len().saturating_sub(STDERR_TAIL_LINES)..].join("\n");
            anyhow::bail!("npm install exited with {}\n{}", output.status, tail);
        }

        info!("Installed {} package(s)", specs.len());
        Ok(())
    }
}
