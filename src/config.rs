//! Lifecycle settings: where the application lives and which backends and
//! plugins it is made of.

use anyhow::{Context, Result};
use log::debug;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;

pub const DEFAULT_REGISTRY: &str = "https://registry.npmjs.org";

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Application root; backends are installed into its `node_modules`.
    pub src_root: PathBuf,
    /// Engine backend package.
    pub engine: Option<String>,
    /// Service backend packages.
    pub services: Vec<String>,
    /// App plugin packages.
    pub apps: Vec<String>,
    /// Plugin install root, `<srcRoot>/apps` when unset.
    pub apps_dir: Option<PathBuf>,
    /// Registry base URL.
    pub registry: String,
    /// npm executable.
    pub npm: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            src_root: PathBuf::new(),
            engine: None,
            services: Vec::new(),
            apps: Vec::new(),
            apps_dir: None,
            registry: DEFAULT_REGISTRY.to_string(),
            npm: PathBuf::from("npm"),
        }
    }
}

impl Settings {
    /// Load settings from `path`, or from `<config_dir>/npmi/config.json` when
    /// no path is given. Only an explicit path is required to exist.
    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => Some(p.to_path_buf()),
            None => runtime
                .config_dir()
                .map(|dir| dir.join("npmi").join("config.json"))
                .filter(|p| runtime.exists(p)),
        };

        let mut settings = match file {
            Some(file) => {
                debug!("Loading settings from {:?}", file);
                let content = runtime.read_to_string(&file)?;
                serde_json::from_str::<Settings>(&content)
                    .with_context(|| format!("Invalid settings file {}", file.display()))?
            }
            None => {
                debug!("No settings file, using defaults");
                Settings::default()
            }
        };

        if settings.src_root.as_os_str().is_empty() {
            settings.src_root = runtime.current_dir()?;
        } else if settings.src_root.is_relative() {
            settings.src_root = runtime.current_dir()?.join(&settings.src_root);
        }

        Ok(settings)
    }

    /// Directory app plugins are installed into.
    pub fn apps_dir(&self) -> PathBuf {
        self.apps_dir
            .clone()
            .unwrap_or_else(|| self.src_root.join("apps"))
    }

    /// Registry URL without a trailing slash.
    pub fn registry_url(&self) -> &str {
        self.registry.trim_end_matches('/')
    }
}
