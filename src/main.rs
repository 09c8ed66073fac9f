use anyhow::Result;
use clap::Parser;
use log::debug;
use npmi::backend::NpmBackend;
use npmi::config::Settings;
use npmi::runtime::RealRuntime;
use npmi::{InstallRequest, install_packages, update_backends, update_plugins};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// npmi - npm install orchestrator
///
/// Installs an application's npm dependencies, or a list of packages after
/// checking each one against the registry, in a single npm invocation.
///
/// Examples:
///   npmi install --where ./app         # Install ./app/package.json dependencies
///   npmi install left-pad chalk        # Install whichever of these exist
///   npmi backends                      # Update engine and service backends
#[derive(Parser, Debug)]
#[command(author, version = env!("NPMI_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file (defaults to <config dir>/npmi/config.json; also via NPMI_CONFIG)
    #[arg(long, env = "NPMI_CONFIG", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Registry URL (overrides the settings file; also via NPM_CONFIG_REGISTRY)
    #[arg(long, env = "NPM_CONFIG_REGISTRY", value_name = "URL", global = true)]
    pub registry: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Install manifest dependencies or registry packages
    Install(InstallArgs),

    /// Update the engine and service backends
    Backends,

    /// Update the app plugins
    Plugins,
}

#[derive(clap::Args, Debug)]
pub struct InstallArgs {
    /// Directory holding package.json, or the install prefix when packages are given
    #[arg(long = "where", short = 'w', value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Packages to check against the registry and install
    #[arg(value_name = "PKG")]
    pub packages: Vec<String>,
}

impl InstallArgs {
    fn into_request(self) -> InstallRequest {
        let packages = (!self.packages.is_empty()).then_some(self.packages);
        InstallRequest::from_args(self.dir, packages)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = RealRuntime;

    let config = cli.config.as_deref();
    let registry = cli.registry;

    match cli.command {
        Commands::Install(args) => {
            let request = args.into_request();
            // Settings are not consulted for an empty request
            if request == InstallRequest::Empty {
                debug!("Nothing to install");
                return Ok(());
            }
            let (_, backend) = setup(&runtime, config, registry)?;
            install_packages(backend.as_ref(), &runtime, request).await?
        }
        Commands::Backends => {
            let (settings, backend) = setup(&runtime, config, registry)?;
            update_backends(backend.as_ref(), &runtime, &settings).await?
        }
        Commands::Plugins => {
            let (settings, backend) = setup(&runtime, config, registry)?;
            update_plugins(backend.as_ref(), &runtime, &settings).await?
        }
    }
    Ok(())
}

fn setup(
    runtime: &RealRuntime,
    config: Option<&Path>,
    registry: Option<String>,
) -> Result<(Settings, Arc<NpmBackend>)> {
    let mut settings = Settings::load(runtime, config)?;
    if let Some(registry) = registry {
        settings.registry = registry;
    }
    let backend = NpmBackend::shared(&settings)?;
    Ok((settings, backend))
}
