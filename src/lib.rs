pub mod aggregate;
pub mod backend;
pub mod config;
pub mod http;
pub mod install;
pub mod lifecycle;
pub mod manifest;
pub mod probe;
pub mod runtime;

pub use install::{DependencySpec, InstallRequest, install_packages};
pub use lifecycle::{update_backends, update_plugins};
