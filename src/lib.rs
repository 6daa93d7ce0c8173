pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;

pub use crate::adapters::{ManifestInventory, WindowsInstallerInventory};
pub use crate::core::{
    action::{ActionConfig, UninstallAction, UninstallReport, UninstallSettings},
    runner::{ProcessRunner, RunnerSettings},
    unregister::UnregisterDllAction,
};
pub use crate::domain::model::{Classification, Package, UninstallOutcome};
pub use crate::utils::error::{Result, UninstallError};
