pub mod action;
pub mod matcher;
pub mod runner;
pub mod selection;
pub mod unregister;

pub use crate::domain::model::{Classification, Package, RunReport, Termination, UninstallOutcome};
pub use crate::domain::ports::{PackageInventory, Uninstaller};
pub use crate::utils::error::Result;
