// Adapters layer: concrete inventories for the host package subsystem.

pub mod manifest;
pub mod msi;

pub use manifest::ManifestInventory;
pub use msi::WindowsInstallerInventory;
