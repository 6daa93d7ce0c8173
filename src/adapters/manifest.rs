use crate::domain::model::Package;
use crate::domain::ports::PackageInventory;
use crate::utils::error::{Result, UninstallError};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;

/// TOML 清單：
///
/// ```toml
/// [[products]]
/// name = "Acme Tool 1.0"
/// id = "{11111111-1111-1111-1111-111111111111}"
/// ```
#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default)]
    products: Vec<ManifestEntry>,
}

#[derive(Debug, Deserialize)]
struct ManifestEntry {
    name: Option<String>,
    id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ManifestInventory {
    path: PathBuf,
}

impl ManifestInventory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> Result<Manifest> {
        let content = std::fs::read_to_string(&self.path)?;
        toml::from_str(&content).map_err(|e| UninstallError::InventoryError {
            message: format!("{}: {}", self.path.display(), e),
        })
    }
}

pub fn packages_from_manifest_str(content: &str) -> Result<Vec<Package>> {
    let manifest: Manifest = toml::from_str(content).map_err(|e| UninstallError::InventoryError {
        message: e.to_string(),
    })?;
    Ok(collect_packages(manifest))
}

fn collect_packages(manifest: Manifest) -> Vec<Package> {
    manifest
        .products
        .into_iter()
        .filter_map(|entry| match (entry.name, entry.id) {
            (Some(name), Some(id)) => {
                let package = Package::from_braced(name, &id);
                if package.is_none() {
                    tracing::debug!("Skipping product with malformed id: {}", id);
                }
                package
            }
            _ => {
                tracing::debug!("Skipping product entry without name or id");
                None
            }
        })
        .collect()
}

#[async_trait]
impl PackageInventory for ManifestInventory {
    async fn list_installed_packages(&self) -> Result<Vec<Package>> {
        match self.load() {
            Ok(manifest) => Ok(collect_packages(manifest)),
            Err(e) => {
                tracing::warn!("⚠️ Unable to read product manifest: {}", e);
                Ok(Vec::new())
            }
        }
    }
}
