use anyhow::Result;
use small_uninstall::config::TomlConfig;
use small_uninstall::core::PackageInventory;
use small_uninstall::utils::validation::Validate;
use small_uninstall::{ActionConfig, ManifestInventory, Package, ProcessRunner, UninstallAction};
use tempfile::TempDir;

const MANIFEST: &str = r#"
[[products]]
name = "Acme Tool 1.0"
id = "{11111111-1111-1111-1111-111111111111}"

[[products]]
name = "Acme Helper"
id = "{22222222-2222-2222-2222-222222222222}"

[[products]]
name = "Other App"
id = "{33333333-3333-3333-3333-333333333333}"
"#;

#[tokio::test]
async fn test_manifest_inventory_strips_braces() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("products.toml");
    std::fs::write(&path, MANIFEST)?;

    let packages = ManifestInventory::new(&path).list_installed_packages().await?;

    assert_eq!(packages.len(), 3);
    assert_eq!(
        packages[0],
        Package::new("Acme Tool 1.0", "11111111-1111-1111-1111-111111111111")
    );
    assert!(packages.iter().all(|p| p.id.len() == 36));
    Ok(())
}

#[tokio::test]
async fn test_missing_manifest_degrades_to_empty() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let inventory = ManifestInventory::new(temp_dir.path().join("missing.toml"));

    let packages = inventory.list_installed_packages().await?;

    assert!(packages.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_dry_run_from_config_file() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let manifest_path = temp_dir.path().join("products.toml");
    std::fs::write(&manifest_path, MANIFEST)?;

    // 將Windows路徑中的反斜杠轉為正斜杠以避免TOML解析問題
    let normalized = manifest_path.display().to_string().replace('\\', "/");
    let config_content = format!(
        r#"
[uninstall]
application_name = "Acme%"
exceptions = "Acme Helper"
parameters = ""
dont_uninstall_if_no_exception = true
kill_process = true
kill_after = 1

[runner]
settle_delay_seconds = 0

[inventory]
manifest = "{}"
"#,
        normalized
    );
    let config = TomlConfig::from_toml_str(&config_content)?;
    config.validate()?;

    let inventory = ManifestInventory::new(config.manifest().expect("manifest configured"));
    let runner = ProcessRunner::new(config.runner_settings());
    let action = UninstallAction::new(
        inventory,
        runner,
        ActionConfig::try_from(config.uninstall.clone())?,
    );

    let selection = action.plan().await?;

    assert!(selection.gate_passed);
    assert_eq!(
        selection.packages,
        vec![Package::new("Acme Tool 1.0", "11111111-1111-1111-1111-111111111111")]
    );
    Ok(())
}
