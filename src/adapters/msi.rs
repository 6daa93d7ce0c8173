use crate::domain::model::Package;
use crate::domain::ports::PackageInventory;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

/// 透過 WindowsInstaller.Installer COM 物件列出所有產品，一行一個
/// `{ProductCode}<TAB>ProductName`。讀不到名稱的產品在腳本內直接略過。
const LIST_PRODUCTS_SCRIPT: &str = r#"
$ErrorActionPreference = 'Stop'
[Console]::OutputEncoding = [System.Text.Encoding]::UTF8
$installer = New-Object -ComObject WindowsInstaller.Installer
$type = $installer.GetType()
$products = $type.InvokeMember('Products', 'GetProperty', $null, $installer, $null)
foreach ($code in $products) {
    try {
        $name = $type.InvokeMember('ProductInfo', 'GetProperty', $null, $installer, @($code, 'ProductName'))
        Write-Output ("{0}`t{1}" -f $code, $name)
    } catch { }
}
"#;

#[derive(Debug, Clone)]
pub struct WindowsInstallerInventory {
    powershell: String,
}

impl WindowsInstallerInventory {
    pub fn new() -> Self {
        Self {
            powershell: "powershell.exe".to_string(),
        }
    }

    pub fn with_powershell(powershell: impl Into<String>) -> Self {
        Self {
            powershell: powershell.into(),
        }
    }
}

impl Default for WindowsInstallerInventory {
    fn default() -> Self {
        Self::new()
    }
}

/// 解析腳本輸出，格式不對的行略過
pub fn parse_product_listing(output: &str) -> Vec<Package> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let parsed = line
                .split_once('\t')
                .and_then(|(code, name)| Package::from_braced(name, code));
            if parsed.is_none() {
                tracing::debug!("Skipping unreadable product entry: {:?}", line);
            }
            parsed
        })
        .collect()
}

#[async_trait]
impl PackageInventory for WindowsInstallerInventory {
    async fn list_installed_packages(&self) -> Result<Vec<Package>> {
        let output = Command::new(&self.powershell)
            .args(["-NoProfile", "-NonInteractive", "-Command", LIST_PRODUCTS_SCRIPT])
            .stdin(Stdio::null())
            .output()
            .await;

        let output = match output {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!(
                    "⚠️ An error occurs while getting list of all MSI products installed on this computer: {}",
                    e
                );
                return Ok(Vec::new());
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::warn!(
                "⚠️ An error occurs while getting list of all MSI products installed on this computer: {}",
                stderr.trim()
            );
            return Ok(Vec::new());
        }

        Ok(parse_product_listing(&String::from_utf8_lossy(&output.stdout)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_product_listing() {
        let output = "{11111111-1111-1111-1111-111111111111}\tAcme Tool 1.0\r\n\
                      garbage line\r\n\
                      {2222}\tBroken Code\r\n\
                      \r\n\
                      {33333333-3333-3333-3333-333333333333}\tOther App\r\n";
        let packages = parse_product_listing(output);

        assert_eq!(
            packages,
            vec![
                Package::new("Acme Tool 1.0", "11111111-1111-1111-1111-111111111111"),
                Package::new("Other App", "33333333-3333-3333-3333-333333333333"),
            ]
        );
    }

    #[test]
    fn test_product_name_kept_verbatim() {
        let output = "{11111111-1111-1111-1111-111111111111}\t  Acme Tool  \r\n";
        let packages = parse_product_listing(output);

        assert_eq!(
            packages,
            vec![Package::new("  Acme Tool  ", "11111111-1111-1111-1111-111111111111")]
        );
    }

    #[tokio::test]
    async fn test_unreachable_subsystem_degrades_to_empty() {
        let inventory = WindowsInstallerInventory::with_powershell("definitely-not-powershell");
        let packages = inventory.list_installed_packages().await.unwrap();
        assert!(packages.is_empty());
    }
}
