use crate::core::action::ActionConfig;
use crate::domain::model::{Package, UninstallOutcome};
use crate::utils::error::Result;
use async_trait::async_trait;

/// 主機上的套件管理子系統
///
/// 子系統整體連不上時實作應回傳空清單並記 warning；`Err` 只留給呼叫端
/// 必須中止的意外狀況。
#[async_trait]
pub trait PackageInventory: Send + Sync {
    async fn list_installed_packages(&self) -> Result<Vec<Package>>;
}

/// 移除單一套件，任何失敗都要轉成 [`UninstallOutcome`]，不能往外丟
#[async_trait]
pub trait Uninstaller: Send + Sync {
    async fn uninstall(&self, package: &Package, config: &ActionConfig) -> UninstallOutcome;
}
