use crate::core::matcher::PatternSet;
use crate::core::selection::{self, Selection};
use crate::domain::model::{Classification, Package, UninstallOutcome};
use crate::domain::ports::{PackageInventory, Uninstaller};
use crate::utils::error::{Result, UninstallError};
use crate::utils::validation::Validate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 超過這個分鐘數的 kill_after 只提醒，不擋
pub const LONG_KILL_AFTER_MINUTES: u64 = 24 * 60;

/// 外部設定來源給的原始欄位，全部都是必填
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UninstallSettings {
    pub application_name: String,
    pub exceptions: String,
    pub parameters: String,
    pub dont_uninstall_if_no_exception: bool,
    pub kill_process: bool,
    pub kill_after: u64,
}

impl UninstallSettings {
    /// 合法但多半是設定錯誤的組合
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if is_blank_list(&self.application_name) {
            warnings.push("application_name has no pattern, nothing will be uninstalled".to_string());
        }
        if self.dont_uninstall_if_no_exception && is_blank_list(&self.exceptions) {
            warnings.push(
                "dont_uninstall_if_no_exception is set without exceptions, nothing will be uninstalled"
                    .to_string(),
            );
        }
        if self.kill_process && self.kill_after > LONG_KILL_AFTER_MINUTES {
            warnings.push(format!(
                "kill_after is {} minutes, uninstallers may hang for more than a day",
                self.kill_after
            ));
        }

        warnings
    }
}

fn is_blank_list(value: &str) -> bool {
    value.split(';').all(|entry| entry.is_empty())
}

impl Validate for UninstallSettings {
    fn validate(&self) -> Result<()> {
        for warning in self.warnings() {
            tracing::warn!("⚠️ {}", warning);
        }
        Ok(())
    }
}

/// 建好之後就不會再變的動作設定
#[derive(Debug, Clone)]
pub struct ActionConfig {
    pub target_patterns: PatternSet,
    pub exception_patterns: PatternSet,
    pub extra_args: String,
    pub gate_on_exception: bool,
    pub force_kill: bool,
    pub kill_after_minutes: u64,
}

impl TryFrom<UninstallSettings> for ActionConfig {
    type Error = UninstallError;

    fn try_from(settings: UninstallSettings) -> Result<Self> {
        Ok(Self {
            target_patterns: PatternSet::parse(&settings.application_name)?,
            exception_patterns: PatternSet::parse(&settings.exceptions)?,
            extra_args: settings.parameters,
            gate_on_exception: settings.dont_uninstall_if_no_exception,
            force_kill: settings.kill_process,
            kill_after_minutes: settings.kill_after,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UninstallReport {
    pub packages_found: usize,
    pub gate_passed: bool,
    pub outcomes: Vec<UninstallOutcome>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl UninstallReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.classification.is_success())
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn reboot_required(&self) -> bool {
        self.outcomes
            .iter()
            .any(|o| o.classification == Classification::SuccessRebootRequired)
    }
}

/// 依名稱移除已安裝產品
pub struct UninstallAction<I: PackageInventory, U: Uninstaller> {
    inventory: I,
    uninstaller: U,
    config: ActionConfig,
}

impl<I: PackageInventory, U: Uninstaller> UninstallAction<I, U> {
    pub fn new(inventory: I, uninstaller: U, config: ActionConfig) -> Self {
        Self {
            inventory,
            uninstaller,
            config,
        }
    }

    pub fn config(&self) -> &ActionConfig {
        &self.config
    }

    /// 只做到挑選為止，不執行移除
    pub async fn plan(&self) -> Result<Selection> {
        let installed = self.list_inventory().await?;
        Ok(selection::plan(&installed, &self.config))
    }

    pub async fn run(&self) -> Result<UninstallReport> {
        let started_at = Utc::now();
        tracing::info!(
            "🚀 Running uninstall by name. ApplicationName={} Exceptions={} Parameters={}",
            self.config.target_patterns,
            self.config.exception_patterns,
            self.config.extra_args
        );

        let installed = self.list_inventory().await?;

        let mut report = UninstallReport {
            packages_found: installed.len(),
            gate_passed: false,
            outcomes: Vec::new(),
            started_at,
            finished_at: started_at,
        };

        if !selection::should_proceed(&installed, &self.config) {
            tracing::info!("⏭️ No exception installed, nothing will be uninstalled");
            report.finished_at = Utc::now();
            return Ok(report);
        }
        report.gate_passed = true;

        tracing::info!("🔍 Searching products to uninstall");
        let targets = selection::compute_uninstall_set(&installed, &self.config);
        tracing::info!("{} products to uninstall", targets.len());

        // 一次只跑一個 msiexec
        for package in &targets {
            let outcome = self.uninstaller.uninstall(package, &self.config).await;
            report.outcomes.push(outcome);
        }

        report.finished_at = Utc::now();
        tracing::info!(
            "✅ End of uninstall by name: {} succeeded, {} failed",
            report.succeeded(),
            report.failed()
        );
        Ok(report)
    }

    async fn list_inventory(&self) -> Result<Vec<Package>> {
        tracing::info!("Getting all installed products on this computer");
        match self.inventory.list_installed_packages().await {
            Ok(installed) => {
                tracing::info!("Found {} products installed", installed.len());
                Ok(installed)
            }
            Err(e) => {
                tracing::error!("❌ An error occurs while preparing uninstallation: {}", e);
                Err(e)
            }
        }
    }
}
