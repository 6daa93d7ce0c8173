use crate::core::action::ActionConfig;
use crate::domain::model::Package;
use serde::Serialize;

/// 乾跑時用：閘門結果加上要移除的套件
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub gate_passed: bool,
    pub packages: Vec<Package>,
}

/// 閘門檢查
///
/// 沒開啟 `gate_on_exception` 時永遠放行；開啟時至少要有一個已安裝套件
/// 符合例外 pattern 才繼續。找到第一個就停。
pub fn should_proceed(inventory: &[Package], config: &ActionConfig) -> bool {
    if !config.gate_on_exception {
        return true;
    }

    tracing::info!("Searching at least one exception in installed products");
    for package in inventory {
        if let Some(exception) = config.exception_patterns.first_match(&package.name) {
            tracing::info!(
                "At least one exception is installed: {} match exception {}",
                package,
                exception
            );
            return true;
        }
    }

    tracing::info!("No installed products are matching exception");
    false
}

/// 計算要移除的套件，保持 inventory 順序，每個套件最多出現一次
pub fn compute_uninstall_set(inventory: &[Package], config: &ActionConfig) -> Vec<Package> {
    let mut selected = Vec::new();

    for package in inventory {
        for target in config.target_patterns.iter() {
            if !target.is_match(&package.name) {
                continue;
            }

            if let Some(exception) = config.exception_patterns.first_match(&package.name) {
                tracing::info!(
                    "{} match exception {} (it won't be uninstalled)",
                    package.name,
                    exception
                );
            } else {
                tracing::info!("{} is selected for uninstallation", package);
                selected.push(package.clone());
            }
            // 第一個命中的 target 就決定結果
            break;
        }
    }

    selected
}

pub fn plan(inventory: &[Package], config: &ActionConfig) -> Selection {
    if !should_proceed(inventory, config) {
        return Selection {
            gate_passed: false,
            packages: Vec::new(),
        };
    }

    Selection {
        gate_passed: true,
        packages: compute_uninstall_set(inventory, config),
    }
}
