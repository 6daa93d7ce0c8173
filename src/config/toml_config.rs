use crate::core::action::UninstallSettings;
use crate::core::runner::{RunnerSettings, DEFAULT_LOG_DIRECTORY, DEFAULT_UNINSTALLER};
use crate::utils::env::{expand_path, substitute_env_vars};
use crate::utils::error::{Result, UninstallError};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// settle delay 上限 (秒)
pub const MAX_SETTLE_DELAY_SECONDS: u64 = 300;

/// 動作設定檔
///
/// ```toml
/// [uninstall]
/// application_name = "Acme%"
/// exceptions = "Acme Helper"
/// parameters = ""
/// dont_uninstall_if_no_exception = false
/// kill_process = true
/// kill_after = 30
///
/// [runner]
/// settle_delay_seconds = 2
///
/// [inventory]
/// manifest = "products.toml"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub uninstall: UninstallSettings,
    pub runner: Option<RunnerConfig>,
    pub inventory: Option<InventoryConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunnerConfig {
    pub uninstaller: Option<String>,
    pub log_directory: Option<String>,
    pub settle_delay_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InventoryConfig {
    pub manifest: Option<PathBuf>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(UninstallError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置，缺欄位直接失敗
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| UninstallError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    pub fn runner_settings(&self) -> RunnerSettings {
        let runner = self.runner.clone().unwrap_or_default();
        let defaults = RunnerSettings::default();

        RunnerSettings {
            uninstaller: runner
                .uninstaller
                .map(|p| PathBuf::from(expand_path(&p)))
                .unwrap_or(defaults.uninstaller),
            log_directory: runner
                .log_directory
                .map(|p| PathBuf::from(expand_path(&p)))
                .unwrap_or(defaults.log_directory),
            settle_delay: runner
                .settle_delay_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.settle_delay),
        }
    }

    pub fn manifest(&self) -> Option<&Path> {
        self.inventory.as_ref()?.manifest.as_deref()
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.uninstall.validate()?;

        if let Some(runner) = &self.runner {
            validation::validate_path(
                "runner.uninstaller",
                runner.uninstaller.as_deref().unwrap_or(DEFAULT_UNINSTALLER),
            )?;
            validation::validate_path(
                "runner.log_directory",
                runner.log_directory.as_deref().unwrap_or(DEFAULT_LOG_DIRECTORY),
            )?;
            if let Some(delay) = runner.settle_delay_seconds {
                validation::validate_range(
                    "runner.settle_delay_seconds",
                    delay,
                    0,
                    MAX_SETTLE_DELAY_SECONDS,
                )?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
[uninstall]
application_name = "Acme%"
exceptions = "Acme Helper"
parameters = "REBOOT=ReallySuppress"
dont_uninstall_if_no_exception = false
kill_process = true
kill_after = 30

[runner]
uninstaller = "msiexec.exe"
log_directory = "logs"
settle_delay_seconds = 0

[inventory]
manifest = "products.toml"
"#;

    #[test]
    fn test_parse_full_config() {
        let config = TomlConfig::from_toml_str(FULL).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.uninstall.application_name, "Acme%");
        assert_eq!(config.uninstall.kill_after, 30);

        let runner = config.runner_settings();
        assert_eq!(runner.uninstaller, PathBuf::from("msiexec.exe"));
        assert_eq!(runner.log_directory, PathBuf::from("logs"));
        assert_eq!(runner.settle_delay, Duration::ZERO);
        assert_eq!(config.manifest(), Some(Path::new("products.toml")));
    }

    #[test]
    fn test_missing_required_field_is_an_error() {
        let content = r#"
[uninstall]
application_name = "Acme%"
exceptions = ""
parameters = ""
dont_uninstall_if_no_exception = false
kill_process = false
"#;
        let err = TomlConfig::from_toml_str(content).unwrap_err();
        assert!(err.to_string().contains("kill_after"));
    }

    #[test]
    fn test_gate_without_exceptions_is_valid() {
        let content = r#"
[uninstall]
application_name = ""
exceptions = ""
parameters = ""
dont_uninstall_if_no_exception = true
kill_process = true
kill_after = 5000
"#;
        let config = TomlConfig::from_toml_str(content).unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_runner_defaults() {
        let content = r#"
[uninstall]
application_name = "Acme%"
exceptions = ""
parameters = ""
dont_uninstall_if_no_exception = false
kill_process = false
kill_after = 0
"#;
        let config = TomlConfig::from_toml_str(content).unwrap();
        assert_eq!(config.runner_settings().settle_delay, Duration::from_secs(2));
        assert!(config.manifest().is_none());
    }
}
