use serde::{Deserialize, Serialize};
use std::fmt;

/// 產品代碼去掉大括號後的長度
pub const PRODUCT_CODE_LEN: usize = 36;

/// 已安裝的產品，身分由 `id` 決定
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    pub id: String,
}

impl Package {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }

    /// 從 `{XXXXXXXX-XXXX-XXXX-XXXX-XXXXXXXXXXXX}` 形式建立，格式不對回傳 None
    pub fn from_braced(name: impl Into<String>, braced_id: &str) -> Option<Self> {
        strip_braces(braced_id).map(|id| Self::new(name, id))
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

pub fn strip_braces(braced_id: &str) -> Option<&str> {
    let inner = braced_id.trim().strip_prefix('{')?.strip_suffix('}')?;
    if inner.len() == PRODUCT_CODE_LEN && inner.is_ascii() {
        Some(inner)
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Classification {
    Success,
    SuccessRebootRequired,
    Error,
}

impl Classification {
    pub const REBOOT_REQUIRED_CODE: i32 = 3010;

    /// 沒有結束代碼 (被 kill 或 signal) 一律算錯誤
    pub fn from_exit_code(exit_code: Option<i32>) -> Self {
        match exit_code {
            Some(0) => Self::Success,
            Some(Self::REBOOT_REQUIRED_CODE) => Self::SuccessRebootRequired,
            _ => Self::Error,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success | Self::SuccessRebootRequired)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    Exited,
    Killed,
    WaitFailed,
}

/// 執行一次外部程式的結果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub exit_code: Option<i32>,
    pub timed_out: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UninstallOutcome {
    pub package: Package,
    pub exit_code: Option<i32>,
    pub classification: Classification,
    pub termination: Termination,
    pub failure: Option<String>,
}

impl UninstallOutcome {
    pub fn from_run(package: Package, report: RunReport) -> Self {
        Self {
            package,
            exit_code: report.exit_code,
            classification: Classification::from_exit_code(report.exit_code),
            termination: if report.timed_out {
                Termination::Killed
            } else {
                Termination::Exited
            },
            failure: None,
        }
    }

    pub fn process_failure(package: Package, message: impl Into<String>) -> Self {
        Self {
            package,
            exit_code: None,
            classification: Classification::Error,
            termination: Termination::WaitFailed,
            failure: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_braces() {
        let code = "{12345678-1234-1234-1234-123456789ABC}";
        assert_eq!(strip_braces(code), Some("12345678-1234-1234-1234-123456789ABC"));
        assert_eq!(strip_braces("12345678-1234-1234-1234-123456789ABC"), None);
        assert_eq!(strip_braces("{short}"), None);
    }

    #[test]
    fn test_classification() {
        assert_eq!(Classification::from_exit_code(Some(0)), Classification::Success);
        assert_eq!(
            Classification::from_exit_code(Some(3010)),
            Classification::SuccessRebootRequired
        );
        assert_eq!(Classification::from_exit_code(Some(1603)), Classification::Error);
        assert_eq!(Classification::from_exit_code(None), Classification::Error);
    }

    #[test]
    fn test_outcome_preserves_error_code() {
        let package = Package::new("Acme Tool", "A".repeat(36));
        let outcome = UninstallOutcome::from_run(
            package.clone(),
            RunReport {
                exit_code: Some(1603),
                timed_out: false,
            },
        );
        assert_eq!(outcome.classification, Classification::Error);
        assert_eq!(outcome.exit_code, Some(1603));
        assert_eq!(outcome.termination, Termination::Exited);
        assert_eq!(outcome.package, package);
    }
}
