use crate::core::runner::{run_bounded, Invocation, WaitPolicy};
use crate::utils::env::expand_path;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

pub const REGSVR32: &str = "regsvr32.exe";
pub const UNREGISTER_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnregisterReport {
    pub full_path: PathBuf,
    pub file_found: bool,
    pub exit_code: Option<i32>,
    pub timed_out: bool,
    pub failure: Option<String>,
}

impl UnregisterReport {
    pub fn succeeded(&self) -> bool {
        !self.timed_out && self.failure.is_none() && self.exit_code == Some(0)
    }
}

/// 用 regsvr32 取消註冊 DLL，逾時固定 10 秒，逾時一定 kill
#[derive(Debug, Clone)]
pub struct UnregisterDllAction {
    full_path: String,
    tool: PathBuf,
    timeout: Duration,
}

impl UnregisterDllAction {
    pub fn new(full_path: impl Into<String>) -> Self {
        Self {
            full_path: full_path.into(),
            tool: PathBuf::from(REGSVR32),
            timeout: UNREGISTER_TIMEOUT,
        }
    }

    /// 測試用，換掉 regsvr32 與逾時
    pub fn with_tool(mut self, tool: impl Into<PathBuf>, timeout: Duration) -> Self {
        self.tool = tool.into();
        self.timeout = timeout;
        self
    }

    pub fn invocation(&self, expanded: &str) -> Invocation {
        Invocation::new(&self.tool).arg("/s").arg("/u").arg(expanded)
    }

    pub async fn run(&self) -> UnregisterReport {
        tracing::info!("Running UnregisterDLL. FullPath = {}", self.full_path);

        let expanded = expand_path(&self.full_path);
        let full_path = PathBuf::from(&expanded);
        let file_found = full_path.exists();
        if !file_found {
            tracing::warn!("⚠️ The file was not found on this system: {}", expanded);
        }

        let mut report = UnregisterReport {
            full_path,
            file_found,
            exit_code: None,
            timed_out: false,
            failure: None,
        };

        match run_bounded(&self.invocation(&expanded), WaitPolicy::KillAfter(self.timeout)).await {
            Ok(run) => {
                report.exit_code = run.exit_code;
                report.timed_out = run.timed_out;
                if run.timed_out {
                    tracing::warn!("⚠️ regsvr32 did not finish in {:?}, process killed", self.timeout);
                } else {
                    tracing::info!("Process stop by itself. Returned code: {:?}", run.exit_code);
                }
                if report.succeeded() {
                    tracing::info!("✅ DLL has been successfully unregistered.");
                }
            }
            Err(e) => {
                tracing::error!("❌ An error occurs while unregistering DLL {}: {}", expanded, e);
                report.failure = Some(e.to_string());
            }
        }

        tracing::info!("End of UnregisterDLL");
        report
    }
}
