//! 外部程式執行與逾時處理
//!
//! 啟動是非阻塞的，等待分成兩條路：有期限 ([`WaitPolicy::KillAfter`]) 或
//! 無限期 ([`WaitPolicy::Unbounded`])。逾時後才另外一步強制結束程序。

use crate::core::action::ActionConfig;
use crate::domain::model::{Classification, Package, RunReport, UninstallOutcome};
use crate::domain::ports::Uninstaller;
use crate::utils::env::expand_path;
use crate::utils::error::{Result, UninstallError};
use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::process::{Child, Command};

pub const DEFAULT_UNINSTALLER: &str = r"%windir%\system32\msiexec.exe";
pub const DEFAULT_LOG_DIRECTORY: &str = r"%windir%\Temp";
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(2);

/// 要執行的指令
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    /// 呼叫端給的額外參數，原封不動接在最後
    pub raw_tail: Option<String>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            raw_tail: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn raw_tail(mut self, tail: &str) -> Self {
        if !tail.trim().is_empty() {
            self.raw_tail = Some(tail.to_string());
        }
        self
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        if let Some(tail) = &self.raw_tail {
            #[cfg(windows)]
            {
                cmd.raw_arg(tail);
            }
            #[cfg(not(windows))]
            {
                cmd.args(tail.split_whitespace());
            }
        }

        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        cmd
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        if let Some(tail) = &self.raw_tail {
            write!(f, " {}", tail)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitPolicy {
    Unbounded,
    KillAfter(Duration),
}

impl WaitPolicy {
    pub fn from_config(config: &ActionConfig) -> Self {
        if config.force_kill {
            Self::KillAfter(Duration::from_secs(config.kill_after_minutes.saturating_mul(60)))
        } else {
            Self::Unbounded
        }
    }
}

#[derive(Debug)]
pub enum WaitOutcome {
    Exited(ExitStatus),
    TimedOut,
    Failed(std::io::Error),
}

async fn wait_for_exit(child: &mut Child, policy: WaitPolicy) -> WaitOutcome {
    match policy {
        WaitPolicy::Unbounded => match child.wait().await {
            Ok(status) => WaitOutcome::Exited(status),
            Err(e) => WaitOutcome::Failed(e),
        },
        WaitPolicy::KillAfter(limit) => match tokio::time::timeout(limit, child.wait()).await {
            Ok(Ok(status)) => WaitOutcome::Exited(status),
            Ok(Err(e)) => WaitOutcome::Failed(e),
            Err(_) => WaitOutcome::TimedOut,
        },
    }
}

/// 啟動程式並依 `policy` 等待；逾時就強制結束
pub async fn run_bounded(invocation: &Invocation, policy: WaitPolicy) -> Result<RunReport> {
    tracing::debug!("Starting process: {}", invocation);
    let mut child = invocation.command().spawn().map_err(|e| {
        UninstallError::process(format!(
            "failed to start {}: {}",
            invocation.program.display(),
            e
        ))
    })?;

    match wait_for_exit(&mut child, policy).await {
        WaitOutcome::Exited(status) => {
            tracing::info!("Exiting process with exit code: {:?}", status.code());
            Ok(RunReport {
                exit_code: status.code(),
                timed_out: false,
            })
        }
        WaitOutcome::TimedOut => {
            match child.kill().await {
                Ok(()) => tracing::info!("🔪 Process killed."),
                Err(e) => tracing::warn!("⚠️ Unable to kill process: {}", e),
            }
            let exit_code = child.try_wait().ok().flatten().and_then(|s| s.code());
            Ok(RunReport {
                exit_code,
                timed_out: true,
            })
        }
        WaitOutcome::Failed(e) => Err(UninstallError::process(format!(
            "the process is already stopped or doesn't have start: {}",
            e
        ))),
    }
}

#[derive(Debug, Clone)]
pub struct RunnerSettings {
    pub uninstaller: PathBuf,
    pub log_directory: PathBuf,
    pub settle_delay: Duration,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            uninstaller: PathBuf::from(expand_path(DEFAULT_UNINSTALLER)),
            log_directory: PathBuf::from(expand_path(DEFAULT_LOG_DIRECTORY)),
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

/// 用 msiexec 移除套件
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    settings: RunnerSettings,
}

impl ProcessRunner {
    pub fn new(settings: RunnerSettings) -> Self {
        Self { settings }
    }

    pub fn log_path(&self, package: &Package) -> PathBuf {
        log_path_in(&self.settings.log_directory, package)
    }

    pub fn invocation_for(&self, package: &Package, config: &ActionConfig) -> Invocation {
        Invocation::new(&self.settings.uninstaller)
            .arg(format!("/X{{{}}}", package.id))
            .arg("/qn")
            .arg("/norestart")
            .arg("/log")
            .arg(self.log_path(package).display().to_string())
            .raw_tail(&config.extra_args)
    }

    fn log_outcome(outcome: &UninstallOutcome) {
        let name = &outcome.package.name;
        match outcome.classification {
            Classification::Success => tracing::info!("✅ Successfully uninstalled {}", name),
            Classification::SuccessRebootRequired => {
                tracing::info!("✅ Successfully uninstalled {} (A restart is required)", name)
            }
            Classification::Error => match outcome.exit_code {
                Some(code) => tracing::error!(
                    "❌ An error occurs while uninstalling {} (MsiError: {})",
                    name,
                    code
                ),
                None => tracing::error!(
                    "❌ An error occurs while uninstalling {} (no exit code)",
                    name
                ),
            },
        }
    }
}

fn log_path_in(directory: &Path, package: &Package) -> PathBuf {
    directory.join(format!("Uninstall-{}.log", package.id))
}

#[async_trait]
impl Uninstaller for ProcessRunner {
    async fn uninstall(&self, package: &Package, config: &ActionConfig) -> UninstallOutcome {
        tracing::info!("🗑️ Starting uninstallation of: {}", package.name);
        let invocation = self.invocation_for(package, config);

        let outcome = match run_bounded(&invocation, WaitPolicy::from_config(config)).await {
            Ok(report) => UninstallOutcome::from_run(package.clone(), report),
            Err(e) => {
                tracing::error!("❌ An error occurs while uninstalling {}: {}", package.name, e);
                UninstallOutcome::process_failure(package.clone(), e.to_string())
            }
        };
        Self::log_outcome(&outcome);

        // 讓 Windows Installer 放掉資料庫鎖
        tokio::time::sleep(self.settings.settle_delay).await;
        outcome
    }
}
