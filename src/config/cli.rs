use crate::config::toml_config::{TomlConfig, MAX_SETTLE_DELAY_SECONDS};
use crate::core::action::UninstallSettings;
use crate::core::runner::RunnerSettings;
use crate::utils::error::Result;
use crate::utils::logger::LogFormat;
use crate::utils::validation::{self, Validate};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Parser)]
#[command(name = "small-uninstall")]
#[command(about = "Uninstall Windows Installer products by name pattern")]
pub struct CliConfig {
    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Uninstall every product whose name matches the target patterns
    Uninstall(UninstallArgs),
    /// List installed products
    List(ListArgs),
    /// Unregister a COM DLL with regsvr32
    UnregisterDll {
        /// DLL path, %VAR% references are expanded
        full_path: String,
    },
}

#[derive(Debug, Clone, Args)]
pub struct UninstallArgs {
    /// TOML action file; replaces the pattern/kill flags below
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Semicolon separated name patterns (% = any sequence, _ = one character)
    #[arg(long, required_unless_present = "config")]
    pub application_name: Option<String>,

    /// Semicolon separated patterns that are never uninstalled
    #[arg(long, default_value = "")]
    pub exceptions: String,

    /// Extra arguments passed verbatim to msiexec
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub parameters: String,

    /// Only uninstall when at least one exception product is installed
    #[arg(long)]
    pub dont_uninstall_if_no_exception: bool,

    /// Kill msiexec when it runs longer than --kill-after minutes
    #[arg(long)]
    pub kill_process: bool,

    #[arg(long, default_value_t = 30)]
    pub kill_after: u64,

    /// Read installed products from a TOML manifest instead of Windows Installer
    #[arg(long)]
    pub manifest: Option<PathBuf>,

    /// Seconds to wait after each uninstall
    #[arg(long)]
    pub settle_delay: Option<u64>,

    /// Show what would be uninstalled without running msiexec
    #[arg(long)]
    pub dry_run: bool,

    /// Print the final report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Args)]
pub struct ListArgs {
    /// Only show products matching this pattern
    #[arg(long)]
    pub filter: Option<String>,

    #[arg(long)]
    pub manifest: Option<PathBuf>,
}

/// 命令列與設定檔合併後的結果
#[derive(Debug, Clone)]
pub struct ResolvedUninstall {
    pub settings: UninstallSettings,
    pub runner: RunnerSettings,
    pub manifest: Option<PathBuf>,
}

impl Validate for ResolvedUninstall {
    fn validate(&self) -> Result<()> {
        self.settings.validate()?;
        validation::validate_path(
            "uninstaller",
            &self.runner.uninstaller.display().to_string(),
        )?;
        if let Some(manifest) = &self.manifest {
            validation::validate_path("manifest", &manifest.display().to_string())?;
        }
        validation::validate_range(
            "settle_delay",
            self.runner.settle_delay.as_secs(),
            0,
            MAX_SETTLE_DELAY_SECONDS,
        )?;
        Ok(())
    }
}

impl UninstallArgs {
    pub fn resolve(&self) -> Result<ResolvedUninstall> {
        let mut resolved = match &self.config {
            Some(path) => {
                tracing::info!("📁 Loading configuration from: {}", path.display());
                let file = TomlConfig::from_file(path)?;
                file.validate()?;
                ResolvedUninstall {
                    runner: file.runner_settings(),
                    manifest: file.manifest().map(PathBuf::from),
                    settings: file.uninstall,
                }
            }
            None => {
                let application_name =
                    validation::validate_required_field("application_name", &self.application_name)?;
                ResolvedUninstall {
                    settings: UninstallSettings {
                        application_name: application_name.clone(),
                        exceptions: self.exceptions.clone(),
                        parameters: self.parameters.clone(),
                        dont_uninstall_if_no_exception: self.dont_uninstall_if_no_exception,
                        kill_process: self.kill_process,
                        kill_after: self.kill_after,
                    },
                    runner: RunnerSettings::default(),
                    manifest: None,
                }
            }
        };

        // 命令列優先
        if let Some(manifest) = &self.manifest {
            resolved.manifest = Some(manifest.clone());
        }
        if let Some(seconds) = self.settle_delay {
            resolved.runner.settle_delay = Duration::from_secs(seconds);
        }

        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_uninstall_flags() {
        let cli = CliConfig::parse_from([
            "small-uninstall",
            "uninstall",
            "--application-name",
            "Acme%",
            "--exceptions",
            "Acme Helper",
            "--kill-process",
            "--kill-after",
            "5",
            "--settle-delay",
            "0",
        ]);

        let Command::Uninstall(args) = cli.command else {
            panic!("expected uninstall subcommand");
        };
        let resolved = args.resolve().unwrap();
        assert!(resolved.validate().is_ok());
        assert_eq!(resolved.settings.application_name, "Acme%");
        assert_eq!(resolved.settings.exceptions, "Acme Helper");
        assert!(resolved.settings.kill_process);
        assert_eq!(resolved.settings.kill_after, 5);
        assert_eq!(resolved.runner.settle_delay, Duration::ZERO);
    }

    #[test]
    fn test_gate_without_exceptions_is_accepted() {
        let cli = CliConfig::parse_from([
            "small-uninstall",
            "uninstall",
            "--application-name",
            "Acme%",
            "--dont-uninstall-if-no-exception",
        ]);

        let Command::Uninstall(args) = cli.command else {
            panic!("expected uninstall subcommand");
        };
        let resolved = args.resolve().unwrap();
        assert!(resolved.validate().is_ok());
        assert!(resolved.settings.dont_uninstall_if_no_exception);
        assert!(resolved.settings.exceptions.is_empty());
    }

    #[test]
    fn test_settle_delay_out_of_range() {
        let cli = CliConfig::parse_from([
            "small-uninstall",
            "uninstall",
            "--application-name",
            "Acme%",
            "--settle-delay",
            "301",
        ]);

        let Command::Uninstall(args) = cli.command else {
            panic!("expected uninstall subcommand");
        };
        assert!(args.resolve().unwrap().validate().is_err());
    }

    #[test]
    fn test_application_name_required_without_config() {
        let result = CliConfig::try_parse_from(["small-uninstall", "uninstall"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_unregister_dll() {
        let cli = CliConfig::parse_from([
            "small-uninstall",
            "--verbose",
            "unregister-dll",
            r"%ProgramFiles%\Acme\acme.dll",
        ]);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::UnregisterDll { .. }));
    }
}
