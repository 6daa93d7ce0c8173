use clap::Parser;
use small_uninstall::config::cli::{Command, ListArgs, UninstallArgs};
use small_uninstall::core::matcher::NamePattern;
use small_uninstall::core::PackageInventory;
use small_uninstall::utils::error::{ErrorSeverity, UninstallError};
use small_uninstall::utils::{logger, validation::Validate};
use small_uninstall::{
    ActionConfig, CliConfig, ManifestInventory, ProcessRunner, UninstallAction,
    UnregisterDllAction, WindowsInstallerInventory,
};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(config.verbose, config.log_format);

    tracing::info!("Starting small-uninstall");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    let result = match &config.command {
        Command::Uninstall(args) => uninstall(args).await,
        Command::List(args) => list(args).await,
        Command::UnregisterDll { full_path } => {
            let report = UnregisterDllAction::new(full_path.as_str()).run().await;
            if report.succeeded() {
                println!("✅ Unregistered {}", report.full_path.display());
                Ok(0)
            } else {
                println!("❌ Unregistering {} did not succeed", report.full_path.display());
                Ok(2)
            }
        }
    };

    match result {
        Ok(0) => Ok(()),
        Ok(code) => std::process::exit(code),
        Err(e) => {
            tracing::error!(
                "❌ small-uninstall failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            std::process::exit(exit_code);
        }
    }
}

async fn uninstall(args: &UninstallArgs) -> Result<i32, UninstallError> {
    let resolved = args.resolve()?;
    resolved.validate()?;

    if !resolved.settings.kill_process {
        tracing::warn!("⚠️ kill_process is off: a hung msiexec will block this run forever");
    }

    let action_config = ActionConfig::try_from(resolved.settings.clone())?;
    let runner = ProcessRunner::new(resolved.runner.clone());

    match &resolved.manifest {
        Some(path) => {
            run_action(ManifestInventory::new(path), runner, action_config, args).await
        }
        None => run_action(WindowsInstallerInventory::new(), runner, action_config, args).await,
    }
}

async fn run_action<I: PackageInventory>(
    inventory: I,
    runner: ProcessRunner,
    config: ActionConfig,
    args: &UninstallArgs,
) -> Result<i32, UninstallError> {
    let action = UninstallAction::new(inventory, runner, config);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - msiexec will not be started");
        let selection = action.plan().await?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&selection)?);
        } else if !selection.gate_passed {
            println!("No exception product installed, nothing would be uninstalled");
        } else {
            println!("{} products would be uninstalled:", selection.packages.len());
            for package in &selection.packages {
                println!("  {}", package);
            }
        }
        return Ok(0);
    }

    let report = action.run().await?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "✅ {} products found, {} uninstalled, {} failed",
            report.packages_found,
            report.succeeded(),
            report.failed()
        );
        if report.reboot_required() {
            println!("🔁 A restart is required to complete the uninstallation");
        }
    }

    Ok(if report.failed() > 0 { 2 } else { 0 })
}

async fn list(args: &ListArgs) -> Result<i32, UninstallError> {
    let filter = args.filter.as_deref().map(NamePattern::new).transpose()?;
    let packages = match &args.manifest {
        Some(path) => list_from(ManifestInventory::new(PathBuf::from(path))).await?,
        None => list_from(WindowsInstallerInventory::new()).await?,
    };

    for package in packages
        .iter()
        .filter(|p| filter.as_ref().map_or(true, |f| f.is_match(&p.name)))
    {
        println!("{}\t{}", package.id, package.name);
    }
    Ok(0)
}

async fn list_from<I: PackageInventory>(
    inventory: I,
) -> Result<Vec<small_uninstall::Package>, UninstallError> {
    inventory.list_installed_packages().await
}
