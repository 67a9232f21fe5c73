//! diskvault - whole-disk backup and restore tool

use anyhow::{Context, Result};
use clap::Parser;
use diskvault::application::BackupPlanner;
use diskvault::config::AppConfig;
use diskvault::domain::entities::Device;
use diskvault::domain::repositories::BlockDeviceReader;
use diskvault::infrastructure::block_device::DiskDevice;
use diskvault::infrastructure::store::BackupStore;
use diskvault::infrastructure::tool_driver::ProcessToolDriver;
use diskvault::presentation::cli::{format_bytes, Cli, Commands, ProgressReporter};
use diskvault::presentation::menu;
use std::time::{SystemTime, UNIX_EPOCH};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config = AppConfig::load(&cli.config).context("failed to load config")?;
    let driver = ProcessToolDriver::new();

    match cli.command {
        Some(Commands::Backup {
            device,
            description,
            store,
        }) => run_backup(&config, &driver, &device, &description, store.as_deref()),
        Some(Commands::Restore { device, backup, store }) => {
            run_restore(&config, &driver, &device, &backup, store.as_deref())
        }
        Some(Commands::List { store }) => run_list(&config, &driver, store.as_deref()),
        None => run_interactive(&config, &driver),
    }
}

fn run_backup(
    config: &AppConfig,
    driver: &ProcessToolDriver,
    device_path: &str,
    description: &str,
    store_override: Option<&std::path::Path>,
) -> Result<()> {
    let store_dir = store_override.unwrap_or(&config.backup_store_path);
    let reader = DiskDevice::open(device_path).context("failed to open device")?;
    let device_size = reader.size();
    let device = Device::new(device_path, device_size, 512);
    drop(reader);

    println!("device size: {}", format_bytes(device_size));
    let progress = ProgressReporter::for_device(device_size, "backing up device");

    let planner = BackupPlanner::new(driver);
    let epoch = current_epoch();
    let path = planner.plan_and_write(&device, store_dir, description, epoch)?;

    progress.set_position(device_size);
    progress.finish("backup complete");
    println!("backup written to {}", path.display());
    Ok(())
}

fn run_restore(
    config: &AppConfig,
    driver: &ProcessToolDriver,
    device_path: &str,
    backup_name: &str,
    store_override: Option<&std::path::Path>,
) -> Result<()> {
    let store_dir = store_override.unwrap_or(&config.backup_store_path);
    let backup_path = store_dir.join(backup_name);
    let backup_size = std::fs::metadata(&backup_path)
        .context("failed to stat backup file")?
        .len();

    println!("backup size: {}", format_bytes(backup_size));
    let progress = ProgressReporter::for_device(backup_size, "restoring device");

    let sequencer = diskvault::application::RestoreSequencer::new(
        driver,
        std::time::Duration::from_secs(config.rescan_settle_delay_secs),
    );
    sequencer.restore(&backup_path, std::path::Path::new(device_path))?;

    progress.set_position(backup_size);
    progress.finish("restore complete");
    Ok(())
}

fn run_list(config: &AppConfig, driver: &ProcessToolDriver, store_override: Option<&std::path::Path>) -> Result<()> {
    let mut config = config.clone();
    if let Some(dir) = store_override {
        config.backup_store_path = dir.to_path_buf();
    }
    let store = BackupStore::discover(&config, driver)?;
    let backups = store.list_machine_backups(driver)?;

    if backups.is_empty() {
        println!("no backups found for this machine");
        return Ok(());
    }

    for backup in backups {
        println!(
            "{}  {}  {}",
            backup.filename.epoch_seconds,
            backup.description(),
            backup.path.display()
        );
    }
    Ok(())
}

/// Mirrors the original tool's resilience to a full backup device or a
/// failing disk: retry the interactive session on any I/O error instead
/// of exiting.
fn run_interactive(config: &AppConfig, driver: &ProcessToolDriver) -> Result<()> {
    let device_path = config.backup_device.clone().unwrap_or_else(|| "/dev/sda".to_string());

    loop {
        match menu::run(config, driver, &device_path) {
            Ok(()) => return Ok(()),
            Err(diskvault::DiskVaultError::Io(e)) => {
                eprintln!("THE STORAGE DEVICE MAY BE FULL, OR THE TARGET DISK MAY BE BAD: {e}");
                eprintln!("PRESS ENTER TO CONTINUE");
                let mut discard = String::new();
                std::io::stdin().read_line(&mut discard).ok();
            }
            Err(e) => return Err(e.into()),
        }
    }
}

fn current_epoch() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
