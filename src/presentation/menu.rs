//! The bare, no-subcommand interactive menu: backup / restore / exit,
//! with a paged restore-selection list. This is the tool's original and
//! still default entry point.

use crate::application::backup_planner::BackupPlanner;
use crate::application::restore_sequencer::RestoreSequencer;
use crate::config::AppConfig;
use crate::domain::entities::{is_valid_description, Device};
use crate::domain::error::Result;
use crate::domain::repositories::{BlockDeviceReader, ToolDriver};
use crate::infrastructure::block_device::DiskDevice;
use crate::infrastructure::store::BackupStore;
use dialoguer::{Confirm, Input, Select};
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const PAGE_SIZE: usize = 10;

pub fn run(config: &AppConfig, driver: &dyn ToolDriver, device_path: &str) -> Result<()> {
    let store = BackupStore::discover(config, driver)?;
    let backups = store.list_machine_backups(driver)?;

    if !backups.is_empty() {
        println!("PREVIOUS BACKUPS FOUND FOR THIS MACHINE");
    }

    let choice = Select::new()
        .with_prompt("What do you want to do?")
        .items(&["backup", "restore", "exit"])
        .default(0)
        .interact()
        .map_err(to_io_error)?;

    match choice {
        0 => run_backup(config, driver, device_path),
        1 => run_restore(config, driver, device_path, &store).map(|_| ()),
        _ => Ok(()),
    }
}

fn run_backup(config: &AppConfig, driver: &dyn ToolDriver, device_path: &str) -> Result<()> {
    let description = loop {
        let desc: String = Input::new()
            .with_prompt("Type a descriptive name for this backup (letters, numbers, spaces, hyphens, max 24 chars)")
            .interact_text()
            .map_err(to_io_error)?;

        if is_valid_description(&desc) {
            break desc;
        }
        println!("INVALID DESCRIPTIVE NAME. TRY AGAIN.");
    };

    println!("STARTING BACKUP");

    let device = open_device(device_path)?;
    let planner = BackupPlanner::new(driver);
    let epoch = current_epoch();
    let path = planner.plan_and_write(&device, &config.backup_store_path, &description, epoch)?;

    println!("BACKUP COMPLETE: {}", path.display());
    Ok(())
}

fn run_restore(
    config: &AppConfig,
    driver: &dyn ToolDriver,
    device_path: &str,
    store: &BackupStore,
) -> Result<bool> {
    let mut backups = store.list_machine_backups(driver)?;
    if backups.is_empty() {
        println!("NO BACKUPS AVAILABLE FOR THIS MACHINE");
        return Ok(false);
    }
    backups.sort_by_key(|b| std::cmp::Reverse(b.filename.epoch_seconds));

    let mut page_start = 0usize;
    let index = loop {
        let page_end = (page_start + PAGE_SIZE).min(backups.len());
        let mut labels: Vec<String> = backups[page_start..page_end]
            .iter()
            .map(|b| format!("{} {}", b.filename.epoch_seconds, b.description()))
            .collect();
        labels.push("-- see next 10 --".to_string());
        labels.push("exit".to_string());

        let pick = Select::new()
            .with_prompt("Choose a backup to restore")
            .items(&labels)
            .default(0)
            .interact()
            .map_err(to_io_error)?;

        if pick == labels.len() - 1 {
            return Ok(false);
        }
        if pick == labels.len() - 2 {
            page_start = (page_start + PAGE_SIZE) % backups.len();
            continue;
        }
        break page_start + pick;
    };

    let chosen = &backups[index];
    let confirmed = Confirm::new()
        .with_prompt(format!(
            "Are you sure you wish to restore the backup {} {}?",
            chosen.filename.epoch_seconds,
            chosen.description()
        ))
        .default(false)
        .interact()
        .map_err(to_io_error)?;

    if !confirmed {
        return Ok(false);
    }

    println!("RESTORING BACKUP");
    let sequencer = RestoreSequencer::new(
        driver,
        Duration::from_secs(config.rescan_settle_delay_secs),
    );
    sequencer.restore(&chosen.path, Path::new(device_path))?;
    println!("RESTORATION DONE");
    Ok(true)
}

fn open_device(path: &str) -> Result<Device> {
    let reader = DiskDevice::open(path)?;
    Ok(Device::new(path, reader.size(), 512))
}

fn current_epoch() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn to_io_error(e: dialoguer::Error) -> crate::domain::error::DiskVaultError {
    match e {
        dialoguer::Error::IO(io) => io.into(),
    }
}
