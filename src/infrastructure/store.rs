//! Backup store: resolves where backups live and lists the ones that
//! belong to this machine.

use crate::config::AppConfig;
use crate::domain::entities::{Backup, BackupFilename};
use crate::domain::error::Result;
use crate::domain::machine_identity::local_machine_id;
use crate::domain::repositories::ToolDriver;
use crate::infrastructure::container::read_backup;
use std::path::{Path, PathBuf};

pub struct BackupStore {
    pub dir: PathBuf,
}

impl BackupStore {
    /// Resolves the directory backups live in. With `discover_via_mount`
    /// off (the default), this is just `config.backup_store_path`. With
    /// it on, every unmounted block device under `/dev` is mounted in
    /// turn at a scratch `tempfile::TempDir` and checked for a
    /// `backup.drive` marker file; first match wins and is left mounted
    /// at its own directory for the caller to read from.
    pub fn discover(config: &AppConfig, driver: &dyn ToolDriver) -> Result<Self> {
        if !config.discover_via_mount {
            return Ok(Self {
                dir: config.backup_store_path.clone(),
            });
        }

        for candidate in candidate_partitions() {
            let mount_point = tempfile::tempdir()?;
            let candidate_str = candidate.to_string_lossy().to_string();
            let mount_str = mount_point.path().to_string_lossy().to_string();

            if driver
                .run_collecting(&[&config.tools.mount, &candidate_str, &mount_str])
                .is_err()
            {
                continue;
            }

            let marker = mount_point.path().join("backup.drive");
            if marker.exists() {
                log::info!("found backup store marker on {candidate_str}");
                // `into_path` hands ownership of the directory to the
                // mount itself so it isn't removed when the TempDir drops.
                let dir = mount_point.into_path();
                return Ok(Self { dir });
            }

            let _ = driver.run_collecting(&[&config.tools.umount, &mount_str]);
        }

        Ok(Self {
            dir: config.backup_store_path.clone(),
        })
    }

    /// Lists every `backup_*` file in the store directory that parses
    /// (valid filename, valid container) and belongs to this machine.
    pub fn list_machine_backups(&self, driver: &dyn ToolDriver) -> Result<Vec<Backup>> {
        let machine_id = local_machine_id(driver);
        let mut backups = Vec::new();

        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if let Some(backup) = open_backup(&path) {
                if backup.valid && backup.machine_id() == machine_id {
                    backups.push(backup);
                }
            }
        }

        backups.sort_by_key(|b| b.filename.epoch_seconds);
        Ok(backups)
    }
}

fn open_backup(path: &Path) -> Option<Backup> {
    let name = path.file_name()?.to_str()?;
    let filename = BackupFilename::parse(name)?;
    let parsed = read_backup(path).ok()?;

    Some(Backup {
        path: path.to_path_buf(),
        filename,
        header_time: parsed.header_time,
        records: parsed.records,
        valid: parsed.valid,
    })
}

/// Every `/dev/sdX`/`/dev/nvme...` whole-device or partition node, used as
/// the candidate list for mount-based discovery. Best-effort: an
/// unreadable `/dev` just yields no candidates.
fn candidate_partitions() -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir("/dev") else {
        return Vec::new();
    };

    let mut candidates: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with("sd") || n.starts_with("nvme"))
                .unwrap_or(false)
        })
        .collect();
    candidates.sort();
    candidates
}
