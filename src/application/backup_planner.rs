//! Backup planning: walks the device's partition table left to right,
//! emitting a `RAW_GAP` record for every stretch of the device not
//! covered by a partition and a `SPECIALIZED`/`OPAQUE_PART` record for
//! each partition itself.

use crate::domain::entities::{is_valid_description, BackupFilename, Device, PartitionEntry, RecordKind};
use crate::domain::error::{DiskVaultError, Result};
use crate::domain::machine_identity::local_machine_id;
use crate::domain::repositories::ToolDriver;
use crate::infrastructure::container::ContainerWriter;
use crate::infrastructure::partition_prober;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

pub struct BackupPlanner<'a> {
    driver: &'a dyn ToolDriver,
}

impl<'a> BackupPlanner<'a> {
    pub fn new(driver: &'a dyn ToolDriver) -> Self {
        Self { driver }
    }

    /// Plans and writes a complete backup of `device` to `store_dir`,
    /// returning the path written. `description` is validated before any
    /// I/O happens, per the container filename grammar.
    pub fn plan_and_write(
        &self,
        device: &Device,
        store_dir: &Path,
        description: &str,
        epoch_seconds: u64,
    ) -> Result<PathBuf> {
        if !is_valid_description(description) {
            return Err(DiskVaultError::InvalidDescription(description.to_string()));
        }

        let machine_id = local_machine_id(self.driver);
        let filename = BackupFilename::format(&machine_id, description, epoch_seconds);
        let out_path = store_dir.join(&filename);

        let mut partitions = partition_prober::list_partitions(self.driver, device);
        partitions.sort_by_key(|p| p.start);

        let mut writer = ContainerWriter::create(&out_path)?;
        writer.write_header(epoch_seconds)?;

        let mut coffset: u64 = 0;
        let mut remaining = partitions;

        loop {
            let nearest = select_nearest(&remaining, coffset);

            match nearest {
                Some(index) => {
                    let part = remaining.remove(index);
                    let gap_len = part.start - coffset;
                    self.write_gap(&mut writer, &device.path, coffset, gap_len)?;
                    self.write_partition(&mut writer, &part)?;
                    coffset = part.end + 1;
                }
                None => {
                    let gap_len = device.size - coffset;
                    // Unlike the leading/interior gaps above, a zero-length
                    // trailing gap is omitted: a partition ending at
                    // device_size - 1 leaves nothing after it worth a record.
                    if gap_len > 0 {
                        self.write_gap(&mut writer, &device.path, coffset, gap_len)?;
                    }
                    break;
                }
            }
        }

        writer.finish()?;
        Ok(out_path)
    }

    fn write_gap(
        &self,
        writer: &mut ContainerWriter,
        device_path: &Path,
        offset: u64,
        length: u64,
    ) -> Result<()> {
        let mut source = File::open(device_path)?;
        source.seek(SeekFrom::Start(offset))?;
        let mut limited = (&mut source).take(length);
        writer.write_record(RecordKind::RawGap, offset, &mut limited)?;
        Ok(())
    }

    fn write_partition(&self, writer: &mut ContainerWriter, part: &PartitionEntry) -> Result<()> {
        if part.is_specialized {
            let mut child = self.driver.spawn_stream(
                &["ntfsclone", &part.device_path, "-s", "-o", "-"],
                crate::domain::repositories::StdioMode::Null,
                crate::domain::repositories::StdioMode::Piped,
            )?;
            let mut stdout = child
                .stdout
                .take()
                .expect("spawn_stream requested a piped stdout");
            writer.write_record(RecordKind::Specialized, 0, &mut stdout)?;
            crate::infrastructure::tool_driver::reap("ntfsclone", child)?;
        } else {
            let mut source = File::open(&part.device_path)?;
            writer.write_record(RecordKind::OpaquePart, 0, &mut source)?;
        }
        Ok(())
    }
}

/// Picks the partition with the smallest non-negative `start - coffset`
/// delta, breaking ties by the lowest `start` (stable since partitions
/// are already sorted by start, `min_by_key` keeps the first).
fn select_nearest(partitions: &[PartitionEntry], coffset: u64) -> Option<usize> {
    partitions
        .iter()
        .enumerate()
        .filter(|(_, p)| p.start >= coffset)
        .min_by_key(|(_, p)| (p.start - coffset, p.start))
        .map(|(i, _)| i)
}
