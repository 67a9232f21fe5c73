//! Restore sequencing: writes the raw (non-partition) records back to the
//! device first, rescans the partition table, then writes the
//! partition-addressed records by their running index.

use crate::domain::entities::{ContainerRecordRef, RecordKind};
use crate::domain::error::{DiskVaultError, Result};
use crate::domain::repositories::{StdioMode, ToolDriver};
use crate::infrastructure::codec::{StreamingDecompressor, MAX_CHUNK};
use crate::infrastructure::container::read_backup_strict;
use crate::infrastructure::tool_driver::reap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::thread;
use std::time::Duration;

pub struct RestoreSequencer<'a> {
    driver: &'a dyn ToolDriver,
    rescan_settle_delay: Duration,
}

impl<'a> RestoreSequencer<'a> {
    pub fn new(driver: &'a dyn ToolDriver, rescan_settle_delay: Duration) -> Self {
        Self {
            driver,
            rescan_settle_delay,
        }
    }

    /// Restores `backup_path` onto `device_path`. Validates the whole
    /// container before writing a single byte (spec's validate-before-apply
    /// rule): a malformed container returns `BadContainer` and the device
    /// is never touched.
    pub fn restore(&self, backup_path: &Path, device_path: &Path) -> Result<()> {
        let parsed = read_backup_strict(backup_path)?;

        let (raw, partitioned): (Vec<_>, Vec<_>) = parsed
            .records
            .into_iter()
            .partition(|r| r.kind == RecordKind::RawGap);

        for record in &raw {
            self.write_raw(device_path, record)?;
        }

        self.rescan(device_path)?;

        for (index, record) in partitioned.iter().enumerate() {
            let partition_number = index + 1;
            let partition_path = partition_device_path(device_path, partition_number);
            self.write_partition(&partition_path, record)?;
        }

        Ok(())
    }

    fn write_raw(&self, device_path: &Path, record: &ContainerRecordRef) -> Result<()> {
        let mut target = OpenOptions::new().write(true).open(device_path)?;
        target.seek(SeekFrom::Start(record.target_offset))?;
        stream_decompress_into(record, &mut target)
    }

    fn write_partition(&self, partition_path: &Path, record: &ContainerRecordRef) -> Result<()> {
        match record.kind {
            RecordKind::Specialized => self.write_specialized(partition_path, record),
            RecordKind::OpaquePart => {
                let mut target = OpenOptions::new().write(true).open(partition_path)?;
                stream_decompress_into(record, &mut target)
            }
            RecordKind::RawGap => unreachable!("raw records are filtered out before this point"),
        }
    }

    fn write_specialized(&self, partition_path: &Path, record: &ContainerRecordRef) -> Result<()> {
        let partition_str = partition_path.to_string_lossy().to_string();
        let mut child = self.driver.spawn_stream(
            &["ntfsclone", "-", "-r", "--overwrite", &partition_str],
            StdioMode::Piped,
            StdioMode::Null,
        )?;
        let stdin = child.stdin.take().expect("spawn_stream requested piped stdin");

        let mut source = File::open(&record.source)?;
        source.seek(SeekFrom::Start(record.file_offset))?;
        let limited = source.take(record.payload_size);
        let reader = DecompressingReader::new(limited);

        let pump = crate::infrastructure::tool_driver::spawn_stdin_pump(stdin, reader);
        pump.join()
            .map_err(|_| DiskVaultError::ToolFailed {
                tool: "ntfsclone".to_string(),
                reason: "stdin pump thread panicked".to_string(),
            })??;

        reap("ntfsclone", child)
    }

    fn rescan(&self, device_path: &Path) -> Result<()> {
        thread::sleep(self.rescan_settle_delay);

        if let Some(devname) = device_path.file_name().and_then(|n| n.to_str()) {
            let rescan_path = format!("/sys/block/{devname}/device/rescan");
            if let Ok(mut f) = OpenOptions::new().write(true).open(&rescan_path) {
                let _ = f.write_all(b"1");
            } else {
                log::warn!("could not open {rescan_path} to trigger a partition rescan");
            }
        }

        thread::sleep(self.rescan_settle_delay);
        Ok(())
    }
}

fn partition_device_path(device_path: &Path, partition_number: usize) -> std::path::PathBuf {
    let mut name = device_path.as_os_str().to_os_string();
    name.push(partition_number.to_string());
    std::path::PathBuf::from(name)
}

fn stream_decompress_into(record: &ContainerRecordRef, target: &mut File) -> Result<()> {
    let mut source = File::open(&record.source)?;
    source.seek(SeekFrom::Start(record.file_offset))?;

    let mut decompressor = StreamingDecompressor::new();
    let mut buf = vec![0u8; MAX_CHUNK];
    let mut remaining = record.payload_size;

    while remaining > 0 {
        let want = remaining.min(MAX_CHUNK as u64) as usize;
        let n = source.read(&mut buf[..want])?;
        if n == 0 {
            return Err(DiskVaultError::DeviceShort {
                read: record.payload_size - remaining,
                expected: record.payload_size,
            });
        }
        remaining -= n as u64;
        let out = decompressor.decompress_chunk(&buf[..n])?;
        if !out.is_empty() {
            target.write_all(&out)?;
        }
    }

    let tail = decompressor.finish()?;
    if !tail.is_empty() {
        target.write_all(&tail)?;
    }
    Ok(())
}

/// Adapts a compressed byte stream into a plain `Read` of decompressed
/// bytes, for the NTFS clone path which pipes decompressed bytes straight
/// into `ntfsclone`'s stdin rather than writing them to a `File`.
struct DecompressingReader<R> {
    inner: R,
    decompressor: Option<StreamingDecompressor>,
    pending: std::collections::VecDeque<u8>,
}

impl<R: Read> DecompressingReader<R> {
    fn new(inner: R) -> Self {
        Self {
            inner,
            decompressor: Some(StreamingDecompressor::new()),
            pending: std::collections::VecDeque::new(),
        }
    }
}

impl<R: Read> Read for DecompressingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        while self.pending.is_empty() && self.decompressor.is_some() {
            let mut chunk = vec![0u8; MAX_CHUNK];
            let n = self.inner.read(&mut chunk)?;
            if n == 0 {
                let decompressor = self.decompressor.take().unwrap();
                let tail = decompressor.finish()?;
                self.pending.extend(tail);
                break;
            }
            let out = self
                .decompressor
                .as_mut()
                .unwrap()
                .decompress_chunk(&chunk[..n])?;
            self.pending.extend(out);
        }

        let n = self.pending.len().min(buf.len());
        for (i, byte) in self.pending.drain(..n).enumerate() {
            buf[i] = byte;
        }
        Ok(n)
    }
}
