//! Device and partition-table observations.
//!
//! `Device` and `PartitionEntry` are read-only snapshots of a live block
//! device, produced by the partition prober at the start of a backup and
//! discarded once the backup finishes. Neither type owns an open file
//! handle; they describe geometry only.

use std::path::PathBuf;

/// A block device identified by a path, with a total byte size and the
/// sector size used to interpret partition-table units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub path: PathBuf,
    pub size: u64,
    pub sector_size: u64,
}

impl Device {
    pub fn new(path: impl Into<PathBuf>, size: u64, sector_size: u64) -> Self {
        Self {
            path: path.into(),
            size,
            sector_size,
        }
    }
}

/// One partition entry belonging to a `Device`.
///
/// Invariants (checked by the prober, not re-validated here):
/// `0 <= start <= end < device.size`; entries from the same device never
/// overlap; `end - start + 1 == count` after rounding to sector granularity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionEntry {
    /// Device path of the partition itself, e.g. `/dev/sda1`.
    pub device_path: String,
    /// Inclusive start offset within the parent device.
    pub start: u64,
    /// Inclusive end offset within the parent device.
    pub end: u64,
    pub count: u64,
    /// Currently equivalent to "is NTFS".
    pub is_specialized: bool,
}

impl PartitionEntry {
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }
}
