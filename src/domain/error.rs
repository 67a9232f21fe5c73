//! Core error types for the backup/restore tool.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiskVaultError {
    /// An external helper (fdisk, ntfsclone, ntfsinfo, dmidecode, mount...)
    /// exited non-zero or could not be launched at all.
    #[error("external tool '{tool}' failed: {reason}")]
    ToolFailed { tool: String, reason: String },

    /// Header truncated, record header truncated, unknown kind tag, or
    /// a payload_size that doesn't align with the next header.
    #[error("malformed container: {0}")]
    BadContainer(String),

    /// A read on the source device returned EOF before the planned length.
    #[error("device ended abruptly after {read} of {expected} bytes")]
    DeviceShort { read: u64, expected: u64 },

    /// The partition-table lister returned zero entries on a device that
    /// was expected to have partitions; the planner degrades to a single
    /// OPAQUE range spanning the whole device.
    #[error("partition table unreadable for {0}")]
    PartitionTableUnreadable(String),

    /// A backup description failed the `[A-Za-z0-9 \-]{1,24}` grammar.
    #[error("invalid backup description: {0:?}")]
    InvalidDescription(String),

    /// Any other read/write failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DiskVaultError>;
