//! Domain entities
//!
//! Core business objects: device/partition observations, container
//! records, and the backup metadata derived from a container's filename
//! and header.

mod backup;
mod device;
mod record;

pub use backup::{is_valid_description, Backup, BackupFilename, FILENAME_PREFIX};
pub use device::{Device, PartitionEntry};
pub use record::{ContainerRecordRef, RecordHeader, RecordKind, RECORD_HEADER_LEN};
