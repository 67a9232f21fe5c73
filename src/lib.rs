//! diskvault - whole-disk backup and restore tool
//!
//! Backs up a block device by walking its partition table: NTFS
//! partitions are captured with a filesystem-aware clone, everything else
//! (partition tables, gaps between partitions, non-NTFS partitions) is
//! copied raw. Restore replays the raw records first so the kernel sees a
//! valid partition table again, then the partition-addressed records.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

pub use config::AppConfig;
pub use domain::error::{DiskVaultError, Result};
