//! Read-only block device access.
//!
//! Works equally against a physical device path (`/dev/sda`), a partition
//! device (`/dev/sda1`), or a disk image file — all three are just a file
//! to `open(2)`.

use crate::domain::error::Result;
use crate::domain::repositories::BlockDeviceReader;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

pub struct DiskDevice {
    file: File,
    size: u64,
}

impl DiskDevice {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut file = OpenOptions::new().read(true).write(false).open(path)?;
        let size = file.seek(SeekFrom::End(0))?;
        file.seek(SeekFrom::Start(0))?;
        Ok(Self { file, size })
    }
}

impl BlockDeviceReader for DiskDevice {
    fn read_chunk(&mut self, offset: u64, buffer: &mut [u8]) -> Result<usize> {
        self.file.seek(SeekFrom::Start(offset))?;
        Ok(self.file.read(buffer)?)
    }

    fn size(&self) -> u64 {
        self.size
    }
}
