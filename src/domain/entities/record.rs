//! Container record types.
//!
//! On-disk record layout (all integers little-endian):
//!
//! ```text
//! offset  size  field
//!   0      1    kind_tag       (u8: 0=RAW_GAP, 1=SPECIALIZED, 2=OPAQUE_PART)
//!   1      8    payload_size   (u64, back-patched at finish)
//!   9      8    target_offset  (u64)
//!  17      ..   compressed payload bytes
//! ```

use crate::domain::error::{DiskVaultError, Result};
use std::path::PathBuf;

pub const RECORD_HEADER_LEN: usize = 1 + 8 + 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// `target_offset` is an absolute byte offset on the device; the
    /// payload decompresses to exactly that many raw bytes.
    RawGap,
    /// `target_offset` is unused (zero on write, ignored on read). The
    /// payload is a filesystem-aware clone stream for the partition.
    Specialized,
    /// Like `Specialized` but the payload is a plain raw dump of the
    /// partition device, restored from offset zero.
    OpaquePart,
}

impl RecordKind {
    pub fn tag(self) -> u8 {
        match self {
            RecordKind::RawGap => 0,
            RecordKind::Specialized => 1,
            RecordKind::OpaquePart => 2,
        }
    }

    pub fn from_tag(tag: u8) -> Result<Self> {
        match tag {
            0 => Ok(RecordKind::RawGap),
            1 => Ok(RecordKind::Specialized),
            2 => Ok(RecordKind::OpaquePart),
            other => Err(DiskVaultError::BadContainer(format!(
                "unknown record kind tag {other}"
            ))),
        }
    }
}

/// A parsed, on-disk record header (not yet carrying the payload bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub kind: RecordKind,
    pub payload_size: u64,
    pub target_offset: u64,
}

impl RecordHeader {
    pub fn to_bytes(self) -> [u8; RECORD_HEADER_LEN] {
        let mut buf = [0u8; RECORD_HEADER_LEN];
        buf[0] = self.kind.tag();
        buf[1..9].copy_from_slice(&self.payload_size.to_le_bytes());
        buf[9..17].copy_from_slice(&self.target_offset.to_le_bytes());
        buf
    }

    pub fn from_bytes(buf: &[u8; RECORD_HEADER_LEN]) -> Result<Self> {
        let kind = RecordKind::from_tag(buf[0])?;
        let payload_size = u64::from_le_bytes(buf[1..9].try_into().unwrap());
        let target_offset = u64::from_le_bytes(buf[9..17].try_into().unwrap());
        Ok(Self {
            kind,
            payload_size,
            target_offset,
        })
    }
}

/// A cursor onto one record's compressed bytes inside a container file.
/// Holds no copy of the data — just where to find it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerRecordRef {
    pub source: PathBuf,
    pub file_offset: u64,
    pub payload_size: u64,
    pub kind: RecordKind,
    pub target_offset: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trips() {
        let hdr = RecordHeader {
            kind: RecordKind::Specialized,
            payload_size: 0xdead_beef,
            target_offset: 0,
        };
        let bytes = hdr.to_bytes();
        assert_eq!(bytes.len(), RECORD_HEADER_LEN);
        let back = RecordHeader::from_bytes(&bytes).unwrap();
        assert_eq!(hdr, back);
    }

    #[test]
    fn unknown_tag_is_bad_container() {
        let mut bytes = [0u8; RECORD_HEADER_LEN];
        bytes[0] = 3;
        assert!(RecordHeader::from_bytes(&bytes).is_err());
    }
}
