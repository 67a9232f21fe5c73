//! Container reader: parses a container file into an ordered record index
//! without ever loading a payload into memory.

use crate::domain::entities::{ContainerRecordRef, RecordHeader, RECORD_HEADER_LEN};
use crate::domain::error::{DiskVaultError, Result};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use super::HEADER_LEN;

/// A container's creation-time header plus its parsed record index.
#[derive(Debug, Clone)]
pub struct ParsedContainer {
    pub header_time: u64,
    pub records: Vec<ContainerRecordRef>,
    pub valid: bool,
}

/// Lenient parse: truncation or an unrecognized record kind marks the
/// container `invalid` rather than returning an error. Used by the
/// backup store when listing backups, where a corrupt file should just
/// be skipped rather than abort enumeration.
pub fn read_backup(path: impl AsRef<Path>) -> Result<ParsedContainer> {
    parse(path.as_ref(), false)
}

/// Strict parse: any malformation is a hard `BadContainer` error. Used by
/// the restore sequencer, which must fully validate before writing any
/// bytes (spec's validation-before-apply rule).
pub fn read_backup_strict(path: impl AsRef<Path>) -> Result<ParsedContainer> {
    parse(path.as_ref(), true)
}

fn parse(path: &Path, strict: bool) -> Result<ParsedContainer> {
    let mut file = File::open(path)?;

    let mut header_buf = [0u8; HEADER_LEN];
    match file.read_exact(&mut header_buf) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return bad(strict, "container shorter than the 8-byte header");
        }
        Err(e) => return Err(e.into()),
    }
    let header_time = u64::from_le_bytes(header_buf);

    let mut records = Vec::new();
    loop {
        let mut hdr_buf = [0u8; RECORD_HEADER_LEN];
        let read = read_up_to(&mut file, &mut hdr_buf)?;

        if read == 0 {
            break; // clean EOF between records
        }
        if read != RECORD_HEADER_LEN {
            return bad(strict, "truncated record header");
        }

        let header = match RecordHeader::from_bytes(&hdr_buf) {
            Ok(h) => h,
            Err(e) => return bad(strict, &e.to_string()),
        };

        let file_offset = file.stream_position()?;
        records.push(ContainerRecordRef {
            source: path.to_path_buf(),
            file_offset,
            payload_size: header.payload_size,
            kind: header.kind,
            target_offset: header.target_offset,
        });

        let next = file_offset
            .checked_add(header.payload_size)
            .ok_or_else(|| DiskVaultError::BadContainer("payload_size overflow".to_string()))?;
        if next > file.metadata()?.len() {
            return bad(strict, "payload_size extends past end of file");
        }
        file.seek(SeekFrom::Start(next))?;
    }

    Ok(ParsedContainer {
        header_time,
        records,
        valid: true,
    })
}

fn read_up_to(file: &mut File, buf: &mut [u8]) -> Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        let n = file.read(&mut buf[total..])?;
        if n == 0 {
            break;
        }
        total += n;
    }
    Ok(total)
}

fn bad(strict: bool, message: &str) -> Result<ParsedContainer> {
    if strict {
        Err(DiskVaultError::BadContainer(message.to_string()))
    } else {
        Ok(ParsedContainer {
            header_time: 0,
            records: Vec::new(),
            valid: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::RecordKind;
    use crate::infrastructure::container::ContainerWriter;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    #[test]
    fn round_trips_multiple_records() {
        let tmp = NamedTempFile::new().unwrap();
        let mut writer = ContainerWriter::create(tmp.path()).unwrap();
        writer.write_header(1234).unwrap();
        let mut a = Cursor::new(vec![1u8; 1024]);
        writer.write_record(RecordKind::RawGap, 0, &mut a).unwrap();
        let mut b = Cursor::new(vec![2u8; 2048]);
        writer
            .write_record(RecordKind::Specialized, 0, &mut b)
            .unwrap();
        let mut c = Cursor::new(vec![3u8; 512]);
        writer
            .write_record(RecordKind::RawGap, 4096, &mut c)
            .unwrap();
        writer.finish().unwrap();

        let parsed = read_backup_strict(tmp.path()).unwrap();
        assert!(parsed.valid);
        assert_eq!(parsed.header_time, 1234);
        assert_eq!(parsed.records.len(), 3);
        assert_eq!(parsed.records[0].kind, RecordKind::RawGap);
        assert_eq!(parsed.records[1].kind, RecordKind::Specialized);
        assert_eq!(parsed.records[2].target_offset, 4096);
    }

    #[test]
    fn empty_container_has_no_records() {
        let tmp = NamedTempFile::new().unwrap();
        let mut writer = ContainerWriter::create(tmp.path()).unwrap();
        writer.write_header(1).unwrap();
        writer.finish().unwrap();

        let parsed = read_backup_strict(tmp.path()).unwrap();
        assert!(parsed.records.is_empty());
    }

    #[test]
    fn truncated_header_is_bad_container_in_strict_mode() {
        let tmp = NamedTempFile::new().unwrap();
        {
            let mut f = std::fs::File::create(tmp.path()).unwrap();
            f.write_all(&1u64.to_le_bytes()).unwrap();
            f.write_all(&[0u8, 1, 2]).unwrap(); // 3 bytes, short of 17
        }
        let err = read_backup_strict(tmp.path()).unwrap_err();
        assert!(matches!(err, DiskVaultError::BadContainer(_)));
    }

    #[test]
    fn truncated_header_is_invalid_in_lenient_mode() {
        let tmp = NamedTempFile::new().unwrap();
        {
            let mut f = std::fs::File::create(tmp.path()).unwrap();
            f.write_all(&1u64.to_le_bytes()).unwrap();
            f.write_all(&[0u8, 1, 2]).unwrap();
        }
        let parsed = read_backup(tmp.path()).unwrap();
        assert!(!parsed.valid);
    }

    #[test]
    fn payload_past_eof_is_bad_container() {
        let tmp = NamedTempFile::new().unwrap();
        {
            let mut f = std::fs::File::create(tmp.path()).unwrap();
            f.write_all(&1u64.to_le_bytes()).unwrap();
            let header = RecordHeader {
                kind: RecordKind::RawGap,
                payload_size: 1_000_000,
                target_offset: 0,
            };
            f.write_all(&header.to_bytes()).unwrap();
        }
        let err = read_backup_strict(tmp.path()).unwrap_err();
        assert!(matches!(err, DiskVaultError::BadContainer(_)));
    }

    #[test]
    fn unknown_kind_tag_is_bad_container() {
        let tmp = NamedTempFile::new().unwrap();
        {
            let mut f = std::fs::File::create(tmp.path()).unwrap();
            f.write_all(&1u64.to_le_bytes()).unwrap();
            f.write_all(&[9u8]).unwrap();
            f.write_all(&0u64.to_le_bytes()).unwrap();
            f.write_all(&0u64.to_le_bytes()).unwrap();
        }
        let err = read_backup_strict(tmp.path()).unwrap_err();
        assert!(matches!(err, DiskVaultError::BadContainer(_)));
    }
}
