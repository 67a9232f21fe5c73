//! Container writer: emits records whose compressed length is unknown
//! until the payload has streamed through, by reserving the length field,
//! streaming the payload, then seeking back to patch it.

use crate::domain::entities::{RecordHeader, RecordKind, RECORD_HEADER_LEN};
use crate::domain::error::Result;
use crate::infrastructure::codec::{StreamingCompressor, MAX_CHUNK};
use std::fs::File;
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use super::HEADER_LEN;

pub struct ContainerWriter {
    file: BufWriter<File>,
}

impl ContainerWriter {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            file: BufWriter::new(file),
        })
    }

    pub fn write_header(&mut self, epoch_seconds: u64) -> Result<()> {
        self.file.write_all(&epoch_seconds.to_le_bytes())?;
        debug_assert_eq!(HEADER_LEN, 8);
        Ok(())
    }

    /// Streams `source` through the compressor in `MAX_CHUNK`-sized reads,
    /// writing compressed bytes as they're produced, then backpatches the
    /// header's `payload_size` field. Returns the number of compressed
    /// bytes written (not counting the 17-byte header).
    pub fn write_record(
        &mut self,
        kind: RecordKind,
        target_offset: u64,
        source: &mut dyn Read,
    ) -> Result<u64> {
        let size_field_offset = self.reserve_header(kind, target_offset)?;

        let mut compressor = StreamingCompressor::new();
        let mut buf = vec![0u8; MAX_CHUNK];
        let mut compressed_len: u64 = 0;

        loop {
            let n = source.read(&mut buf)?;
            if n == 0 {
                break;
            }
            let out = compressor.compress_chunk(&buf[..n])?;
            compressed_len += out.len() as u64;
            self.file.write_all(&out)?;
        }

        let tail = compressor.finish()?;
        compressed_len += tail.len() as u64;
        self.file.write_all(&tail)?;

        self.patch_payload_size(size_field_offset, compressed_len)?;

        Ok(compressed_len)
    }

    /// Writes a header with `payload_size = 0` and returns the file
    /// offset of the payload_size field so it can be patched afterward.
    fn reserve_header(&mut self, kind: RecordKind, target_offset: u64) -> Result<u64> {
        let header = RecordHeader {
            kind,
            payload_size: 0,
            target_offset,
        };
        let bytes = header.to_bytes();
        debug_assert_eq!(bytes.len(), RECORD_HEADER_LEN);
        self.file.write_all(&bytes)?;
        let current = self.file.stream_position()?;
        Ok(current - 16) // payload_size field starts 1 byte after kind_tag
    }

    fn patch_payload_size(&mut self, size_field_offset: u64, size: u64) -> Result<()> {
        let resume = self.file.stream_position()?;
        self.file.seek(SeekFrom::Start(size_field_offset))?;
        self.file.write_all(&size.to_le_bytes())?;
        self.file.seek(SeekFrom::Start(resume))?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        self.file.flush()?;
        Ok(())
    }
}
