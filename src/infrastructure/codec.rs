//! Streaming deflate-family compression, mirroring `zlib.compressobj()` /
//! `decompressobj()` semantics: bytes go in a chunk at a time and come out
//! a chunk at a time, with no requirement to hold the whole stream in
//! memory.

use flate2::write::{ZlibDecoder, ZlibEncoder};
use flate2::Compression;
use std::io::Write;

pub const MAX_CHUNK: usize = 16 * 1024 * 1024;

pub struct StreamingCompressor {
    encoder: ZlibEncoder<Vec<u8>>,
}

impl StreamingCompressor {
    pub fn new() -> Self {
        Self {
            encoder: ZlibEncoder::new(Vec::new(), Compression::default()),
        }
    }

    /// Compresses one chunk (at most `MAX_CHUNK` bytes), returning
    /// whatever compressed bytes the encoder has produced so far, drained
    /// so memory use doesn't grow with the input.
    pub fn compress_chunk(&mut self, chunk: &[u8]) -> std::io::Result<Vec<u8>> {
        self.encoder.write_all(chunk)?;
        Ok(std::mem::take(self.encoder.get_mut()))
    }

    /// Flushes and finalizes the stream, returning the trailing bytes.
    pub fn finish(self) -> std::io::Result<Vec<u8>> {
        self.encoder.finish()
    }
}

impl Default for StreamingCompressor {
    fn default() -> Self {
        Self::new()
    }
}

pub struct StreamingDecompressor {
    decoder: ZlibDecoder<Vec<u8>>,
}

impl StreamingDecompressor {
    pub fn new() -> Self {
        Self {
            decoder: ZlibDecoder::new(Vec::new()),
        }
    }

    pub fn decompress_chunk(&mut self, chunk: &[u8]) -> std::io::Result<Vec<u8>> {
        self.decoder.write_all(chunk)?;
        Ok(std::mem::take(self.decoder.get_mut()))
    }

    pub fn finish(self) -> std::io::Result<Vec<u8>> {
        self.decoder.finish()
    }
}

impl Default for StreamingDecompressor {
    fn default() -> Self {
        Self::new()
    }
}
