//! The container file format: an 8-byte creation-time header followed by
//! a sequence of typed, length-prefixed, compressed records.

mod reader;
mod writer;

pub use reader::{read_backup, read_backup_strict};
pub use writer::ContainerWriter;

pub const HEADER_LEN: usize = 8;
