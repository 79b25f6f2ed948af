//! The save-stream wire format.
//!
//! ```text
//! offset 0   4 bytes   ASCII "FTS0"
//! offset 4   4 bytes   i32-LE compression level (0 = none, 1..=9 = gzip)
//! offset 8   [gzip envelope wraps everything below when compressed]
//!            4 bytes   i32-LE intern-table entry count
//!            entries   7-bit length-prefixed UTF-8 key strings
//!            tree body, depth first from the root:
//!              4 bytes   i32-LE edge length, then the edge bytes
//!              4 bytes   i32-LE key count
//!              4 bytes   i32-LE child count
//!              key count × i32-LE intern-table indices
//!              child count × child records
//! ```
//!
//! All integers are little-endian. The root record always carries a zero
//! edge length and zero key count. Keys are interned once, in first-visit
//! order, and nodes reference them by table position.

pub mod reader;
pub mod varint;
pub mod writer;

use std::io;

use crate::error::Error;

/// Stream magic, the first four bytes of every save.
pub const MAGIC: [u8; 4] = *b"FTS0";

/// Compression of everything following the level field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Compression {
    None,
    /// Gzip at the default level.
    #[default]
    Gzip,
}

impl Compression {
    /// The level field value written for this setting.
    pub(crate) fn level(self) -> i32 {
        match self {
            Compression::None => 0,
            Compression::Gzip => flate2::Compression::default().level() as i32,
        }
    }
}

/// Maps end-of-stream to a malformed-input error; a save stream never
/// ends mid-record, so running out of bytes means the data is bad, not
/// the transport.
pub(crate) fn read_failed(err: io::Error) -> Error {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        Error::InvalidData("unexpected end of stream".to_string())
    } else {
        err.into()
    }
}
