//! 7-bit variable-length integers.
//!
//! Intern-table strings are length-prefixed with the BinaryWriter
//! convention: 7 bits per byte, low group first, high bit set on every
//! byte except the last. A `u32` length takes 1 to 5 bytes.

use std::io::{Read, Write};

use crate::encoding::read_failed;
use crate::errdata;
use crate::error::Result;

/// Writes `value` as a 7-bit variable-length integer.
pub fn write_u32<W: Write + ?Sized>(writer: &mut W, value: u32) -> Result<()> {
    let mut remaining = value;
    while remaining >= 0x80 {
        writer.write_all(&[(remaining as u8) | 0x80])?;
        remaining >>= 7;
    }
    writer.write_all(&[remaining as u8])?;
    Ok(())
}

/// Reads a 7-bit variable-length integer.
///
/// Rejects encodings longer than 5 bytes and 5-byte encodings whose high
/// bits overflow a `u32`.
pub fn read_u32<R: Read + ?Sized>(reader: &mut R) -> Result<u32> {
    let mut value: u32 = 0;
    let mut shift = 0;
    loop {
        let mut byte = [0u8; 1];
        reader.read_exact(&mut byte).map_err(read_failed)?;
        let group = (byte[0] & 0x7f) as u32;
        if shift == 28 && group > 0x0f {
            return errdata!("7-bit encoded length overflows u32");
        }
        value |= group << shift;
        if byte[0] & 0x80 == 0 {
            return Ok(value);
        }
        shift += 7;
        if shift > 28 {
            return errdata!("7-bit encoded length longer than 5 bytes");
        }
    }
}
