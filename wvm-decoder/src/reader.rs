//! The positional byte reader the decoder walks a module with.
//!
//! `BinaryReader` wraps the `(bytes, pos)` primitives of
//! `wvm_format::binary` in a cursor, and adds the save/restore pair
//! the section decoder uses to re-scan a region.

use wvm_error::{kinds, Result};
use wvm_format::binary;

use crate::prelude::{String, Vec};

/// A cursor over a module's bytes with typed reads.
#[derive(Debug)]
pub struct BinaryReader<'a> {
    bytes: &'a [u8],
    pos: usize,
    saved: Vec<usize>,
}

impl<'a> BinaryReader<'a> {
    /// Create a reader over `bytes`, positioned at the start.
    #[must_use]
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            pos: 0,
            saved: Vec::new(),
        }
    }

    /// Current byte offset.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left to read.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    /// True when every byte has been consumed.
    #[must_use]
    pub const fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    /// Remember the current position for a later [`restore`].
    ///
    /// [`restore`]: Self::restore
    pub fn save(&mut self) {
        self.saved.push(self.pos);
    }

    /// Return to the most recently saved position.
    pub fn restore(&mut self) {
        if let Some(pos) = self.saved.pop() {
            self.pos = pos;
        }
    }

    /// Move the cursor to an absolute offset.
    pub fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    /// Read one byte.
    pub fn read_byte(&mut self) -> Result<u8> {
        let Some(&byte) = self.bytes.get(self.pos) else {
            return Err(kinds::unexpected_end());
        };
        self.pos += 1;
        Ok(byte)
    }

    /// Read an exact number of raw bytes.
    pub fn read_exact(&mut self, len: usize) -> Result<&'a [u8]> {
        let Some(slice) = self.bytes.get(self.pos..self.pos + len) else {
            return Err(kinds::unexpected_end());
        };
        self.pos += len;
        Ok(slice)
    }

    /// Read an unsigned LEB128 u32.
    pub fn read_u32_leb(&mut self) -> Result<u32> {
        let (value, consumed) = binary::read_leb128_u32(self.bytes, self.pos)?;
        self.pos += consumed;
        Ok(value)
    }

    /// Read an unsigned LEB128 u64.
    pub fn read_u64_leb(&mut self) -> Result<u64> {
        let (value, consumed) = binary::read_leb128_u64(self.bytes, self.pos)?;
        self.pos += consumed;
        Ok(value)
    }

    /// Read a signed LEB128 i32.
    pub fn read_s32_leb(&mut self) -> Result<i32> {
        let (value, consumed) = binary::read_leb128_i32(self.bytes, self.pos)?;
        self.pos += consumed;
        Ok(value)
    }

    /// Read a signed LEB128 i64.
    pub fn read_s64_leb(&mut self) -> Result<i64> {
        let (value, consumed) = binary::read_leb128_i64(self.bytes, self.pos)?;
        self.pos += consumed;
        Ok(value)
    }

    /// Read a little-endian f32 as its bit pattern.
    pub fn read_f32_bits(&mut self) -> Result<u32> {
        let (bits, consumed) = binary::read_f32(self.bytes, self.pos)?;
        self.pos += consumed;
        Ok(bits)
    }

    /// Read a little-endian f64 as its bit pattern.
    pub fn read_f64_bits(&mut self) -> Result<u64> {
        let (bits, consumed) = binary::read_f64(self.bytes, self.pos)?;
        self.pos += consumed;
        Ok(bits)
    }

    /// Read a length-prefixed UTF-8 name.
    pub fn read_name(&mut self) -> Result<String> {
        let (name, consumed) = binary::read_name(self.bytes, self.pos)?;
        self.pos += consumed;
        Ok(name)
    }

    /// Read a length-prefixed byte vector.
    pub fn read_bytes_vec(&mut self) -> Result<Vec<u8>> {
        let (bytes, consumed) = binary::read_bytes(self.bytes, self.pos)?;
        self.pos += consumed;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wvm_error::codes;

    #[test]
    fn cursor_advances() {
        let mut reader = BinaryReader::new(&[0x05, 0xE5, 0x8E, 0x26]);
        assert_eq!(reader.read_byte().unwrap(), 5);
        assert_eq!(reader.read_u32_leb().unwrap(), 624_485);
        assert!(reader.at_end());
    }

    #[test]
    fn save_restore() {
        let mut reader = BinaryReader::new(&[0x01, 0x02, 0x03]);
        reader.save();
        assert_eq!(reader.read_byte().unwrap(), 1);
        assert_eq!(reader.read_byte().unwrap(), 2);
        reader.restore();
        assert_eq!(reader.read_byte().unwrap(), 1);
    }

    #[test]
    fn truncated_read_is_unexpected_end() {
        let mut reader = BinaryReader::new(&[0x01]);
        reader.read_byte().unwrap();
        assert_eq!(reader.read_byte().unwrap_err().code, codes::UNEXPECTED_END);
    }
}
