//! A small stateful byte cursor over an in-memory record buffer.
//!
//! CLASSIC files are read as a native little-endian 32-bit-word stream; every
//! front-end positions this cursor at a word address within a record and then
//! reads a fixed sequence of typed fields from it.

use crate::{error::ClassError, FlexString, Result};

use std::convert::TryInto;
use std::str;

/// A cursor over a byte slice, advancing as primitive values are read off its front.
pub struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Cursor { buf, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(n).unwrap_or(usize::MAX);
        if end > self.buf.len() {
            return Err(ClassError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!(
                    "cursor read of {} bytes at offset {} exceeds buffer of {} bytes",
                    n,
                    self.pos,
                    self.buf.len()
                ),
            )));
        }
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(i64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(f64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }

    /// Read `len` bytes as fixed-width ASCII, trimming leading and trailing
    /// whitespace while preserving interior characters.
    pub fn read_str(&mut self, len: usize) -> Result<FlexString> {
        let raw = self.take(len)?;
        let s = str::from_utf8(raw)?;
        Ok(FlexString::from(s.trim()))
    }
}
