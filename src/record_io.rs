//! Positioned record I/O over any `Read + Seek` backing store.
//!
//! CLASSIC files are addressed in 1-based (block, word) pairs. A block is
//! `record_len` 4-byte words; `byte_offset` centralizes the arithmetic so every
//! front-end performs it identically.

use crate::Result;

use std::io::{self, Read, Seek, SeekFrom};

/// Initial capacity of the scratch buffer (1 MiB), matching the original's
/// fixed allocation. Unlike the original, the buffer grows past this on
/// demand rather than warning and truncating (see design notes).
pub const INITIAL_SCRATCH_CAPACITY: usize = 1024 * 1024;

/// `byte_offset(block, word, record_len) = 4*((block-1)*record_len + (word-1))`.
///
/// Centralizes the 1-based word/block arithmetic that both front-ends share;
/// off-by-one mistakes here are the dominant failure mode of a reimplementation.
pub fn byte_offset(block: i64, word: i64, record_len: i64) -> u64 {
    (4 * ((block - 1) * record_len + (word - 1))) as u64
}

/// A positioned reader over a backing store, with a growable scratch buffer.
pub struct RecordSource<R> {
    inner: R,
    scratch: Vec<u8>,
}

impl<R: Read + Seek> RecordSource<R> {
    pub fn new(inner: R) -> Self {
        RecordSource {
            inner,
            scratch: Vec::with_capacity(INITIAL_SCRATCH_CAPACITY),
        }
    }

    pub fn seek_bytes(&mut self, byte_offset: u64) -> Result<()> {
        self.inner.seek(SeekFrom::Start(byte_offset))?;
        Ok(())
    }

    pub fn seek_words(&mut self, word_offset: i64) -> Result<()> {
        self.seek_bytes((4 * word_offset) as u64)
    }

    /// Read exactly `n_words` 32-bit words into the scratch buffer and return
    /// it as a byte slice. A clean EOF (nothing at all could be read) leaves
    /// the scratch buffer's prior contents and returns them unchanged; any
    /// other short read is logged and the (possibly garbage-tailed) buffer is
    /// still returned, matching the original's non-fatal short-read policy.
    pub fn read_words(&mut self, n_words: usize) -> Result<&[u8]> {
        self.read_bytes(n_words * 4)
    }

    pub fn read_bytes(&mut self, n_bytes: usize) -> Result<&[u8]> {
        if n_bytes > self.scratch.capacity() {
            log::debug!(
                "growing scratch buffer from {} to {} bytes",
                self.scratch.capacity(),
                n_bytes
            );
        }
        self.scratch.resize(n_bytes, 0);

        let mut filled = 0;
        loop {
            if filled == n_bytes {
                break;
            }
            match self.inner.read(&mut self.scratch[filled..]) {
                Ok(0) => {
                    if filled == 0 {
                        // Clean EOF before anything was read: leave prior contents alone.
                        return Ok(&self.scratch[..n_bytes]);
                    }
                    log::warn!(
                        "short read: expected {} bytes, found {} before EOF",
                        n_bytes,
                        filled
                    );
                    break;
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(&self.scratch[..n_bytes])
    }

    /// Append `n_words` more words to the end of the scratch buffer, growing
    /// it in place. Used when an observation block spans more than one record.
    pub fn read_words_append(&mut self, offset_words: usize, n_words: usize) -> Result<()> {
        let offset = offset_words * 4;
        let n_bytes = n_words * 4;
        let needed = offset + n_bytes;
        if needed > self.scratch.len() {
            self.scratch.resize(needed, 0);
        }

        let mut filled = 0;
        while filled < n_bytes {
            match self.inner.read(&mut self.scratch[offset + filled..offset + n_bytes]) {
                Ok(0) => {
                    log::warn!(
                        "short read while extending observation block: expected {} bytes, found {}",
                        n_bytes,
                        filled
                    );
                    break;
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    pub fn buffer(&self) -> &[u8] {
        &self.scratch
    }
}

/// Format a record's raw words as a debug dump, 8 per line, each as a
/// little-endian `i32` with its word index.
pub fn dump_words(buf: &[u8]) -> String {
    const WORDS_PER_LINE: usize = 8;
    let mut out = String::new();
    for (i, chunk) in buf.chunks_exact(4).enumerate() {
        let word = i32::from_le_bytes(chunk.try_into().unwrap());
        out.push_str(&format!("[{:03}] {:10} ", i, word));
        if i % WORDS_PER_LINE == WORDS_PER_LINE - 1 {
            out.push('\n');
        }
    }
    out
}

/// Widen a little-endian `f32` sample block to `f64`, element by element.
pub fn widen_f32_le(bytes: &[u8]) -> Vec<f64> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes(chunk.try_into().unwrap()) as f64)
        .collect()
}
