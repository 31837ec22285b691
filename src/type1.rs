//! The Type-1 front-end: fixed 128-word records, directory packed 4 entries
//! per record, single directory extension.

use std::io::{Read, Seek};

use crate::cursor::Cursor;
use crate::descriptor::ClassDescriptor;
use crate::directory::DirectoryEntry;
use crate::error::ClassError;
use crate::header::{self, SpectrumHeader};
use crate::record_io::{byte_offset, dump_words, widen_f32_le, RecordSource};
use crate::section::fill_header;
use crate::{MAX_CHANNELS, MAX_EXTENSIONS, Result};

/// Type-1 records are a fixed 128 words (512 bytes).
pub const RECORD_LEN: i64 = 128;
const ENTRIES_PER_RECORD: i64 = 4;
const ENTRY_WORDS: i64 = RECORD_LEN / ENTRIES_PER_RECORD;

pub struct Type1Reader<R> {
    source: RecordSource<R>,
    ext0: i64,
    xnext: i64,
    directory: Option<Vec<DirectoryEntry>>,
    descriptor: ClassDescriptor,
}

impl<R: Read + Seek> Type1Reader<R> {
    pub fn open(inner: R) -> Result<Self> {
        let mut source = RecordSource::new(inner);
        source.seek_bytes(0)?;
        let record = source.read_words(RECORD_LEN as usize)?;
        let mut cur = Cursor::new(record);

        let _code = cur.read_str(4)?;
        let _next = cur.read_i32()?;
        let _lex = cur.read_i32()?;
        let nex = cur.read_i32()?;
        let xnext = cur.read_i32()? as i64;

        if nex as usize > MAX_EXTENSIONS {
            log::warn!("Type-1 file descriptor claims {} extensions, capping at {}", nex, MAX_EXTENSIONS);
        }
        let nex = (nex as usize).min(MAX_EXTENSIONS);

        let mut ext = Vec::with_capacity(nex);
        for _ in 0..nex {
            ext.push(cur.read_i32()? as i64);
        }
        let ext0 = *ext.first().ok_or(ClassError::UnsupportedHeader(
            "Type-1 file descriptor has no extensions".into(),
        ))?;

        Ok(Type1Reader {
            source,
            ext0,
            xnext,
            directory: None,
            descriptor: ClassDescriptor::default(),
        })
    }

    pub fn count(&mut self) -> Result<i64> {
        Ok(self.directory()?.len() as i64)
    }

    fn directory(&mut self) -> Result<&Vec<DirectoryEntry>> {
        if self.directory.is_none() {
            let dir = self.enumerate_directory()?;
            self.directory = Some(dir);
        }
        Ok(self.directory.as_ref().unwrap())
    }

    fn enumerate_directory(&mut self) -> Result<Vec<DirectoryEntry>> {
        let mut entries = Vec::new();
        self.source.seek_bytes(byte_offset(self.ext0, 1, RECORD_LEN))?;

        let mut nrec = 2i64;
        'outer: while nrec < self.xnext {
            let record = self.source.read_words(RECORD_LEN as usize)?.to_vec();
            for k in 0..ENTRIES_PER_RECORD {
                let entry = decode_type1_entry(&record, k as usize)?;
                if entry.version == 1 && entry.num > 0 && entry.num < self.xnext {
                    entries.push(entry);
                } else {
                    break 'outer;
                }
            }
            nrec += 1;
        }
        Ok(entries)
    }

    fn locate(&mut self, scan: i64) -> Result<DirectoryEntry> {
        let count = self.count()?;
        if scan < 1 || scan > count {
            return Err(ClassError::ScanOutOfRange { scan, count });
        }
        Ok(self.directory.as_ref().unwrap()[(scan - 1) as usize].clone())
    }

    /// Read the observation block for `entry` and decode every section it lists.
    fn read_obs_block(&mut self, entry: &DirectoryEntry) -> Result<(ClassDescriptor, i64)> {
        self.source.seek_bytes(byte_offset(entry.block, 1, RECORD_LEN))?;
        let header_record = self.source.read_words(RECORD_LEN as usize)?.to_vec();
        let mut cur = Cursor::new(&header_record);

        let _ident = cur.read_str(4)?;
        let nbl = cur.read_i32()? as i64;
        let _bytes = cur.read_i32()?;
        let _adr = cur.read_i32()?;
        let nhead = cur.read_i32()? as i64;
        let _len = cur.read_i32()?;
        let _ientry = cur.read_i32()?;
        let nsec = (cur.read_i32()? as usize).min(4);
        let _obsnum = cur.read_i32()?;

        let mut sec_cod = vec![0i32; nsec];
        for s in sec_cod.iter_mut() {
            *s = cur.read_i32()?;
        }
        let mut sec_len = vec![0i64; nsec];
        for s in sec_len.iter_mut() {
            *s = cur.read_i32()? as i64;
        }
        let mut sec_adr = vec![0i64; nsec];
        for s in sec_adr.iter_mut() {
            *s = cur.read_i32()? as i64;
        }

        if nbl > 1 {
            self.source.read_words_append(RECORD_LEN as usize, ((nbl - 1) * RECORD_LEN) as usize)?;
        }
        let buf = self.source.buffer().to_vec();

        self.descriptor.reset();
        for i in 0..nsec {
            fill_header(&buf, sec_cod[i], sec_adr[i], sec_len[i], &mut self.descriptor)?;
        }

        Ok((self.descriptor.clone(), nhead))
    }

    pub fn header(&mut self, scan: i64) -> Result<SpectrumHeader> {
        let entry = self.locate(scan)?;
        let (desc, _nhead) = self.read_obs_block(&entry)?;
        Ok(header::normalize(scan, &entry, &desc))
    }

    pub fn frequencies(&mut self, scan: i64) -> Result<Vec<f64>> {
        let head = self.header(scan)?;
        Ok(header::frequency_vector(&head))
    }

    pub fn samples(&mut self, scan: i64) -> Result<Vec<f64>> {
        let entry = self.locate(scan)?;
        let (desc, nhead) = self.read_obs_block(&entry)?;
        let is_spectrum = entry.kind == 0;
        let ndata = if is_spectrum {
            desc.spectroscopic.nchan as i64
        } else {
            desc.continuum.npoin as i64
        };
        if ndata as usize > MAX_CHANNELS {
            log::warn!("channel count {} exceeds MAX_CHANNELS; the limit is informational, returning the full vector", ndata);
        }

        let start = 4 * (nhead - 1) as usize;
        let end = start + 4 * ndata as usize;
        let buf = self.source.buffer();
        if end > buf.len() {
            log::warn!("data block runs past the buffer; returning what is available");
            return Ok(widen_f32_le(&buf[start.min(buf.len())..buf.len()]));
        }
        Ok(widen_f32_le(&buf[start..end]))
    }

    /// Dump the raw words of a scan's observation header record, 8 per
    /// line, for debugging. Mirrors the original's `dumpRecord`.
    pub fn dump_obs_record(&mut self, scan: i64) -> Result<String> {
        let entry = self.locate(scan)?;
        self.source.seek_bytes(byte_offset(entry.block, 1, RECORD_LEN))?;
        let record = self.source.read_words(RECORD_LEN as usize)?;
        Ok(dump_words(record))
    }
}

fn decode_type1_entry(record: &[u8], k: usize) -> Result<DirectoryEntry> {
    let start = k * ENTRY_WORDS as usize * 4;
    let mut cur = Cursor::new(&record[start..]);

    let xblock = cur.read_i32()? as i64;
    let xnum = cur.read_i32()? as i64;
    let xver = cur.read_i32()?;
    let xsourc = cur.read_str(12)?;
    let xline = cur.read_str(12)?;
    let xtel = cur.read_str(12)?;
    let xdobs = cur.read_i32()?;
    let _xdred = cur.read_i32()?;
    let xoff1 = cur.read_f32()?;
    let xoff2 = cur.read_f32()?;
    let _xtype = cur.read_str(4)?;
    let xkind = cur.read_i32()?;
    let _xqual = cur.read_i32()?;
    let xscan = cur.read_i32()? as i64;
    let _xposa = cur.read_i32()?;

    Ok(DirectoryEntry {
        num: xnum,
        version: xver,
        block: xblock,
        word: 1,
        kind: xkind,
        source: xsourc,
        line: xline,
        telescope: xtel,
        xdobs,
        offset1: xoff1,
        offset2: xoff2,
        scan_num: xscan,
        reclen: RECORD_LEN,
        xsubs: 0,
    })
}
