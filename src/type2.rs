//! The Type-2 front-end: variable-length records, up to `nex` directory
//! extensions growing linearly (`gex == 10`) or by doubling (`gex == 20`).

use std::io::{Read, Seek};

use crate::cursor::Cursor;
use crate::descriptor::ClassDescriptor;
use crate::directory::DirectoryEntry;
use crate::error::ClassError;
use crate::header::{self, SpectrumHeader};
use crate::record_io::{byte_offset, dump_words, widen_f32_le, RecordSource};
use crate::section::fill_header;
use crate::{MAX_CHANNELS, MAX_EXTENSIONS, Result};

pub struct Type2Reader<R> {
    source: RecordSource<R>,
    reclen: i64,
    lind: i64,
    lex1: i64,
    nex: i64,
    gex: i64,
    ext: Vec<i64>,
    directory: Option<Vec<DirectoryEntry>>,
    descriptor: ClassDescriptor,
}

impl<R: Read + Seek> Type2Reader<R> {
    pub fn open(inner: R) -> Result<Self> {
        let mut source = RecordSource::new(inner);

        source.seek_bytes(0)?;
        let prefix = source.read_bytes(8)?;
        let reclen = i32::from_le_bytes(prefix[4..8].try_into().unwrap()) as i64;
        if reclen <= 0 {
            return Err(ClassError::UnsupportedHeader(format!(
                "Type-2 record length must be positive, got {}",
                reclen
            )));
        }

        source.seek_bytes(0)?;
        let record = source.read_words(reclen as usize)?.to_vec();
        // Skip the 4-byte code and 4-byte reclen already consumed above.
        let mut cur = Cursor::new(&record[8..]);

        let kind = cur.read_i32()?;
        let _vind = cur.read_i32()?;
        let lind = cur.read_i32()? as i64;
        let _flags = cur.read_i32()?;
        let _xnext = cur.read_i64()?;
        let _nextrec = cur.read_i64()?;
        let _nextword = cur.read_i32()?;
        let lex1 = cur.read_i32()? as i64;
        let nex = cur.read_i32()?;
        let gex = cur.read_i32()? as i64;

        if kind != 1 {
            return Err(ClassError::UnsupportedHeader(format!(
                "file descriptor kind {} is not a CLASS Type-2 file",
                kind
            )));
        }
        if gex != 10 && gex != 20 {
            return Err(ClassError::UnsupportedHeader(format!(
                "extension growth rule {} is neither 10 nor 20",
                gex
            )));
        }
        if nex as usize > MAX_EXTENSIONS {
            log::warn!("Type-2 file descriptor claims {} extensions, capping at {}", nex, MAX_EXTENSIONS);
        }
        let nex = (nex as usize).min(MAX_EXTENSIONS) as i64;

        let mut ext = Vec::with_capacity(nex as usize);
        for _ in 0..nex {
            ext.push(cur.read_i64()?);
        }

        Ok(Type2Reader {
            source,
            reclen,
            lind,
            lex1,
            nex,
            gex,
            ext,
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

    /// Byte offset of extension `iext`'s directory block, using the
    /// file's own `reclen` uniformly rather than the original's
    /// hard-coded 1024-word divisor in `getDirectory`.
    fn extension_byte_offset(&self, iext: usize) -> u64 {
        (4 * (self.ext[iext] - 1) * self.reclen) as u64
    }

    /// Directory slot count for extension `iext`, given `gex == 20`
    /// doubles the slot count once per extension rather than compounding
    /// the unused debug-only `size` variable the original also updates.
    fn slots_in_extension(&self, iext: usize) -> i64 {
        let growth = if self.gex == 20 { 1i64 << iext } else { 1 };
        self.lex1 * growth
    }

    fn enumerate_directory(&mut self) -> Result<Vec<DirectoryEntry>> {
        let mut entries = Vec::new();
        for iext in 0..self.nex as usize {
            let nst = self.slots_in_extension(iext);
            let isize_words = (nst * self.lind) as usize;

            self.source.seek_bytes(self.extension_byte_offset(iext))?;
            let record = self.source.read_words(isize_words)?.to_vec();

            for k in 0..nst as usize {
                let entry = decode_type2_entry(&record, k, self.lind, self.reclen)?;
                if entry.num >= 1 {
                    entries.push(entry);
                }
            }
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

    /// Decode every section the observation header lists, each read fresh
    /// from its own byte range (Type-2 sections aren't contiguous in one
    /// buffer the way a Type-1 multi-block observation is).
    fn read_obs_block(&mut self, entry: &DirectoryEntry) -> Result<(ClassDescriptor, i64, i64)> {
        let pos_words = (entry.block - 1) * self.reclen + (entry.word - 1);
        self.source.seek_bytes(byte_offset(entry.block, entry.word, self.reclen))?;
        let header_record = self.source.read_words(self.reclen as usize)?.to_vec();
        let mut cur = Cursor::new(&header_record);

        let _ident = cur.read_str(4)?;
        let _version = cur.read_i32()?;
        let nsec = (cur.read_i32()? as usize).min(10);
        let _nword = cur.read_i64()?;
        let adata = cur.read_i64()?;
        let ldata = cur.read_i64()?;
        let _xnum = cur.read_i64()?;

        let mut sec_cod = vec![0i32; nsec];
        for s in sec_cod.iter_mut() {
            *s = cur.read_i32()?;
        }
        let mut sec_len = vec![0i64; nsec];
        for s in sec_len.iter_mut() {
            *s = cur.read_i64()?;
        }
        let mut sec_adr = vec![0i64; nsec];
        for s in sec_adr.iter_mut() {
            *s = cur.read_i64()?;
        }

        self.descriptor.reset();
        for i in 0..nsec {
            let sec_pos_words = pos_words + sec_adr[i] - 1;
            self.source.seek_bytes((4 * sec_pos_words) as u64)?;
            let section_bytes = self.source.read_bytes((4 * sec_len[i]) as usize)?.to_vec();
            fill_header(&section_bytes, sec_cod[i], 1, sec_len[i], &mut self.descriptor)?;
        }

        Ok((self.descriptor.clone(), adata, ldata))
    }

    pub fn header(&mut self, scan: i64) -> Result<SpectrumHeader> {
        let entry = self.locate(scan)?;
        let (desc, _adata, _ldata) = self.read_obs_block(&entry)?;
        Ok(header::normalize(scan, &entry, &desc))
    }

    pub fn frequencies(&mut self, scan: i64) -> Result<Vec<f64>> {
        let head = self.header(scan)?;
        Ok(header::frequency_vector(&head))
    }

    pub fn samples(&mut self, scan: i64) -> Result<Vec<f64>> {
        let entry = self.locate(scan)?;
        let pos_words = (entry.block - 1) * self.reclen + (entry.word - 1);
        let (desc, adata, _ldata) = self.read_obs_block(&entry)?;

        let is_spectrum = entry.kind == 0;
        let ndata = if is_spectrum {
            desc.spectroscopic.nchan as i64
        } else {
            desc.continuum.npoin as i64
        };
        if ndata as usize > MAX_CHANNELS {
            log::warn!("channel count {} exceeds MAX_CHANNELS; the limit is informational, returning the full vector", ndata);
        }

        let data_pos_words = pos_words + adata - 1;
        self.source.seek_bytes(4 * data_pos_words as u64)?;
        let bytes = self.source.read_words(ndata as usize)?;
        Ok(widen_f32_le(bytes))
    }

    /// Dump the raw words of a scan's observation header record, 8 per
    /// line, for debugging. Mirrors the original's `dumpRecord`.
    pub fn dump_obs_record(&mut self, scan: i64) -> Result<String> {
        let entry = self.locate(scan)?;
        self.source.seek_bytes(byte_offset(entry.block, entry.word, self.reclen))?;
        let record = self.source.read_words(self.reclen as usize)?;
        Ok(dump_words(record))
    }
}

fn decode_type2_entry(record: &[u8], k: usize, lind: i64, reclen: i64) -> Result<DirectoryEntry> {
    let start = k * (lind as usize) * 4;
    let mut cur = Cursor::new(&record[start..]);

    let xblock = cur.read_i64()?;
    let xword = cur.read_i32()? as i64;
    let xnum = cur.read_i64()?;
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
    let _xposa = cur.read_i32()?;
    let xscan = cur.read_i64()?;
    let xsubs = cur.read_i32()?;

    Ok(DirectoryEntry {
        num: xnum,
        version: xver,
        block: xblock,
        word: xword,
        kind: xkind,
        source: xsourc,
        line: xline,
        telescope: xtel,
        xdobs,
        offset1: xoff1,
        offset2: xoff2,
        scan_num: xscan,
        reclen,
        xsubs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor as IoCursor;

    const RECLEN: i64 = 32;
    const LIND: i64 = 26;

    fn push_i32(buf: &mut Vec<u8>, v: i32) {
        buf.extend_from_slice(&v.to_le_bytes());
    }
    fn push_i64(buf: &mut Vec<u8>, v: i64) {
        buf.extend_from_slice(&v.to_le_bytes());
    }
    fn push_f32(buf: &mut Vec<u8>, v: f32) {
        buf.extend_from_slice(&v.to_le_bytes());
    }
    fn push_f64(buf: &mut Vec<u8>, v: f64) {
        buf.extend_from_slice(&v.to_le_bytes());
    }
    fn push_str(buf: &mut Vec<u8>, s: &str, len: usize) {
        let mut bytes = s.as_bytes().to_vec();
        bytes.resize(len, b' ');
        buf.extend_from_slice(&bytes);
    }
    fn pad_to_words(buf: &mut Vec<u8>, words: i64) {
        let target = (words * 4) as usize;
        if buf.len() < target {
            buf.resize(target, 0);
        }
    }

    /// Build a minimal one-scan Type-2 file with `gex == 10` (one
    /// extension, no growth), record length 32 words, directory entry
    /// width 26 words, and an observation block with one spectroscopic
    /// section plus 2 data samples.
    fn build_one_scan_file() -> Vec<u8> {
        let mut file = Vec::new();

        // Record 1: the file descriptor.
        let mut fd = Vec::new();
        push_str(&mut fd, "2A", 4); // code, word 1
        push_i32(&mut fd, RECLEN as i32); // reclen, word 2
        push_i32(&mut fd, 1); // kind, word 3
        push_i32(&mut fd, 0); // vind, word 4
        push_i32(&mut fd, LIND as i32); // lind, word 5
        push_i32(&mut fd, 0); // flags, word 6
        push_i64(&mut fd, 0); // xnext, words 7-8
        push_i64(&mut fd, 0); // nextrec, words 9-10
        push_i32(&mut fd, 0); // nextword, word 11
        push_i32(&mut fd, 1); // lex1, word 12
        push_i32(&mut fd, 1); // nex, word 13
        push_i32(&mut fd, 10); // gex, word 14
        push_i64(&mut fd, 2); // ext[0] = record 2, words 15-16
        pad_to_words(&mut fd, RECLEN);
        file.extend_from_slice(&fd);

        // Record 2: directory extension, one entry (width 26 words = 104 bytes).
        let mut dir = Vec::new();
        push_i64(&mut dir, 3); // xblock: obs block at record 3
        push_i32(&mut dir, 1); // xword: word 1 within that block
        push_i64(&mut dir, 1); // xnum
        push_i32(&mut dir, 1); // xver
        push_str(&mut dir, "SOURCE", 12);
        push_str(&mut dir, "LINE", 12);
        push_str(&mut dir, "TELESCOPE", 12);
        push_i32(&mut dir, 20500); // xdobs
        push_i32(&mut dir, 0); // xdred
        push_f32(&mut dir, 0.0); // xoff1
        push_f32(&mut dir, 0.0); // xoff2
        push_str(&mut dir, "XUNK", 4); // xtype
        push_i32(&mut dir, 0); // xkind: spectrum
        push_i32(&mut dir, 0); // xqual
        push_i32(&mut dir, 0); // xposa
        push_i64(&mut dir, 99); // xscan
        push_i32(&mut dir, 0); // xsubs
        pad_to_words(&mut dir, LIND);
        pad_to_words(&mut dir, RECLEN);
        file.extend_from_slice(&dir);

        // Record 3: observation header, one section (-4), data after it.
        // Fixed header/tables occupy words 1-16; section occupies words
        // 17-33 (17 words); data starts at word 34.
        let mut obs = Vec::new();
        push_str(&mut obs, "SEC2", 4); // ident, word 1
        push_i32(&mut obs, 1); // version, word 2
        push_i32(&mut obs, 1); // nsec, word 3
        push_i64(&mut obs, 0); // nword, words 4-5
        push_i64(&mut obs, 34); // adata: data at word 34, words 6-7
        push_i64(&mut obs, 2); // ldata: 2 words of data, words 8-9
        push_i64(&mut obs, 1); // xnum, words 10-11
        push_i32(&mut obs, -4); // sec_cod[0], word 12
        push_i64(&mut obs, 17); // sec_len[0]: 17 words, words 13-14
        push_i64(&mut obs, 17); // sec_adr[0]: relative word 17, words 15-16

        assert_eq!(obs.len(), 16 * 4);
        push_str(&mut obs, "LINE", 12); // words 17-19
        push_f64(&mut obs, 115271.2); // restf, words 20-21
        push_i32(&mut obs, 2); // nchan, word 22
        push_f32(&mut obs, 1.0); // rchan, word 23
        push_f32(&mut obs, 1.0); // fres, word 24
        push_f32(&mut obs, 0.0); // foff, word 25
        push_f32(&mut obs, 0.0); // vres, word 26
        push_f32(&mut obs, 0.0); // voff, word 27
        push_f32(&mut obs, 0.0); // badl, word 28
        push_f64(&mut obs, 0.0); // image, words 29-30
        push_i32(&mut obs, 0); // vtype, word 31
        push_f64(&mut obs, 0.0); // doppler, words 32-33

        assert_eq!(obs.len(), 33 * 4); // section ends at word 33 (17 words: 17..33)
        for sample in [5.0f32, 6.0] {
            push_f32(&mut obs, sample); // data: words 34-35
        }
        file.extend_from_slice(&obs);

        file
    }

    #[test]
    fn enumerates_single_scan_directory() {
        let bytes = build_one_scan_file();
        let mut reader = Type2Reader::open(IoCursor::new(bytes)).unwrap();
        assert_eq!(reader.count().unwrap(), 1);
    }

    #[test]
    fn decodes_header_and_samples_for_single_scan() {
        let bytes = build_one_scan_file();
        let mut reader = Type2Reader::open(IoCursor::new(bytes)).unwrap();

        let head = reader.header(1).unwrap();
        assert_eq!(head.scan_num, 99);
        assert_eq!(head.target.as_str(), "SOURCE");
        assert_eq!(head.f0, 115271.2);
        assert_eq!(head.num_channels, 2);

        let samples = reader.samples(1).unwrap();
        assert_eq!(samples, vec![5.0, 6.0]);
    }

    #[test]
    fn out_of_range_scan_is_an_error() {
        let bytes = build_one_scan_file();
        let mut reader = Type2Reader::open(IoCursor::new(bytes)).unwrap();
        assert!(reader.header(0).is_err());
        assert!(reader.header(2).is_err());
    }

    #[test]
    fn dump_obs_record_reports_every_word() {
        let bytes = build_one_scan_file();
        let mut reader = Type2Reader::open(IoCursor::new(bytes)).unwrap();
        let dump = reader.dump_obs_record(1).unwrap();
        assert_eq!(dump.lines().count(), RECLEN as usize / 8);
        assert!(dump.contains("[000]"));
    }

    /// Build a two-extension `gex == 20` file: extension 0 has `lex1 * 2^0
    /// == 1` slot, extension 1 has `lex1 * 2^1 == 2` slots, all occupied,
    /// exercising the doubling-growth branch of `slots_in_extension`.
    fn build_doubling_growth_file() -> Vec<u8> {
        let mut file = Vec::new();

        // Record 1: the file descriptor, lex1 = 1, gex = 20, two extensions.
        let mut fd = Vec::new();
        push_str(&mut fd, "2A", 4);
        push_i32(&mut fd, RECLEN as i32); // reclen
        push_i32(&mut fd, 1); // kind
        push_i32(&mut fd, 0); // vind
        push_i32(&mut fd, LIND as i32); // lind
        push_i32(&mut fd, 0); // flags
        push_i64(&mut fd, 0); // xnext
        push_i64(&mut fd, 0); // nextrec
        push_i32(&mut fd, 0); // nextword
        push_i32(&mut fd, 1); // lex1
        push_i32(&mut fd, 2); // nex
        push_i32(&mut fd, 20); // gex: doubling
        push_i64(&mut fd, 2); // ext[0] = record 2
        push_i64(&mut fd, 3); // ext[1] = record 3
        pad_to_words(&mut fd, RECLEN);
        file.extend_from_slice(&fd);

        fn push_entry(buf: &mut Vec<u8>, xblock: i64, xnum: i64, source: &str) {
            push_i64(buf, xblock);
            push_i32(buf, 1); // xword
            push_i64(buf, xnum);
            push_i32(buf, 1); // xver
            push_str(buf, source, 12);
            push_str(buf, "LINE", 12);
            push_str(buf, "TELESCOPE", 12);
            push_i32(buf, 20500); // xdobs
            push_i32(buf, 0); // xdred
            push_f32(buf, 0.0); // xoff1
            push_f32(buf, 0.0); // xoff2
            push_str(buf, "XUNK", 4); // xtype
            push_i32(buf, 0); // xkind
            push_i32(buf, 0); // xqual
            push_i32(buf, 0); // xposa
            push_i64(buf, 1); // xscan
            push_i32(buf, 0); // xsubs
        }

        // Record 2: extension 0, one occupied slot.
        let mut ext0 = Vec::new();
        push_entry(&mut ext0, 4, 1, "A");
        assert_eq!(ext0.len(), LIND as usize * 4);
        pad_to_words(&mut ext0, RECLEN);
        file.extend_from_slice(&ext0);

        // Record 3: extension 1, two occupied slots (doubled from extension 0).
        let mut ext1 = Vec::new();
        push_entry(&mut ext1, 4, 1, "B");
        push_entry(&mut ext1, 4, 1, "C");
        assert_eq!(ext1.len(), 2 * LIND as usize * 4);
        file.extend_from_slice(&ext1);

        file
    }

    #[test]
    fn doubling_growth_sums_lex1_times_2_pow_i_slots_per_extension() {
        let bytes = build_doubling_growth_file();
        let mut reader = Type2Reader::open(IoCursor::new(bytes)).unwrap();
        // extension 0: lex1 * 2^0 == 1, extension 1: lex1 * 2^1 == 2.
        assert_eq!(reader.count().unwrap(), 3);
    }

    #[test]
    fn rejects_invalid_growth_rule() {
        let mut fd = Vec::new();
        push_str(&mut fd, "2A", 4);
        push_i32(&mut fd, 16); // reclen
        push_i32(&mut fd, 1); // kind
        push_i32(&mut fd, 0); // vind
        push_i32(&mut fd, 8); // lind
        push_i32(&mut fd, 0); // flags
        push_i64(&mut fd, 0); // xnext
        push_i64(&mut fd, 0); // nextrec
        push_i32(&mut fd, 0); // nextword
        push_i32(&mut fd, 1); // lex1
        push_i32(&mut fd, 1); // nex
        push_i32(&mut fd, 7); // gex: invalid
        push_i64(&mut fd, 2); // ext[0]
        pad_to_words(&mut fd, 16);

        let result = Type2Reader::open(IoCursor::new(fd));
        assert!(result.is_err());
    }
}
