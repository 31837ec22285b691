//! The common directory entry both Type-1 and Type-2 front-ends expose,
//! independent of which on-disk entry layout produced it.

use crate::FlexString;

/// One scan's worth of locating information, normalized across both file
/// layouts. Type-1 entries carry no `word`/`xsubs` of their own — the
/// observation block always starts at word 1, and Type-1 has no subscans.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectoryEntry {
    /// Directory occupancy counter (`xnum`); used only to detect the first
    /// empty slot while enumerating, not to address the observation block.
    pub num: i64,
    pub version: i32,
    pub block: i64,
    /// 1-based word offset into `block` (`xword`, Type-2 only; always 1 for Type-1).
    pub word: i64,
    pub kind: i32,
    pub source: FlexString,
    pub line: FlexString,
    pub telescope: FlexString,
    /// Observation day number (`xdobs`), prior to the MJD/Unix-epoch offset.
    pub xdobs: i32,
    pub offset1: f32,
    pub offset2: f32,
    /// The scan number as recorded by the observer (`xscan`); what callers
    /// usually mean by "scan", distinct from the 1-based directory index.
    pub scan_num: i64,
    /// Length in words of the record this entry points into. For Type-1
    /// files this is always the file's fixed record length; Type-2 entries
    /// carry their own `reclen`.
    pub reclen: i64,
    /// Subscan count (`xsubs`, Type-2 only). Zero for Type-1 entries.
    pub xsubs: i32,
}
