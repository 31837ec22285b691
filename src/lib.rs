//! A reader for the binary files ("CLASSIC") written out by the GILDAS/CLASS
//! single-dish radio-astronomy data reduction suite.

mod cursor;
pub mod descriptor;
pub mod directory;
pub mod error;
pub mod header;
mod record_io;
mod section;
pub mod type1;
pub mod type2;

mod reader;

pub use error::ClassError;
pub use header::SpectrumHeader;
pub use reader::Reader;

use smallstr::SmallString;

/// Convenience type alias for a string with the SSO, sized for the 12-character
/// fixed-width source/line/instrument columns of a CLASSIC directory entry.
pub(crate) const FIXED_STRING_LENGTH: usize = 13;
pub type FlexString = SmallString<[u8; FIXED_STRING_LENGTH]>;

/// Crate's Result type.
pub type Result<T> = std::result::Result<T, error::ClassError>;

/// Maximum number of channels/points a section is expected to carry.
pub const MAX_CHANNELS: usize = 262_144;

/// Maximum number of directory extensions a Type-2 file descriptor may declare.
pub const MAX_EXTENSIONS: usize = 10;
