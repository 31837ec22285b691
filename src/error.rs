use thiserror::Error;

/// Crate errors.
#[derive(Error, Debug)]
pub enum ClassError {
    #[error("failed to open '{path}': {source}")]
    Open { path: String, source: std::io::Error },

    #[error("unrecognized CLASSIC file format (expected magic \"1A\" or \"2A\")")]
    UnknownFormat,

    #[error("scan {scan} out of range (file has {count} scans)")]
    ScanOutOfRange { scan: i64, count: i64 },

    #[error("unsupported Type-2 file descriptor: {0}")]
    UnsupportedHeader(String),

    #[error("failed to decode a fixed-width ASCII field")]
    InvalidString(#[from] std::str::Utf8Error),

    #[error("I/O error")]
    Io(#[from] std::io::Error),
}
