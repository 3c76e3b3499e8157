use std::path::PathBuf;

use crate::header::Mime;
use crate::path::IntoPboPathError;

pub type Result<T> = std::result::Result<T, Error>;

/// Structural problems with the archive bytes, or with values that cannot be
/// represented in them.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("header too short")]
    HeaderTooShort,

    #[error("version header must be first")]
    VersionNotFirst,

    #[error("terminating header has non-zero fields")]
    SentinelNotEmpty,

    #[error("checksum marker not zero (found {0:#04x})")]
    ChecksumMarker(u8),

    #[error("archive is too short to contain a checksum trailer ({0} bytes)")]
    MissingTrailer(u64),

    #[error("entry content ends at byte {consumed}, but the checksum trailer starts at byte {trailer}")]
    ContentLength { consumed: u64, trailer: u64 },

    #[error("filename is not ASCII: {0:?}")]
    NonAsciiFilename(String),

    #[error("property `{0}` is not ASCII")]
    NonAsciiProperty(String),

    #[error("string cannot be stored in an archive: {0:?}")]
    UnencodableString(String),

    #[error("entry `{0}` would be extracted outside of the destination")]
    UnsafePath(String),

    #[error("`{path}` is {len} bytes, larger than an archive entry can hold")]
    EntryTooLarge { path: String, len: u64 },

    #[error("modification time of `{0}` cannot be stored in an archive")]
    TimestampOutOfRange(String),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Malformed archive: {0}")]
    Format(#[from] FormatError),

    #[error("{0} archives are not supported")]
    Unsupported(Mime),

    #[error("Expected data, but reached end of archive. Entry: '{path}' ({actual} of {expected} bytes)")]
    Truncated {
        path: String,
        expected: u64,
        actual: u64,
    },

    #[error("Checksums do not match. Stored: {stored}, computed: {computed}")]
    ChecksumMismatch { stored: String, computed: String },

    #[error("Entry size mismatch for '{}': expected {expected}, got {actual}", .path.display())]
    LengthMismatch {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    #[error("Cannot handle path '{}'", .1.display())]
    InvalidPath(#[source] IntoPboPathError, PathBuf),

    #[error("Cannot walk directory. Path: '{}'", .1.display())]
    Walk(#[source] jwalk::Error, PathBuf),

    #[error("Filesystem operation failed. Path: '{}'", .1.display())]
    Io(#[source] std::io::Error, PathBuf),

    #[error("Reading or writing the archive stream failed")]
    Stream(#[from] std::io::Error),
}

impl Error {
    /// Whether the error may be logged and skipped when errors are ignored.
    ///
    /// Unsupported entries, checksum mismatches and a missing trailer are never
    /// recoverable.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Format(FormatError::MissingTrailer(_)) => false,
            Error::Format(_) | Error::Truncated { .. } | Error::InvalidPath(..) => true,
            _ => false,
        }
    }
}
