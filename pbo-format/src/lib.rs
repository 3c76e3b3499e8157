//! Reading, writing and verifying PBO archives.
//!
//! A PBO is a flat archive: an optional version header with a property list,
//! a table of file headers ended by an all-zero sentinel, the concatenated
//! file contents, and a trailer holding the SHA-1 of everything before it.

mod checksum;
mod de;
mod error;
mod file;
pub mod fs;
mod hashing;
mod header;
pub mod path;
mod properties;
mod ser;

pub use checksum::{verify, verify_stream, Checksum, Verification};
pub use error::{Error, FormatError, Result};
pub use file::{
    pack, pack_with_progress, PackStats, PboMetadata, PboOptions, PboReader, PboWriter, Progress,
    UnpackStats,
};
pub use hashing::{HashingReader, HashingWriter};
pub use header::{HeaderEntry, Mime, HEADER_FIXED_LEN, TRAILER_LEN};
pub use path::PboPath;
pub use properties::{Properties, DEFAULT_PROPERTIES_FILE};
