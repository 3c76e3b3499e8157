//! The SHA-1 trailer and whole-archive verification.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use byteorder::ReadBytesExt;
use sha1::{Digest, Sha1};

use crate::error::{Error, FormatError, Result};
use crate::file::PboOptions;
use crate::hashing::HashingReader;
use crate::header::TRAILER_LEN;

/// A SHA-1 digest as stored in an archive trailer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Checksum([u8; 20]);

impl Checksum {
    pub fn from_bytes(bytes: [u8; 20]) -> Checksum {
        Checksum(bytes)
    }

    pub(crate) fn from_hasher(hasher: Sha1) -> Checksum {
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&hasher.finalize());
        Checksum(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Outcome of checking an archive against its trailer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    Valid(Checksum),
    Mismatch { stored: Checksum, computed: Checksum },
}

impl Verification {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verification::Valid(_))
    }

    pub fn computed(&self) -> Checksum {
        match self {
            Verification::Valid(checksum) => *checksum,
            Verification::Mismatch { computed, .. } => *computed,
        }
    }

    pub(crate) fn into_result(self) -> Result<Checksum> {
        match self {
            Verification::Valid(checksum) => Ok(checksum),
            Verification::Mismatch { stored, computed } => Err(Error::ChecksumMismatch {
                stored: stored.to_hex(),
                computed: computed.to_hex(),
            }),
        }
    }
}

/// Offset of the trailer in a stream of `len` bytes.
pub(crate) fn trailer_offset(len: u64) -> Result<u64> {
    len.checked_sub(TRAILER_LEN)
        .ok_or(Error::Format(FormatError::MissingTrailer(len)))
}

/// Hashes `len` bytes of `reader` into `hashing`, in bounded chunks.
pub(crate) fn hash_exact<R: Read>(hashing: &mut HashingReader<R, Sha1>, len: u64) -> Result<()> {
    let copied = std::io::copy(&mut hashing.by_ref().take(len), &mut std::io::sink())?;
    if copied != len {
        return Err(Error::Stream(std::io::ErrorKind::UnexpectedEof.into()));
    }
    Ok(())
}

/// Reads the zero marker and stored digest at the current position and
/// compares the digest against `computed`.
pub(crate) fn read_trailer<R: Read>(
    reader: &mut R,
    computed: Checksum,
    options: &PboOptions,
) -> Result<Verification> {
    let marker = reader.read_u8()?;
    if marker != 0 {
        options.recover(FormatError::ChecksumMarker(marker).into())?;
    }

    let mut stored = [0u8; 20];
    reader.read_exact(&mut stored)?;
    let stored = Checksum::from_bytes(stored);

    tracing::debug!(%stored, %computed, "read trailer");

    if stored == computed {
        Ok(Verification::Valid(computed))
    } else {
        Ok(Verification::Mismatch { stored, computed })
    }
}

/// Recomputes the digest of everything before the trailer and compares it
/// to the stored one, without parsing any headers.
pub fn verify_stream<R: Read + Seek>(mut reader: R, options: &PboOptions) -> Result<Verification> {
    let len = reader.seek(SeekFrom::End(0))?;
    let trailer = trailer_offset(len)?;
    reader.seek(SeekFrom::Start(0))?;

    let mut hashing = HashingReader::<_, Sha1>::new(reader);
    hash_exact(&mut hashing, trailer)?;
    let (mut reader, hasher) = hashing.into_parts();

    read_trailer(&mut reader, Checksum::from_hasher(hasher), options)
}

/// [`verify_stream`] over the archive at `path`.
pub fn verify<P: AsRef<Path>>(path: P, options: &PboOptions) -> Result<Verification> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::Io(e, path.to_path_buf()))?;
    let verification = verify_stream(BufReader::new(file), options)?;

    match &verification {
        Verification::Valid(checksum) => {
            tracing::info!(path = %path.display(), %checksum, "checksum valid")
        }
        Verification::Mismatch { stored, computed } => {
            tracing::warn!(path = %path.display(), %stored, %computed, "checksum mismatch")
        }
    }

    Ok(verification)
}
