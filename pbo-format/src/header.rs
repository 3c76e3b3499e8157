use std::fmt;

/// Size of the fixed part of a header: the filename terminator plus five `u32` fields.
pub const HEADER_FIXED_LEN: usize = 21;

/// Size of the trailer: a zero marker byte followed by the SHA-1 digest.
pub const TRAILER_LEN: u64 = 21;

pub(crate) const MIME_PLAIN: u32 = 0x0000_0000;
pub(crate) const MIME_VERSION: u32 = 0x5665_7273;
pub(crate) const MIME_COMPRESSED: u32 = 0x4370_7273;
pub(crate) const MIME_ENCODED: u32 = 0x456e_6372;

/// The packing method tag of a header entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mime {
    Plain,
    /// The synthetic first entry followed by the property list.
    Version,
    Compressed,
    Encoded,
    /// Unknown tags are carried through and treated like `Plain`.
    Other(u32),
}

impl Mime {
    pub fn from_u32(value: u32) -> Mime {
        match value {
            MIME_PLAIN => Mime::Plain,
            MIME_VERSION => Mime::Version,
            MIME_COMPRESSED => Mime::Compressed,
            MIME_ENCODED => Mime::Encoded,
            other => Mime::Other(other),
        }
    }

    pub fn as_u32(self) -> u32 {
        match self {
            Mime::Plain => MIME_PLAIN,
            Mime::Version => MIME_VERSION,
            Mime::Compressed => MIME_COMPRESSED,
            Mime::Encoded => MIME_ENCODED,
            Mime::Other(other) => other,
        }
    }

    #[inline(always)]
    pub fn is_supported(self) -> bool {
        !matches!(self, Mime::Compressed | Mime::Encoded)
    }
}

impl fmt::Display for Mime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mime::Plain => f.write_str("plain"),
            Mime::Version => f.write_str("Vers"),
            Mime::Compressed => f.write_str("Cprs"),
            Mime::Encoded => f.write_str("Encr"),
            Mime::Other(value) => {
                // Tags read most significant byte first.
                for b in value.to_be_bytes() {
                    if b.is_ascii_graphic() {
                        write!(f, "{}", b as char)?;
                    } else {
                        write!(f, "\\x{:02x}", b)?;
                    }
                }
                Ok(())
            }
        }
    }
}

/// One record of the header table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderEntry {
    /// Archive-relative path, `\`-separated, ASCII only.
    pub filename: String,
    pub mime: Mime,
    /// Declared uncompressed size, `0` meaning "same as `data_size`".
    pub original_size: u32,
    /// Reserved, always `0` when written.
    pub offset: u32,
    /// Modification time in POSIX seconds.
    pub timestamp: u32,
    /// Number of content bytes stored for this entry.
    pub data_size: u32,
}

impl HeaderEntry {
    pub fn new<S: Into<String>>(filename: S, timestamp: u32, data_size: u32) -> HeaderEntry {
        HeaderEntry {
            filename: filename.into(),
            mime: Mime::Plain,
            original_size: 0,
            offset: 0,
            timestamp,
            data_size,
        }
    }

    /// The entry preceding the property list.
    pub fn version() -> HeaderEntry {
        HeaderEntry {
            mime: Mime::Version,
            ..HeaderEntry::sentinel()
        }
    }

    /// The all-zero entry ending the header table.
    pub fn sentinel() -> HeaderEntry {
        HeaderEntry::new(String::new(), 0, 0)
    }

    #[inline(always)]
    pub fn is_sentinel(&self) -> bool {
        self == &HeaderEntry::sentinel()
    }

    #[inline(always)]
    pub fn packed_size(&self) -> u64 {
        self.data_size as u64
    }

    #[inline(always)]
    pub fn unpacked_size(&self) -> u64 {
        if self.original_size == 0 {
            self.data_size as u64
        } else {
            self.original_size as u64
        }
    }

    /// Informational only; content is never decompressed.
    #[inline(always)]
    pub fn is_compressed(&self) -> bool {
        self.packed_size() != self.unpacked_size()
    }

    /// Encoded length of this entry in the header table.
    #[inline(always)]
    pub fn encoded_len(&self) -> usize {
        self.filename.len() + HEADER_FIXED_LEN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_tags() {
        assert_eq!(Mime::from_u32(0x5665_7273), Mime::Version);
        assert_eq!(Mime::from_u32(0x4370_7273), Mime::Compressed);
        assert_eq!(Mime::from_u32(0x456e_6372), Mime::Encoded);
        assert_eq!(Mime::from_u32(0), Mime::Plain);
        assert_eq!(Mime::from_u32(7), Mime::Other(7));
        assert_eq!(Mime::Other(7).as_u32(), 7);
        assert_eq!(Mime::Version.as_u32().to_le_bytes(), *b"sreV");
    }

    #[test]
    fn mime_display() {
        assert_eq!(Mime::Compressed.to_string(), "Cprs");
        assert_eq!(Mime::Other(0x4142_4344).to_string(), "ABCD");
        assert_eq!(Mime::Other(0x4142_0044).to_string(), "AB\\x00D");
    }

    #[test]
    fn derived_sizes() {
        let mut entry = HeaderEntry::new("a.txt", 0, 10);
        assert_eq!(entry.packed_size(), 10);
        assert_eq!(entry.unpacked_size(), 10);
        assert!(!entry.is_compressed());

        entry.original_size = 25;
        assert_eq!(entry.unpacked_size(), 25);
        assert!(entry.is_compressed());
    }

    #[test]
    fn sentinel() {
        assert!(HeaderEntry::sentinel().is_sentinel());
        assert!(!HeaderEntry::version().is_sentinel());
        assert_eq!(HeaderEntry::sentinel().encoded_len(), 21);
    }
}
