use std::io::Read;

use super::PboOptions;
use crate::de::{DeserializeOwned, RawProperties};
use crate::error::{Error, FormatError, Result};
use crate::header::{HeaderEntry, Mime};
use crate::properties::Properties;

/// The parsed header table of an archive.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PboMetadata {
    /// File entries in archive order, which is also content order.
    pub(crate) entries: Vec<HeaderEntry>,

    /// Pairs following the version header, in archive order.
    pub(crate) properties: Properties,
}

impl PboMetadata {
    #[inline(always)]
    pub fn entries(&self) -> &[HeaderEntry] {
        &self.entries
    }

    #[inline(always)]
    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// Sum of every entry's stored size.
    pub fn content_len(&self) -> u64 {
        self.entries.iter().map(HeaderEntry::packed_size).sum()
    }

    pub fn entry(&self, filename: &str) -> Option<&HeaderEntry> {
        self.entries.iter().find(|e| e.filename == filename)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TableState {
    ExpectingVersion,
    ReadingEntries,
    Done,
}

/// Reads header entries from the current position up to and including the
/// sentinel.
pub(crate) fn read_table<R: Read>(reader: &mut R, options: &PboOptions) -> Result<PboMetadata> {
    let mut meta = PboMetadata::default();
    let mut state = TableState::ExpectingVersion;

    while state != TableState::Done {
        let entry = HeaderEntry::deserialize_owned(reader)?;
        let mime = entry.mime;

        state = match mime {
            Mime::Version => {
                if state != TableState::ExpectingVersion {
                    options.recover(FormatError::VersionNotFirst.into())?;
                }
                let properties =
                    RawProperties::deserialize_owned(reader)?.into_properties(options)?;
                tracing::debug!(?state, count = properties.len(), "read version header");
                meta.properties.extend(properties);
                TableState::ReadingEntries
            }
            _ if !mime.is_supported() => return Err(Error::Unsupported(mime)),
            _ if entry.filename.is_empty() => {
                if !entry.is_sentinel() {
                    options.recover(FormatError::SentinelNotEmpty.into())?;
                }
                TableState::Done
            }
            _ => {
                meta.entries.push(entry);
                TableState::ReadingEntries
            }
        };
    }

    tracing::debug!(
        entries = meta.entries.len(),
        properties = meta.properties.len(),
        "read header table"
    );

    Ok(meta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ser::Serialize;
    use std::io::Cursor;

    fn table(entries: &[HeaderEntry], trailing: &[u8]) -> Cursor<Vec<u8>> {
        let mut out = vec![];
        for entry in entries {
            entry.write(&mut out).unwrap();
            if entry.mime == Mime::Version {
                out.extend_from_slice(b"prefix\0x\0\0");
            }
        }
        out.extend_from_slice(trailing);
        Cursor::new(out)
    }

    #[test]
    fn version_and_entries() {
        let mut cursor = table(
            &[
                HeaderEntry::version(),
                HeaderEntry::new("a.txt", 1, 3),
                HeaderEntry::new("B.txt", 2, 0),
                HeaderEntry::sentinel(),
            ],
            b"abc",
        );
        let meta = read_table(&mut cursor, &PboOptions::default()).unwrap();
        assert_eq!(meta.properties().get("prefix"), Some("x"));
        assert_eq!(meta.entries().len(), 2);
        assert_eq!(meta.entries()[1].filename, "B.txt");
        assert_eq!(meta.content_len(), 3);
        assert_eq!(cursor.position() as usize, cursor.get_ref().len() - 3);
    }

    #[test]
    fn no_version_header() {
        let mut cursor = table(&[HeaderEntry::new("a.txt", 1, 3), HeaderEntry::sentinel()], b"");
        let meta = read_table(&mut cursor, &PboOptions::default()).unwrap();
        assert!(meta.properties().is_empty());
        assert!(meta.entry("a.txt").is_some());
    }

    #[test]
    fn late_version_header() {
        let entries = [
            HeaderEntry::version(),
            HeaderEntry::new("a.txt", 1, 3),
            HeaderEntry::version(),
            HeaderEntry::sentinel(),
        ];

        let err = read_table(&mut table(&entries, b""), &PboOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Format(FormatError::VersionNotFirst)));

        let options = PboOptions::default().ignore_errors(true);
        let meta = read_table(&mut table(&entries, b""), &options).unwrap();
        assert_eq!(meta.entries().len(), 1);
        assert_eq!(
            meta.properties().iter().collect::<Vec<_>>(),
            vec![("prefix", "x"), ("prefix", "x")]
        );
    }

    #[test]
    fn unsupported_entries() {
        for mime in [Mime::Compressed, Mime::Encoded] {
            let mut entry = HeaderEntry::new("a.txt", 1, 3);
            entry.mime = mime;
            let entries = [entry, HeaderEntry::sentinel()];

            let options = PboOptions::default().ignore_errors(true);
            let err = read_table(&mut table(&entries, b""), &options).unwrap_err();
            assert!(matches!(err, Error::Unsupported(m) if m == mime));
        }
    }

    #[test]
    fn unknown_mime_is_plain() {
        let mut entry = HeaderEntry::new("a.txt", 1, 3);
        entry.mime = Mime::Other(0x1234);
        let meta = read_table(
            &mut table(&[entry, HeaderEntry::sentinel()], b""),
            &PboOptions::default(),
        )
        .unwrap();
        assert_eq!(meta.entries()[0].mime, Mime::Other(0x1234));
    }

    #[test]
    fn sentinel_not_empty() {
        let entries = [HeaderEntry::new("", 5, 0)];

        let err = read_table(&mut table(&entries, b""), &PboOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Format(FormatError::SentinelNotEmpty)));

        let options = PboOptions::default().ignore_errors(true);
        let meta = read_table(&mut table(&entries, b""), &options).unwrap();
        assert!(meta.entries().is_empty());
    }

    #[test]
    fn missing_sentinel() {
        let mut cursor = table(&[HeaderEntry::new("a.txt", 1, 3)], b"");
        let err = read_table(&mut cursor, &PboOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Format(FormatError::HeaderTooShort)));
    }
}
