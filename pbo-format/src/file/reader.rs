use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom};
use std::path::Path;

use sha1::Sha1;

use super::meta::read_table;
use super::{PboMetadata, PboOptions, Progress};
use crate::checksum::{hash_exact, read_trailer, trailer_offset, Checksum};
use crate::error::{Error, FormatError, Result};
use crate::fs::set_file_time;
use crate::hashing::HashingReader;
use crate::header::HeaderEntry;
use crate::path::PboPath;
use crate::properties::Properties;

/// Statistics from unpacking an archive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnpackStats {
    /// Number of files written to disk.
    pub files_extracted: u64,
    /// Total content bytes written to disk.
    pub bytes_written: u64,
    /// Entries left out after an ignored error.
    pub entries_skipped: u64,
    /// Whether the properties side file was written.
    pub properties_written: bool,
    /// The verified trailer digest.
    pub checksum: Option<Checksum>,
}

/// A single forward pass over an archive stream.
///
/// The header table is parsed on construction. Unpacking then consumes the
/// content and checks the trailer, hashing everything on the way through.
pub struct PboReader<R> {
    hashing: HashingReader<R, Sha1>,
    len: u64,
    meta: PboMetadata,
    options: PboOptions,
}

impl<R> std::fmt::Debug for PboReader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PboReader")
            .field("len", &self.len)
            .field("meta", &self.meta)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl PboReader<BufReader<File>> {
    /// Opens the archive at `path` and reads its header table.
    pub fn open<P: AsRef<Path>>(path: P, options: PboOptions) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::Io(e, path.to_path_buf()))?;
        PboReader::new(BufReader::new(file), options)
    }
}

impl<R: Read + Seek> PboReader<R> {
    pub fn new(mut reader: R, options: PboOptions) -> Result<Self> {
        let len = reader.seek(SeekFrom::End(0))?;
        trailer_offset(len)?;
        reader.seek(SeekFrom::Start(0))?;

        let mut hashing = HashingReader::<_, Sha1>::new(reader);
        let meta = read_table(&mut hashing, &options)?;
        tracing::debug!(len, table_len = hashing.bytes_read(), "opened archive");

        Ok(PboReader {
            hashing,
            len,
            meta,
            options,
        })
    }

    #[inline(always)]
    pub fn entries(&self) -> &[HeaderEntry] {
        self.meta.entries()
    }

    #[inline(always)]
    pub fn properties(&self) -> &Properties {
        self.meta.properties()
    }

    #[inline(always)]
    pub fn options(&self) -> &PboOptions {
        &self.options
    }

    #[inline(always)]
    pub fn unpack<P: AsRef<Path>>(self, dest: P) -> Result<UnpackStats> {
        self.unpack_with_progress(dest, |_| {})
    }

    /// Extracts every entry below `dest`, then checks the trailer.
    ///
    /// On a dry run nothing is written, but content is still consumed so the
    /// trailer check runs exactly as it would otherwise.
    pub fn unpack_with_progress<P, F>(mut self, dest: P, mut progress: F) -> Result<UnpackStats>
    where
        P: AsRef<Path>,
        F: FnMut(Progress<'_>),
    {
        let dest = dest.as_ref();
        let dry_run = self.options.dry_run;
        let trailer = trailer_offset(self.len)?;
        let mut stats = UnpackStats::default();

        progress(Progress::Started {
            total_files: self.meta.entries.len() as u64,
            total_bytes: self.meta.content_len(),
        });

        if !dry_run {
            fs::create_dir_all(dest).map_err(|e| Error::Io(e, dest.to_path_buf()))?;
            if !self.meta.properties.is_empty() {
                self.meta
                    .properties
                    .write_to(dest.join(&self.options.properties_file))?;
                stats.properties_written = true;
            }
        }

        for entry in &self.meta.entries {
            let target = match PboPath::from_archive(entry.filename.as_str()).to_path_below(dest) {
                Some(target) => Some(target),
                None => {
                    let err = Error::from(FormatError::UnsafePath(entry.filename.clone()));
                    if !self.options.can_skip(&err) {
                        return Err(err);
                    }
                    tracing::warn!(error = %err, "skipping entry");
                    progress(Progress::Skipped {
                        name: &entry.filename,
                        error: &err,
                    });
                    stats.entries_skipped += 1;
                    None
                }
            };

            // Content never extends into the trailer.
            let limit = entry
                .packed_size()
                .min(trailer.saturating_sub(self.hashing.bytes_read()));

            let copied = match target.as_deref() {
                Some(path) if !dry_run => {
                    progress(Progress::Unpacking {
                        entry,
                        dest: Some(path),
                    });
                    let copied = extract_entry(&mut self.hashing, entry, path, limit)?;
                    stats.files_extracted += 1;
                    stats.bytes_written += copied;
                    copied
                }
                Some(_) => {
                    progress(Progress::Unpacking { entry, dest: None });
                    skip_entry(&mut self.hashing, limit)?
                }
                None => skip_entry(&mut self.hashing, limit)?,
            };

            if copied != entry.packed_size() {
                self.options.recover(Error::Truncated {
                    path: entry.filename.clone(),
                    expected: entry.packed_size(),
                    actual: copied,
                })?;
            }
        }

        let checksum = self.finish(trailer)?;
        stats.checksum = Some(checksum);
        progress(Progress::Finished);

        Ok(stats)
    }

    /// Hashes whatever is left before the trailer and checks it.
    ///
    /// Content must end exactly where the trailer starts. Anything else is
    /// only tolerated when errors are ignored.
    fn finish(mut self, trailer: u64) -> Result<Checksum> {
        let consumed = self.hashing.bytes_read();
        if consumed != trailer {
            self.options
                .recover(FormatError::ContentLength { consumed, trailer }.into())?;
        }

        if consumed > trailer {
            tracing::debug!(consumed, trailer, "read past trailer, rehashing from start");
            self.hashing.get_mut().seek(SeekFrom::Start(0))?;
            self.hashing.reset();
            hash_exact(&mut self.hashing, trailer)?;
        } else {
            hash_exact(&mut self.hashing, trailer - consumed)?;
        }

        let (mut reader, hasher) = self.hashing.into_parts();
        read_trailer(&mut reader, Checksum::from_hasher(hasher), &self.options)?.into_result()
    }
}

/// Streams up to `limit` bytes of one entry's content into a new file at `path`.
fn extract_entry<R: Read>(
    reader: &mut R,
    entry: &HeaderEntry,
    path: &Path,
    limit: u64,
) -> Result<u64> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::Io(e, parent.to_path_buf()))?;
    }

    let file = File::create(path).map_err(|e| Error::Io(e, path.to_path_buf()))?;
    let mut writer = BufWriter::new(file);
    let copied = io::copy(&mut reader.by_ref().take(limit), &mut writer)
        .map_err(|e| Error::Io(e, path.to_path_buf()))?;

    let file = writer
        .into_inner()
        .map_err(|e| Error::Io(e.into_error(), path.to_path_buf()))?;
    set_file_time(&file, entry.timestamp).map_err(|e| Error::Io(e, path.to_path_buf()))?;

    tracing::debug!(path = %path.display(), bytes = copied, "extracted entry");
    Ok(copied)
}

fn skip_entry<R: Read>(reader: &mut R, limit: u64) -> Result<u64> {
    Ok(io::copy(&mut reader.by_ref().take(limit), &mut io::sink())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ser::Serialize;
    use sha1::Digest;
    use std::io::Cursor;

    fn archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut out = vec![];
        for (name, data) in entries {
            HeaderEntry::new(*name, 1_600_000_000, data.len() as u32)
                .write(&mut out)
                .unwrap();
        }
        HeaderEntry::sentinel().write(&mut out).unwrap();
        for (_, data) in entries {
            out.extend_from_slice(data);
        }
        let digest = Sha1::digest(&out);
        out.push(0);
        out.extend_from_slice(&digest);
        out
    }

    #[test]
    fn unpack_entries() {
        let dir = tempfile::tempdir().unwrap();
        let data = archive(&[("a.txt", &b"abc"[..]), ("sub\\b.txt", &b"hello"[..])]);

        let reader = PboReader::new(Cursor::new(data), PboOptions::default()).unwrap();
        assert_eq!(reader.entries().len(), 2);
        let stats = reader.unpack(dir.path()).unwrap();

        assert_eq!(stats.files_extracted, 2);
        assert_eq!(stats.bytes_written, 8);
        assert!(!stats.properties_written);
        assert!(stats.checksum.is_some());
        assert_eq!(fs::read(dir.path().join("a.txt")).unwrap(), b"abc");
        assert_eq!(
            fs::read(dir.path().join("sub").join("b.txt")).unwrap(),
            b"hello"
        );

        let modified = fs::metadata(dir.path().join("a.txt"))
            .unwrap()
            .modified()
            .unwrap();
        assert_eq!(
            crate::fs::system_time_to_timestamp(modified),
            Some(1_600_000_000)
        );
    }

    #[test]
    fn dry_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out");
        let data = archive(&[("a.txt", &b"abc"[..])]);

        let mut seen = vec![];
        let reader = PboReader::new(Cursor::new(data), PboOptions::default().dry_run(true)).unwrap();
        let stats = reader
            .unpack_with_progress(&dest, |p| {
                if let Progress::Unpacking { entry, dest } = p {
                    assert!(dest.is_none());
                    seen.push(entry.filename.clone());
                }
            })
            .unwrap();

        assert_eq!(seen, vec!["a.txt"]);
        assert_eq!(stats.files_extracted, 0);
        assert!(stats.checksum.is_some());
        assert!(!dest.exists());
    }

    #[test]
    fn unsafe_paths() {
        let dir = tempfile::tempdir().unwrap();
        let data = archive(&[("..\\evil.txt", &b"bad"[..]), ("good.txt", &b"ok"[..])]);

        let err = PboReader::new(Cursor::new(data.clone()), PboOptions::default())
            .unwrap()
            .unpack(dir.path())
            .unwrap_err();
        assert!(matches!(err, Error::Format(FormatError::UnsafePath(_))));

        let options = PboOptions::default().ignore_errors(true);
        let stats = PboReader::new(Cursor::new(data), options)
            .unwrap()
            .unpack(dir.path())
            .unwrap();
        assert_eq!(stats.entries_skipped, 1);
        assert_eq!(fs::read(dir.path().join("good.txt")).unwrap(), b"ok");
        assert!(!dir.path().parent().unwrap().join("evil.txt").exists());
    }

    #[test]
    fn checksum_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let mut data = archive(&[("a.txt", &b"abc"[..])]);
        let len = data.len();
        data[len - 22] ^= 0xff;

        let options = PboOptions::default().ignore_errors(true);
        let err = PboReader::new(Cursor::new(data), options)
            .unwrap()
            .unpack(dir.path())
            .unwrap_err();
        assert!(matches!(err, Error::ChecksumMismatch { .. }));
    }

    #[test]
    fn truncated() {
        let dir = tempfile::tempdir().unwrap();
        let mut data = vec![];
        HeaderEntry::new("a.txt", 0, 100).write(&mut data).unwrap();
        HeaderEntry::sentinel().write(&mut data).unwrap();
        data.extend_from_slice(&[1u8; 30]);

        let err = PboReader::new(Cursor::new(data.clone()), PboOptions::default())
            .unwrap()
            .unpack(dir.path())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Truncated {
                expected: 100,
                actual: 9,
                ..
            }
        ));

        let options = PboOptions::default().ignore_errors(true);
        let err = PboReader::new(Cursor::new(data), options)
            .unwrap()
            .unpack(dir.path())
            .unwrap_err();
        assert!(matches!(err, Error::ChecksumMismatch { .. }));
    }

    /// An archive whose trailer digest covers a header claiming more content
    /// than sits before the trailer.
    fn oversized_entry() -> Vec<u8> {
        let mut out = vec![];
        HeaderEntry::new("a.txt", 0, 24).write(&mut out).unwrap();
        HeaderEntry::sentinel().write(&mut out).unwrap();
        out.extend_from_slice(b"abc");
        let digest = Sha1::digest(&out);
        out.push(0);
        out.extend_from_slice(&digest);
        out
    }

    #[test]
    fn content_stops_at_trailer() {
        let dir = tempfile::tempdir().unwrap();
        let data = oversized_entry();
        assert!(crate::verify_stream(Cursor::new(data.clone()), &PboOptions::default())
            .unwrap()
            .is_valid());

        let err = PboReader::new(Cursor::new(data.clone()), PboOptions::default())
            .unwrap()
            .unpack(dir.path())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Truncated {
                expected: 24,
                actual: 3,
                ..
            }
        ));

        let options = PboOptions::default().ignore_errors(true);
        let stats = PboReader::new(Cursor::new(data), options)
            .unwrap()
            .unpack(dir.path())
            .unwrap();
        assert!(stats.checksum.is_some());
        assert_eq!(fs::read(dir.path().join("a.txt")).unwrap(), b"abc");
    }

    #[test]
    fn unclaimed_bytes_before_trailer() {
        let dir = tempfile::tempdir().unwrap();
        let mut data = vec![];
        HeaderEntry::new("a.txt", 0, 3).write(&mut data).unwrap();
        HeaderEntry::sentinel().write(&mut data).unwrap();
        data.extend_from_slice(b"abcdefgh");
        let digest = Sha1::digest(&data);
        data.push(0);
        data.extend_from_slice(&digest);

        let err = PboReader::new(Cursor::new(data.clone()), PboOptions::default())
            .unwrap()
            .unpack(dir.path())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Format(FormatError::ContentLength {
                consumed: 50,
                trailer: 55,
            })
        ));

        let options = PboOptions::default().ignore_errors(true);
        let stats = PboReader::new(Cursor::new(data), options)
            .unwrap()
            .unpack(dir.path())
            .unwrap();
        assert_eq!(stats.files_extracted, 1);
        assert_eq!(fs::read(dir.path().join("a.txt")).unwrap(), b"abc");
    }

    #[test]
    fn too_short_for_trailer() {
        let err = PboReader::new(Cursor::new(vec![0u8; 10]), PboOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Format(FormatError::MissingTrailer(10))));
    }
}
