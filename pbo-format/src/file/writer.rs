use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;

use byteorder::WriteBytesExt;
use sha1::Sha1;

use super::{PboOptions, Progress};
use crate::checksum::Checksum;
use crate::error::{Error, Result};
use crate::fs::{collect_files, SourceFile};
use crate::hashing::HashingWriter;
use crate::header::HeaderEntry;
use crate::properties::Properties;
use crate::ser::Serialize;

/// Statistics from packing a directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackStats {
    /// Number of files written into the archive.
    pub files_packed: u64,
    /// Total content bytes written into the archive.
    pub bytes_packed: u64,
    /// Files left out after an ignored error.
    pub files_skipped: u64,
    /// Whether a version header with properties was written.
    pub properties_written: bool,
    /// Digest appended as the trailer. `None` on a dry run.
    pub checksum: Option<Checksum>,
}

/// Writes an archive front to back, hashing every byte.
///
/// Call order is properties (optional), headers, then each entry's content
/// in header order, then [`PboWriter::finish`].
pub struct PboWriter<W: Write> {
    hashing: HashingWriter<W, Sha1>,
}

impl<W: Write> PboWriter<W> {
    pub fn new(inner: W) -> Self {
        PboWriter {
            hashing: HashingWriter::new(inner),
        }
    }

    #[inline(always)]
    pub fn bytes_written(&self) -> u64 {
        self.hashing.bytes_written()
    }

    /// Writes the version header and its property list.
    pub fn write_properties(&mut self, properties: &Properties) -> Result<()> {
        HeaderEntry::version().write(&mut self.hashing)?;
        properties.write(&mut self.hashing)
    }

    /// Writes the header table followed by the sentinel.
    pub fn write_headers<'a, I>(&mut self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a HeaderEntry>,
    {
        for entry in entries {
            entry.write(&mut self.hashing)?;
        }
        HeaderEntry::sentinel().write(&mut self.hashing)
    }

    /// Copies exactly `entry.data_size` bytes of content from `reader`.
    ///
    /// A reader yielding more or fewer bytes is a [`Error::LengthMismatch`],
    /// since the header has already been written.
    pub fn write_content<R: Read>(
        &mut self,
        entry: &HeaderEntry,
        reader: &mut R,
        source: &Path,
    ) -> Result<u64> {
        let expected = entry.packed_size();
        let copied = io::copy(&mut reader.by_ref().take(expected), &mut self.hashing)
            .map_err(|e| Error::Io(e, source.to_path_buf()))?;

        let mut extra_byte = [0u8; 1];
        let extra = reader
            .read(&mut extra_byte)
            .map_err(|e| Error::Io(e, source.to_path_buf()))?;

        if copied != expected || extra != 0 {
            return Err(Error::LengthMismatch {
                path: source.to_path_buf(),
                expected,
                actual: copied + extra as u64,
            });
        }

        Ok(copied)
    }

    /// Appends the zero marker and the digest of everything written so far.
    pub fn finish(self) -> Result<(W, Checksum)> {
        let (mut inner, hasher) = self.hashing.into_parts();
        let checksum = Checksum::from_hasher(hasher);

        inner.write_u8(0)?;
        inner.write_all(checksum.as_bytes())?;
        inner.flush()?;

        tracing::debug!(%checksum, "wrote trailer");
        Ok((inner, checksum))
    }
}

#[inline(always)]
pub fn pack<S: AsRef<Path>, D: AsRef<Path>>(
    src: S,
    dest: D,
    options: &PboOptions,
) -> Result<PackStats> {
    pack_with_progress(src, dest, options, |_| {})
}

/// Packs every regular file below `src` into a new archive at `dest`.
///
/// On a dry run the tree is enumerated and reported but `dest` is not created.
pub fn pack_with_progress<S, D, F>(
    src: S,
    dest: D,
    options: &PboOptions,
    mut progress: F,
) -> Result<PackStats>
where
    S: AsRef<Path>,
    D: AsRef<Path>,
    F: FnMut(Progress<'_>),
{
    let src = src.as_ref();
    let dest = dest.as_ref();
    let mut stats = PackStats::default();

    let files = collect_files(src, Some(dest), options, |path, error| {
        stats.files_skipped += 1;
        progress(Progress::Skipped {
            name: &path.to_string_lossy(),
            error,
        });
    })?;
    let properties = Properties::read_from(src.join(&options.properties_file))?
        .map(|properties| properties.into_storable(options))
        .transpose()?;

    let entries = files
        .iter()
        .map(|f| HeaderEntry::new(f.pbo_path.as_str(), f.timestamp, f.len))
        .collect::<Vec<_>>();

    progress(Progress::Started {
        total_files: entries.len() as u64,
        total_bytes: entries.iter().map(HeaderEntry::packed_size).sum(),
    });

    if options.dry_run {
        for (entry, file) in entries.iter().zip(&files) {
            progress(Progress::Packing {
                entry,
                source: &file.path,
            });
        }
        progress(Progress::Finished);
        return Ok(stats);
    }

    let out = File::create(dest).map_err(|e| Error::Io(e, dest.to_path_buf()))?;
    let mut writer = PboWriter::new(BufWriter::new(out));

    if let Some(properties) = &properties {
        writer.write_properties(properties)?;
        stats.properties_written = true;
    }
    writer.write_headers(&entries)?;

    for (entry, file) in entries.iter().zip(&files) {
        progress(Progress::Packing {
            entry,
            source: &file.path,
        });
        stats.bytes_packed += write_file(&mut writer, entry, file)?;
        stats.files_packed += 1;
    }

    let (out, checksum) = writer.finish()?;
    out.into_inner()
        .map_err(|e| Error::Io(e.into_error(), dest.to_path_buf()))?;

    tracing::info!(
        path = %dest.display(),
        files = stats.files_packed,
        bytes = stats.bytes_packed,
        %checksum,
        "packed archive"
    );

    stats.checksum = Some(checksum);
    progress(Progress::Finished);
    Ok(stats)
}

fn write_file<W: Write>(
    writer: &mut PboWriter<W>,
    entry: &HeaderEntry,
    file: &SourceFile,
) -> Result<u64> {
    let mut input = File::open(&file.path).map_err(|e| Error::Io(e, file.path.clone()))?;
    writer.write_content(entry, &mut input, &file.path)
}
