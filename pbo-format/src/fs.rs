//! Filesystem helpers for packing: enumerating a tree and converting
//! modification times to and from archive timestamps.

use std::convert::TryFrom;
use std::fs::{File, FileTimes};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jwalk::WalkDir;

use crate::error::{Error, FormatError, Result};
use crate::file::PboOptions;
use crate::path::PboPath;

/// A regular file found below the directory being packed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub pbo_path: PboPath,
    pub timestamp: u32,
    pub len: u32,
}

/// Seconds since the epoch as an archive timestamp, if it fits.
pub fn system_time_to_timestamp(time: SystemTime) -> Option<u32> {
    let secs = time.duration_since(UNIX_EPOCH).ok()?.as_secs();
    u32::try_from(secs).ok()
}

pub fn timestamp_to_system_time(timestamp: u32) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(timestamp as u64)
}

/// Sets both the access and modification time of `file` to `timestamp`.
pub fn set_file_time(file: &File, timestamp: u32) -> std::io::Result<()> {
    let time = timestamp_to_system_time(timestamp);
    file.set_times(FileTimes::new().set_accessed(time).set_modified(time))
}

/// Case-insensitive archive order, with a case-sensitive tiebreak.
pub fn archive_order(a: &str, b: &str) -> std::cmp::Ordering {
    a.to_ascii_lowercase()
        .cmp(&b.to_ascii_lowercase())
        .then_with(|| a.cmp(b))
}

/// Collects every regular file below `root` in archive order.
///
/// Symlinks are followed only when they point at a regular file. The
/// properties side file at the root and the archive at `exclude` are left out.
/// Files that cannot be stored are passed to `skipped` when errors are
/// ignored.
pub fn collect_files<F>(
    root: &Path,
    exclude: Option<&Path>,
    options: &PboOptions,
    mut skipped: F,
) -> Result<Vec<SourceFile>>
where
    F: FnMut(&Path, &Error),
{
    let exclude = exclude.and_then(|p| p.canonicalize().ok());
    let mut files = vec![];

    for entry in WalkDir::new(root)
        .sort(true)
        .skip_hidden(false)
        .follow_links(false)
    {
        let entry = entry.map_err(|e| Error::Walk(e, root.to_path_buf()))?;
        if entry.depth == 0 {
            continue;
        }

        let path = entry.path();
        let meta = match std::fs::metadata(&path) {
            Ok(meta) => meta,
            // Dangling symlink.
            Err(e) if entry.file_type().is_symlink() => {
                tracing::debug!(path = %path.display(), error = %e, "skipping broken link");
                continue;
            }
            Err(e) => return Err(Error::Io(e, path)),
        };
        if !meta.is_file() {
            continue;
        }

        let relative = match path.strip_prefix(root) {
            Ok(relative) => relative,
            Err(_) => continue,
        };
        if relative == Path::new(&options.properties_file) {
            continue;
        }

        if let Some(exclude) = &exclude {
            if path.file_name() == exclude.file_name()
                && path.canonicalize().ok().as_ref() == Some(exclude)
            {
                tracing::debug!(path = %path.display(), "not packing the archive into itself");
                continue;
            }
        }

        match source_file(&path, relative, &meta) {
            Ok(file) => files.push(file),
            Err(e) if options.can_skip(&e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping file");
                skipped(relative, &e);
            }
            Err(e) => return Err(e),
        }
    }

    files.sort_by(|a, b| archive_order(a.pbo_path.as_str(), b.pbo_path.as_str()));
    Ok(files)
}

fn source_file(path: &Path, relative: &Path, meta: &std::fs::Metadata) -> Result<SourceFile> {
    let pbo_path =
        PboPath::new(relative).map_err(|e| Error::InvalidPath(e, relative.to_path_buf()))?;

    let len = u32::try_from(meta.len()).map_err(|_| FormatError::EntryTooLarge {
        path: pbo_path.to_string(),
        len: meta.len(),
    })?;

    let modified = meta
        .modified()
        .map_err(|e| Error::Io(e, path.to_path_buf()))?;
    let timestamp = system_time_to_timestamp(modified)
        .ok_or_else(|| FormatError::TimestampOutOfRange(pbo_path.to_string()))?;

    Ok(SourceFile {
        path: path.to_path_buf(),
        pbo_path,
        timestamp,
        len,
    })
}
