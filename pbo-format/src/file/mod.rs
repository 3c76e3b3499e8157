use std::path::Path;

use crate::error::{Error, Result};
use crate::header::HeaderEntry;
use crate::properties::DEFAULT_PROPERTIES_FILE;

pub(crate) mod meta;
pub mod reader;
pub mod writer;

pub use self::meta::PboMetadata;
pub use self::reader::{PboReader, UnpackStats};
pub use self::writer::{pack, pack_with_progress, PackStats, PboWriter};

/// Options shared by pack, unpack and verify.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PboOptions {
    /// Name of the properties side file at the root of an unpacked tree.
    pub properties_file: String,
    /// Log recoverable errors as warnings and carry on.
    pub ignore_errors: bool,
    /// Report what would happen without touching the filesystem.
    pub dry_run: bool,
}

impl Default for PboOptions {
    fn default() -> Self {
        Self {
            properties_file: DEFAULT_PROPERTIES_FILE.to_string(),
            ignore_errors: false,
            dry_run: false,
        }
    }
}

impl PboOptions {
    pub fn properties_file<S: Into<String>>(mut self, name: S) -> Self {
        self.properties_file = name.into();
        self
    }

    pub fn ignore_errors(mut self, ignore_errors: bool) -> Self {
        self.ignore_errors = ignore_errors;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    #[inline(always)]
    pub(crate) fn can_skip(&self, err: &Error) -> bool {
        self.ignore_errors && err.is_recoverable()
    }

    /// Swallows `err` with a warning when errors are ignored and the error
    /// allows it, otherwise hands it back.
    pub(crate) fn recover(&self, err: Error) -> Result<()> {
        if self.can_skip(&err) {
            tracing::warn!(error = %err, "ignoring error");
            Ok(())
        } else {
            Err(err)
        }
    }
}

/// Progress updates from packing or unpacking.
#[derive(Debug, Clone, Copy)]
pub enum Progress<'a> {
    /// The header table is known.
    Started { total_files: u64, total_bytes: u64 },
    /// An entry is being written into the archive.
    Packing { entry: &'a HeaderEntry, source: &'a Path },
    /// An entry is being extracted. `dest` is `None` on a dry run.
    Unpacking {
        entry: &'a HeaderEntry,
        dest: Option<&'a Path>,
    },
    /// An entry was left out after an ignored error.
    Skipped { name: &'a str, error: &'a Error },
    /// All entries have been processed.
    Finished,
}
