use std::path::Path;

use pbo_format::{PboOptions, PboReader};

use crate::error::{Error, Result};

pub fn run(input: &Path, output: &Path, options: &PboOptions, verbose: bool) -> Result<()> {
    let to_error = |source| Error::Unpack {
        path: input.to_path_buf(),
        source,
    };

    let reader = PboReader::open(input, options.clone()).map_err(to_error)?;
    let stats = reader
        .unpack_with_progress(output, |progress| {
            if verbose || options.dry_run {
                super::print_progress(progress)
            }
        })
        .map_err(to_error)?;

    if verbose && !options.dry_run {
        println!(
            "Extracted {} files to {}",
            stats.files_extracted,
            output.display()
        );
    }

    if stats.entries_skipped > 0 {
        eprintln!("WARNING: {} entries were skipped", stats.entries_skipped);
    }

    Ok(())
}
