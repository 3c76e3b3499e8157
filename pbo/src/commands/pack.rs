use std::path::{Path, PathBuf};

use pbo_format::PboOptions;

use crate::error::{Error, Result};

/// `<input>.pbo` next to the input directory.
fn default_output(input: &Path) -> Result<PathBuf> {
    let dir = input.canonicalize().map_err(|source| Error::ReadInput {
        path: input.to_path_buf(),
        source,
    })?;
    let mut name = dir
        .file_name()
        .ok_or_else(|| Error::NoOutputPath {
            path: input.to_path_buf(),
        })?
        .to_os_string();
    name.push(".pbo");
    Ok(dir.with_file_name(name))
}

pub fn run(
    input: &Path,
    output: Option<PathBuf>,
    options: &PboOptions,
    verbose: bool,
) -> Result<()> {
    let output = match output {
        Some(output) => output,
        None => default_output(input)?,
    };

    let stats = pbo_format::pack_with_progress(input, &output, options, |progress| {
        if verbose || options.dry_run {
            super::print_progress(progress)
        }
    })
    .map_err(|source| Error::Pack {
        path: input.to_path_buf(),
        source,
    })?;

    if let Some(checksum) = stats.checksum {
        if verbose {
            println!(
                "Packed {} files into {} ({})",
                stats.files_packed,
                output.display(),
                checksum
            );
        }
    }

    if stats.files_skipped > 0 {
        eprintln!("WARNING: {} files were skipped", stats.files_skipped);
    }

    Ok(())
}
