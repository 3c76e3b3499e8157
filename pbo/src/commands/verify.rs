use std::path::Path;

use pbo_format::{PboOptions, Verification};

use crate::error::{Error, Result};

/// Prints the digest of a valid archive. Returns `false` on a mismatch.
pub fn run(input: &Path, options: &PboOptions) -> Result<bool> {
    let verification = pbo_format::verify(input, options).map_err(|source| Error::Verify {
        path: input.to_path_buf(),
        source,
    })?;

    match verification {
        Verification::Valid(checksum) => {
            println!("{}", checksum);
            Ok(true)
        }
        Verification::Mismatch { stored, computed } => {
            eprintln!(
                "{}: checksums do not match (stored {}, computed {})",
                input.display(),
                stored,
                computed
            );
            Ok(false)
        }
    }
}
