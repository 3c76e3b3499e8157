use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Cannot read input `{}`", .path.display())]
    ReadInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("`{}` is neither a regular file nor a directory", .path.display())]
    UnsupportedInput { path: PathBuf },

    #[error("Cannot derive an archive name from `{}`", .path.display())]
    NoOutputPath { path: PathBuf },

    #[error("Cannot pack `{}`", .path.display())]
    Pack {
        path: PathBuf,
        #[source]
        source: pbo_format::Error,
    },

    #[error("Cannot unpack `{}`", .path.display())]
    Unpack {
        path: PathBuf,
        #[source]
        source: pbo_format::Error,
    },

    #[error("Cannot verify `{}`", .path.display())]
    Verify {
        path: PathBuf,
        #[source]
        source: pbo_format::Error,
    },
}
