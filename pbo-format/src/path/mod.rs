use std::{
    fmt,
    path::{Component, Path, PathBuf},
};

mod error;

pub use self::error::IntoPboPathError;

#[cfg(not(windows))]
/// The platform-specific separator as a string, used for printing `PboPath`s
/// in the platform-preferred manner.
pub const PATH_PLATFORM_SEP: &str = "/";

#[cfg(windows)]
/// The platform-specific separator as a string, used for printing `PboPath`s
/// in the platform-preferred manner.
pub const PATH_PLATFORM_SEP: &str = "\\";

/// The separator used inside archive filenames.
pub const PATH_PBO_SEP: &str = "\\";

/// An archive-relative filename, `\`-separated and ASCII only.
#[derive(Debug, Clone, PartialOrd, Ord, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct PboPath(pub(crate) String);

/// Translates a host-relative path to the archive convention.
///
/// On hosts whose separator already is `\` this is the identity.
pub fn os_path_to_pbo_path(path: &str) -> String {
    if PATH_PLATFORM_SEP == PATH_PBO_SEP {
        return path.to_string();
    }
    path.split(PATH_PLATFORM_SEP)
        .collect::<Vec<_>>()
        .join(PATH_PBO_SEP)
}

/// Translates an archive filename to the host convention. Inverse of
/// [`os_path_to_pbo_path`].
pub fn pbo_path_to_os_path(path: &str) -> String {
    if PATH_PLATFORM_SEP == PATH_PBO_SEP {
        return path.to_string();
    }
    path.split(PATH_PBO_SEP)
        .collect::<Vec<_>>()
        .join(PATH_PLATFORM_SEP)
}

impl PboPath {
    /// Builds an archive path from a path relative to the packed directory.
    pub fn new<P: AsRef<Path>>(path: P) -> std::result::Result<PboPath, IntoPboPathError> {
        let mut out = vec![];

        for component in path.as_ref().components() {
            match component {
                Component::CurDir => {}
                Component::Normal(os_str) => {
                    let part = os_str
                        .to_str()
                        .filter(|x| x.is_ascii() && !x.contains('\0'))
                        .ok_or(IntoPboPathError::UnrepresentableStr)?;
                    out.push(part);
                }
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(IntoPboPathError::NonRelative)
                }
            }
        }

        if out.is_empty() {
            return Err(IntoPboPathError::EmptyPath);
        }

        Ok(PboPath(os_path_to_pbo_path(&out.join(PATH_PLATFORM_SEP))))
    }

    /// Wraps a filename read from an archive as is.
    pub fn from_archive<S: Into<String>>(filename: S) -> PboPath {
        PboPath(filename.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The host path of this entry below `root`, or `None` if any part would
    /// escape it.
    pub fn to_path_below(&self, root: &Path) -> Option<PathBuf> {
        let mut parts = vec![];
        for part in self.iter().filter(|x| !x.is_empty() && *x != ".") {
            if part == ".." || part.contains(&['/', ':'][..]) {
                return None;
            }
            parts.push(part);
        }
        if parts.is_empty() {
            return None;
        }
        Some(root.join(pbo_path_to_os_path(&parts.join(PATH_PBO_SEP))))
    }

    pub fn iter(&self) -> std::str::Split<'_, &str> {
        self.0.split(PATH_PBO_SEP)
    }
}

impl fmt::Display for PboPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&pbo_path_to_os_path(&self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_relative() {
        let pbo_path = PboPath::new(Path::new("scripts").join("init.sqf")).unwrap();
        assert_eq!(pbo_path.as_str(), "scripts\\init.sqf");

        let pbo_path = PboPath::new("./config.cpp").unwrap();
        assert_eq!(pbo_path.as_str(), "config.cpp");
    }

    #[test]
    fn rejects_unrepresentable() {
        assert!(matches!(
            PboPath::new("caf\u{e9}.txt"),
            Err(IntoPboPathError::UnrepresentableStr)
        ));
        assert!(matches!(
            PboPath::new("../outside"),
            Err(IntoPboPathError::NonRelative)
        ));
        assert!(matches!(PboPath::new(""), Err(IntoPboPathError::EmptyPath)));
        assert!(matches!(PboPath::new("."), Err(IntoPboPathError::EmptyPath)));
    }

    #[test]
    fn translation_is_inverse() {
        for path in ["a", "a\\b\\c.txt", "dir\\", ""] {
            assert_eq!(os_path_to_pbo_path(&pbo_path_to_os_path(path)), path);
        }
        #[cfg(not(windows))]
        assert_eq!(pbo_path_to_os_path("a\\b\\c.txt"), "a/b/c.txt");
        #[cfg(windows)]
        assert_eq!(pbo_path_to_os_path("a\\b\\c.txt"), "a\\b\\c.txt");
    }

    #[test]
    fn below_root() {
        let root = Path::new("out");
        let path = PboPath::from_archive("a\\.\\b.txt").to_path_below(root);
        assert_eq!(path, Some(root.join("a").join("b.txt")));

        let pbo_path = PboPath::new(Path::new("sub").join("b.txt")).unwrap();
        assert_eq!(
            pbo_path.to_path_below(root),
            Some(root.join("sub").join("b.txt"))
        );

        assert_eq!(PboPath::from_archive("a\\..\\..\\b").to_path_below(root), None);
        assert_eq!(PboPath::from_archive("\\").to_path_below(root), None);
        assert_eq!(PboPath::from_archive("a/../../b").to_path_below(root), None);
        assert_eq!(PboPath::from_archive("C:\\b").to_path_below(root), None);
    }
}
