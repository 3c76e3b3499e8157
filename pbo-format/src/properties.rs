//! The property list stored after the version header, and its `key=value`
//! side file in an unpacked tree.

use std::fmt;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::{Error, FormatError, Result};
use crate::file::PboOptions;
use crate::ser::check_asciiz;

/// Default name of the side file at the root of an unpacked tree.
pub const DEFAULT_PROPERTIES_FILE: &str = ".pboproperties";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties(Vec<(String, String)>);

impl Properties {
    pub fn push<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.0.push((key.into(), value.into()));
    }

    pub fn extend(&mut self, other: Properties) {
        self.0.extend(other.0);
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parses side file contents. Everything after the first `=` is the value,
    /// blank lines are skipped.
    pub fn parse(text: &str) -> Properties {
        let mut properties = Properties::default();
        for line in text.lines() {
            if line.is_empty() {
                continue;
            }
            match line.split_once('=') {
                Some((key, value)) => properties.push(key, value),
                None => properties.push(line, ""),
            }
        }
        properties
    }

    /// Reads the side file, returning `None` if it does not exist.
    pub fn read_from<P: AsRef<Path>>(path: P) -> Result<Option<Properties>> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(text) => Ok(Some(Properties::parse(&text))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Io(e, path.to_path_buf())),
        }
    }

    /// Drops pairs that cannot be stored in an archive. Each one is an error
    /// unless `options` allows it to be skipped.
    ///
    /// An empty key would end the list early, so it is refused too.
    pub(crate) fn into_storable(self, options: &PboOptions) -> Result<Properties> {
        let mut storable = Properties::default();
        for (key, value) in self.0 {
            let checked = if key.is_empty() {
                Err(FormatError::UnencodableString(key.clone()).into())
            } else {
                check_asciiz(&key).and_then(|_| check_asciiz(&value))
            };
            match checked {
                Ok(()) => storable.push(key, value),
                Err(err) => options.recover(err)?,
            }
        }
        Ok(storable)
    }

    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_string()).map_err(|e| Error::Io(e, path.to_path_buf()))
    }
}

impl fmt::Display for Properties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in self.iter() {
            writeln!(f, "{}={}", key, value)?;
        }
        Ok(())
    }
}
