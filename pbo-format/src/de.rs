use std::io::{ErrorKind, Read};

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::{Error, FormatError, Result};
use crate::file::PboOptions;
use crate::header::{HeaderEntry, Mime};
use crate::properties::Properties;

pub(crate) trait DeserializeOwned {
    fn deserialize_owned<R: Read>(reader: &mut R) -> Result<Self>
    where
        Self: Sized;
}

/// Reads a zero-terminated string. The end of the stream also terminates it.
pub(crate) fn read_asciiz<R: Read>(reader: &mut R) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    loop {
        match reader.read_u8() {
            Ok(0) => break,
            Ok(b) => buf.push(b),
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e),
        }
    }
    Ok(buf)
}

fn ascii_string(bytes: Vec<u8>) -> Result<String> {
    if bytes.is_ascii() {
        Ok(bytes.into_iter().map(char::from).collect())
    } else {
        Err(FormatError::NonAsciiFilename(String::from_utf8_lossy(&bytes).into_owned()).into())
    }
}

impl DeserializeOwned for HeaderEntry {
    fn deserialize_owned<R: Read>(reader: &mut R) -> Result<Self> {
        let filename = ascii_string(read_asciiz(reader)?)?;

        let mut fields = [0u8; 20];
        reader.read_exact(&mut fields).map_err(|e| match e.kind() {
            ErrorKind::UnexpectedEof => Error::Format(FormatError::HeaderTooShort),
            _ => Error::Stream(e),
        })?;
        let mut fields = &fields[..];

        let entry = HeaderEntry {
            filename,
            mime: Mime::from_u32(fields.read_u32::<LittleEndian>()?),
            original_size: fields.read_u32::<LittleEndian>()?,
            offset: fields.read_u32::<LittleEndian>()?,
            timestamp: fields.read_u32::<LittleEndian>()?,
            data_size: fields.read_u32::<LittleEndian>()?,
        };

        tracing::debug!(
            filename = %entry.filename,
            mime = %entry.mime,
            original_size = entry.original_size,
            timestamp = entry.timestamp,
            data_size = entry.data_size,
            "deserialized HeaderEntry"
        );

        Ok(entry)
    }
}

/// A property list as stored, before its strings are checked.
pub(crate) struct RawProperties(Vec<(Vec<u8>, Vec<u8>)>);

impl DeserializeOwned for RawProperties {
    /// Reads key/value pairs up to and including the empty key.
    fn deserialize_owned<R: Read>(reader: &mut R) -> Result<Self> {
        let mut pairs = vec![];
        loop {
            let key = read_asciiz(reader)?;
            if key.is_empty() {
                break;
            }
            let value = read_asciiz(reader)?;
            pairs.push((key, value));
        }

        tracing::debug!(count = pairs.len(), "deserialized RawProperties");
        Ok(RawProperties(pairs))
    }
}

impl RawProperties {
    /// Keeps the ASCII pairs. Any other pair is an error unless `options`
    /// allows it to be dropped.
    pub(crate) fn into_properties(self, options: &PboOptions) -> Result<Properties> {
        let mut properties = Properties::default();
        for (key, value) in self.0 {
            if key.is_ascii() && value.is_ascii() {
                properties.push(
                    key.into_iter().map(char::from).collect::<String>(),
                    value.into_iter().map(char::from).collect::<String>(),
                );
            } else {
                let key = String::from_utf8_lossy(&key).into_owned();
                options.recover(FormatError::NonAsciiProperty(key).into())?;
            }
        }
        Ok(properties)
    }
}
