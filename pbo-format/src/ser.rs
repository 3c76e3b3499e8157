use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::error::{FormatError, Result};
use crate::header::HeaderEntry;
use crate::properties::Properties;

pub(crate) trait Serialize {
    fn write<W: Write>(&self, writer: &mut W) -> Result<()>;
}

/// Fails unless `value` can be written as a zero-terminated ASCII string.
pub(crate) fn check_asciiz(value: &str) -> Result<()> {
    if !value.is_ascii() || value.contains('\0') {
        return Err(FormatError::UnencodableString(value.to_string()).into());
    }
    Ok(())
}

/// Writes `value` followed by its zero terminator.
pub(crate) fn write_asciiz<W: Write>(writer: &mut W, value: &str) -> Result<()> {
    check_asciiz(value)?;
    writer.write_all(value.as_bytes())?;
    writer.write_u8(0)?;
    Ok(())
}

impl Serialize for HeaderEntry {
    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        // The terminator doubles as the leading reserved byte of the fixed record.
        write_asciiz(writer, &self.filename)?;
        writer.write_u32::<LittleEndian>(self.mime.as_u32())?;
        writer.write_u32::<LittleEndian>(self.original_size)?;
        writer.write_u32::<LittleEndian>(self.offset)?;
        writer.write_u32::<LittleEndian>(self.timestamp)?;
        writer.write_u32::<LittleEndian>(self.data_size)?;
        Ok(())
    }
}

impl Serialize for Properties {
    /// Writes each pair, then the empty key ending the list.
    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        for (key, value) in self.iter() {
            write_asciiz(writer, key)?;
            write_asciiz(writer, value)?;
        }
        writer.write_u8(0)?;
        Ok(())
    }
}
