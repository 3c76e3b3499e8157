//! Hashing wrappers for computing digests while reading or writing.

use std::io::{Read, Result, Write};

use digest::Digest;

/// A reader wrapper that computes a hash digest while data is read through it.
///
/// The hash is updated as data passes through `read`.
pub struct HashingReader<R, D> {
    inner: R,
    hasher: D,
    bytes_read: u64,
}

impl<R, D: Digest + Default> HashingReader<R, D> {
    /// Create a new hashing reader wrapping the given reader.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            hasher: D::default(),
            bytes_read: 0,
        }
    }

    /// Get the total number of bytes read through this reader.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Access the inner reader. Bytes read from it directly are not hashed.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Discards everything hashed so far.
    pub fn reset(&mut self) {
        self.hasher = D::default();
        self.bytes_read = 0;
    }

    pub fn into_parts(self) -> (R, D) {
        (self.inner, self.hasher)
    }
}

impl<R: Read, D: Digest> Read for HashingReader<R, D> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = self.inner.read(buf)?;
        if n > 0 {
            self.hasher.update(&buf[..n]);
            self.bytes_read += n as u64;
        }
        Ok(n)
    }
}

/// A writer wrapper that computes a hash digest while data is written through it.
///
/// The hash is updated as data passes through `write`.
pub struct HashingWriter<W, D> {
    inner: W,
    hasher: D,
    bytes_written: u64,
}

impl<W, D: Digest + Default> HashingWriter<W, D> {
    /// Create a new hashing writer wrapping the given writer.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: D::default(),
            bytes_written: 0,
        }
    }

    /// Get the total number of bytes written through this writer.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Get the inner writer back, along with the hasher.
    pub fn into_parts(self) -> (W, D) {
        (self.inner, self.hasher)
    }
}

impl<W: Write, D: Digest> Write for HashingWriter<W, D> {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        let n = self.inner.write(buf)?;
        if n > 0 {
            self.hasher.update(&buf[..n]);
            self.bytes_written += n as u64;
        }
        Ok(n)
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.flush()
    }
}
