use bytes::{Buf, BytesMut};

use crate::error::{Result, SourceError};

const SKIP_CHUNK_SIZE: usize = 256;

/// A supplier of raw bytes that can report how many are ready.
///
/// Callers are expected to check [`ByteSource::bytes_available`] before
/// reading. Asking for more than is available is a contract breach and
/// yields [`SourceError::Exhausted`] rather than blocking.
pub trait ByteSource {
    /// Number of bytes that can be read without blocking.
    fn bytes_available(&self) -> usize;

    /// Read a single byte.
    fn read_byte(&mut self) -> Result<u8>;

    /// Fill `dst` completely.
    fn read_exact(&mut self, dst: &mut [u8]) -> Result<()>;

    /// Discard `n` bytes.
    fn skip(&mut self, n: usize) -> Result<()> {
        let mut scratch = [0u8; SKIP_CHUNK_SIZE];
        let mut remaining = n;
        while remaining > 0 {
            let step = remaining.min(SKIP_CHUNK_SIZE);
            self.read_exact(&mut scratch[..step])?;
            remaining -= step;
        }
        Ok(())
    }
}

impl ByteSource for BytesMut {
    fn bytes_available(&self) -> usize {
        self.len()
    }

    fn read_byte(&mut self) -> Result<u8> {
        if self.is_empty() {
            return Err(SourceError::Exhausted {
                requested: 1,
                available: 0,
            });
        }
        Ok(self.get_u8())
    }

    fn read_exact(&mut self, dst: &mut [u8]) -> Result<()> {
        if self.len() < dst.len() {
            return Err(SourceError::Exhausted {
                requested: dst.len(),
                available: self.len(),
            });
        }
        self.copy_to_slice(dst);
        Ok(())
    }

    fn skip(&mut self, n: usize) -> Result<()> {
        if self.len() < n {
            return Err(SourceError::Exhausted {
                requested: n,
                available: self.len(),
            });
        }
        self.advance(n);
        Ok(())
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn bytes_available(&self) -> usize {
        (**self).bytes_available()
    }

    fn read_byte(&mut self) -> Result<u8> {
        (**self).read_byte()
    }

    fn read_exact(&mut self, dst: &mut [u8]) -> Result<()> {
        (**self).read_exact(dst)
    }

    fn skip(&mut self, n: usize) -> Result<()> {
        (**self).skip(n)
    }
}
