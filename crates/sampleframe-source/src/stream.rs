use std::io::{ErrorKind, Read};

use bytes::BytesMut;

use crate::error::{Result, SourceError};
use crate::traits::ByteSource;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Buffers bytes pulled from any `Read` stream.
///
/// [`StreamSource::fill`] performs the (possibly blocking) read. The
/// [`ByteSource`] methods only ever touch the buffer, so a decoder driving
/// this source never blocks on missing bytes.
pub struct StreamSource<T> {
    inner: T,
    buf: BytesMut,
    eof: bool,
}

impl<T: Read> StreamSource<T> {
    /// Wrap a reader.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            eof: false,
        }
    }

    /// Pull one chunk from the underlying stream into the buffer.
    ///
    /// Returns the number of bytes appended. `Ok(0)` means the stream
    /// reached EOF; subsequent calls keep returning `Ok(0)`.
    pub fn fill(&mut self) -> Result<usize> {
        if self.eof {
            return Ok(0);
        }

        let mut chunk = [0u8; READ_CHUNK_SIZE];
        let read = loop {
            match self.inner.read(&mut chunk) {
                Ok(n) => break n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(SourceError::Io(err)),
            }
        };

        if read == 0 {
            tracing::trace!(buffered = self.buf.len(), "stream source reached EOF");
            self.eof = true;
            return Ok(0);
        }

        self.buf.extend_from_slice(&chunk[..read]);
        Ok(read)
    }

    /// Whether the underlying stream has reported EOF.
    pub fn is_eof(&self) -> bool {
        self.eof
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the source and return the inner stream.
    ///
    /// Buffered bytes that were not yet consumed are dropped.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T> ByteSource for StreamSource<T> {
    fn bytes_available(&self) -> usize {
        self.buf.len()
    }

    fn read_byte(&mut self) -> Result<u8> {
        self.buf.read_byte()
    }

    fn read_exact(&mut self, dst: &mut [u8]) -> Result<()> {
        self.buf.read_exact(dst)
    }

    fn skip(&mut self, n: usize) -> Result<()> {
        self.buf.skip(n)
    }
}

impl<T> std::fmt::Debug for StreamSource<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamSource")
            .field("buffered", &self.buf.len())
            .field("eof", &self.eof)
            .finish()
    }
}
