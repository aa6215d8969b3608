use std::io::{ErrorKind, Write};

use bytes::BytesMut;

use crate::codec::encode_frame;
use crate::error::{FrameError, Result};
use crate::format::FrameFormat;

const INITIAL_BUFFER_CAPACITY: usize = 1024;

/// Writes encoded frames to any `Write` stream.
///
/// Mostly useful for simulating a device: tests, demos and the `encode`
/// command.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
    format: FrameFormat,
}

impl<T: Write> FrameWriter<T> {
    /// Create a new frame writer for `format`.
    pub fn new(inner: T, format: FrameFormat) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            format,
        }
    }

    /// Encode `sample_sets` as one frame and write it (blocking).
    pub fn write_frame(&mut self, sample_sets: &[Vec<f64>]) -> Result<()> {
        self.buf.clear();
        encode_frame(&self.format, sample_sets, &mut self.buf)?;
        self.write_buffered()
    }

    /// Write raw bytes unchanged, e.g. to inject line noise.
    pub fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.buf.clear();
        self.buf.extend_from_slice(bytes);
        self.write_buffered()
    }

    fn write_buffered(&mut self) -> Result<()> {
        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::StreamClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Frame format used for subsequent writes.
    pub fn format(&self) -> &FrameFormat {
        &self.format
    }

    pub fn set_format(&mut self, format: FrameFormat) {
        self.format = format;
    }
}
