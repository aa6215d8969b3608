use std::io::Read;

use sampleframe_source::StreamSource;

use crate::decoder::{DecoderConfig, FrameDecoder};
use crate::diagnostic::{Collector, DecodeStats};
use crate::error::{FrameError, Result};
use crate::sample::SamplePack;

/// Reads decoded sample packs from any `Read` stream.
///
/// Handles partial reads internally; callers always get complete frames.
pub struct SampleReader<T> {
    source: StreamSource<T>,
    decoder: FrameDecoder,
    ready: Collector,
}

impl<T: Read> SampleReader<T> {
    /// Create a new sample reader decoding with `config`.
    pub fn new(inner: T, config: DecoderConfig) -> Self {
        Self {
            source: StreamSource::new(inner),
            decoder: FrameDecoder::new(config),
            ready: Collector::new(),
        }
    }

    /// Read the next valid sample pack (blocking).
    ///
    /// Returns `Err(FrameError::StreamClosed)` when EOF is reached. Any
    /// partial frame left at that point is discarded.
    pub fn read_pack(&mut self) -> Result<SamplePack> {
        loop {
            if let Some(pack) = self.ready.pop() {
                return Ok(pack);
            }

            self.decoder.feed(&mut self.source, &mut self.ready)?;
            if let Some(pack) = self.ready.pop() {
                return Ok(pack);
            }

            if self.source.fill()? == 0 {
                self.decoder.reset();
                return Err(FrameError::StreamClosed);
            }
        }
    }

    /// Counters for frames emitted and diagnostics seen so far.
    pub fn stats(&self) -> &DecodeStats {
        self.ready.stats()
    }

    pub fn decoder(&self) -> &FrameDecoder {
        &self.decoder
    }

    /// Reconfigure or pause the decoder between reads.
    pub fn decoder_mut(&mut self) -> &mut FrameDecoder {
        &mut self.decoder
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        self.source.get_ref()
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        self.source.get_mut()
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.source.into_inner()
    }
}

impl<T: Read> Iterator for SampleReader<T> {
    type Item = Result<SamplePack>;

    /// Yields packs until the stream closes.
    fn next(&mut self) -> Option<Self::Item> {
        match self.read_pack() {
            Err(FrameError::StreamClosed) => None,
            other => Some(other),
        }
    }
}
