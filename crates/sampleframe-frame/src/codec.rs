use bytes::{BufMut, BytesMut};

use crate::error::{FrameError, Result};
use crate::format::{ChannelKind, Endianness, FrameFormat, SizeMode};

/// Encode one frame carrying `sample_sets` into the wire format.
///
/// Wire format:
/// ```text
/// ┌────────────┬──────────────┬──────────────────────────────┬────────────┐
/// │ Sync word  │ Size field   │ Payload                      │ Checksum   │
/// │ (N bytes)  │ (0, 1 or 2B) │ sample set × k               │ (0 or 1B)  │
/// │            │ payload len  │ channel 0 │ channel 1 │ ...  │ Σ payload  │
/// └────────────┴──────────────┴──────────────────────────────┴────────────┘
/// ```
///
/// Values are cast to each channel's type (saturating for integers); pad
/// channels are written as zero bytes.
pub fn encode_frame(format: &FrameFormat, sample_sets: &[Vec<f64>], dst: &mut BytesMut) -> Result<()> {
    format.validate()?;

    if sample_sets.is_empty() {
        return Err(FrameError::EmptyFrame);
    }
    if let Some(set) = sample_sets.iter().find(|set| set.len() != format.num_channels()) {
        return Err(FrameError::SampleSetMismatch {
            expected: format.num_channels(),
            got: set.len(),
        });
    }

    let payload_len = format.sample_set_size().saturating_mul(sample_sets.len());
    match format.size_mode {
        SizeMode::Fixed(expected) if expected != payload_len => {
            return Err(FrameError::FixedSizeMismatch {
                expected,
                got: payload_len,
            });
        }
        mode if payload_len > mode.max_payload() => {
            return Err(FrameError::PayloadTooLarge {
                size: payload_len,
                max: mode.max_payload(),
            });
        }
        _ => {}
    }

    dst.reserve(
        format.sync_word.len()
            + format.size_mode.field_width()
            + payload_len
            + format.trailer_len(),
    );
    dst.put_slice(&format.sync_word);
    match (format.size_mode, format.endianness) {
        (SizeMode::Fixed(_), _) => {}
        (SizeMode::OneByteField, _) => dst.put_u8(payload_len as u8),
        (SizeMode::TwoByteField, Endianness::Little) => dst.put_u16_le(payload_len as u16),
        (SizeMode::TwoByteField, Endianness::Big) => dst.put_u16(payload_len as u16),
    }

    let payload_start = dst.len();
    for set in sample_sets {
        for (channel, value) in format.channels.iter().zip(set) {
            put_sample(dst, channel.kind, *value, format.endianness);
        }
    }

    if format.checksum {
        let checksum = dst[payload_start..]
            .iter()
            .fold(0u8, |sum, b| sum.wrapping_add(*b));
        dst.put_u8(checksum);
    }
    Ok(())
}

fn put_sample(dst: &mut BytesMut, kind: ChannelKind, value: f64, endianness: Endianness) {
    let little = endianness == Endianness::Little;
    match kind {
        ChannelKind::Pad(width) => dst.put_bytes(0, width),
        ChannelKind::UInt8 => dst.put_u8(value as u8),
        ChannelKind::Int8 => dst.put_i8(value as i8),
        ChannelKind::UInt16 if little => dst.put_u16_le(value as u16),
        ChannelKind::UInt16 => dst.put_u16(value as u16),
        ChannelKind::Int16 if little => dst.put_i16_le(value as i16),
        ChannelKind::Int16 => dst.put_i16(value as i16),
        ChannelKind::UInt32 if little => dst.put_u32_le(value as u32),
        ChannelKind::UInt32 => dst.put_u32(value as u32),
        ChannelKind::Int32 if little => dst.put_i32_le(value as i32),
        ChannelKind::Int32 => dst.put_i32(value as i32),
        ChannelKind::Float32 if little => dst.put_f32_le(value as f32),
        ChannelKind::Float32 => dst.put_f32(value as f32),
        ChannelKind::Float64 if little => dst.put_f64_le(value),
        ChannelKind::Float64 => dst.put_f64(value),
    }
}

#[cfg(feature = "async")]
pub use self::async_codec::SampleCodec;

#[cfg(feature = "async")]
mod async_codec {
    use bytes::BytesMut;
    use tokio_util::codec::Decoder;

    use crate::decoder::{DecoderConfig, FrameDecoder};
    use crate::diagnostic::{Collector, DecodeStats};
    use crate::error::FrameError;
    use crate::sample::SamplePack;

    /// `tokio_util` decoder yielding one [`SamplePack`] per valid frame.
    ///
    /// Use with `FramedRead` over any `AsyncRead` device stream.
    #[derive(Debug)]
    pub struct SampleCodec {
        decoder: FrameDecoder,
        ready: Collector,
    }

    impl SampleCodec {
        pub fn new(config: DecoderConfig) -> Self {
            Self {
                decoder: FrameDecoder::new(config),
                ready: Collector::new(),
            }
        }

        pub fn decoder(&self) -> &FrameDecoder {
            &self.decoder
        }

        /// Reconfigure or pause the underlying decoder.
        pub fn decoder_mut(&mut self) -> &mut FrameDecoder {
            &mut self.decoder
        }

        pub fn stats(&self) -> &DecodeStats {
            self.ready.stats()
        }
    }

    impl Decoder for SampleCodec {
        type Item = SamplePack;
        type Error = FrameError;

        fn decode(&mut self, src: &mut BytesMut) -> Result<Option<SamplePack>, FrameError> {
            if let Some(pack) = self.ready.pop() {
                return Ok(Some(pack));
            }
            self.decoder.feed(src, &mut self.ready)?;
            Ok(self.ready.pop())
        }

        fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<SamplePack>, FrameError> {
            if let Some(pack) = self.decode(src)? {
                return Ok(Some(pack));
            }
            if !src.is_empty() {
                tracing::debug!(remaining = src.len(), "stream ended mid-frame, partial frame dropped");
                src.clear();
            }
            self.decoder.reset();
            Ok(None)
        }
    }
}
