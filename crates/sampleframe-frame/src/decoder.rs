//! Incremental frame decoder.
//!
//! The decoder walks `sync -> size (optional) -> payload` and never blocks:
//! when the source cannot supply the next sub-step it returns, keeping the
//! partial state for the next call. Every finished frame (emitted or
//! discarded), every configuration change and every bad size field puts it
//! back to the start of sync search.

use sampleframe_source::ByteSource;
use tracing::{debug, error, trace, warn};

use crate::diagnostic::{Diagnostic, SampleSink};
use crate::error::{ConfigError, FrameError, Result};
use crate::format::{ChannelFormat, ChannelKind, Endianness, FrameFormat, SizeMode};
use crate::sample::SamplePack;

/// Checksum byte accepted regardless of the payload when
/// [`DecoderConfig::accept_checksum_sentinel`] is set.
///
/// This is a debugging aid that lets hand-written test streams skip the
/// checksum. It weakens corruption detection and is off by default.
pub const CHECKSUM_SENTINEL: u8 = 0xAA;

/// What happens to sync progress when a byte does not match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncRecovery {
    /// Start matching from the first sync byte again. The mismatching byte
    /// is not re-tested as a new start.
    #[default]
    Restart,
    /// Keep the matched prefix and wait for the expected byte.
    Hold,
}

/// Everything the decoder needs to know about the stream.
#[derive(Debug, Clone, PartialEq)]
pub struct DecoderConfig {
    pub format: FrameFormat,
    /// Promote routine per-byte logging from `trace` to `debug`.
    pub debug: bool,
    /// Consume frames without decoding or emitting them.
    pub paused: bool,
    /// Accept [`CHECKSUM_SENTINEL`] as a valid checksum.
    pub accept_checksum_sentinel: bool,
    pub sync_recovery: SyncRecovery,
}

impl DecoderConfig {
    pub fn new(format: FrameFormat) -> Self {
        Self {
            format,
            debug: false,
            paused: false,
            accept_checksum_sentinel: false,
            sync_recovery: SyncRecovery::Restart,
        }
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self::new(FrameFormat::default())
    }
}

/// Where the decoder is within the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Searching for the sync word; `matched` bytes of it seen so far.
    Sync { matched: usize },
    /// Sync found, waiting for the size field.
    Size,
    /// Waiting for `frame_size` payload bytes (plus checksum, if enabled).
    Payload { frame_size: usize },
}

impl Stage {
    const START: Self = Self::Sync { matched: 0 };
}

/// Turns a byte stream into [`SamplePack`]s.
///
/// Not thread-safe by itself; callers serialize `feed` calls.
#[derive(Debug)]
pub struct FrameDecoder {
    config: DecoderConfig,
    invalid: Option<ConfigError>,
    stage: Stage,
    checksum: u8,
    payload: Vec<u8>,
}

impl FrameDecoder {
    pub fn new(config: DecoderConfig) -> Self {
        let mut decoder = Self {
            config,
            invalid: None,
            stage: Stage::START,
            checksum: 0,
            payload: Vec::new(),
        };
        decoder.revalidate();
        decoder
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    pub fn format(&self) -> &FrameFormat {
        &self.config.format
    }

    /// Current position within the frame being received.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Why the decoder is refusing to run, if it is.
    pub fn configuration_error(&self) -> Option<&ConfigError> {
        self.invalid.as_ref()
    }

    pub fn is_paused(&self) -> bool {
        self.config.paused
    }

    /// Drop any partial frame and go back to sync search.
    pub fn reset(&mut self) {
        self.stage = Stage::START;
        self.checksum = 0;
    }

    /// Replace the whole configuration.
    ///
    /// Always resets. Returns the validation result; while it is an error,
    /// [`FrameDecoder::feed`] consumes nothing.
    pub fn reconfigure(&mut self, config: DecoderConfig) -> std::result::Result<(), ConfigError> {
        self.config = config;
        self.revalidate();
        self.reset();
        self.validity()
    }

    pub fn set_format(&mut self, format: FrameFormat) -> std::result::Result<(), ConfigError> {
        self.update_format(|current| *current = format)
    }

    pub fn set_sync_word(&mut self, sync_word: Vec<u8>) -> std::result::Result<(), ConfigError> {
        self.update_format(|format| format.sync_word = sync_word)
    }

    pub fn set_size_mode(&mut self, size_mode: SizeMode) -> std::result::Result<(), ConfigError> {
        self.update_format(|format| format.size_mode = size_mode)
    }

    pub fn set_endianness(
        &mut self,
        endianness: Endianness,
    ) -> std::result::Result<(), ConfigError> {
        self.update_format(|format| format.endianness = endianness)
    }

    pub fn set_checksum_enabled(&mut self, enabled: bool) -> std::result::Result<(), ConfigError> {
        self.update_format(|format| format.checksum = enabled)
    }

    /// Grow or shrink the channel list. New channels copy the last
    /// channel's format (`uint8` if there was none).
    pub fn set_channel_count(&mut self, count: usize) -> std::result::Result<(), ConfigError> {
        self.update_format(|format| {
            let fill = format
                .channels
                .last()
                .copied()
                .unwrap_or(ChannelFormat::new(ChannelKind::UInt8));
            format.channels.resize(count, fill);
        })
    }

    pub fn set_channel_format(
        &mut self,
        index: usize,
        channel: ChannelFormat,
    ) -> std::result::Result<(), ConfigError> {
        let count = self.config.format.num_channels();
        if index >= count {
            return Err(ConfigError::ChannelOutOfRange { index, count });
        }
        self.update_format(|format| format.channels[index] = channel)
    }

    /// Pausing keeps the stream framed but discards every payload.
    pub fn set_paused(&mut self, paused: bool) {
        self.config.paused = paused;
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.config.debug = debug;
    }

    /// Consume as many bytes from `source` as the current state allows.
    ///
    /// Emits every complete, checksum-valid frame to `sink` and returns the
    /// number of bytes consumed. Stops without consuming when the next
    /// sub-step (one sync byte, the whole size field, or payload plus
    /// checksum) is not fully available.
    ///
    /// Fails with [`FrameError::InvalidConfiguration`] (consuming nothing)
    /// while the configuration is invalid, and with [`FrameError::Source`]
    /// if the source breaks its availability contract.
    pub fn feed<S, K>(&mut self, source: &mut S, sink: &mut K) -> Result<usize>
    where
        S: ByteSource + ?Sized,
        K: SampleSink + ?Sized,
    {
        if let Some(err) = &self.invalid {
            sink.on_diagnostic(&Diagnostic::ConfigurationInvalid(err.clone()));
            return Err(FrameError::InvalidConfiguration(err.clone()));
        }

        let mut consumed = 0usize;
        loop {
            let available = source.bytes_available();
            if available == 0 {
                break;
            }

            match self.stage {
                Stage::Sync { matched } => {
                    let byte = source.read_byte()?;
                    consumed += 1;
                    self.on_sync_byte(matched, byte, sink);
                }
                Stage::Size => {
                    let width = self.config.format.size_mode.field_width();
                    if available < width {
                        break;
                    }
                    let size = self.read_size_field(source)?;
                    consumed += width;
                    self.on_size_field(size, sink);
                }
                Stage::Payload { frame_size } => {
                    let needed = frame_size.saturating_add(self.config.format.trailer_len());
                    if available < needed {
                        break;
                    }
                    let outcome = self.read_payload(frame_size, source, sink);
                    self.reset();
                    outcome?;
                    consumed += needed;
                }
            }
        }

        Ok(consumed)
    }

    fn update_format<F>(&mut self, change: F) -> std::result::Result<(), ConfigError>
    where
        F: FnOnce(&mut FrameFormat),
    {
        change(&mut self.config.format);
        self.revalidate();
        self.reset();
        self.validity()
    }

    fn revalidate(&mut self) {
        self.invalid = self.config.format.validate().err();
        match &self.invalid {
            Some(err) => error!(error = %err, "frame format invalid, decoder disabled"),
            None => debug!(
                sample_set_size = self.config.format.sample_set_size(),
                channels = self.config.format.num_channels(),
                "frame format accepted"
            ),
        }
    }

    fn validity(&self) -> std::result::Result<(), ConfigError> {
        match &self.invalid {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn on_sync_byte<K: SampleSink + ?Sized>(&mut self, matched: usize, byte: u8, sink: &mut K) {
        let sync_len = self.config.format.sync_word.len();
        let expected = self.config.format.sync_word[matched];

        if byte == expected {
            let matched = matched + 1;
            self.stage = if matched < sync_len {
                Stage::Sync { matched }
            } else {
                match self.config.format.size_mode {
                    SizeMode::Fixed(frame_size) => Stage::Payload { frame_size },
                    SizeMode::OneByteField | SizeMode::TwoByteField => Stage::Size,
                }
            };
            return;
        }

        if self.config.debug {
            debug!(position = matched, expected, received = byte, "missed sync byte");
        } else {
            trace!(position = matched, expected, received = byte, "missed sync byte");
        }
        sink.on_diagnostic(&Diagnostic::SyncMismatch {
            position: matched,
            expected,
            received: byte,
        });

        if self.config.sync_recovery == SyncRecovery::Restart {
            self.stage = Stage::START;
        }
    }

    fn read_size_field<S: ByteSource + ?Sized>(&mut self, source: &mut S) -> Result<usize> {
        let size = match self.config.format.size_mode {
            SizeMode::OneByteField => usize::from(source.read_byte()?),
            SizeMode::TwoByteField => {
                let mut raw = [0u8; 2];
                source.read_exact(&mut raw)?;
                let size = match self.config.format.endianness {
                    Endianness::Little => u16::from_le_bytes(raw),
                    Endianness::Big => u16::from_be_bytes(raw),
                };
                usize::from(size)
            }
            SizeMode::Fixed(frame_size) => frame_size,
        };
        Ok(size)
    }

    fn on_size_field<K: SampleSink + ?Sized>(&mut self, size: usize, sink: &mut K) {
        let format = &self.config.format;
        if format.accepts_payload_size(size) {
            if self.config.debug {
                debug!(payload_size = size, "size field accepted");
            }
            self.stage = Stage::Payload { frame_size: size };
            return;
        }

        let sample_set_size = format.sample_set_size();
        warn!(
            payload_size = size,
            sample_set_size, "invalid size field, frame abandoned"
        );
        sink.on_diagnostic(&Diagnostic::InvalidSizeField {
            size,
            sample_set_size,
        });
        self.reset();
    }

    /// Caller guarantees `frame_size + trailer_len` bytes are available.
    fn read_payload<S, K>(&mut self, frame_size: usize, source: &mut S, sink: &mut K) -> Result<()>
    where
        S: ByteSource + ?Sized,
        K: SampleSink + ?Sized,
    {
        let format = &self.config.format;

        if self.config.paused {
            source.skip(frame_size + format.trailer_len())?;
            trace!(payload_size = frame_size, "paused, frame discarded");
            return Ok(());
        }

        self.payload.resize(frame_size, 0);
        source.read_exact(&mut self.payload)?;

        let sample_set_size = format.sample_set_size();
        let mut pack = SamplePack::for_format(format, frame_size / sample_set_size);
        for (index, set) in self.payload.chunks_exact(sample_set_size).enumerate() {
            let mut offset = 0;
            for (channel, channel_format) in format.channels.iter().enumerate() {
                let width = channel_format.byte_width();
                let raw = &set[offset..offset + width];
                pack.channel_mut(channel)[index] =
                    channel_format.decode(raw, format.endianness, &mut self.checksum);
                offset += width;
            }
        }

        if format.checksum {
            let received = source.read_byte()?;
            let computed = self.checksum;
            if received != computed {
                if !(self.config.accept_checksum_sentinel && received == CHECKSUM_SENTINEL) {
                    warn!(received, computed, "checksum failed, frame discarded");
                    sink.on_diagnostic(&Diagnostic::ChecksumMismatch { received, computed });
                    return Ok(());
                }
                debug!(computed, "checksum sentinel accepted");
            }
        }

        if self.config.debug {
            debug!(
                payload_size = frame_size,
                samples = pack.num_samples(),
                "frame decoded"
            );
        }
        sink.on_sample_pack(pack);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;

    use super::*;
    use crate::codec::encode_frame;
    use crate::diagnostic::{Collector, DiagnosticKind};
    use crate::format::PAD_PLACEHOLDER;

    fn two_u8_with_checksum() -> FrameFormat {
        FrameFormat::new([0xAA, 0xBB], vec![ChannelKind::UInt8.into(); 2]).with_checksum(true)
    }

    fn decode_all(decoder: &mut FrameDecoder, bytes: &[u8]) -> (Collector, usize) {
        let mut source = BytesMut::from(bytes);
        let mut sink = Collector::new();
        let consumed = decoder.feed(&mut source, &mut sink).unwrap();
        (sink, consumed)
    }

    #[derive(Default)]
    struct Recording {
        packs: Vec<SamplePack>,
        diagnostics: Vec<Diagnostic>,
    }

    impl SampleSink for Recording {
        fn on_sample_pack(&mut self, pack: SamplePack) {
            self.packs.push(pack);
        }

        fn on_diagnostic(&mut self, diagnostic: &Diagnostic) {
            self.diagnostics.push(diagnostic.clone());
        }
    }

    #[test]
    fn decodes_frame_with_valid_checksum() {
        let mut decoder = FrameDecoder::new(DecoderConfig::new(two_u8_with_checksum()));
        let (mut sink, consumed) = decode_all(&mut decoder, &[0xAA, 0xBB, 0x01, 0x02, 0x03]);

        assert_eq!(consumed, 5);
        let pack = sink.pop().unwrap();
        assert_eq!(pack.channel(0), &[1.0]);
        assert_eq!(pack.channel(1), &[2.0]);
        assert!(sink.is_empty());
        assert_eq!(decoder.stage(), Stage::Sync { matched: 0 });
    }

    #[test]
    fn rejects_frame_with_bad_checksum() {
        let mut decoder = FrameDecoder::new(DecoderConfig::new(two_u8_with_checksum()));
        let mut source = BytesMut::from(&[0xAA, 0xBB, 0x01, 0x02, 0xFF][..]);
        let mut sink = Recording::default();

        let consumed = decoder.feed(&mut source, &mut sink).unwrap();

        assert_eq!(consumed, 5);
        assert!(sink.packs.is_empty());
        assert_eq!(
            sink.diagnostics,
            vec![Diagnostic::ChecksumMismatch {
                received: 0xFF,
                computed: 0x03
            }]
        );
    }

    #[test]
    fn checksum_sentinel_requires_opt_in() {
        let frame = [0xAA, 0xBB, 0x01, 0x02, CHECKSUM_SENTINEL];

        let mut strict = FrameDecoder::new(DecoderConfig::new(two_u8_with_checksum()));
        let (sink, _) = decode_all(&mut strict, &frame);
        assert!(sink.is_empty());
        assert_eq!(sink.stats().checksum_failures, 1);

        let mut config = DecoderConfig::new(two_u8_with_checksum());
        config.accept_checksum_sentinel = true;
        let mut lenient = FrameDecoder::new(config);
        let (sink, _) = decode_all(&mut lenient, &frame);
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn suspends_without_consuming_partial_payload() {
        let mut decoder = FrameDecoder::new(DecoderConfig::new(two_u8_with_checksum()));
        let mut sink = Collector::new();

        let mut source = BytesMut::from(&[0xAA][..]);
        assert_eq!(decoder.feed(&mut source, &mut sink).unwrap(), 1);
        assert_eq!(decoder.stage(), Stage::Sync { matched: 1 });

        source.extend_from_slice(&[0xBB, 0x01, 0x02]);
        assert_eq!(decoder.feed(&mut source, &mut sink).unwrap(), 1);
        assert_eq!(decoder.stage(), Stage::Payload { frame_size: 2 });
        assert_eq!(source.len(), 2, "payload bytes stay in the source");

        source.extend_from_slice(&[0x03]);
        assert_eq!(decoder.feed(&mut source, &mut sink).unwrap(), 3);
        assert_eq!(sink.len(), 1);
        assert!(source.is_empty());
    }

    #[test]
    fn one_byte_chunks_match_single_call() {
        let format = FrameFormat::new(
            [0x55, 0xAA],
            vec![ChannelKind::Int16.into(), ChannelKind::UInt8.into()],
        )
        .with_size_mode(SizeMode::OneByteField)
        .with_checksum(true);
        let mut wire = BytesMut::from(&[0x00, 0x13, 0x42][..]);
        encode_frame(&format, &[vec![-5.0, 7.0], vec![300.0, 0.0]], &mut wire).unwrap();
        wire.extend_from_slice(&[0x42]);
        encode_frame(&format, &[vec![1.0, 2.0]], &mut wire).unwrap();

        let mut whole = FrameDecoder::new(DecoderConfig::new(format.clone()));
        let (whole_sink, consumed) = decode_all(&mut whole, &wire);
        assert_eq!(consumed, wire.len());

        let mut chunked = FrameDecoder::new(DecoderConfig::new(format));
        let mut sink = Collector::new();
        let mut source = BytesMut::new();
        let mut total = 0;
        for byte in wire.iter() {
            source.extend_from_slice(&[*byte]);
            total += chunked.feed(&mut source, &mut sink).unwrap();
        }

        assert_eq!(total, wire.len());
        let expected = whole_sink.into_packs();
        assert_eq!(expected.len(), 2);
        assert_eq!(sink.into_packs(), expected);
    }

    #[test]
    fn decodes_multiple_sample_sets_per_frame() {
        let format = FrameFormat::new([0xAA], vec![ChannelKind::UInt8.into(); 2])
            .with_size_mode(SizeMode::Fixed(6));
        let mut decoder = FrameDecoder::new(DecoderConfig::new(format));
        let (mut sink, _) = decode_all(&mut decoder, &[0xAA, 1, 2, 3, 4, 5, 6]);

        let pack = sink.pop().unwrap();
        assert_eq!(pack.num_samples(), 3);
        assert_eq!(pack.channel(0), &[1.0, 3.0, 5.0]);
        assert_eq!(pack.channel(1), &[2.0, 4.0, 6.0]);
    }

    #[test]
    fn decodes_heterogeneous_big_endian_channels() {
        let format = FrameFormat::new(
            [0xFE],
            vec![
                ChannelKind::UInt16.into(),
                ChannelKind::Int32.into(),
                ChannelKind::Float32.into(),
                ChannelKind::Float64.into(),
                ChannelKind::Int8.into(),
            ],
        )
        .with_endianness(Endianness::Big);
        let mut wire = vec![0xFE, 0x01, 0x02, 0xFF, 0xFF, 0xFF, 0xFE];
        wire.extend_from_slice(&2.5f32.to_be_bytes());
        wire.extend_from_slice(&(-1e9f64).to_be_bytes());
        wire.push(0x80);

        let mut decoder = FrameDecoder::new(DecoderConfig::new(format));
        let (mut sink, consumed) = decode_all(&mut decoder, &wire);
        assert_eq!(consumed, wire.len());

        let pack = sink.pop().unwrap();
        assert_eq!(pack.channel(0), &[258.0]);
        assert_eq!(pack.channel(1), &[-2.0]);
        assert_eq!(pack.channel(2), &[2.5]);
        assert_eq!(pack.channel(3), &[-1e9]);
        assert_eq!(pack.channel(4), &[-128.0]);
    }

    #[test]
    fn pad_channel_is_checksummed_and_skipped() {
        let format = FrameFormat::new(
            [0xAA],
            vec![ChannelKind::UInt8.into(), ChannelFormat::pad(2), ChannelKind::UInt8.into()],
        )
        .with_checksum(true);
        let mut decoder = FrameDecoder::new(DecoderConfig::new(format));

        // 0x10 + 0xF0 + 0x01 + 0x20 = 0x121 -> 0x21
        let (mut sink, _) = decode_all(&mut decoder, &[0xAA, 0x10, 0xF0, 0x01, 0x20, 0x21]);

        let pack = sink.pop().unwrap();
        assert_eq!(pack.channel(0), &[16.0]);
        assert_eq!(pack.channel(1), &[PAD_PLACEHOLDER]);
        assert_eq!(pack.channel(2), &[32.0]);
        assert!(pack.is_placeholder(1));
    }

    #[test]
    fn two_byte_size_field_waits_for_both_bytes() {
        let format = FrameFormat::new([0xAA], vec![ChannelKind::UInt8.into()])
            .with_size_mode(SizeMode::TwoByteField)
            .with_endianness(Endianness::Big);
        let mut decoder = FrameDecoder::new(DecoderConfig::new(format));
        let mut sink = Collector::new();

        let mut source = BytesMut::from(&[0xAA, 0x00][..]);
        assert_eq!(decoder.feed(&mut source, &mut sink).unwrap(), 1);
        assert_eq!(decoder.stage(), Stage::Size);
        assert_eq!(source.len(), 1);

        source.extend_from_slice(&[0x02, 7, 9]);
        assert_eq!(decoder.feed(&mut source, &mut sink).unwrap(), 4);
        assert_eq!(sink.pop().unwrap().channel(0), &[7.0, 9.0]);
    }

    #[test]
    fn two_byte_size_field_little_endian() {
        let format = FrameFormat::new([0xAA], vec![ChannelKind::UInt8.into()])
            .with_size_mode(SizeMode::TwoByteField);
        let mut decoder = FrameDecoder::new(DecoderConfig::new(format));
        let (sink, _) = decode_all(&mut decoder, &[0xAA, 0x01, 0x00, 0x33]);
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn zero_size_field_abandons_frame_and_resyncs() {
        let format = FrameFormat::new([0xAA], vec![ChannelKind::UInt8.into()])
            .with_size_mode(SizeMode::OneByteField);
        let mut decoder = FrameDecoder::new(DecoderConfig::new(format));
        let mut sink = Recording::default();
        let mut source = BytesMut::from(&[0xAA, 0x00, 0xAA, 0x01, 0x09][..]);

        decoder.feed(&mut source, &mut sink).unwrap();

        assert_eq!(
            sink.diagnostics,
            vec![Diagnostic::InvalidSizeField {
                size: 0,
                sample_set_size: 1
            }]
        );
        assert_eq!(sink.packs.len(), 1);
        assert_eq!(sink.packs[0].channel(0), &[9.0]);
    }

    #[test]
    fn size_field_not_multiple_abandons_frame() {
        let format = FrameFormat::new([0xAA], vec![ChannelKind::UInt16.into()])
            .with_size_mode(SizeMode::OneByteField);
        let mut decoder = FrameDecoder::new(DecoderConfig::new(format));
        let (sink, consumed) = decode_all(&mut decoder, &[0xAA, 0x03, 0x01]);

        assert_eq!(consumed, 3, "size bytes consumed, trailing byte treated as noise");
        assert!(sink.is_empty());
        assert_eq!(sink.stats().invalid_sizes, 1);
        assert_eq!(sink.stats().sync_mismatches, 1);
    }

    #[test]
    fn noise_before_sync_is_discarded() {
        let mut decoder = FrameDecoder::new(DecoderConfig::new(two_u8_with_checksum()));
        let (mut sink, consumed) =
            decode_all(&mut decoder, &[0x00, 0x11, 0xBB, 0xAA, 0xBB, 0x04, 0x05, 0x09]);

        assert_eq!(consumed, 8);
        assert_eq!(sink.stats().sync_mismatches, 3);
        assert_eq!(sink.pop().unwrap().channel(1), &[5.0]);
    }

    #[test]
    fn restart_policy_does_not_reuse_mismatching_byte() {
        let stream = [0xAA, 0xAA, 0xBB, 0x01, 0x02, 0x03];

        let mut restart = FrameDecoder::new(DecoderConfig::new(two_u8_with_checksum()));
        let (sink, _) = decode_all(&mut restart, &stream);
        assert!(sink.is_empty());

        let mut config = DecoderConfig::new(two_u8_with_checksum());
        config.sync_recovery = SyncRecovery::Hold;
        let mut hold = FrameDecoder::new(config);
        let (sink, _) = decode_all(&mut hold, &stream);
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn several_frames_in_one_call() {
        let mut decoder = FrameDecoder::new(DecoderConfig::new(two_u8_with_checksum()));
        let stream = [
            0xAA, 0xBB, 0x01, 0x02, 0x03, //
            0xAA, 0xBB, 0x05, 0x06, 0x00, // bad checksum
            0xAA, 0xBB, 0x07, 0x08, 0x0F,
        ];
        let (sink, consumed) = decode_all(&mut decoder, &stream);

        assert_eq!(consumed, stream.len());
        let packs = sink.into_packs();
        assert_eq!(packs.len(), 2);
        assert_eq!(packs[1].channel(0), &[7.0]);
    }

    #[test]
    fn paused_consumes_frames_without_emitting() {
        let mut decoder = FrameDecoder::new(DecoderConfig::new(two_u8_with_checksum()));
        decoder.set_paused(true);

        let (sink, consumed) = decode_all(&mut decoder, &[0xAA, 0xBB, 0x01, 0x02, 0xEE]);
        assert_eq!(consumed, 5);
        assert!(sink.is_empty());
        assert_eq!(sink.stats().checksum_failures, 0, "paused frames are not checked");
        assert_eq!(decoder.stage(), Stage::Sync { matched: 0 });

        decoder.set_paused(false);
        let (sink, _) = decode_all(&mut decoder, &[0xAA, 0xBB, 0x01, 0x02, 0x03]);
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn invalid_configuration_consumes_nothing() {
        let format = FrameFormat::new(Vec::new(), vec![ChannelKind::UInt8.into()]);
        let mut decoder = FrameDecoder::new(DecoderConfig::new(format));
        assert_eq!(decoder.configuration_error(), Some(&ConfigError::EmptySyncWord));

        let mut source = BytesMut::from(&[0xAA, 0x01][..]);
        let mut sink = Recording::default();
        let err = decoder.feed(&mut source, &mut sink).unwrap_err();

        assert!(matches!(
            err,
            FrameError::InvalidConfiguration(ConfigError::EmptySyncWord)
        ));
        assert_eq!(source.len(), 2);
        assert_eq!(sink.diagnostics[0].kind(), DiagnosticKind::ConfigurationInvalid);

        decoder.set_sync_word(vec![0xAA]).unwrap();
        let mut sink = Collector::new();
        assert_eq!(decoder.feed(&mut source, &mut sink).unwrap(), 2);
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn fixed_size_must_hold_whole_sample_sets() {
        let mut decoder = FrameDecoder::new(DecoderConfig::new(two_u8_with_checksum()));
        let err = decoder.set_size_mode(SizeMode::Fixed(3)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::FrameSizeNotMultipleOfSampleSet { frame_size: 3, .. }
        ));

        let mut source = BytesMut::from(&[0xAA, 0xBB][..]);
        assert!(decoder.feed(&mut source, &mut Collector::new()).is_err());

        decoder.set_size_mode(SizeMode::Fixed(4)).unwrap();
        assert!(decoder.configuration_error().is_none());
    }

    #[test]
    fn reconfiguration_discards_partial_frame() {
        let mut decoder = FrameDecoder::new(DecoderConfig::new(two_u8_with_checksum()));
        let mut sink = Collector::new();

        let mut source = BytesMut::from(&[0xAA, 0xBB, 0x01][..]);
        decoder.feed(&mut source, &mut sink).unwrap();
        assert_eq!(decoder.stage(), Stage::Payload { frame_size: 2 });

        assert!(decoder.set_channel_count(3).is_err());
        assert_eq!(decoder.stage(), Stage::Sync { matched: 0 });
        assert_eq!(decoder.format().size_mode, SizeMode::Fixed(2));
        assert!(decoder.configuration_error().is_some());

        decoder.set_size_mode(SizeMode::Fixed(3)).unwrap();
        // The stale payload byte is now noise.
        let mut source = BytesMut::from(&[0x01, 0xAA, 0xBB, 0x01, 0x02, 0x03, 0x06][..]);
        decoder.feed(&mut source, &mut sink).unwrap();

        let pack = sink.pop().unwrap();
        assert_eq!(pack.num_channels(), 3);
        assert_eq!(pack.channel(2), &[3.0]);
    }

    #[test]
    fn changing_channel_format_or_checksum_resets() {
        let mut decoder = FrameDecoder::new(DecoderConfig::new(two_u8_with_checksum()));
        let mut sink = Collector::new();
        let mut source = BytesMut::from(&[0xAA][..]);
        decoder.feed(&mut source, &mut sink).unwrap();

        decoder
            .set_channel_format(1, ChannelKind::Int8.into())
            .unwrap();
        assert_eq!(decoder.stage(), Stage::Sync { matched: 0 });

        decoder.feed(&mut BytesMut::from(&[0xAA][..]), &mut sink).unwrap();
        decoder.set_checksum_enabled(false).unwrap();
        assert_eq!(decoder.stage(), Stage::Sync { matched: 0 });

        let (mut sink, _) = decode_all(&mut decoder, &[0xAA, 0xBB, 0x01, 0xFF]);
        assert_eq!(sink.pop().unwrap().channel(1), &[-1.0]);
    }

    #[test]
    fn sync_word_change_mid_payload_resets() {
        let mut decoder = FrameDecoder::new(DecoderConfig::new(two_u8_with_checksum()));
        let mut sink = Collector::new();
        decoder
            .feed(&mut BytesMut::from(&[0xAA, 0xBB, 0x01][..]), &mut sink)
            .unwrap();
        assert_eq!(decoder.stage(), Stage::Payload { frame_size: 2 });

        decoder.set_sync_word(vec![0x7E, 0x81]).unwrap();
        assert_eq!(decoder.stage(), Stage::Sync { matched: 0 });

        // Rest of the abandoned frame, a frame under the new sync word, then
        // a frame under the old one.
        let mut source = BytesMut::from(
            &[
                0x02, 0x03, 0x7E, 0x81, 0x05, 0x06, 0x0B, 0xAA, 0xBB, 0x01, 0x02, 0x03,
            ][..],
        );
        assert_eq!(decoder.feed(&mut source, &mut sink).unwrap(), 12);

        assert_eq!(sink.len(), 1);
        assert_eq!(sink.stats().sync_mismatches, 7);
        let pack = sink.pop().unwrap();
        assert_eq!(pack.channel(0), &[5.0]);
        assert_eq!(pack.channel(1), &[6.0]);
    }

    #[test]
    fn size_mode_change_mid_payload_resets() {
        let mut decoder = FrameDecoder::new(DecoderConfig::new(two_u8_with_checksum()));
        let mut sink = Collector::new();
        decoder
            .feed(&mut BytesMut::from(&[0xAA, 0xBB, 0x01][..]), &mut sink)
            .unwrap();

        decoder.set_size_mode(SizeMode::OneByteField).unwrap();
        assert_eq!(decoder.stage(), Stage::Sync { matched: 0 });

        let (mut sink, consumed) = decode_all(&mut decoder, &[0xAA, 0xBB, 0x02, 0x07, 0x08, 0x0F]);
        assert_eq!(consumed, 6);
        let pack = sink.pop().unwrap();
        assert_eq!(pack.channel(0), &[7.0]);
        assert_eq!(pack.channel(1), &[8.0]);
    }

    #[test]
    fn oversized_fixed_frame_is_refused() {
        let format = two_u8_with_checksum().with_size_mode(SizeMode::Fixed(usize::MAX));
        let mut decoder = FrameDecoder::new(DecoderConfig::new(format));
        assert!(matches!(
            decoder.configuration_error(),
            Some(ConfigError::FrameTooLarge { .. })
        ));

        let mut source = BytesMut::from(&[0xAA, 0xBB, 0x01][..]);
        let err = decoder.feed(&mut source, &mut Collector::new()).unwrap_err();
        assert!(matches!(
            err,
            FrameError::InvalidConfiguration(ConfigError::FrameTooLarge { .. })
        ));
        assert_eq!(source.len(), 3);
    }

    #[test]
    fn channel_format_index_checked() {
        let mut decoder = FrameDecoder::new(DecoderConfig::default());
        assert_eq!(
            decoder.set_channel_format(4, ChannelKind::UInt8.into()),
            Err(ConfigError::ChannelOutOfRange { index: 4, count: 1 })
        );
    }

    #[test]
    fn reconfigure_validates_and_resets() {
        let mut decoder = FrameDecoder::new(DecoderConfig::default());
        decoder.feed(&mut BytesMut::from(&[0xAA][..]), &mut Collector::new()).unwrap();

        let mut config = DecoderConfig::new(two_u8_with_checksum());
        config.format.channels.clear();
        assert_eq!(decoder.reconfigure(config), Err(ConfigError::NoChannels));
        assert_eq!(decoder.stage(), Stage::Sync { matched: 0 });

        assert!(decoder
            .reconfigure(DecoderConfig::new(two_u8_with_checksum()))
            .is_ok());
    }
}
