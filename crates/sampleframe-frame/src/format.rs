//! Wire layout description: channel encodings and the frame format.

use std::fmt;
use std::str::FromStr;

use bytes::Buf;

use crate::error::ConfigError;

/// Maximum number of channels a frame format may declare.
pub const MAX_CHANNELS: usize = 32;

/// Largest payload any size mode may carry; also bounds a single sample set.
pub const MAX_PAYLOAD: usize = u16::MAX as usize;

/// Value reported for pad channels. Not a real sample.
pub const PAD_PLACEHOLDER: f64 = 0.0;

/// Byte order of multi-byte fields (size field and samples).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Endianness {
    #[default]
    Little,
    Big,
}

impl FromStr for Endianness {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "little" | "le" => Ok(Self::Little),
            "big" | "be" => Ok(Self::Big),
            _ => Err(ConfigError::UnknownEndianness(s.to_string())),
        }
    }
}

impl fmt::Display for Endianness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Little => "little",
            Self::Big => "big",
        })
    }
}

/// Numeric encoding of a single channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    UInt8,
    Int8,
    UInt16,
    Int16,
    UInt32,
    Int32,
    Float32,
    Float64,
    /// Raw bytes that are consumed and checksummed but carry no sample.
    Pad(usize),
}

impl ChannelKind {
    /// Number of bytes this kind occupies on the wire.
    pub fn byte_width(self) -> usize {
        match self {
            Self::UInt8 | Self::Int8 => 1,
            Self::UInt16 | Self::Int16 => 2,
            Self::UInt32 | Self::Int32 | Self::Float32 => 4,
            Self::Float64 => 8,
            Self::Pad(width) => width,
        }
    }

    pub fn is_pad(self) -> bool {
        matches!(self, Self::Pad(_))
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UInt8 => f.write_str("uint8"),
            Self::Int8 => f.write_str("int8"),
            Self::UInt16 => f.write_str("uint16"),
            Self::Int16 => f.write_str("int16"),
            Self::UInt32 => f.write_str("uint32"),
            Self::Int32 => f.write_str("int32"),
            Self::Float32 => f.write_str("float"),
            Self::Float64 => f.write_str("double"),
            Self::Pad(width) => write!(f, "pad:{width}"),
        }
    }
}

impl FromStr for ChannelKind {
    type Err = ConfigError;

    /// Accepts `uint8`, `int16`, `float`, `double`, ... (or the short
    /// `u8`/`i16`/`f32`/`f64` forms) and `pad:<width>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        if let Some(width) = name.strip_prefix("pad:") {
            return width
                .trim()
                .parse()
                .map(Self::Pad)
                .map_err(|_| ConfigError::UnknownChannelFormat(s.to_string()));
        }

        match name.as_str() {
            "uint8" | "u8" => Ok(Self::UInt8),
            "int8" | "i8" => Ok(Self::Int8),
            "uint16" | "u16" => Ok(Self::UInt16),
            "int16" | "i16" => Ok(Self::Int16),
            "uint32" | "u32" => Ok(Self::UInt32),
            "int32" | "i32" => Ok(Self::Int32),
            "float" | "float32" | "f32" => Ok(Self::Float32),
            "double" | "float64" | "f64" => Ok(Self::Float64),
            "pad" => Ok(Self::Pad(1)),
            _ => Err(ConfigError::UnknownChannelFormat(s.to_string())),
        }
    }
}

/// Wire encoding of one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelFormat {
    pub kind: ChannelKind,
}

impl ChannelFormat {
    pub fn new(kind: ChannelKind) -> Self {
        Self { kind }
    }

    /// A pad channel of `width` bytes.
    pub fn pad(width: usize) -> Self {
        Self::new(ChannelKind::Pad(width))
    }

    pub fn byte_width(&self) -> usize {
        self.kind.byte_width()
    }

    pub fn is_pad(&self) -> bool {
        self.kind.is_pad()
    }

    /// Decode one sample from `raw`, adding every raw byte into `checksum`.
    ///
    /// Pad channels still feed the checksum but always yield
    /// [`PAD_PLACEHOLDER`].
    ///
    /// # Panics
    ///
    /// Panics if `raw` is shorter than [`ChannelFormat::byte_width`].
    pub fn decode(&self, raw: &[u8], endianness: Endianness, checksum: &mut u8) -> f64 {
        debug_assert_eq!(raw.len(), self.byte_width());
        *checksum = raw.iter().fold(*checksum, |sum, b| sum.wrapping_add(*b));

        let mut buf = raw;
        let little = endianness == Endianness::Little;
        match self.kind {
            ChannelKind::Pad(_) => PAD_PLACEHOLDER,
            ChannelKind::UInt8 => f64::from(buf.get_u8()),
            ChannelKind::Int8 => f64::from(buf.get_i8()),
            ChannelKind::UInt16 if little => f64::from(buf.get_u16_le()),
            ChannelKind::UInt16 => f64::from(buf.get_u16()),
            ChannelKind::Int16 if little => f64::from(buf.get_i16_le()),
            ChannelKind::Int16 => f64::from(buf.get_i16()),
            ChannelKind::UInt32 if little => f64::from(buf.get_u32_le()),
            ChannelKind::UInt32 => f64::from(buf.get_u32()),
            ChannelKind::Int32 if little => f64::from(buf.get_i32_le()),
            ChannelKind::Int32 => f64::from(buf.get_i32()),
            ChannelKind::Float32 if little => f64::from(buf.get_f32_le()),
            ChannelKind::Float32 => f64::from(buf.get_f32()),
            ChannelKind::Float64 if little => buf.get_f64_le(),
            ChannelKind::Float64 => buf.get_f64(),
        }
    }
}

impl From<ChannelKind> for ChannelFormat {
    fn from(kind: ChannelKind) -> Self {
        Self::new(kind)
    }
}

impl FromStr for ChannelFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self::new)
    }
}

impl fmt::Display for ChannelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.kind, f)
    }
}

/// How the payload size of each frame is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SizeMode {
    /// Every payload is exactly this many bytes; no size field on the wire.
    Fixed(usize),
    /// A 1-byte unsigned size field follows the sync word.
    OneByteField,
    /// A 2-byte unsigned size field (configured endianness) follows the sync word.
    TwoByteField,
}

impl SizeMode {
    /// Bytes occupied by the size field on the wire.
    pub fn field_width(self) -> usize {
        match self {
            Self::Fixed(_) => 0,
            Self::OneByteField => 1,
            Self::TwoByteField => 2,
        }
    }

    /// Largest payload this mode can describe.
    pub fn max_payload(self) -> usize {
        match self {
            Self::Fixed(size) => size,
            Self::OneByteField => usize::from(u8::MAX),
            Self::TwoByteField => usize::from(u16::MAX),
        }
    }
}

impl Default for SizeMode {
    fn default() -> Self {
        Self::Fixed(1)
    }
}

/// Complete description of the framing protocol.
///
/// Replace the whole format (see `FrameDecoder::reconfigure`) whenever any
/// part of it changes; in-flight decode state never survives a change.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameFormat {
    pub sync_word: Vec<u8>,
    pub size_mode: SizeMode,
    pub endianness: Endianness,
    pub checksum: bool,
    pub channels: Vec<ChannelFormat>,
}

impl FrameFormat {
    /// Fixed-size frames with no checksum, little endian.
    pub fn new(sync_word: impl Into<Vec<u8>>, channels: Vec<ChannelFormat>) -> Self {
        let mut format = Self {
            sync_word: sync_word.into(),
            size_mode: SizeMode::Fixed(0),
            endianness: Endianness::Little,
            checksum: false,
            channels,
        };
        format.size_mode = SizeMode::Fixed(format.sample_set_size());
        format
    }

    pub fn with_size_mode(mut self, size_mode: SizeMode) -> Self {
        self.size_mode = size_mode;
        self
    }

    pub fn with_endianness(mut self, endianness: Endianness) -> Self {
        self.endianness = endianness;
        self
    }

    pub fn with_checksum(mut self, checksum: bool) -> Self {
        self.checksum = checksum;
        self
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Bytes needed for one value of every channel.
    ///
    /// Saturates at `usize::MAX`; `validate` rejects anything above
    /// [`MAX_PAYLOAD`].
    pub fn sample_set_size(&self) -> usize {
        self.channels
            .iter()
            .map(ChannelFormat::byte_width)
            .try_fold(0usize, usize::checked_add)
            .unwrap_or(usize::MAX)
    }

    /// Bytes that follow the payload (the checksum byte, if enabled).
    pub fn trailer_len(&self) -> usize {
        usize::from(self.checksum)
    }

    /// Whether a payload of `size` bytes holds a whole, non-zero number of sample sets.
    pub fn accepts_payload_size(&self, size: usize) -> bool {
        let sample_set_size = self.sample_set_size();
        size != 0 && sample_set_size != 0 && size % sample_set_size == 0
    }

    /// Check that the decoder can run with this format.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sync_word.is_empty() {
            return Err(ConfigError::EmptySyncWord);
        }
        if self.channels.is_empty() {
            return Err(ConfigError::NoChannels);
        }
        if self.channels.len() > MAX_CHANNELS {
            return Err(ConfigError::TooManyChannels {
                count: self.channels.len(),
                max: MAX_CHANNELS,
            });
        }
        if let Some(channel) = self.channels.iter().position(|c| c.byte_width() == 0) {
            return Err(ConfigError::ZeroWidthPad { channel });
        }
        let sample_set_size = self.sample_set_size();
        if sample_set_size > MAX_PAYLOAD {
            return Err(ConfigError::FrameTooLarge {
                size: sample_set_size,
                max: MAX_PAYLOAD,
            });
        }
        if let SizeMode::Fixed(frame_size) = self.size_mode {
            if frame_size > MAX_PAYLOAD {
                return Err(ConfigError::FrameTooLarge {
                    size: frame_size,
                    max: MAX_PAYLOAD,
                });
            }
            if !self.accepts_payload_size(frame_size) {
                return Err(ConfigError::FrameSizeNotMultipleOfSampleSet {
                    frame_size,
                    sample_set_size,
                });
            }
        }
        Ok(())
    }
}

impl Default for FrameFormat {
    fn default() -> Self {
        Self::new([0xAA, 0xBB], vec![ChannelFormat::new(ChannelKind::UInt8)])
    }
}

/// Parse sync word text such as `"AA BB"` or `"aabb"`.
pub fn parse_sync_word(text: &str) -> Result<Vec<u8>, ConfigError> {
    let digits: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if digits.is_empty() {
        return Err(ConfigError::EmptySyncWord);
    }
    if digits.len() % 2 != 0 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ConfigError::MalformedSyncWord(text.to_string()));
    }

    digits
        .as_bytes()
        .chunks(2)
        .map(|pair| {
            std::str::from_utf8(pair)
                .ok()
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .ok_or_else(|| ConfigError::MalformedSyncWord(text.to_string()))
        })
        .collect()
}

/// Render a sync word as space-separated upper-case hex.
pub fn format_sync_word(sync_word: &[u8]) -> String {
    sync_word
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}
