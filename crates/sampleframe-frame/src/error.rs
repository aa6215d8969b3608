use sampleframe_source::SourceError;

/// Reasons a frame format cannot be used for decoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The sync word has no bytes.
    #[error("sync word is empty")]
    EmptySyncWord,

    /// The sync word text is not an even number of hex digits.
    #[error("sync word {0:?} is not valid hex")]
    MalformedSyncWord(String),

    /// No channels are configured.
    #[error("at least one channel is required")]
    NoChannels,

    /// More channels than the decoder supports.
    #[error("too many channels ({count}, max {max})")]
    TooManyChannels { count: usize, max: usize },

    /// A pad channel was declared with zero width.
    #[error("pad channel {channel} must be at least 1 byte wide")]
    ZeroWidthPad { channel: usize },

    /// The fixed payload size does not hold a whole number of sample sets.
    #[error(
        "payload size {frame_size} must be a non-zero multiple of {sample_set_size} (sum of channel widths)"
    )]
    FrameSizeNotMultipleOfSampleSet {
        frame_size: usize,
        sample_set_size: usize,
    },

    /// A sample set or fixed payload exceeds the largest supported payload.
    #[error("frame too large ({size} bytes, max {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// A channel format name could not be parsed.
    #[error("unknown channel format {0:?}")]
    UnknownChannelFormat(String),

    /// Endianness text was neither little nor big.
    #[error("unknown endianness {0:?} (expected little or big)")]
    UnknownEndianness(String),

    /// A channel index does not exist in the current format.
    #[error("channel {index} does not exist ({count} channels configured)")]
    ChannelOutOfRange { index: usize, count: usize },
}

/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The decoder refuses to run until its configuration is corrected.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),

    /// The byte source failed.
    #[error("byte source error: {0}")]
    Source(#[from] SourceError),

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The payload cannot be described by the configured size field.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The payload does not match the configured fixed frame size.
    #[error("payload is {got} bytes, fixed frame size is {expected}")]
    FixedSizeMismatch { expected: usize, got: usize },

    /// A sample set has the wrong number of values.
    #[error("sample set has {got} values, expected {expected} (one per channel)")]
    SampleSetMismatch { expected: usize, got: usize },

    /// A frame must carry at least one sample set.
    #[error("frame has no sample sets")]
    EmptyFrame,

    /// The stream ended before another complete frame was received.
    #[error("stream closed (no further complete frame)")]
    StreamClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
