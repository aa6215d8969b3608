//! Incremental decoding of sync-word framed, multi-channel sample streams.
//!
//! This is the core value-add layer of sampleframe. Every frame on the wire is:
//! - A configurable sync word for stream synchronization
//! - An optional 1- or 2-byte payload size field
//! - A payload of one or more sample sets (one value per channel)
//! - An optional 1-byte additive checksum
//!
//! Bytes may arrive in any chunking. The decoder keeps partial-frame state
//! between calls and resynchronizes on its own after corruption.

pub mod codec;
pub mod decoder;
pub mod diagnostic;
pub mod error;
pub mod format;
pub mod reader;
pub mod sample;
pub mod writer;

#[cfg(feature = "async")]
pub use codec::SampleCodec;
pub use codec::encode_frame;
pub use decoder::{DecoderConfig, FrameDecoder, Stage, SyncRecovery, CHECKSUM_SENTINEL};
pub use diagnostic::{Collector, DecodeStats, Diagnostic, DiagnosticKind, SampleSink, Severity};
pub use error::{ConfigError, FrameError, Result};
pub use format::{
    format_sync_word, parse_sync_word, ChannelFormat, ChannelKind, Endianness, FrameFormat,
    SizeMode, MAX_CHANNELS, MAX_PAYLOAD, PAD_PLACEHOLDER,
};
pub use reader::SampleReader;
pub use sample::SamplePack;
pub use writer::FrameWriter;
