//! Decode sync-word framed, multi-channel sample streams.
//!
//! sampleframe turns the raw byte stream of a serial device into decoded
//! sample packs. Framing (sync word, size field, per-channel encodings,
//! checksum) is fully configurable at runtime.
//!
//! # Crate Structure
//!
//! - [`source`]: Byte source abstraction the decoder pulls from
//! - [`frame`]: Frame formats, the incremental decoder, encoder and readers

/// Re-export byte source types.
pub mod source {
    pub use sampleframe_source::*;
}

/// Re-export frame types.
pub mod frame {
    pub use sampleframe_frame::*;
}

pub use sampleframe_frame::{
    ChannelFormat, ChannelKind, DecoderConfig, Diagnostic, Endianness, FrameDecoder, FrameError,
    FrameFormat, SamplePack, SampleSink, SizeMode,
};
