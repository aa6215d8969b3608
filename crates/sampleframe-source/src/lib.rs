//! Byte source abstraction for the sample-frame decoder.
//!
//! The decoder never reads from a device directly. It asks a [`ByteSource`]
//! how many bytes are ready and only then pulls exactly what it needs:
//! - [`bytes::BytesMut`] for bytes already in memory
//! - [`StreamSource`] for anything implementing [`std::io::Read`]
//!
//! This is the lowest layer of sampleframe. Everything else builds on top of
//! the [`ByteSource`] trait provided here.

pub mod error;
pub mod stream;
pub mod traits;

pub use error::{Result, SourceError};
pub use stream::StreamSource;
pub use traits::ByteSource;
