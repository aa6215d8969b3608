//! Decode frames from an `AsyncRead` with `tokio_util::codec::FramedRead`.
//!
//! Run with: cargo run -p sampleframe --features async --example async-decode

use bytes::BytesMut;
use futures_util::StreamExt;
use tokio_util::codec::FramedRead;

use sampleframe::frame::{encode_frame, DecoderConfig, SampleCodec};
use sampleframe::{ChannelKind, FrameError, FrameFormat, SizeMode};

#[tokio::main]
async fn main() -> Result<(), FrameError> {
    let format = FrameFormat::new([0xAA, 0xBB], vec![ChannelKind::UInt16.into(); 2])
        .with_size_mode(SizeMode::TwoByteField)
        .with_checksum(true);

    let mut wire = BytesMut::new();
    for n in 1..=3u8 {
        let sets: Vec<Vec<f64>> = (0..n).map(|i| vec![f64::from(i), f64::from(n)]).collect();
        encode_frame(&format, &sets, &mut wire)?;
    }

    let bytes = wire.freeze();
    let mut frames = FramedRead::new(bytes.as_ref(), SampleCodec::new(DecoderConfig::new(format)));
    while let Some(pack) = frames.next().await {
        let pack = pack?;
        println!("samples={} ch0={:?}", pack.num_samples(), pack.channel(0));
    }

    println!("{:?}", frames.decoder().stats());
    Ok(())
}
