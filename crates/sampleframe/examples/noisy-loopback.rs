//! Simulate a noisy serial link: encode frames, corrupt some of them and
//! decode the result with a blocking `SampleReader`.
//!
//! Run with: cargo run -p sampleframe --example noisy-loopback

use std::io::Cursor;

use sampleframe::frame::{ChannelFormat, DecoderConfig, FrameWriter, SampleReader};
use sampleframe::{ChannelKind, Endianness, FrameError, FrameFormat, SizeMode};

fn main() -> Result<(), FrameError> {
    let format = FrameFormat::new(
        [0xA5, 0x5A],
        vec![
            ChannelKind::Int16.into(),
            ChannelFormat::pad(1),
            ChannelKind::Float32.into(),
        ],
    )
    .with_size_mode(SizeMode::OneByteField)
    .with_endianness(Endianness::Big)
    .with_checksum(true);

    let mut writer = FrameWriter::new(Vec::new(), format.clone());
    for tick in 0..8 {
        let t = f64::from(tick);
        writer.write_frame(&[vec![t * 100.0, 0.0, t / 4.0], vec![-t, 0.0, t * 1.5]])?;
        // Line noise between frames.
        writer.write_raw(&[0x00, 0x13, 0x37])?;
    }

    let mut wire = writer.into_inner();
    // Flip a payload bit in the fourth frame so its checksum fails.
    let frame_len = 2 + 1 + 2 * 7 + 1 + 3;
    wire[3 * frame_len + 4] ^= 0x01;

    let mut reader = SampleReader::new(Cursor::new(wire), DecoderConfig::new(format));
    loop {
        let pack = match reader.read_pack() {
            Ok(pack) => pack,
            Err(FrameError::StreamClosed) => break,
            Err(err) => return Err(err),
        };
        println!(
            "samples={} ch0={:?} ch2={:?}",
            pack.num_samples(),
            pack.channel(0),
            pack.channel(2)
        );
    }

    println!("{:?}", reader.stats());
    Ok(())
}
