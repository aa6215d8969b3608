use std::fs::File;
use std::io::Read;
use std::path::Path;

use sampleframe_frame::{DecoderConfig, FrameError, SampleReader, SyncRecovery};
use tracing::info;

use crate::cmd::DecodeArgs;
use crate::exit::{config_error, frame_error, io_error, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{OutputFormat, PackPrinter};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let profile = args.protocol.profile()?;
    let frame_format = profile
        .to_format()
        .map_err(|err| config_error("invalid protocol", err))?;
    frame_format
        .validate()
        .map_err(|err| config_error("invalid protocol", err))?;

    let mut config = DecoderConfig::new(frame_format.clone());
    config.debug = args.debug_frames || profile.debug;
    config.accept_checksum_sentinel = args.accept_checksum_sentinel;
    if args.hold_sync {
        config.sync_recovery = SyncRecovery::Hold;
    }

    let input = open_input(&args.input)?;
    let mut reader = SampleReader::new(input, config);
    let mut printer = PackPrinter::new(format, &frame_format, args.show_pad);

    info!(
        input = %args.input.display(),
        sample_set_size = frame_format.sample_set_size(),
        "decoding"
    );

    while args.count.is_none_or(|count| printer.printed() < count as u64) {
        match reader.read_pack() {
            Ok(pack) => printer.print(&pack),
            Err(FrameError::StreamClosed) => break,
            Err(err) => return Err(frame_error("decode failed", err)),
        }
    }

    let stats = reader.stats();
    info!(
        frames = stats.frames,
        sync_mismatches = stats.sync_mismatches,
        invalid_sizes = stats.invalid_sizes,
        checksum_failures = stats.checksum_failures,
        "decode finished"
    );

    if args.strict && stats.dropped_frames() > 0 {
        return Ok(DATA_INVALID);
    }
    Ok(SUCCESS)
}

fn open_input(path: &Path) -> CliResult<Box<dyn Read>> {
    if path.as_os_str() == "-" {
        return Ok(Box::new(std::io::stdin()));
    }
    let file = File::open(path).map_err(|err| io_error(&format!("open {}", path.display()), err))?;
    Ok(Box::new(file))
}
