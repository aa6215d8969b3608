use std::fs::File;
use std::io::{BufWriter, Write};

use sampleframe_frame::{parse_sync_word, FrameWriter};
use tracing::info;

use crate::cmd::EncodeArgs;
use crate::exit::{config_error, frame_error, io_error, CliError, CliResult, SUCCESS, USAGE};

pub fn run(args: EncodeArgs) -> CliResult<i32> {
    let frame_format = args
        .protocol
        .profile()?
        .to_format()
        .map_err(|err| config_error("invalid protocol", err))?;

    let frames = args
        .values
        .iter()
        .map(|text| parse_sample_sets(text))
        .collect::<CliResult<Vec<_>>>()?;
    let noise = match &args.noise {
        Some(text) => parse_sync_word(text)
            .map_err(|_| CliError::new(USAGE, format!("invalid --noise hex {text:?}")))?,
        None => Vec::new(),
    };

    let out: Box<dyn Write> = match &args.out {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).map_err(|err| io_error(&format!("create {}", path.display()), err))?,
        )),
        None => Box::new(std::io::stdout().lock()),
    };
    let mut writer = FrameWriter::new(out, frame_format);

    for (index, sets) in frames.iter().enumerate() {
        if !noise.is_empty() {
            writer
                .write_raw(&noise)
                .map_err(|err| frame_error("write failed", err))?;
        }
        writer
            .write_frame(sets)
            .map_err(|err| frame_error(&format!("frame {index}"), err))?;
    }

    info!(frames = frames.len(), "encode finished");
    Ok(SUCCESS)
}

/// Parse `"1,2;3,4"` into sample sets `[[1, 2], [3, 4]]`.
fn parse_sample_sets(text: &str) -> CliResult<Vec<Vec<f64>>> {
    text.split(';')
        .map(str::trim)
        .filter(|set| !set.is_empty())
        .map(|set| {
            set.split(',')
                .map(|value| {
                    value.trim().parse::<f64>().map_err(|_| {
                        CliError::new(USAGE, format!("invalid sample value {value:?} in {text:?}"))
                    })
                })
                .collect()
        })
        .collect()
}
