use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use sampleframe_frame::{format_sync_word, FrameFormat, SizeMode};
use serde::Serialize;

use crate::cmd::CheckArgs;
use crate::config::ProtocolProfile;
use crate::exit::{config_error, CliResult, SUCCESS, USAGE};
use crate::output::OutputFormat;

#[derive(Serialize)]
struct ChannelInfo {
    index: usize,
    format: String,
    bytes: usize,
}

#[derive(Serialize)]
struct CheckOutput {
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    sync_word: String,
    size_field: String,
    endianness: String,
    checksum: bool,
    channels: Vec<ChannelInfo>,
    sample_set_size: usize,
    /// Sync, size field and checksum bytes around every payload.
    frame_overhead: usize,
    /// Most sample sets one frame can carry.
    max_sample_sets: usize,
    profile: ProtocolProfile,
}

pub fn run(args: CheckArgs, format: OutputFormat) -> CliResult<i32> {
    let profile = args.protocol.profile()?;
    let frame_format = profile
        .to_format()
        .map_err(|err| config_error("invalid protocol", err))?;

    let out = describe(&frame_format, profile);
    print_check(&out, format);

    // Same code `decode` and `encode` exit with for these settings.
    if out.valid {
        Ok(SUCCESS)
    } else {
        Ok(USAGE)
    }
}

fn describe(format: &FrameFormat, profile: ProtocolProfile) -> CheckOutput {
    let error = format.validate().err().map(|err| err.to_string());
    let sample_set_size = format.sample_set_size();
    let max_sample_sets = match sample_set_size {
        0 => 0,
        size => format.size_mode.max_payload() / size,
    };

    CheckOutput {
        valid: error.is_none(),
        error,
        sync_word: format_sync_word(&format.sync_word),
        size_field: match format.size_mode {
            SizeMode::Fixed(size) => format!("fixed ({size} bytes)"),
            SizeMode::OneByteField => "1 byte".to_string(),
            SizeMode::TwoByteField => "2 bytes".to_string(),
        },
        endianness: format.endianness.to_string(),
        checksum: format.checksum,
        channels: format
            .channels
            .iter()
            .enumerate()
            .map(|(index, channel)| ChannelInfo {
                index,
                format: channel.to_string(),
                bytes: channel.byte_width(),
            })
            .collect(),
        sample_set_size,
        frame_overhead: format.sync_word.len()
            + format.size_mode.field_width()
            + format.trailer_len(),
        max_sample_sets,
        profile,
    }
}

fn print_check(out: &CheckOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty | OutputFormat::Csv => {
            println!("Frame format:");
            match &out.error {
                None => println!("  Valid:            yes"),
                Some(err) => println!("  Valid:            no ({err})"),
            }
            println!("  Sync word:        {}", out.sync_word);
            println!("  Size field:       {}", out.size_field);
            println!("  Endianness:       {}", out.endianness);
            println!("  Checksum:         {}", if out.checksum { "on" } else { "off" });
            println!("  Sample set:       {} bytes", out.sample_set_size);
            println!("  Frame overhead:   {} bytes", out.frame_overhead);
            println!("  Max sample sets:  {}", out.max_sample_sets);

            if format == OutputFormat::Table {
                let mut table = Table::new();
                table
                    .load_preset(UTF8_FULL)
                    .set_content_arrangement(ContentArrangement::Dynamic)
                    .set_header(vec!["CHANNEL", "FORMAT", "BYTES"]);
                for channel in &out.channels {
                    table.add_row(vec![
                        channel.index.to_string(),
                        channel.format.clone(),
                        channel.bytes.to_string(),
                    ]);
                }
                println!("{table}");
            } else {
                let chans = out
                    .channels
                    .iter()
                    .map(|c| format!("{} ({}B)", c.format, c.bytes))
                    .collect::<Vec<_>>()
                    .join(", ");
                println!("  Channels:         {chans}");
            }
        }
    }
}
