use clap::{Args, Subcommand};
use std::path::PathBuf;

use sampleframe_frame::{ChannelFormat, Endianness};

use crate::config::{ProtocolProfile, SizeField};
use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod check;
pub mod decode;
pub mod encode;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode a captured or live byte stream and print sample packs.
    Decode(DecodeArgs),
    /// Encode sample values into frames (simulates a device).
    Encode(EncodeArgs),
    /// Validate protocol settings and show the resulting frame layout.
    Check(CheckArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Decode(args) => decode::run(args, format),
        Command::Encode(args) => encode::run(args),
        Command::Check(args) => check::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Framing settings shared by every command that touches the wire.
#[derive(Args, Debug, Clone)]
pub struct ProtocolArgs {
    /// JSON protocol profile (replaces the individual protocol flags).
    #[arg(
        long,
        value_name = "FILE",
        conflicts_with_all = ["sync", "size_field", "frame_size", "endianness", "checksum", "channels"]
    )]
    pub config: Option<PathBuf>,
    /// Sync word as hex bytes, e.g. "AA BB".
    #[arg(long, default_value = "AA BB")]
    pub sync: String,
    /// How the payload length is carried.
    #[arg(long, value_enum, default_value = "fixed")]
    pub size_field: SizeField,
    /// Payload bytes per frame when --size-field is fixed. Default: one sample set.
    #[arg(long)]
    pub frame_size: Option<usize>,
    /// Byte order of the size field and samples.
    #[arg(long, default_value = "little")]
    pub endianness: Endianness,
    /// Frames end with an additive checksum byte.
    #[arg(long)]
    pub checksum: bool,
    /// Channel formats in wire order (comma-separated), e.g. uint16,int8,pad:2.
    #[arg(long, value_delimiter = ',', default_value = "uint8")]
    pub channels: Vec<ChannelFormat>,
}

impl ProtocolArgs {
    /// Settings from `--config`, or else from the individual flags.
    pub fn profile(&self) -> CliResult<ProtocolProfile> {
        if let Some(path) = &self.config {
            return ProtocolProfile::load(path);
        }

        Ok(ProtocolProfile {
            sync: self.sync.clone(),
            size_field: self.size_field,
            frame_size: self.frame_size,
            endianness: self.endianness.to_string(),
            checksum: self.checksum,
            channels: self.channels.iter().map(ToString::to_string).collect(),
            debug: false,
        })
    }
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Input file, device node or "-" for stdin.
    #[arg(default_value = "-")]
    pub input: PathBuf,
    #[command(flatten)]
    pub protocol: ProtocolArgs,
    /// Exit after printing N packs.
    #[arg(long)]
    pub count: Option<usize>,
    /// Accept 0xAA as a valid checksum byte for any frame (debug builds of some firmware).
    #[arg(long)]
    pub accept_checksum_sentinel: bool,
    /// Log every sync mismatch at debug level.
    #[arg(long)]
    pub debug_frames: bool,
    /// Keep the matched sync prefix on a mismatch instead of restarting the search.
    #[arg(long)]
    pub hold_sync: bool,
    /// Include pad channels (as placeholders) in the output.
    #[arg(long)]
    pub show_pad: bool,
    /// Exit with a data error if any frame was dropped.
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// One frame per occurrence: sample sets separated by ';', channel values by ','.
    #[arg(long, required = true, value_name = "SETS")]
    pub values: Vec<String>,
    #[command(flatten)]
    pub protocol: ProtocolArgs,
    /// Write frames to this file instead of stdout.
    #[arg(long, short = 'o', value_name = "FILE")]
    pub out: Option<PathBuf>,
    /// Hex bytes written before every frame, e.g. "00 13".
    #[arg(long, value_name = "HEX")]
    pub noise: Option<String>,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub protocol: ProtocolArgs,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
