use std::io::IsTerminal;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use sampleframe_frame::{FrameFormat, SamplePack};
use serde::Serialize;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Csv,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct ChannelOutput<'a> {
    index: usize,
    format: &'a str,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    placeholder: bool,
    values: &'a [f64],
}

#[derive(Serialize)]
struct PackOutput<'a> {
    frame: u64,
    num_samples: usize,
    channels: Vec<ChannelOutput<'a>>,
    timestamp: String,
}

/// Prints decoded packs one after another in the selected format.
pub struct PackPrinter {
    format: OutputFormat,
    labels: Vec<String>,
    show_pad: bool,
    printed: u64,
}

impl PackPrinter {
    pub fn new(format: OutputFormat, frame_format: &FrameFormat, show_pad: bool) -> Self {
        Self {
            format,
            labels: frame_format.channels.iter().map(|c| c.to_string()).collect(),
            show_pad,
            printed: 0,
        }
    }

    pub fn printed(&self) -> u64 {
        self.printed
    }

    /// Channels worth showing; pad placeholders are hidden unless asked for.
    fn visible(&self, pack: &SamplePack) -> Vec<usize> {
        (0..pack.num_channels())
            .filter(|&ch| self.show_pad || !pack.is_placeholder(ch))
            .collect()
    }

    fn label(&self, channel: usize) -> &str {
        self.labels.get(channel).map(String::as_str).unwrap_or("?")
    }

    pub fn print(&mut self, pack: &SamplePack) {
        let frame = self.printed;
        let channels = self.visible(pack);

        match self.format {
            OutputFormat::Json => {
                let out = PackOutput {
                    frame,
                    num_samples: pack.num_samples(),
                    channels: channels
                        .iter()
                        .map(|&ch| ChannelOutput {
                            index: ch,
                            format: self.label(ch),
                            placeholder: pack.is_placeholder(ch),
                            values: pack.channel(ch),
                        })
                        .collect(),
                    timestamp: now_unix_seconds(),
                };
                println!(
                    "{}",
                    serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
                );
            }
            OutputFormat::Table => {
                let mut header = vec!["FRAME".to_string(), "SAMPLE".to_string()];
                header.extend(channels.iter().map(|&ch| format!("CH{ch} {}", self.label(ch))));

                let mut table = Table::new();
                table
                    .load_preset(UTF8_FULL)
                    .set_content_arrangement(ContentArrangement::Dynamic)
                    .set_header(header);
                for sample in 0..pack.num_samples() {
                    let mut row = vec![frame.to_string(), sample.to_string()];
                    row.extend(channels.iter().map(|&ch| pack.channel(ch)[sample].to_string()));
                    table.add_row(row);
                }
                println!("{table}");
            }
            OutputFormat::Pretty => {
                let values = channels
                    .iter()
                    .map(|&ch| {
                        format!(
                            "ch{ch}({})=[{}]",
                            self.label(ch),
                            join_values(pack.channel(ch))
                        )
                    })
                    .collect::<Vec<_>>()
                    .join(" ");
                println!("frame={frame} samples={} {values}", pack.num_samples());
            }
            OutputFormat::Csv => {
                if frame == 0 {
                    let columns = channels
                        .iter()
                        .map(|&ch| format!("ch{ch}"))
                        .collect::<Vec<_>>()
                        .join(",");
                    println!("frame,sample,{columns}");
                }
                for sample in 0..pack.num_samples() {
                    let row = channels
                        .iter()
                        .map(|&ch| pack.channel(ch)[sample].to_string())
                        .collect::<Vec<_>>()
                        .join(",");
                    println!("{frame},{sample},{row}");
                }
            }
        }

        self.printed += 1;
    }
}

fn join_values(values: &[f64]) -> String {
    values
        .iter()
        .map(f64::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
