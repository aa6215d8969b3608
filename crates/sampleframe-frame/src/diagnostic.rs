//! Decoder output: sample packs and diagnostic events.

use std::collections::VecDeque;
use std::fmt;

use crate::error::ConfigError;
use crate::sample::SamplePack;

/// How much attention a diagnostic deserves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Expected under line noise.
    Routine,
    /// A frame was lost.
    Warning,
    /// The decoder cannot run.
    Error,
}

/// Discriminant of [`Diagnostic`], for counting and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    SyncMismatch,
    InvalidSizeField,
    ChecksumMismatch,
    ConfigurationInvalid,
}

/// Something the decoder noticed while consuming the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A byte did not match the sync word at `position`.
    SyncMismatch {
        position: usize,
        expected: u8,
        received: u8,
    },
    /// The size field was zero or not a multiple of the sample set size.
    InvalidSizeField { size: usize, sample_set_size: usize },
    /// The trailing checksum byte did not match the payload.
    ChecksumMismatch { received: u8, computed: u8 },
    /// The decoder refused to consume bytes.
    ConfigurationInvalid(ConfigError),
}

impl Diagnostic {
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            Self::SyncMismatch { .. } => DiagnosticKind::SyncMismatch,
            Self::InvalidSizeField { .. } => DiagnosticKind::InvalidSizeField,
            Self::ChecksumMismatch { .. } => DiagnosticKind::ChecksumMismatch,
            Self::ConfigurationInvalid(_) => DiagnosticKind::ConfigurationInvalid,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::SyncMismatch { .. } => Severity::Routine,
            Self::InvalidSizeField { .. } | Self::ChecksumMismatch { .. } => Severity::Warning,
            Self::ConfigurationInvalid(_) => Severity::Error,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SyncMismatch {
                position,
                expected,
                received,
            } => write!(
                f,
                "missed sync byte {} (expected 0x{expected:02X}, got 0x{received:02X})",
                position + 1
            ),
            Self::InvalidSizeField {
                size,
                sample_set_size,
            } => write!(
                f,
                "payload size {size} is not a non-zero multiple of {sample_set_size}"
            ),
            Self::ChecksumMismatch { received, computed } => write!(
                f,
                "checksum failed (received 0x{received:02X}, calculated 0x{computed:02X})"
            ),
            Self::ConfigurationInvalid(err) => write!(f, "configuration invalid: {err}"),
        }
    }
}

/// Receives whatever the decoder produces.
pub trait SampleSink {
    /// Called once per complete frame that passed its checksum.
    fn on_sample_pack(&mut self, pack: SamplePack);

    /// Called for every diagnostic. Ignored by default.
    fn on_diagnostic(&mut self, diagnostic: &Diagnostic) {
        let _ = diagnostic;
    }
}

impl SampleSink for Vec<SamplePack> {
    fn on_sample_pack(&mut self, pack: SamplePack) {
        self.push(pack);
    }
}

impl<S: SampleSink + ?Sized> SampleSink for &mut S {
    fn on_sample_pack(&mut self, pack: SamplePack) {
        (**self).on_sample_pack(pack);
    }

    fn on_diagnostic(&mut self, diagnostic: &Diagnostic) {
        (**self).on_diagnostic(diagnostic);
    }
}

/// Running totals of what a decoder produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeStats {
    pub frames: u64,
    pub sync_mismatches: u64,
    pub invalid_sizes: u64,
    pub checksum_failures: u64,
    pub config_errors: u64,
}

impl DecodeStats {
    pub fn record(&mut self, diagnostic: &Diagnostic) {
        let counter = match diagnostic.kind() {
            DiagnosticKind::SyncMismatch => &mut self.sync_mismatches,
            DiagnosticKind::InvalidSizeField => &mut self.invalid_sizes,
            DiagnosticKind::ChecksumMismatch => &mut self.checksum_failures,
            DiagnosticKind::ConfigurationInvalid => &mut self.config_errors,
        };
        *counter = counter.saturating_add(1);
    }

    /// Frames lost after sync was acquired.
    pub fn dropped_frames(&self) -> u64 {
        self.invalid_sizes.saturating_add(self.checksum_failures)
    }
}

/// Queues packs and counts diagnostics.
#[derive(Debug, Default)]
pub struct Collector {
    packs: VecDeque<SamplePack>,
    stats: DecodeStats,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> &DecodeStats {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.packs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packs.is_empty()
    }

    /// Oldest pack not yet taken.
    pub fn pop(&mut self) -> Option<SamplePack> {
        self.packs.pop_front()
    }

    pub fn into_packs(self) -> Vec<SamplePack> {
        self.packs.into()
    }
}

impl SampleSink for Collector {
    fn on_sample_pack(&mut self, pack: SamplePack) {
        self.stats.frames = self.stats.frames.saturating_add(1);
        self.packs.push_back(pack);
    }

    fn on_diagnostic(&mut self, diagnostic: &Diagnostic) {
        self.stats.record(diagnostic);
    }
}
