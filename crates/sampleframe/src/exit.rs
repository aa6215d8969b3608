use std::fmt;
use std::io;

use sampleframe_frame::{ConfigError, FrameError};
use sampleframe_source::SourceError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const PERMISSION_DENIED: i32 = 50;
pub const NOT_FOUND: i32 = 51;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::NotFound => NOT_FOUND,
        io::ErrorKind::InvalidData => DATA_INVALID,
        io::ErrorKind::BrokenPipe => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

/// Protocol settings the user supplied do not describe a decodable format.
pub fn config_error(context: &str, err: ConfigError) -> CliError {
    CliError::new(USAGE, format!("{context}: {err}"))
}

pub fn source_error(context: &str, err: SourceError) -> CliError {
    match err {
        SourceError::Io(source) => io_error(context, source),
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::Source(source) => source_error(context, source),
        FrameError::InvalidConfiguration(source) => config_error(context, source),
        FrameError::PayloadTooLarge { .. }
        | FrameError::FixedSizeMismatch { .. }
        | FrameError::SampleSetMismatch { .. }
        | FrameError::EmptyFrame => CliError::new(DATA_INVALID, format!("{context}: {err}")),
        FrameError::StreamClosed => CliError::new(FAILURE, format!("{context}: {err}")),
    }
}
