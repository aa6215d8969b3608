/// Errors that can occur while pulling bytes from a source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// More bytes were requested than the source reported as available.
    #[error("byte source exhausted (requested {requested} bytes, {available} available)")]
    Exhausted { requested: usize, available: usize },

    /// An I/O error occurred on the underlying stream.
    #[error("source I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SourceError>;
