/// Errors surfaced by the parser and its stream feeders.
///
/// Malformed input is never an error: unknown commands are ignored and
/// overflowing writes are dropped.
#[derive(Debug, thiserror::Error)]
pub enum ParserError {
    /// A buffer was assigned while one is already bound, or the
    /// supplied buffer has no capacity.
    #[error("invalid buffer assignment: {reason}")]
    InvalidBufferAssignment { reason: &'static str },

    /// An I/O error occurred while reading the byte stream.
    #[error("stream I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The byte stream reached end of file.
    #[error("stream closed")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, ParserError>;
