use std::fmt;
use std::io;

use firmata_parser::ParserError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
/// The stream ended while a message was still incomplete (`--strict`).
pub const INCOMPLETE: i32 = 2;
pub const PERMISSION_DENIED: i32 = 50;
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
        io::ErrorKind::NotFound => FAILURE,
        io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => DATA_INVALID,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn parser_error(context: &str, err: ParserError) -> CliError {
    match err {
        ParserError::Io(source) => io_error(context, source),
        ParserError::InvalidBufferAssignment { .. } => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
        ParserError::ConnectionClosed => CliError::new(FAILURE, format!("{context}: {err}")),
    }
}
