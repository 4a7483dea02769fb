//! Firmata serial protocol decoding for hosts talking to microcontrollers.
//!
//! # Crate Structure
//!
//! - [`parser`]: Byte-at-a-time decoder, handler registry and stream feeders
//! - [`command`]: Wire constants for commands and sysex tags
//!
//! The `firmata` binary (behind the `cli` feature) decodes a captured or live
//! byte stream and prints the decoded messages.

/// Re-export parser types.
pub mod parser {
    pub use firmata_parser::*;
}

/// Re-export wire constants.
pub mod command {
    pub use firmata_parser::command::*;
}

pub use firmata_parser::{
    ByteFeeder, Event, EventRecorder, FeedConfig, ParseState, Parser, ParserError,
};
