//! Byte-at-a-time decoder for the Firmata serial protocol.
//!
//! Bytes arrive one at a time in stream order. The parser reassembles
//! three message shapes:
//! - fixed-length channel messages (`0x80`-`0xEF`, channel in the low nibble)
//!   and pin messages (`SET_PIN_MODE`, `SET_DIGITAL_PIN_VALUE`)
//! - single-byte commands (`REPORT_VERSION`, `SYSTEM_RESET`)
//! - sysex messages delimited by `START_SYSEX` .. `END_SYSEX`
//!
//! Payloads are staged in a caller-owned buffer that is never written past
//! its end, and completed messages are dispatched to typed handlers.

pub mod buffer;
pub mod command;
pub mod error;
pub mod event;
pub mod feeder;
pub mod parser;
pub mod registry;
pub mod sysex;

pub use buffer::{BufferGrant, DataBuffer};
pub use error::{ParserError, Result};
pub use event::{Event, EventRecorder};
#[cfg(feature = "async")]
pub use feeder::AsyncByteFeeder;
pub use feeder::{ByteFeeder, FeedConfig, DEFAULT_CHUNK_SIZE};
pub use parser::{FixedMessage, ParseState, Parser};
pub use registry::{
    CallbackRegistry, NumericHandler, OverflowHandler, SimpleHandler, SysexHandler, TextHandler,
};
