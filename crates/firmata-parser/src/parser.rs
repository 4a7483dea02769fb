use tracing::{debug, trace, warn};

use crate::buffer::{BufferGrant, DataBuffer};
use crate::command::{
    command_name, fixed_data_len, is_data_byte, CommandByte, ANALOG_MESSAGE, DIGITAL_MESSAGE,
    END_SYSEX, REPORT_ANALOG, REPORT_DIGITAL, REPORT_FIRMWARE, REPORT_VERSION,
    SET_DIGITAL_PIN_VALUE, SET_PIN_MODE, START_SYSEX, STRING_DATA, SYSTEM_RESET,
};
use crate::error::Result;
use crate::registry::{
    CallbackRegistry, NumericHandler, SimpleHandler, SysexHandler, TextHandler, WithContext,
};
use crate::sysex;

/// A fixed-length message that is still waiting for data bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedMessage {
    /// Command with the channel nibble removed.
    pub command: u8,
    /// Channel nibble; only meaningful for channel-encoded commands.
    pub channel: u8,
    expected: usize,
    received: usize,
    data: [u8; 2],
    overflowed: bool,
}

impl FixedMessage {
    fn new(command: u8, channel: u8, expected: usize) -> Self {
        Self {
            command,
            channel,
            expected,
            received: 0,
            data: [0; 2],
            overflowed: false,
        }
    }

    /// Data bytes still outstanding (1 or 2 while pending).
    pub fn remaining(&self) -> usize {
        self.expected - self.received
    }

    fn push(&mut self, byte: u8, overflowed: bool) {
        self.data[self.received] = byte;
        self.received += 1;
        self.overflowed |= overflowed;
    }

    fn is_complete(&self) -> bool {
        self.received == self.expected
    }

    /// First data byte received (LSB of 14-bit values).
    fn low(&self) -> u8 {
        self.data[0]
    }

    /// Second data byte received (MSB of 14-bit values).
    fn high(&self) -> u8 {
        self.data[1]
    }

    fn value14(&self) -> u16 {
        u16::from(self.low()) + (u16::from(self.high()) << 7)
    }
}

/// Where the parser is within the byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    /// No message in progress.
    Idle,
    /// A channel-encoded or pin message waiting for its data bytes.
    AwaitingFixedData(FixedMessage),
    /// Inside a `START_SYSEX` .. `END_SYSEX` pair.
    InExtendedMessage { bytes_read: usize },
}

/// Byte-at-a-time Firmata decoder.
///
/// Feed bytes in stream order with [`Parser::feed`]. Completed messages
/// are dispatched synchronously to the attached handlers. Message
/// payloads are staged in a caller-owned buffer that is never written
/// past its end.
///
/// ```
/// use firmata_parser::{command::ANALOG_MESSAGE, Parser};
///
/// let mut storage = [0u8; 32];
/// let mut last = None;
/// {
///     let mut parser = Parser::with_buffer(&mut storage);
///     parser.attach_numeric(ANALOG_MESSAGE, |channel: u8, value: u16| {
///         last = Some((channel, value));
///     });
///     parser.feed_all(&[0xE0, 0x7F, 0x01]);
///     assert!(!parser.is_parsing_message());
/// }
/// assert_eq!(last, Some((0, 255)));
/// ```
#[derive(Debug)]
pub struct Parser<'a> {
    state: ParseState,
    buffer: DataBuffer<'a>,
    registry: CallbackRegistry<'a>,
}

impl Default for Parser<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Parser<'a> {
    /// Create a parser with no data buffer. Assign one with
    /// [`Parser::assign_buffer`] before feeding message payloads.
    pub fn new() -> Self {
        Self {
            state: ParseState::Idle,
            buffer: DataBuffer::unassigned(),
            registry: CallbackRegistry::new(),
        }
    }

    /// Create a parser bound to `buffer` for its whole lifetime.
    pub fn with_buffer(buffer: &'a mut [u8]) -> Self {
        Self {
            state: ParseState::Idle,
            buffer: DataBuffer::new(buffer),
            registry: CallbackRegistry::new(),
        }
    }

    /// Bind the data buffer. Only allowed while none is bound; the
    /// overflow handler uses [`BufferGrant`] to swap buffers instead.
    pub fn assign_buffer(&mut self, buffer: &'a mut [u8]) -> Result<()> {
        self.buffer.assign(buffer)
    }

    /// Capacity of the bound buffer, 0 if none.
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Current contents of the bound buffer.
    pub fn buffer(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    pub fn state(&self) -> ParseState {
        self.state
    }

    /// True while a fixed-length or sysex message is partially received.
    pub fn is_parsing_message(&self) -> bool {
        self.state != ParseState::Idle
    }

    /// Consume one byte from the stream.
    pub fn feed(&mut self, byte: u8) {
        match self.state {
            ParseState::InExtendedMessage { bytes_read } => {
                if byte == END_SYSEX {
                    self.state = ParseState::Idle;
                    sysex::process(&mut self.buffer, &mut self.registry, bytes_read);
                } else {
                    self.buffer
                        .write(byte, bytes_read, self.registry.overflow_handler());
                    self.state = ParseState::InExtendedMessage {
                        bytes_read: bytes_read + 1,
                    };
                }
            }
            ParseState::AwaitingFixedData(mut message) if is_data_byte(byte) => {
                let overflowed =
                    self.buffer
                        .write(byte, message.received, self.registry.overflow_handler());
                message.push(byte, overflowed);

                if message.is_complete() {
                    self.state = ParseState::Idle;
                    self.dispatch_fixed(message);
                } else {
                    self.state = ParseState::AwaitingFixedData(message);
                }
            }
            _ => self.begin_command(byte),
        }
    }

    /// Consume a run of bytes in order.
    pub fn feed_all(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.feed(byte);
        }
    }

    fn begin_command(&mut self, byte: u8) {
        let CommandByte { command, channel } = CommandByte::split(byte);

        if let Some(expected) = fixed_data_len(command) {
            if let ParseState::AwaitingFixedData(abandoned) = self.state {
                debug!(
                    abandoned = command_name(abandoned.command),
                    remaining = abandoned.remaining(),
                    next = command_name(command),
                    "partial message abandoned for new command"
                );
            }
            self.state =
                ParseState::AwaitingFixedData(FixedMessage::new(command, channel, expected));
            return;
        }

        match command {
            START_SYSEX => {
                if let ParseState::AwaitingFixedData(abandoned) = self.state {
                    debug!(
                        abandoned = command_name(abandoned.command),
                        "partial message abandoned for sysex"
                    );
                }
                self.state = ParseState::InExtendedMessage { bytes_read: 0 };
            }
            SYSTEM_RESET => self.reset(),
            REPORT_VERSION => {
                self.registry.dispatch_simple(REPORT_VERSION);
            }
            _ => trace!(byte, "unrecognized command byte ignored"),
        }
    }

    fn dispatch_fixed(&mut self, message: FixedMessage) {
        if message.overflowed {
            warn!(
                command = command_name(message.command),
                "message dropped after data buffer overflow"
            );
            return;
        }

        let (target, value) = match message.command {
            ANALOG_MESSAGE | DIGITAL_MESSAGE => (message.channel, message.value14()),
            SET_PIN_MODE | SET_DIGITAL_PIN_VALUE => (message.low(), u16::from(message.high())),
            REPORT_ANALOG | REPORT_DIGITAL => (message.channel, u16::from(message.low())),
            _ => return,
        };

        self.registry.dispatch_numeric(message.command, target, value);
    }

    /// Return to the power-up state: drop any partial message, zero the
    /// whole buffer, then run the `SYSTEM_RESET` handler.
    ///
    /// Also triggered by a `SYSTEM_RESET` byte in the stream.
    pub fn reset(&mut self) {
        self.state = ParseState::Idle;
        self.buffer.zero();
        debug!(capacity = self.buffer.capacity(), "parser reset");
        self.registry.dispatch_simple(SYSTEM_RESET);
    }

    /// Attach a `(channel_or_pin, value)` handler to one of
    /// `ANALOG_MESSAGE`, `DIGITAL_MESSAGE`, `REPORT_ANALOG`,
    /// `REPORT_DIGITAL`, `SET_PIN_MODE` or `SET_DIGITAL_PIN_VALUE`.
    /// Other commands are ignored.
    pub fn attach_numeric<H: NumericHandler + 'a>(&mut self, command: u8, handler: H) {
        self.registry.set_numeric(command, Some(Box::new(handler)));
    }

    /// Attach a no-argument handler to `REPORT_FIRMWARE`,
    /// `REPORT_VERSION` or `SYSTEM_RESET`. Other commands are ignored.
    pub fn attach_simple<H: SimpleHandler + 'a>(&mut self, command: u8, handler: H) {
        self.registry.set_simple(command, Some(Box::new(handler)));
    }

    /// Attach the `STRING_DATA` handler.
    pub fn attach_text<H: TextHandler + 'a>(&mut self, handler: H) {
        self.registry.set_text(Some(Box::new(handler)));
    }

    /// Attach the handler for sysex tags without built-in decoding.
    pub fn attach_sysex<H: SysexHandler + 'a>(&mut self, handler: H) {
        self.registry.set_sysex(Some(Box::new(handler)));
    }

    /// Attach the overflow handler. `context` is handed back on every
    /// call.
    pub fn attach_overflow<F, C>(&mut self, handler: F, context: C)
    where
        F: FnMut(&mut C, &mut BufferGrant<'_, 'a>) + 'a,
        C: 'a,
    {
        self.registry
            .set_overflow(Some(Box::new(WithContext::new(handler, context))));
    }

    pub fn detach_numeric(&mut self, command: u8) {
        self.registry.set_numeric(command, None);
    }

    pub fn detach_simple(&mut self, command: u8) {
        self.registry.set_simple(command, None);
    }

    pub fn detach_text(&mut self) {
        self.registry.set_text(None);
    }

    pub fn detach_sysex(&mut self) {
        self.registry.set_sysex(None);
    }

    pub fn detach_overflow(&mut self) {
        self.registry.set_overflow(None);
    }

    /// Clear whichever handler `command` selects: `START_SYSEX` clears
    /// the raw sysex handler, `STRING_DATA` the text handler, system
    /// commands their no-argument handler, anything else its numeric
    /// handler.
    pub fn detach(&mut self, command: u8) {
        match command {
            REPORT_FIRMWARE | REPORT_VERSION | SYSTEM_RESET => self.detach_simple(command),
            STRING_DATA => self.detach_text(),
            START_SYSEX => self.detach_sysex(),
            _ => self.detach_numeric(command),
        }
    }

    /// Read-only access to the handler slots.
    pub fn registry(&self) -> &CallbackRegistry<'a> {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::ffi::CStr;
    use std::rc::Rc;

    use super::*;
    use crate::command::{EXTENDED_ANALOG, MAX_DATA_BYTE};

    type Calls = Rc<RefCell<Vec<(u8, u8, u16)>>>;

    fn numeric_recorder(parser: &mut Parser<'_>, calls: &Calls) {
        for command in [
            ANALOG_MESSAGE,
            DIGITAL_MESSAGE,
            REPORT_ANALOG,
            REPORT_DIGITAL,
            SET_PIN_MODE,
            SET_DIGITAL_PIN_VALUE,
        ] {
            let sink = Rc::clone(calls);
            parser.attach_numeric(command, move |target: u8, value: u16| {
                sink.borrow_mut().push((command, target, value));
            });
        }
    }

    fn encode_text(text: &[u8]) -> Vec<u8> {
        let mut wire = vec![START_SYSEX, STRING_DATA];
        for &b in text {
            wire.push(b & MAX_DATA_BYTE);
            wire.push(b >> 7);
        }
        wire.push(END_SYSEX);
        wire
    }

    #[test]
    fn analog_message_dispatches_14_bit_value() {
        let mut storage = [0u8; 16];
        let calls: Calls = Rc::default();
        let mut parser = Parser::with_buffer(&mut storage);
        numeric_recorder(&mut parser, &calls);

        parser.feed_all(&[0xE0, 0x7F, 0x01]);

        assert_eq!(*calls.borrow(), vec![(ANALOG_MESSAGE, 0, 255)]);
        assert!(!parser.is_parsing_message());
        assert_eq!(parser.state(), ParseState::Idle);
    }

    #[test]
    fn channel_comes_from_low_nibble() {
        let mut storage = [0u8; 16];
        let calls: Calls = Rc::default();
        let mut parser = Parser::with_buffer(&mut storage);
        numeric_recorder(&mut parser, &calls);

        parser.feed_all(&[0x93, 0x05, 0x00]);
        parser.feed_all(&[0xEF, 0x7F, 0x7F]);

        assert_eq!(
            *calls.borrow(),
            vec![(DIGITAL_MESSAGE, 3, 5), (ANALOG_MESSAGE, 15, 16383)]
        );
    }

    #[test]
    fn pin_commands_take_pin_then_value() {
        let mut storage = [0u8; 16];
        let calls: Calls = Rc::default();
        let mut parser = Parser::with_buffer(&mut storage);
        numeric_recorder(&mut parser, &calls);

        parser.feed_all(&[SET_PIN_MODE, 13, 1]);
        parser.feed_all(&[SET_DIGITAL_PIN_VALUE, 7, 0]);

        assert_eq!(
            *calls.borrow(),
            vec![(SET_PIN_MODE, 13, 1), (SET_DIGITAL_PIN_VALUE, 7, 0)]
        );
    }

    #[test]
    fn report_commands_take_one_byte() {
        let mut storage = [0u8; 16];
        let calls: Calls = Rc::default();
        let mut parser = Parser::with_buffer(&mut storage);
        numeric_recorder(&mut parser, &calls);

        parser.feed(0xC2);
        assert!(parser.is_parsing_message());
        parser.feed(1);
        assert!(!parser.is_parsing_message());
        parser.feed_all(&[0xD1, 0]);

        assert_eq!(
            *calls.borrow(),
            vec![(REPORT_ANALOG, 2, 1), (REPORT_DIGITAL, 1, 0)]
        );
    }

    #[test]
    fn back_to_back_fixed_messages_do_not_leak_state() {
        let mut storage = [0u8; 16];
        let calls: Calls = Rc::default();
        let mut parser = Parser::with_buffer(&mut storage);
        numeric_recorder(&mut parser, &calls);

        parser.feed_all(&[
            0xC0,
            1,
            0xE4,
            0x10,
            0x02,
            0x95,
            0x05,
            0x01,
            0xD3,
            1,
            SET_PIN_MODE,
            2,
            3,
            SET_DIGITAL_PIN_VALUE,
            13,
            1,
            0xE4,
            0x7F,
            0x7F,
        ]);

        assert_eq!(
            *calls.borrow(),
            vec![
                (REPORT_ANALOG, 0, 1),
                (ANALOG_MESSAGE, 4, 0x10 + (0x02 << 7)),
                (DIGITAL_MESSAGE, 5, 0x05 + (0x01 << 7)),
                (REPORT_DIGITAL, 3, 1),
                (SET_PIN_MODE, 2, 3),
                (SET_DIGITAL_PIN_VALUE, 13, 1),
                (ANALOG_MESSAGE, 4, 0x3FFF),
            ]
        );
        assert!(!parser.is_parsing_message());
    }

    // Resynchronisation policy: a command byte arriving while data bytes
    // are outstanding silently abandons the partial message. Nothing is
    // reported for the abandoned message.
    #[test]
    fn interrupting_command_abandons_partial_message() {
        let mut storage = [0u8; 16];
        let calls: Calls = Rc::default();
        let mut parser = Parser::with_buffer(&mut storage);
        numeric_recorder(&mut parser, &calls);

        parser.feed_all(&[0xE1, 0x22]);
        assert!(parser.is_parsing_message());
        parser.feed_all(&[0x92, 0x01, 0x00]);

        assert_eq!(*calls.borrow(), vec![(DIGITAL_MESSAGE, 2, 1)]);
    }

    #[test]
    fn sysex_start_abandons_partial_message() {
        let mut storage = [0u8; 16];
        let calls: Calls = Rc::default();
        let sysex = Rc::new(RefCell::new(Vec::new()));
        let mut parser = Parser::with_buffer(&mut storage);
        numeric_recorder(&mut parser, &calls);
        let sink = Rc::clone(&sysex);
        parser.attach_sysex(move |tag: u8, payload: &[u8]| {
            sink.borrow_mut().push((tag, payload.to_vec()));
        });

        parser.feed_all(&[0xE1, 0x22, START_SYSEX, 0x01, 0x02, END_SYSEX, 0x05]);

        assert!(calls.borrow().is_empty());
        assert_eq!(*sysex.borrow(), vec![(0x01, vec![0x02])]);
        assert!(!parser.is_parsing_message());
    }

    #[test]
    fn unknown_command_leaves_state_unchanged() {
        let mut storage = [0u8; 16];
        let calls: Calls = Rc::default();
        let mut parser = Parser::with_buffer(&mut storage);
        numeric_recorder(&mut parser, &calls);

        parser.feed(0xF1);
        assert_eq!(parser.state(), ParseState::Idle);

        parser.feed(0xE0);
        let pending = parser.state();
        parser.feed(0xF6);
        assert_eq!(parser.state(), pending);
        parser.feed_all(&[0x01, 0x00]);

        assert_eq!(*calls.borrow(), vec![(ANALOG_MESSAGE, 0, 1)]);
    }

    #[test]
    fn stray_data_bytes_are_ignored_when_idle() {
        let mut storage = [0u8; 16];
        let calls: Calls = Rc::default();
        let mut parser = Parser::with_buffer(&mut storage);
        numeric_recorder(&mut parser, &calls);

        parser.feed_all(&[0x00, 0x10, 0x7F, END_SYSEX]);

        assert!(calls.borrow().is_empty());
        assert!(!parser.is_parsing_message());
    }

    #[test]
    fn report_version_dispatches_immediately() {
        let mut storage = [0u8; 4];
        let hits = Rc::new(RefCell::new(0));
        let mut parser = Parser::with_buffer(&mut storage);
        let sink = Rc::clone(&hits);
        parser.attach_simple(REPORT_VERSION, move || *sink.borrow_mut() += 1);

        parser.feed(REPORT_VERSION);
        assert_eq!(*hits.borrow(), 1);
        assert!(!parser.is_parsing_message());
    }

    #[test]
    fn report_version_does_not_cancel_pending_data() {
        let mut storage = [0u8; 4];
        let calls: Calls = Rc::default();
        let mut parser = Parser::with_buffer(&mut storage);
        numeric_recorder(&mut parser, &calls);

        parser.feed_all(&[0xE2, 0x05, REPORT_VERSION, 0x00]);

        assert_eq!(*calls.borrow(), vec![(ANALOG_MESSAGE, 2, 5)]);
    }

    #[test]
    fn raw_sysex_payload_is_verbatim() {
        let mut storage = [0u8; 32];
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut parser = Parser::with_buffer(&mut storage);
        let sink = Rc::clone(&seen);
        parser.attach_sysex(move |tag: u8, payload: &[u8]| {
            sink.borrow_mut().push((tag, payload.to_vec()));
        });

        parser.feed_all(&[START_SYSEX, EXTENDED_ANALOG, 0x03, 0x7F, 0x00, 0x41, END_SYSEX]);

        assert_eq!(
            *seen.borrow(),
            vec![(EXTENDED_ANALOG, vec![0x03, 0x7F, 0x00, 0x41])]
        );
    }

    #[test]
    fn sysex_keeps_command_bytes_until_end() {
        let mut storage = [0u8; 32];
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut parser = Parser::with_buffer(&mut storage);
        let sink = Rc::clone(&seen);
        parser.attach_sysex(move |tag: u8, payload: &[u8]| {
            sink.borrow_mut().push((tag, payload.to_vec()));
        });

        parser.feed_all(&[START_SYSEX, 0x10]);
        parser.feed_all(&[0xE0, REPORT_VERSION]);
        assert!(parser.is_parsing_message());
        parser.feed(END_SYSEX);

        assert_eq!(*seen.borrow(), vec![(0x10, vec![0xE0, REPORT_VERSION])]);
    }

    #[test]
    fn firmware_report_uses_simple_handler() {
        let mut storage = [0u8; 32];
        let firmware = Rc::new(RefCell::new(0));
        let raw = Rc::new(RefCell::new(0));
        let mut parser = Parser::with_buffer(&mut storage);
        let sink = Rc::clone(&firmware);
        parser.attach_simple(REPORT_FIRMWARE, move || *sink.borrow_mut() += 1);
        let sink = Rc::clone(&raw);
        parser.attach_sysex(move |_: u8, _: &[u8]| *sink.borrow_mut() += 1);

        parser.feed_all(&[START_SYSEX, REPORT_FIRMWARE, 2, 5, b'F', 0, END_SYSEX]);

        assert_eq!(*firmware.borrow(), 1);
        assert_eq!(*raw.borrow(), 0);
    }

    #[test]
    fn text_round_trip_adds_terminator() {
        let mut storage = [0xFFu8; 64];
        let texts = Rc::new(RefCell::new(Vec::new()));
        {
            let mut parser = Parser::with_buffer(&mut storage);
            let sink = Rc::clone(&texts);
            parser.attach_text(move |text: &CStr| {
                sink.borrow_mut().push(text.to_bytes().to_vec());
            });
            parser.feed_all(&encode_text(b"Firmata 2.5"));
        }

        assert_eq!(*texts.borrow(), vec![b"Firmata 2.5".to_vec()]);
        assert_eq!(storage[11], 0);
    }

    #[test]
    fn text_with_embedded_terminator_stops_there() {
        let mut storage = [0u8; 64];
        let texts = Rc::new(RefCell::new(Vec::new()));
        let mut parser = Parser::with_buffer(&mut storage);
        let sink = Rc::clone(&texts);
        parser.attach_text(move |text: &CStr| {
            sink.borrow_mut().push(text.to_bytes().to_vec());
        });

        parser.feed_all(&encode_text(b"ok\0"));
        parser.feed_all(&encode_text(b""));

        assert_eq!(*texts.borrow(), vec![b"ok".to_vec(), Vec::new()]);
    }

    #[test]
    fn overflow_without_resize_drops_fixed_message() {
        let mut storage = [0u8; 1];
        let calls: Calls = Rc::default();
        let overflows = Rc::new(RefCell::new(0));
        let mut parser = Parser::with_buffer(&mut storage);
        numeric_recorder(&mut parser, &calls);
        let sink = Rc::clone(&overflows);
        parser.attach_overflow(move |_, _| *sink.borrow_mut() += 1, ());

        parser.feed_all(&[0xE0, 0x7F, 0x01]);

        assert_eq!(*overflows.borrow(), 1);
        assert!(calls.borrow().is_empty());
        assert!(!parser.is_parsing_message());
    }

    #[test]
    fn overflow_with_resize_completes_message() {
        let mut small = [0u8; 1];
        let mut large = [0u8; 8];
        let calls: Calls = Rc::default();
        let overflows = Rc::new(RefCell::new(0));
        let mut parser = Parser::with_buffer(&mut small);
        numeric_recorder(&mut parser, &calls);
        let counter = Rc::clone(&overflows);
        parser.attach_overflow(
            move |spare, grant| {
                *counter.borrow_mut() += 1;
                if let Some(next) = Option::take(spare) {
                    grant.grow_into(next).unwrap();
                }
            },
            Some(&mut large[..]),
        );

        parser.feed_all(&[0xE0, 0x7F, 0x01]);

        assert_eq!(*overflows.borrow(), 1);
        assert_eq!(*calls.borrow(), vec![(ANALOG_MESSAGE, 0, 255)]);
        assert_eq!(parser.capacity(), 8);
        assert_eq!(&parser.buffer()[..2], &[0x7F, 0x01]);
    }

    #[test]
    fn sysex_overflow_truncates_and_keeps_parsing() {
        let mut storage = [0u8; 3];
        let seen = Rc::new(RefCell::new(Vec::new()));
        let calls: Calls = Rc::default();
        let mut parser = Parser::with_buffer(&mut storage);
        numeric_recorder(&mut parser, &calls);
        let sink = Rc::clone(&seen);
        parser.attach_sysex(move |tag: u8, payload: &[u8]| {
            sink.borrow_mut().push((tag, payload.to_vec()));
        });

        parser.feed_all(&[START_SYSEX, 0x20, 1, 2, 3, 4, 5, END_SYSEX]);
        parser.feed_all(&[0xE0, 0x01, 0x00]);

        assert_eq!(*seen.borrow(), vec![(0x20, vec![1, 2])]);
        assert_eq!(*calls.borrow(), vec![(ANALOG_MESSAGE, 0, 1)]);
    }

    #[test]
    fn no_buffer_means_nothing_dispatches_with_payload() {
        let calls: Calls = Rc::default();
        let mut parser = Parser::new();
        numeric_recorder(&mut parser, &calls);

        parser.feed_all(&[0xE0, 0x01, 0x00]);

        assert!(calls.borrow().is_empty());
        assert_eq!(parser.capacity(), 0);
    }

    #[test]
    fn assign_buffer_once() {
        let mut first = [0u8; 4];
        let mut second = [0u8; 4];
        let mut parser = Parser::new();

        parser.assign_buffer(&mut first).unwrap();
        assert!(parser.assign_buffer(&mut second).is_err());
        assert_eq!(parser.capacity(), 4);
    }

    #[test]
    fn reset_clears_state_and_buffer() {
        let mut storage = [0u8; 8];
        let resets = Rc::new(RefCell::new(0));
        let mut parser = Parser::with_buffer(&mut storage);
        let sink = Rc::clone(&resets);
        parser.attach_simple(SYSTEM_RESET, move || *sink.borrow_mut() += 1);

        parser.feed_all(&[START_SYSEX, 0x01, 0x02, 0x03]);
        assert!(parser.is_parsing_message());

        parser.reset();
        assert!(!parser.is_parsing_message());
        assert!(parser.buffer().iter().all(|&b| b == 0));
        assert_eq!(*resets.borrow(), 1);
    }

    #[test]
    fn reset_is_idempotent() {
        let mut storage = [0u8; 8];
        let mut parser = Parser::with_buffer(&mut storage);

        parser.feed_all(&[0xE0, 0x05]);
        parser.reset();
        let once = (parser.state(), parser.buffer().to_vec());
        parser.reset();
        let twice = (parser.state(), parser.buffer().to_vec());

        assert_eq!(once, twice);
    }

    #[test]
    fn system_reset_byte_resets_mid_message() {
        let mut storage = [0u8; 8];
        let calls: Calls = Rc::default();
        let mut parser = Parser::with_buffer(&mut storage);
        numeric_recorder(&mut parser, &calls);

        parser.feed_all(&[0xE0, 0x05, SYSTEM_RESET, 0x01]);

        assert!(!parser.is_parsing_message());
        assert!(calls.borrow().is_empty());
        assert!(parser.buffer().iter().all(|&b| b == 0));
    }

    #[test]
    fn reset_handler_sees_reset_parser() {
        let mut storage = [0xAAu8; 4];
        let observed = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&observed);
        let mut parser = Parser::with_buffer(&mut storage);
        parser.attach_simple(SYSTEM_RESET, move || *sink.borrow_mut() = Some(()));

        parser.feed(SYSTEM_RESET);
        assert!(observed.borrow().is_some());
        assert_eq!(parser.buffer(), &[0, 0, 0, 0]);
    }

    #[test]
    fn detach_routes_by_command() {
        let mut storage = [0u8; 8];
        let mut parser = Parser::with_buffer(&mut storage);
        parser.attach_numeric(ANALOG_MESSAGE, |_: u8, _: u16| {});
        parser.attach_simple(REPORT_VERSION, || {});
        parser.attach_text(|_: &CStr| {});
        parser.attach_sysex(|_: u8, _: &[u8]| {});
        parser.attach_overflow(|_: &mut (), _| {}, ());

        parser.detach(ANALOG_MESSAGE);
        parser.detach(REPORT_VERSION);
        parser.detach(STRING_DATA);
        parser.detach(START_SYSEX);
        parser.detach_overflow();

        let registry = parser.registry();
        assert!(!registry.has_numeric(ANALOG_MESSAGE));
        assert!(!registry.has_simple(REPORT_VERSION));
        assert!(!registry.has_text());
        assert!(!registry.has_sysex());
        assert!(!registry.has_overflow());
    }

    #[test]
    fn attach_to_foreign_command_is_ignored() {
        let mut parser = Parser::new();
        parser.attach_numeric(REPORT_VERSION, |_: u8, _: u16| {});
        parser.attach_simple(ANALOG_MESSAGE, || {});

        assert!(!parser.registry().has_numeric(REPORT_VERSION));
        assert!(!parser.registry().has_simple(ANALOG_MESSAGE));
    }
}
