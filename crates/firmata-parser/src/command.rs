//! Firmata wire constants.
//!
//! Command bytes below 0xF0 carry a channel in their low nibble.
//! Command bytes in 0xF0-0xFF are taken verbatim.
//! Sysex tags are the first byte inside a `START_SYSEX`/`END_SYSEX` pair.

/// Digital port report (channel = port, 14-bit pin mask).
pub const DIGITAL_MESSAGE: u8 = 0x90;

/// Enable/disable analog reporting for a channel.
pub const REPORT_ANALOG: u8 = 0xC0;

/// Enable/disable digital reporting for a port.
pub const REPORT_DIGITAL: u8 = 0xD0;

/// Analog value report (channel = analog pin, 14-bit value).
pub const ANALOG_MESSAGE: u8 = 0xE0;

/// Start of an extended (sysex) message.
pub const START_SYSEX: u8 = 0xF0;

/// Set a pin's mode (pin, mode).
pub const SET_PIN_MODE: u8 = 0xF4;

/// Set a single digital pin's value (pin, value).
pub const SET_DIGITAL_PIN_VALUE: u8 = 0xF5;

/// End of an extended (sysex) message.
pub const END_SYSEX: u8 = 0xF7;

/// Protocol version report.
pub const REPORT_VERSION: u8 = 0xF9;

/// Reset the peer to its power-up state.
pub const SYSTEM_RESET: u8 = 0xFF;

/// Sysex: serial port passthrough.
pub const SERIAL_MESSAGE: u8 = 0x60;

/// Sysex: analog mapping query.
pub const ANALOG_MAPPING_QUERY: u8 = 0x69;

/// Sysex: analog mapping response.
pub const ANALOG_MAPPING_RESPONSE: u8 = 0x6A;

/// Sysex: capability query.
pub const CAPABILITY_QUERY: u8 = 0x6B;

/// Sysex: capability response.
pub const CAPABILITY_RESPONSE: u8 = 0x6C;

/// Sysex: pin state query.
pub const PIN_STATE_QUERY: u8 = 0x6D;

/// Sysex: pin state response.
pub const PIN_STATE_RESPONSE: u8 = 0x6E;

/// Sysex: analog write beyond pin 15 or beyond 14 bits.
pub const EXTENDED_ANALOG: u8 = 0x6F;

/// Sysex: servo configuration.
pub const SERVO_CONFIG: u8 = 0x70;

/// Sysex: text encoded as 7-bit (low, high) byte pairs.
pub const STRING_DATA: u8 = 0x71;

/// Sysex: I2C request.
pub const I2C_REQUEST: u8 = 0x76;

/// Sysex: I2C reply.
pub const I2C_REPLY: u8 = 0x77;

/// Sysex: I2C configuration.
pub const I2C_CONFIG: u8 = 0x78;

/// Sysex: firmware name and version report.
pub const REPORT_FIRMWARE: u8 = 0x79;

/// Sysex: set the sampling interval.
pub const SAMPLING_INTERVAL: u8 = 0x7A;

/// Sysex: scheduler task data.
pub const SCHEDULER_DATA: u8 = 0x7B;

/// Highest value a data byte may carry; the 8th bit marks command bytes.
pub const MAX_DATA_BYTE: u8 = 0x7F;

/// A command byte split into its command and channel parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandByte {
    /// The command, with the channel nibble masked off below 0xF0.
    pub command: u8,
    /// The channel nibble. Always 0 for commands in 0xF0-0xFF.
    pub channel: u8,
}

impl CommandByte {
    /// Split a raw byte into command and channel.
    pub fn split(byte: u8) -> Self {
        if byte < 0xF0 {
            Self {
                command: byte & 0xF0,
                channel: byte & 0x0F,
            }
        } else {
            Self {
                command: byte,
                channel: 0,
            }
        }
    }
}

/// Returns true if the byte is a 7-bit data byte.
pub fn is_data_byte(byte: u8) -> bool {
    byte <= MAX_DATA_BYTE
}

/// Number of data bytes a fixed-length command expects, or `None` for
/// commands that are not fixed-length.
pub fn fixed_data_len(command: u8) -> Option<usize> {
    match command {
        ANALOG_MESSAGE | DIGITAL_MESSAGE | SET_PIN_MODE | SET_DIGITAL_PIN_VALUE => Some(2),
        REPORT_ANALOG | REPORT_DIGITAL => Some(1),
        _ => None,
    }
}

/// Returns true if the command carries a channel in its low nibble.
pub fn uses_channel(command: u8) -> bool {
    matches!(
        command,
        ANALOG_MESSAGE | DIGITAL_MESSAGE | REPORT_ANALOG | REPORT_DIGITAL
    )
}

/// Commands delivered to numeric `(channel_or_pin, value)` handlers.
pub fn is_numeric_command(command: u8) -> bool {
    fixed_data_len(command).is_some()
}

/// Commands delivered to no-argument handlers.
pub fn is_simple_command(command: u8) -> bool {
    matches!(command, REPORT_FIRMWARE | REPORT_VERSION | SYSTEM_RESET)
}

/// Returns a human-readable name for a command byte (channel nibble ignored).
pub fn command_name(byte: u8) -> &'static str {
    match CommandByte::split(byte).command {
        DIGITAL_MESSAGE => "DIGITAL_MESSAGE",
        REPORT_ANALOG => "REPORT_ANALOG",
        REPORT_DIGITAL => "REPORT_DIGITAL",
        ANALOG_MESSAGE => "ANALOG_MESSAGE",
        START_SYSEX => "START_SYSEX",
        SET_PIN_MODE => "SET_PIN_MODE",
        SET_DIGITAL_PIN_VALUE => "SET_DIGITAL_PIN_VALUE",
        END_SYSEX => "END_SYSEX",
        REPORT_VERSION => "REPORT_VERSION",
        SYSTEM_RESET => "SYSTEM_RESET",
        _ => "UNKNOWN",
    }
}

/// Returns a human-readable name for a sysex tag.
pub fn sysex_name(tag: u8) -> &'static str {
    match tag {
        SERIAL_MESSAGE => "SERIAL_MESSAGE",
        ANALOG_MAPPING_QUERY => "ANALOG_MAPPING_QUERY",
        ANALOG_MAPPING_RESPONSE => "ANALOG_MAPPING_RESPONSE",
        CAPABILITY_QUERY => "CAPABILITY_QUERY",
        CAPABILITY_RESPONSE => "CAPABILITY_RESPONSE",
        PIN_STATE_QUERY => "PIN_STATE_QUERY",
        PIN_STATE_RESPONSE => "PIN_STATE_RESPONSE",
        EXTENDED_ANALOG => "EXTENDED_ANALOG",
        SERVO_CONFIG => "SERVO_CONFIG",
        STRING_DATA => "STRING_DATA",
        I2C_REQUEST => "I2C_REQUEST",
        I2C_REPLY => "I2C_REPLY",
        I2C_CONFIG => "I2C_CONFIG",
        REPORT_FIRMWARE => "REPORT_FIRMWARE",
        SAMPLING_INTERVAL => "SAMPLING_INTERVAL",
        SCHEDULER_DATA => "SCHEDULER_DATA",
        _ => "USER",
    }
}
