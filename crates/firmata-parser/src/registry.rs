//! Handler slots for decoded messages.
//!
//! Each command has at most one handler; attaching replaces, detaching
//! clears. Every handler trait is implemented for the matching `FnMut`
//! closure so callers rarely need to name these traits.

use std::ffi::CStr;

use tracing::trace;

use crate::buffer::BufferGrant;
use crate::command::{
    ANALOG_MESSAGE, DIGITAL_MESSAGE, REPORT_ANALOG, REPORT_DIGITAL, REPORT_FIRMWARE,
    REPORT_VERSION, SET_DIGITAL_PIN_VALUE, SET_PIN_MODE, SYSTEM_RESET,
};

/// Receives `(channel_or_pin, value)` for the fixed-length commands.
pub trait NumericHandler {
    fn on_numeric(&mut self, channel_or_pin: u8, value: u16);
}

impl<F: FnMut(u8, u16)> NumericHandler for F {
    fn on_numeric(&mut self, channel_or_pin: u8, value: u16) {
        self(channel_or_pin, value)
    }
}

/// Receives firmware reports, protocol version reports and resets.
pub trait SimpleHandler {
    fn on_simple(&mut self);
}

impl<F: FnMut()> SimpleHandler for F {
    fn on_simple(&mut self) {
        self()
    }
}

/// Receives decoded `STRING_DATA` text.
pub trait TextHandler {
    fn on_text(&mut self, text: &CStr);
}

impl<F: FnMut(&CStr)> TextHandler for F {
    fn on_text(&mut self, text: &CStr) {
        self(text)
    }
}

/// Receives any sysex message without built-in decoding.
pub trait SysexHandler {
    fn on_sysex(&mut self, tag: u8, payload: &[u8]);
}

impl<F: FnMut(u8, &[u8])> SysexHandler for F {
    fn on_sysex(&mut self, tag: u8, payload: &[u8]) {
        self(tag, payload)
    }
}

/// Notified when a write does not fit in the data buffer.
///
/// The grant allows binding a larger buffer before capacity is
/// re-checked.
pub trait OverflowHandler<'a> {
    fn on_overflow(&mut self, grant: &mut BufferGrant<'_, 'a>);
}

impl<'a, F> OverflowHandler<'a> for F
where
    F: FnMut(&mut BufferGrant<'_, 'a>),
{
    fn on_overflow(&mut self, grant: &mut BufferGrant<'_, 'a>) {
        self(grant)
    }
}

/// Overflow handler paired with a caller context that is handed back on
/// every call.
pub(crate) struct WithContext<F, C> {
    handler: F,
    context: C,
}

impl<F, C> WithContext<F, C> {
    pub(crate) fn new(handler: F, context: C) -> Self {
        Self { handler, context }
    }
}

impl<'a, F, C> OverflowHandler<'a> for WithContext<F, C>
where
    F: FnMut(&mut C, &mut BufferGrant<'_, 'a>),
{
    fn on_overflow(&mut self, grant: &mut BufferGrant<'_, 'a>) {
        (self.handler)(&mut self.context, grant)
    }
}

type Slot<T> = Option<Box<T>>;

/// One slot per command identifier, across all handler shapes.
#[derive(Default)]
pub struct CallbackRegistry<'a> {
    analog: Slot<dyn NumericHandler + 'a>,
    digital: Slot<dyn NumericHandler + 'a>,
    report_analog: Slot<dyn NumericHandler + 'a>,
    report_digital: Slot<dyn NumericHandler + 'a>,
    pin_mode: Slot<dyn NumericHandler + 'a>,
    pin_value: Slot<dyn NumericHandler + 'a>,
    report_firmware: Slot<dyn SimpleHandler + 'a>,
    report_version: Slot<dyn SimpleHandler + 'a>,
    system_reset: Slot<dyn SimpleHandler + 'a>,
    text: Slot<dyn TextHandler + 'a>,
    sysex: Slot<dyn SysexHandler + 'a>,
    overflow: Slot<dyn OverflowHandler<'a> + 'a>,
}

impl<'a> CallbackRegistry<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    fn numeric_slot(&mut self, command: u8) -> Option<&mut Slot<dyn NumericHandler + 'a>> {
        match command {
            ANALOG_MESSAGE => Some(&mut self.analog),
            DIGITAL_MESSAGE => Some(&mut self.digital),
            REPORT_ANALOG => Some(&mut self.report_analog),
            REPORT_DIGITAL => Some(&mut self.report_digital),
            SET_PIN_MODE => Some(&mut self.pin_mode),
            SET_DIGITAL_PIN_VALUE => Some(&mut self.pin_value),
            _ => None,
        }
    }

    fn simple_slot(&mut self, command: u8) -> Option<&mut Slot<dyn SimpleHandler + 'a>> {
        match command {
            REPORT_FIRMWARE => Some(&mut self.report_firmware),
            REPORT_VERSION => Some(&mut self.report_version),
            SYSTEM_RESET => Some(&mut self.system_reset),
            _ => None,
        }
    }

    /// Store or clear the numeric handler for `command`. Returns false
    /// (and does nothing) if `command` has no numeric slot.
    pub fn set_numeric(&mut self, command: u8, handler: Slot<dyn NumericHandler + 'a>) -> bool {
        match self.numeric_slot(command) {
            Some(slot) => {
                *slot = handler;
                true
            }
            None => {
                trace!(command, "no numeric handler slot for command");
                false
            }
        }
    }

    /// Store or clear the no-argument handler for `command`. Returns
    /// false (and does nothing) if `command` has no such slot.
    pub fn set_simple(&mut self, command: u8, handler: Slot<dyn SimpleHandler + 'a>) -> bool {
        match self.simple_slot(command) {
            Some(slot) => {
                *slot = handler;
                true
            }
            None => {
                trace!(command, "no simple handler slot for command");
                false
            }
        }
    }

    pub fn set_text(&mut self, handler: Slot<dyn TextHandler + 'a>) {
        self.text = handler;
    }

    pub fn set_sysex(&mut self, handler: Slot<dyn SysexHandler + 'a>) {
        self.sysex = handler;
    }

    pub fn set_overflow(&mut self, handler: Slot<dyn OverflowHandler<'a> + 'a>) {
        self.overflow = handler;
    }

    pub fn has_numeric(&self, command: u8) -> bool {
        match command {
            ANALOG_MESSAGE => self.analog.is_some(),
            DIGITAL_MESSAGE => self.digital.is_some(),
            REPORT_ANALOG => self.report_analog.is_some(),
            REPORT_DIGITAL => self.report_digital.is_some(),
            SET_PIN_MODE => self.pin_mode.is_some(),
            SET_DIGITAL_PIN_VALUE => self.pin_value.is_some(),
            _ => false,
        }
    }

    pub fn has_simple(&self, command: u8) -> bool {
        match command {
            REPORT_FIRMWARE => self.report_firmware.is_some(),
            REPORT_VERSION => self.report_version.is_some(),
            SYSTEM_RESET => self.system_reset.is_some(),
            _ => false,
        }
    }

    pub fn has_text(&self) -> bool {
        self.text.is_some()
    }

    pub fn has_sysex(&self) -> bool {
        self.sysex.is_some()
    }

    pub fn has_overflow(&self) -> bool {
        self.overflow.is_some()
    }

    /// Invoke the numeric handler for `command`. Returns true if one ran.
    pub fn dispatch_numeric(&mut self, command: u8, channel_or_pin: u8, value: u16) -> bool {
        match self.numeric_slot(command).and_then(|slot| slot.as_deref_mut()) {
            Some(handler) => {
                handler.on_numeric(channel_or_pin, value);
                true
            }
            None => false,
        }
    }

    /// Invoke the no-argument handler for `command`. Returns true if one ran.
    pub fn dispatch_simple(&mut self, command: u8) -> bool {
        match self.simple_slot(command).and_then(|slot| slot.as_deref_mut()) {
            Some(handler) => {
                handler.on_simple();
                true
            }
            None => false,
        }
    }

    pub fn dispatch_text(&mut self, text: &CStr) -> bool {
        match self.text.as_deref_mut() {
            Some(handler) => {
                handler.on_text(text);
                true
            }
            None => false,
        }
    }

    pub fn dispatch_sysex(&mut self, tag: u8, payload: &[u8]) -> bool {
        match self.sysex.as_deref_mut() {
            Some(handler) => {
                handler.on_sysex(tag, payload);
                true
            }
            None => false,
        }
    }

    /// Borrow the overflow handler for a buffer write.
    pub fn overflow_handler(&mut self) -> Option<&mut (dyn OverflowHandler<'a> + 'a)> {
        self.overflow.as_deref_mut()
    }
}

impl std::fmt::Debug for CallbackRegistry<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("analog", &self.analog.is_some())
            .field("digital", &self.digital.is_some())
            .field("report_analog", &self.report_analog.is_some())
            .field("report_digital", &self.report_digital.is_some())
            .field("pin_mode", &self.pin_mode.is_some())
            .field("pin_value", &self.pin_value.is_some())
            .field("report_firmware", &self.report_firmware.is_some())
            .field("report_version", &self.report_version.is_some())
            .field("system_reset", &self.system_reset.is_some())
            .field("text", &self.text.is_some())
            .field("sysex", &self.sysex.is_some())
            .field("overflow", &self.overflow.is_some())
            .finish()
    }
}
