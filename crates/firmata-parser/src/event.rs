use std::cell::RefCell;
use std::collections::VecDeque;
use std::ffi::CStr;
use std::rc::Rc;

use crate::command::{
    ANALOG_MESSAGE, DIGITAL_MESSAGE, REPORT_ANALOG, REPORT_DIGITAL, REPORT_FIRMWARE,
    REPORT_VERSION, SET_DIGITAL_PIN_VALUE, SET_PIN_MODE, SYSTEM_RESET,
};
use crate::parser::Parser;

/// An owned copy of one decoded message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Analog { channel: u8, value: u16 },
    Digital { port: u8, value: u16 },
    ReportAnalog { channel: u8, value: u16 },
    ReportDigital { port: u8, value: u16 },
    PinMode { pin: u8, mode: u16 },
    PinValue { pin: u8, value: u16 },
    FirmwareReport,
    ProtocolVersion,
    SystemReset,
    Text(String),
    Sysex { tag: u8, payload: Vec<u8> },
}

impl Event {
    /// Build the event for a numeric handler call.
    pub fn from_numeric(command: u8, target: u8, value: u16) -> Option<Self> {
        let event = match command {
            ANALOG_MESSAGE => Self::Analog {
                channel: target,
                value,
            },
            DIGITAL_MESSAGE => Self::Digital {
                port: target,
                value,
            },
            REPORT_ANALOG => Self::ReportAnalog {
                channel: target,
                value,
            },
            REPORT_DIGITAL => Self::ReportDigital {
                port: target,
                value,
            },
            SET_PIN_MODE => Self::PinMode {
                pin: target,
                mode: value,
            },
            SET_DIGITAL_PIN_VALUE => Self::PinValue { pin: target, value },
            _ => return None,
        };
        Some(event)
    }

    /// Build the event for a no-argument handler call.
    pub fn from_simple(command: u8) -> Option<Self> {
        match command {
            REPORT_FIRMWARE => Some(Self::FirmwareReport),
            REPORT_VERSION => Some(Self::ProtocolVersion),
            SYSTEM_RESET => Some(Self::SystemReset),
            _ => None,
        }
    }

    /// Short stable name for display.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Analog { .. } => "analog",
            Self::Digital { .. } => "digital",
            Self::ReportAnalog { .. } => "report_analog",
            Self::ReportDigital { .. } => "report_digital",
            Self::PinMode { .. } => "pin_mode",
            Self::PinValue { .. } => "pin_value",
            Self::FirmwareReport => "firmware_report",
            Self::ProtocolVersion => "protocol_version",
            Self::SystemReset => "system_reset",
            Self::Text(_) => "text",
            Self::Sysex { .. } => "sysex",
        }
    }
}

/// Records every decoded message as an [`Event`].
///
/// Clones share one queue, so a recorder can be attached to a parser and
/// drained by the caller between feeds.
#[derive(Debug, Clone, Default)]
pub struct EventRecorder {
    events: Rc<RefCell<VecDeque<Event>>>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach handlers for every message kind to `parser`, replacing
    /// any handlers already attached. The overflow handler is untouched.
    pub fn attach(&self, parser: &mut Parser<'_>) {
        for command in [
            ANALOG_MESSAGE,
            DIGITAL_MESSAGE,
            REPORT_ANALOG,
            REPORT_DIGITAL,
            SET_PIN_MODE,
            SET_DIGITAL_PIN_VALUE,
        ] {
            let events = Rc::clone(&self.events);
            parser.attach_numeric(command, move |target: u8, value: u16| {
                if let Some(event) = Event::from_numeric(command, target, value) {
                    events.borrow_mut().push_back(event);
                }
            });
        }

        for command in [REPORT_FIRMWARE, REPORT_VERSION, SYSTEM_RESET] {
            let events = Rc::clone(&self.events);
            parser.attach_simple(command, move || {
                if let Some(event) = Event::from_simple(command) {
                    events.borrow_mut().push_back(event);
                }
            });
        }

        let events = Rc::clone(&self.events);
        parser.attach_text(move |text: &CStr| {
            let text = text.to_string_lossy().into_owned();
            events.borrow_mut().push_back(Event::Text(text));
        });

        let events = Rc::clone(&self.events);
        parser.attach_sysex(move |tag: u8, payload: &[u8]| {
            events.borrow_mut().push_back(Event::Sysex {
                tag,
                payload: payload.to_vec(),
            });
        });
    }

    /// Remove and return the oldest recorded event.
    pub fn pop(&self) -> Option<Event> {
        self.events.borrow_mut().pop_front()
    }

    /// Remove and return all recorded events, oldest first.
    pub fn drain(&self) -> Vec<Event> {
        self.events.borrow_mut().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }
}
