use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use firmata_parser::command::sysex_name;
use firmata_parser::Event;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize, Debug, Default, PartialEq)]
pub struct EventOutput {
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pin: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_name: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Vec<u8>>,
}

impl From<&Event> for EventOutput {
    fn from(event: &Event) -> Self {
        let base = EventOutput {
            kind: event.kind(),
            ..EventOutput::default()
        };
        match event {
            Event::Analog { channel, value } | Event::ReportAnalog { channel, value } => {
                EventOutput {
                    channel: Some(*channel),
                    value: Some(*value),
                    ..base
                }
            }
            Event::Digital { port, value } | Event::ReportDigital { port, value } => EventOutput {
                channel: Some(*port),
                value: Some(*value),
                ..base
            },
            Event::PinMode { pin, mode: value } | Event::PinValue { pin, value } => EventOutput {
                pin: Some(*pin),
                value: Some(*value),
                ..base
            },
            Event::Text(text) => EventOutput {
                text: Some(text.clone()),
                ..base
            },
            Event::Sysex { tag, payload } => EventOutput {
                tag: Some(*tag),
                tag_name: Some(sysex_name(*tag)),
                payload: Some(payload.clone()),
                ..base
            },
            Event::FirmwareReport | Event::ProtocolVersion | Event::SystemReset => base,
        }
    }
}

/// Prints decoded events. JSON and pretty output stream one line per
/// event; table output is collected and printed by [`EventPrinter::finish`].
pub struct EventPrinter {
    format: OutputFormat,
    rows: Vec<EventOutput>,
}

impl EventPrinter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            rows: Vec::new(),
        }
    }

    pub fn print(&mut self, event: &Event) {
        let out = EventOutput::from(event);
        match self.format {
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
                );
            }
            OutputFormat::Pretty => println!("{}", pretty_line(&out)),
            OutputFormat::Table => self.rows.push(out),
        }
    }

    pub fn finish(self) {
        if self.rows.is_empty() {
            return;
        }
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["KIND", "TARGET", "VALUE", "DETAIL"]);
        for row in &self.rows {
            table.add_row(vec![
                row.kind.to_string(),
                target_label(row),
                row.value.map(|v| v.to_string()).unwrap_or_default(),
                detail_label(row),
            ]);
        }
        println!("{table}");
    }
}

fn target_label(out: &EventOutput) -> String {
    match (out.channel, out.pin, out.tag) {
        (Some(channel), _, _) => format!("channel {channel}"),
        (_, Some(pin), _) => format!("pin {pin}"),
        (_, _, Some(tag)) => format!("0x{tag:02X}"),
        _ => String::new(),
    }
}

fn detail_label(out: &EventOutput) -> String {
    if let Some(text) = &out.text {
        return format!("{text:?}");
    }
    match (&out.tag_name, &out.payload) {
        (Some(name), Some(payload)) => format!("{name} {}", hex_preview(payload)),
        _ => String::new(),
    }
}

pub fn pretty_line(out: &EventOutput) -> String {
    let mut line = out.kind.to_string();
    if let Some(channel) = out.channel {
        line.push_str(&format!(" channel={channel}"));
    }
    if let Some(pin) = out.pin {
        line.push_str(&format!(" pin={pin}"));
    }
    if let Some(value) = out.value {
        line.push_str(&format!(" value={value}"));
    }
    if let Some(tag) = out.tag {
        line.push_str(&format!(" tag=0x{tag:02X}"));
    }
    if let Some(name) = out.tag_name {
        line.push_str(&format!(" ({name})"));
    }
    if let Some(text) = &out.text {
        line.push_str(&format!(" text={text:?}"));
    }
    if let Some(payload) = &out.payload {
        line.push_str(&format!(" payload=[{}]", hex_preview(payload)));
    }
    line
}

fn hex_preview(payload: &[u8]) -> String {
    payload
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}
