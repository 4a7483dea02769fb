use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use firmata_parser::command::{
    self, fixed_data_len, is_numeric_command, is_simple_command, uses_channel,
};
use serde::Serialize;

use crate::cmd::CommandsArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::OutputFormat;

const COMMANDS: [u8; 9] = [
    command::DIGITAL_MESSAGE,
    command::REPORT_ANALOG,
    command::REPORT_DIGITAL,
    command::ANALOG_MESSAGE,
    command::START_SYSEX,
    command::SET_PIN_MODE,
    command::SET_DIGITAL_PIN_VALUE,
    command::REPORT_VERSION,
    command::SYSTEM_RESET,
];

const SYSEX_TAGS: [u8; 16] = [
    command::SERIAL_MESSAGE,
    command::ANALOG_MAPPING_QUERY,
    command::ANALOG_MAPPING_RESPONSE,
    command::CAPABILITY_QUERY,
    command::CAPABILITY_RESPONSE,
    command::PIN_STATE_QUERY,
    command::PIN_STATE_RESPONSE,
    command::EXTENDED_ANALOG,
    command::SERVO_CONFIG,
    command::STRING_DATA,
    command::I2C_REQUEST,
    command::I2C_REPLY,
    command::I2C_CONFIG,
    command::REPORT_FIRMWARE,
    command::SAMPLING_INTERVAL,
    command::SCHEDULER_DATA,
];

#[derive(Serialize)]
struct CommandRow {
    name: &'static str,
    byte: String,
    kind: &'static str,
    data_bytes: Option<usize>,
    channel: bool,
    handler: &'static str,
}

fn command_rows() -> Vec<CommandRow> {
    COMMANDS
        .iter()
        .map(|&byte| CommandRow {
            name: command::command_name(byte),
            byte: format!("0x{byte:02X}"),
            kind: "command",
            data_bytes: fixed_data_len(byte),
            channel: uses_channel(byte),
            handler: handler_shape(byte),
        })
        .collect()
}

fn sysex_rows() -> Vec<CommandRow> {
    SYSEX_TAGS
        .iter()
        .map(|&tag| CommandRow {
            name: command::sysex_name(tag),
            byte: format!("0x{tag:02X}"),
            kind: "sysex",
            data_bytes: None,
            channel: false,
            handler: match tag {
                command::REPORT_FIRMWARE => "simple",
                command::STRING_DATA => "text",
                _ => "sysex",
            },
        })
        .collect()
}

fn handler_shape(byte: u8) -> &'static str {
    if is_numeric_command(byte) {
        "numeric"
    } else if is_simple_command(byte) {
        "simple"
    } else if byte == command::START_SYSEX {
        "sysex/text"
    } else {
        "-"
    }
}

pub fn run(args: CommandsArgs, format: OutputFormat) -> CliResult<i32> {
    let mut rows = command_rows();
    if args.sysex {
        rows.extend(sysex_rows());
    }

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&rows).unwrap_or_else(|_| "[]".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["NAME", "BYTE", "KIND", "DATA", "CHANNEL", "HANDLER"]);
            for row in &rows {
                table.add_row(vec![
                    row.name.to_string(),
                    row.byte.clone(),
                    row.kind.to_string(),
                    row.data_bytes.map(|n| n.to_string()).unwrap_or_default(),
                    if row.channel { "yes" } else { "no" }.to_string(),
                    row.handler.to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for row in &rows {
                println!(
                    "{} {} kind={} data={} channel={} handler={}",
                    row.byte,
                    row.name,
                    row.kind,
                    row.data_bytes
                        .map(|n| n.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    row.channel,
                    row.handler
                );
            }
        }
    }

    Ok(SUCCESS)
}
