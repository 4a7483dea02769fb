use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;

use firmata_parser::{ByteFeeder, EventRecorder, FeedConfig, Parser, ParserError};
use tracing::{debug, info, warn};

use crate::cmd::DecodeArgs;
use crate::exit::{
    io_error, parser_error, CliError, CliResult, DATA_INVALID, INCOMPLETE, SUCCESS, USAGE,
};
use crate::output::{EventPrinter, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    if args.buffer_size == 0 {
        return Err(CliError::new(USAGE, "--buffer-size must be at least 1"));
    }
    if let Some(grow_to) = args.grow_to {
        if grow_to <= args.buffer_size {
            return Err(CliError::new(
                USAGE,
                format!("--grow-to ({grow_to}) must exceed --buffer-size ({})", args.buffer_size),
            ));
        }
    }

    if args.count == Some(0) {
        return Ok(SUCCESS);
    }

    let mut input = open_input(&args.input)?;
    if args.hex {
        let mut text = String::new();
        input
            .read_to_string(&mut text)
            .map_err(|err| io_error("read failed", err))?;
        input = Box::new(Cursor::new(parse_hex(&text)?));
    }

    let mut storage = vec![0u8; args.buffer_size];
    let mut spare = args.grow_to.map(|len| vec![0u8; len]);

    let recorder = EventRecorder::new();
    let mut parser = Parser::with_buffer(&mut storage);
    recorder.attach(&mut parser);

    if let Some(spare) = spare.as_deref_mut() {
        parser.attach_overflow(
            |slot, grant| {
                if let Some(next) = Option::take(slot) {
                    info!(
                        from = grant.capacity(),
                        to = next.len(),
                        "growing data buffer"
                    );
                    if let Err(err) = grant.grow_into(next) {
                        warn!(error = %err, "could not grow data buffer");
                    }
                }
            },
            Some(spare),
        );
    }

    let config = FeedConfig {
        chunk_size: args.chunk_size.max(1),
    };
    let mut feeder = ByteFeeder::with_config(input, config);
    let mut printer = EventPrinter::new(format);
    let mut printed = 0usize;

    loop {
        match feeder.feed_chunk(&mut parser) {
            Ok(_) => {}
            Err(ParserError::ConnectionClosed) => break,
            Err(err) => return Err(parser_error("read failed", err)),
        }

        for event in recorder.drain() {
            printer.print(&event);
            printed = printed.saturating_add(1);

            if args.count.is_some_and(|count| printed >= count) {
                printer.finish();
                return Ok(SUCCESS);
            }
        }
    }

    printer.finish();
    debug!(bytes = feeder.bytes_fed(), messages = printed, "decode finished");

    if args.strict && parser.is_parsing_message() {
        return Err(CliError::new(
            INCOMPLETE,
            format!("stream ended inside a message ({:?})", parser.state()),
        ));
    }

    Ok(SUCCESS)
}

fn open_input(path: &Path) -> CliResult<Box<dyn Read>> {
    if path.as_os_str() == "-" {
        return Ok(Box::new(std::io::stdin()));
    }
    let file = File::open(path)
        .map_err(|err| io_error(&format!("cannot open {}", path.display()), err))?;
    Ok(Box::new(file))
}

/// Parse whitespace- or comma-separated hex bytes, with optional `0x`
/// prefixes. `#` starts a comment that runs to the end of the line.
pub fn parse_hex(text: &str) -> CliResult<Vec<u8>> {
    let mut bytes = Vec::new();
    for line in text.lines() {
        let line = line.split('#').next().unwrap_or_default();
        for token in line.split(|c: char| c.is_whitespace() || c == ',') {
            if token.is_empty() {
                continue;
            }
            let digits = token
                .strip_prefix("0x")
                .or_else(|| token.strip_prefix("0X"))
                .unwrap_or(token);
            let byte = u8::from_str_radix(digits, 16).map_err(|_| {
                CliError::new(DATA_INVALID, format!("invalid hex byte {token:?}"))
            })?;
            bytes.push(byte);
        }
    }
    Ok(bytes)
}
