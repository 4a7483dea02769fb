//! Decode a raw Firmata byte stream from stdin and print each message.
//!
//! Run with:
//!   printf '\xe2\x7f\x01\xf9' | cargo run --example decode-stdin
//!
//! Or against a board (Linux):
//!   stty -F /dev/ttyACM0 57600 raw && cargo run --example decode-stdin < /dev/ttyACM0

use std::io;

use firmata::{ByteFeeder, EventRecorder, Parser, ParserError};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut storage = [0u8; 128];
    let recorder = EventRecorder::new();
    let mut parser = Parser::with_buffer(&mut storage);
    recorder.attach(&mut parser);

    let mut feeder = ByteFeeder::new(io::stdin().lock());
    loop {
        match feeder.feed_chunk(&mut parser) {
            Ok(_) => {}
            Err(ParserError::ConnectionClosed) => break,
            Err(err) => return Err(err.into()),
        }
        while let Some(event) = recorder.pop() {
            println!("{event:?}");
        }
    }

    eprintln!("{} bytes decoded", feeder.bytes_fed());
    Ok(())
}
