use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod commands;
pub mod decode;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode a Firmata byte stream and print each message.
    Decode(DecodeArgs),
    /// Print the command table the decoder recognises.
    Commands(CommandsArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Decode(args) => decode::run(args, format),
        Command::Commands(args) => commands::run(args, format),
        Command::Version(args) => version::run(args, format),
    }
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Input file or device. Use `-` for stdin.
    #[arg(default_value = "-")]
    pub input: PathBuf,
    /// Input is whitespace-separated hex text (e.g. "E0 7F 01").
    #[arg(long)]
    pub hex: bool,
    /// Data buffer capacity in bytes.
    #[arg(long, default_value = "64", env = "FIRMATA_BUFFER_SIZE")]
    pub buffer_size: usize,
    /// On overflow, switch once to a buffer of this many bytes.
    #[arg(long, value_name = "BYTES")]
    pub grow_to: Option<usize>,
    /// Bytes requested from the input per read.
    #[arg(long, default_value = "256")]
    pub chunk_size: usize,
    /// Exit after printing N messages.
    #[arg(long)]
    pub count: Option<usize>,
    /// Fail if the stream ends inside a message.
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args, Debug, Default)]
pub struct CommandsArgs {
    /// Also list the known sysex tags.
    #[arg(long)]
    pub sysex: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
