use firmata_parser::{command, DEFAULT_CHUNK_SIZE};
use serde::Serialize;

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::OutputFormat;

#[derive(Serialize)]
struct BuildInfo {
    name: &'static str,
    version: &'static str,
    target: &'static str,
    profile: &'static str,
    git_hash: &'static str,
    async_feeder: bool,
    default_chunk_size: usize,
    sysex_range: String,
}

impl BuildInfo {
    fn collect() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            target: option_env!("FIRMATA_BUILD_TARGET").unwrap_or("unknown"),
            profile: option_env!("FIRMATA_BUILD_PROFILE").unwrap_or("unknown"),
            git_hash: option_env!("FIRMATA_GIT_HASH").unwrap_or("unknown"),
            async_feeder: cfg!(feature = "async"),
            default_chunk_size: DEFAULT_CHUNK_SIZE,
            sysex_range: format!(
                "0x{:02X}..0x{:02X}",
                command::START_SYSEX,
                command::END_SYSEX
            ),
        }
    }
}

pub fn run(args: VersionArgs, format: OutputFormat) -> CliResult<i32> {
    if !args.extended {
        println!("firmata {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    let info = BuildInfo::collect();
    if matches!(format, OutputFormat::Json) {
        println!(
            "{}",
            serde_json::to_string(&info).unwrap_or_else(|_| "{}".to_string())
        );
        return Ok(SUCCESS);
    }

    println!("name: {}", info.name);
    println!("version: {}", info.version);
    println!("target: {}", info.target);
    println!("profile: {}", info.profile);
    println!("git_hash: {}", info.git_hash);
    println!("async_feeder: {}", info.async_feeder);
    println!("default_chunk_size: {}", info.default_chunk_size);
    println!("sysex_range: {}", info.sysex_range);

    Ok(SUCCESS)
}
