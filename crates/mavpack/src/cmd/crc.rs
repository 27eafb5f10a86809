use mavpack_frame::crc::{accumulate, crc16_mcrf4xx};
use serde::Serialize;

use crate::cmd::CrcArgs;
use crate::exit::{CliError, CliResult, SUCCESS, USAGE};
use crate::output::OutputFormat;

#[derive(Serialize)]
struct CrcOutput {
    schema_id: &'static str,
    length: usize,
    crc: String,
    wire: String,
}

pub fn run(args: CrcArgs, format: OutputFormat) -> CliResult<i32> {
    let data = parse_hex(&args.hex)?;
    let mut crc = crc16_mcrf4xx(&data);
    if let Some(extra) = args.extra {
        crc = accumulate(extra, crc);
    }

    match format {
        OutputFormat::Json => {
            let out = CrcOutput {
                schema_id: "https://schemas.mavpack.dev/cli/v1/crc.schema.json",
                length: data.len(),
                crc: format!("0x{crc:04X}"),
                wire: hex::encode_upper(crc.to_le_bytes()),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => println!("0x{crc:04X}"),
        OutputFormat::Raw => crate::output::print_raw(&crc.to_le_bytes()),
    }
    Ok(SUCCESS)
}

fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let digits: String = input
        .chars()
        .filter(|ch| !ch.is_whitespace() && *ch != ':')
        .collect();
    let digits = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
        .unwrap_or(&digits);
    hex::decode(digits).map_err(|err| CliError::new(USAGE, format!("invalid hex input: {err}")))
}
