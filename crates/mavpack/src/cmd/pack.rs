use std::io::Read;

use mavpack_frame::{OverflowPolicy, PackConfig, Packer};
use mavpack_schema::Message;
use serde_json::Value;
use tracing::{info, warn};

use crate::cmd::PackArgs;
use crate::exit::{frame_error, io_error, schema_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_frame, OutputFormat};

/// Cap on `--values-file` input.
const MAX_VALUES_FILE_SIZE: u64 = 1024 * 1024;

pub fn run(args: PackArgs, format: OutputFormat) -> CliResult<i32> {
    let registry = args.defs.load()?;
    let definition = registry
        .resolve(&args.message)
        .map_err(|err| schema_error("pack", err))?;

    let values = read_values(&args)?;
    let message = Message::from_json(definition, args.system, args.component, &values)
        .map_err(|err| schema_error("pack", err))?;

    let packer = Packer::with_config(PackConfig {
        overflow: if args.strict {
            OverflowPolicy::Reject
        } else {
            OverflowPolicy::Truncate
        },
        apply_crc_extra: args.crc_extra,
    });
    if args.crc_extra && message.definition().crc_extra().is_none() {
        warn!(
            name = message.definition().name(),
            "definition has no crc_extra; checksum left unseeded"
        );
    }

    let outcome = packer
        .pack(&message)
        .map_err(|err| frame_error("pack", err))?;

    if let Some(path) = &args.out {
        std::fs::write(path, outcome.frame.as_bytes())
            .map_err(|err| io_error(&format!("cannot write {}", path.display()), err))?;
        info!(path = %path.display(), bytes = outcome.frame.wire_size(), "frame written");
    }

    print_frame(
        &outcome.frame,
        message.definition().name(),
        &outcome.deviations,
        format,
    );
    Ok(SUCCESS)
}

fn read_values(args: &PackArgs) -> CliResult<Value> {
    let text = match (&args.values, &args.values_file) {
        (Some(inline), _) => inline.clone(),
        (None, Some(path)) => {
            let file = std::fs::File::open(path)
                .map_err(|err| io_error(&format!("cannot read {}", path.display()), err))?;
            let mut text = String::new();
            file.take(MAX_VALUES_FILE_SIZE + 1)
                .read_to_string(&mut text)
                .map_err(|err| io_error(&format!("cannot read {}", path.display()), err))?;
            if text.len() as u64 > MAX_VALUES_FILE_SIZE {
                return Err(CliError::new(
                    DATA_INVALID,
                    format!("{} exceeds {MAX_VALUES_FILE_SIZE} bytes", path.display()),
                ));
            }
            text
        }
        (None, None) => return Ok(Value::Object(Default::default())),
    };

    serde_json::from_str(&text)
        .map_err(|err| CliError::new(DATA_INVALID, format!("invalid field values: {err}")))
}
