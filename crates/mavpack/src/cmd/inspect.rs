use crate::cmd::InspectArgs;
use crate::exit::{schema_error, CliResult, SUCCESS};
use crate::output::{print_definitions, print_layout, OutputFormat};

pub fn run(args: InspectArgs, format: OutputFormat) -> CliResult<i32> {
    let registry = args.defs.load()?;

    match &args.message {
        Some(name_or_id) => {
            let definition = registry
                .resolve(name_or_id)
                .map_err(|err| schema_error("inspect", err))?;
            print_layout(&definition, format);
        }
        None => print_definitions(&registry.definitions(), format),
    }

    Ok(SUCCESS)
}
