use clap::{Args, Subcommand};
use std::path::{Path, PathBuf};

use mavpack_schema::{DefinitionRegistry, RegistryConfig};
use tracing::debug;

use crate::exit::{io_error, schema_error, CliResult};
use crate::output::OutputFormat;

pub mod crc;
pub mod inspect;
pub mod pack;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Pack one message into a frame.
    Pack(PackArgs),
    /// List loaded definitions or show one message's wire layout.
    Inspect(InspectArgs),
    /// Compute the frame checksum over hex-encoded bytes.
    Crc(CrcArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Pack(args) => pack::run(args, format),
        Command::Inspect(args) => inspect::run(args, format),
        Command::Crc(args) => crc::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct DefinitionArgs {
    /// Definition document, or a directory of `*.json` documents.
    pub definitions: PathBuf,
    /// Reject unknown keys in definition documents.
    #[arg(long)]
    pub strict_schema: bool,
    /// Let later documents replace earlier definitions with the same name or id.
    #[arg(long)]
    pub allow_redefinition: bool,
}

#[derive(Args, Debug)]
pub struct PackArgs {
    #[command(flatten)]
    pub defs: DefinitionArgs,
    /// Message name or numeric id.
    #[arg(long, short = 'm')]
    pub message: String,
    /// Sender system id.
    #[arg(long, default_value = "1")]
    pub system: u8,
    /// Sender component id.
    #[arg(long, default_value = "1")]
    pub component: u8,
    /// Field values as a JSON object.
    #[arg(long, conflicts_with = "values_file")]
    pub values: Option<String>,
    /// Read field values from a JSON file.
    #[arg(long, conflicts_with = "values")]
    pub values_file: Option<PathBuf>,
    /// Fail instead of truncating values that do not fit their field.
    #[arg(long)]
    pub strict: bool,
    /// Fold the message's CRC_EXTRA byte into the checksum.
    #[arg(long)]
    pub crc_extra: bool,
    /// Also write the frame bytes to this file.
    #[arg(long, short = 'o', value_name = "FILE")]
    pub out: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    #[command(flatten)]
    pub defs: DefinitionArgs,
    /// Show the layout of one message (name or numeric id).
    #[arg(long, short = 'm')]
    pub message: Option<String>,
}

#[derive(Args, Debug)]
pub struct CrcArgs {
    /// Bytes to checksum, hex encoded. Spaces and colons are ignored.
    pub hex: String,
    /// Accumulate this byte after the data.
    #[arg(long, value_name = "BYTE")]
    pub extra: Option<u8>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build information.
    #[arg(long)]
    pub extended: bool,
}

impl DefinitionArgs {
    fn config(&self) -> RegistryConfig {
        RegistryConfig {
            strict_mode: self.strict_schema,
            allow_redefinition: self.allow_redefinition,
            ..RegistryConfig::default()
        }
    }

    /// Build a registry from the definitions path.
    pub fn load(&self) -> CliResult<DefinitionRegistry> {
        let path = self.definitions.as_path();
        let metadata = std::fs::metadata(path)
            .map_err(|err| io_error(&format!("cannot read {}", path.display()), err))?;

        let registry = if metadata.is_dir() {
            DefinitionRegistry::from_directory_with_config(path, self.config())
                .map_err(|err| schema_error("definitions", err))?
        } else {
            load_file(path, self.config())?
        };
        debug!(
            path = %path.display(),
            count = registry.len(),
            "definitions loaded"
        );
        Ok(registry)
    }
}

fn load_file(path: &Path, config: RegistryConfig) -> CliResult<DefinitionRegistry> {
    let document = std::fs::read_to_string(path)
        .map_err(|err| io_error(&format!("cannot read {}", path.display()), err))?;
    let mut registry = DefinitionRegistry::with_config(config);
    registry
        .register_json(&document)
        .map_err(|err| schema_error(&path.display().to_string(), err))?;
    Ok(registry)
}
