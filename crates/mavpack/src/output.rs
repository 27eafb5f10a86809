use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use mavpack_frame::{Deviation, Frame};
use mavpack_schema::MessageDefinition;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
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

#[derive(Serialize)]
struct FrameOutput<'a> {
    schema_id: &'a str,
    message: &'a str,
    message_id: u32,
    system_id: u8,
    component_id: u8,
    payload_length: usize,
    wire_size: usize,
    checksum: String,
    frame: String,
    deviations: Vec<String>,
}

pub fn print_frame(frame: &Frame, message: &str, deviations: &[Deviation], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = FrameOutput {
                schema_id: "https://schemas.mavpack.dev/cli/v1/frame-packed.schema.json",
                message,
                message_id: frame.message_id(),
                system_id: frame.system_id(),
                component_id: frame.component_id(),
                payload_length: frame.payload_length(),
                wire_size: frame.wire_size(),
                checksum: format!("0x{:04X}", frame.checksum()),
                frame: hex::encode_upper(frame.as_bytes()),
                deviations: deviations.iter().map(ToString::to_string).collect(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["MESSAGE", "ID", "SYS", "COMP", "LEN", "CRC", "FRAME"])
                .add_row(vec![
                    message.to_string(),
                    frame.message_id().to_string(),
                    frame.system_id().to_string(),
                    frame.component_id().to_string(),
                    frame.payload_length().to_string(),
                    format!("0x{:04X}", frame.checksum()),
                    hex_spaced(frame.as_bytes()),
                ]);
            println!("{table}");
            print_deviations(deviations);
        }
        OutputFormat::Pretty => {
            println!("{}", hex_spaced(frame.as_bytes()));
            print_deviations(deviations);
        }
        OutputFormat::Raw => {
            print_raw(frame.as_bytes());
        }
    }
}

fn print_deviations(deviations: &[Deviation]) {
    for deviation in deviations {
        println!("truncated: {deviation}");
    }
}

#[derive(Serialize)]
struct DefinitionSummary<'a> {
    name: &'a str,
    id: u32,
    payload_length: usize,
    crc_extra: Option<u8>,
    fields: usize,
}

#[derive(Serialize)]
struct DefinitionListOutput<'a> {
    schema_id: &'a str,
    messages: Vec<DefinitionSummary<'a>>,
}

pub fn print_definitions(definitions: &[std::sync::Arc<MessageDefinition>], format: OutputFormat) {
    match format {
        OutputFormat::Json | OutputFormat::Raw => {
            let out = DefinitionListOutput {
                schema_id: "https://schemas.mavpack.dev/cli/v1/definitions.schema.json",
                messages: definitions
                    .iter()
                    .map(|def| DefinitionSummary {
                        name: def.name(),
                        id: def.id(),
                        payload_length: def.payload_length(),
                        crc_extra: def.crc_extra(),
                        fields: def.fields().len(),
                    })
                    .collect(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["ID", "NAME", "LEN", "CRC_EXTRA", "FIELDS"]);
            for def in definitions {
                table.add_row(vec![
                    def.id().to_string(),
                    def.name().to_string(),
                    def.payload_length().to_string(),
                    def.crc_extra().map_or_else(|| "-".to_string(), |x| x.to_string()),
                    def.fields().len().to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for def in definitions {
                println!(
                    "{} id={} len={}",
                    def.name(),
                    def.id(),
                    def.payload_length()
                );
            }
        }
    }
}

#[derive(Serialize)]
struct SlotOutput<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    type_tag: &'a str,
    offset: Option<usize>,
    width: usize,
    extension: bool,
}

#[derive(Serialize)]
struct LayoutOutput<'a> {
    schema_id: &'a str,
    name: &'a str,
    id: u32,
    payload_length: usize,
    fields: Vec<SlotOutput<'a>>,
}

/// Payload fields by offset, followed by extensions (which have no offset).
fn layout_rows(def: &MessageDefinition) -> Vec<SlotOutput<'_>> {
    let mut rows: Vec<SlotOutput<'_>> = def
        .layout()
        .slots
        .iter()
        .filter_map(|slot| {
            def.field(&slot.name).map(|field| SlotOutput {
                name: &field.name,
                type_tag: &field.type_tag,
                offset: Some(slot.offset),
                width: slot.descriptor.width(),
                extension: false,
            })
        })
        .collect();
    rows.extend(def.fields().iter().filter(|f| f.extension).map(|field| SlotOutput {
        name: &field.name,
        type_tag: &field.type_tag,
        offset: None,
        width: 0,
        extension: true,
    }));
    rows
}

pub fn print_layout(def: &MessageDefinition, format: OutputFormat) {
    let rows = layout_rows(def);
    match format {
        OutputFormat::Json | OutputFormat::Raw => {
            let out = LayoutOutput {
                schema_id: "https://schemas.mavpack.dev/cli/v1/layout.schema.json",
                name: def.name(),
                id: def.id(),
                payload_length: def.payload_length(),
                fields: rows,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["OFFSET", "FIELD", "TYPE", "WIDTH"]);
            for row in &rows {
                table.add_row(vec![
                    row.offset.map_or_else(|| "ext".to_string(), |o| o.to_string()),
                    row.name.to_string(),
                    row.type_tag.to_string(),
                    row.width.to_string(),
                ]);
            }
            println!("{} (id {}, {} bytes)", def.name(), def.id(), def.payload_length());
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("{} id={} len={}", def.name(), def.id(), def.payload_length());
            for row in &rows {
                match row.offset {
                    Some(offset) => println!("  {offset:>3} {} {}", row.type_tag, row.name),
                    None => println!("  ext {} {}", row.type_tag, row.name),
                }
            }
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

/// Uppercase hex with a space between bytes.
pub fn hex_spaced(data: &[u8]) -> String {
    data.iter()
        .map(|byte| hex::encode_upper([*byte]))
        .collect::<Vec<_>>()
        .join(" ")
}
