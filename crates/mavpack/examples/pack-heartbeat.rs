use mavpack::schema::{DefinitionRegistry, Message};
use mavpack::{PackConfig, Packer};

const COMMON: &str = include_str!("../demos/common.json");

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let registry = DefinitionRegistry::from_embedded(&[COMMON])?;

    let heartbeat = Message::new(registry.resolve("HEARTBEAT")?, 1, 1)
        .with("type", 2u8)?
        .with("autopilot", 3u8)?
        .with("base_mode", 81u8)?
        .with("custom_mode", 0u32)?
        .with("system_status", 4u8)?
        .with("mavlink_version", 3u8)?;

    let packer = Packer::with_config(PackConfig {
        apply_crc_extra: true,
        ..PackConfig::default()
    });
    let outcome = packer.pack(&heartbeat)?;

    println!("{}", hex::encode_upper(outcome.frame.as_bytes()));
    for deviation in &outcome.deviations {
        eprintln!("truncated: {deviation}");
    }
    Ok(())
}
