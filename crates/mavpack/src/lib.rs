//! MAVLink v2 frame packer driven by JSON message definitions.
//!
//! Definitions describe each message's fields and their declared types.
//! The packer writes fields little-endian in declaration order behind the
//! 10-byte v2 header and appends the CRC-16/MCRF4XX checksum.
//!
//! # Crate Structure
//!
//! - [`schema`]: type tags, message definitions, layouts and the definition registry
//! - [`frame`]: field encoding, header layout, checksum and the packer
//!
//! ```
//! use mavpack::schema::{DefinitionRegistry, Message};
//!
//! let registry = DefinitionRegistry::from_embedded(&[r#"{
//!     "messages": [{ "name": "PING", "id": 4, "fields": [{ "name": "seq", "type": "uint32_t" }] }]
//! }"#])?;
//! let msg = Message::new(registry.resolve("PING")?, 1, 1).with("seq", 7u32)?;
//! let frame = mavpack::pack(&msg)?;
//! assert_eq!(frame.payload(), &[7, 0, 0, 0]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Re-export schema types.
pub mod schema {
    pub use mavpack_schema::*;
}

/// Re-export frame types.
pub mod frame {
    pub use mavpack_frame::*;
}

pub use mavpack_frame::{pack, Frame, PackConfig, PackOutcome, Packer};
