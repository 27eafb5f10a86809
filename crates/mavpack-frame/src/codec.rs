use bytes::{Bytes, BytesMut};
use mavpack_schema::{Layout, MessageSource, SchemaError, MAX_PAYLOAD_LEN};
use tracing::{debug, warn};

use crate::crc::{crc16_mcrf4xx, crc16_mcrf4xx_update};
use crate::error::{FrameError, Result};
use crate::field::encode_field;
use crate::header::{FrameHeader, CHECKSUM_SIZE, FRAME_OVERHEAD, HEADER_SIZE};
use crate::outcome::{Deviation, OverflowPolicy};
use crate::scalar::slot;

/// A packed MAVLink v2 frame.
///
/// Only [`pack`] and [`Packer::pack`] create frames, so the byte layout
/// always holds: header, payload, little-endian checksum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    bytes: Bytes,
}

impl Frame {
    /// The complete wire bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Hand the wire bytes to a transport (cheap, zero-copy).
    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }

    /// Total wire size (header + payload + checksum).
    pub fn wire_size(&self) -> usize {
        self.bytes.len()
    }

    pub fn payload_length(&self) -> usize {
        usize::from(self.bytes[1])
    }

    pub fn sequence(&self) -> u8 {
        self.bytes[4]
    }

    pub fn system_id(&self) -> u8 {
        self.bytes[5]
    }

    pub fn component_id(&self) -> u8 {
        self.bytes[6]
    }

    pub fn message_id(&self) -> u32 {
        u32::from_le_bytes([self.bytes[7], self.bytes[8], self.bytes[9], 0])
    }

    pub fn payload(&self) -> &[u8] {
        &self.bytes[HEADER_SIZE..self.bytes.len() - CHECKSUM_SIZE]
    }

    /// The trailing checksum as stored on the wire.
    pub fn checksum(&self) -> u16 {
        let end = self.bytes.len();
        u16::from_le_bytes([self.bytes[end - 2], self.bytes[end - 1]])
    }

    /// Recompute the checksum over bytes `[1, len - 2)`, optionally seeded
    /// with a CRC_EXTRA byte, and compare it with the stored one.
    pub fn checksum_matches(&self, crc_extra: Option<u8>) -> bool {
        let covered = &self.bytes[1..self.bytes.len() - CHECKSUM_SIZE];
        frame_checksum(covered, crc_extra) == self.checksum()
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// Configuration for the packer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PackConfig {
    /// What to do with values that do not fit their field. Default: truncate.
    pub overflow: OverflowPolicy,
    /// Fold the message's CRC_EXTRA byte into the checksum. Default: off.
    pub apply_crc_extra: bool,
}

/// A frame plus every lossy write made while packing it.
#[derive(Debug, Clone)]
pub struct PackOutcome {
    pub frame: Frame,
    pub deviations: Vec<Deviation>,
}

impl PackOutcome {
    /// True when every value was written exactly.
    pub fn is_exact(&self) -> bool {
        self.deviations.is_empty()
    }
}

/// Packs messages into frames under a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct Packer {
    config: PackConfig,
}

impl Packer {
    /// Create a packer with default configuration.
    pub fn new() -> Self {
        Self::with_config(PackConfig::default())
    }

    /// Create a packer with explicit configuration.
    pub fn with_config(config: PackConfig) -> Self {
        Self { config }
    }

    /// Current packer configuration.
    pub fn config(&self) -> &PackConfig {
        &self.config
    }

    /// Pack a message into a frame.
    ///
    /// Wire format:
    /// ```text
    /// ┌──────────────┬──────────────────┬───────────────┐
    /// │ Header (10B) │ Payload (N bytes)│ Checksum (2B) │
    /// │ see header.rs│ schema order     │ CRC-16 LE     │
    /// └──────────────┴──────────────────┴───────────────┘
    /// ```
    pub fn pack<M: MessageSource + ?Sized>(&self, message: &M) -> Result<PackOutcome> {
        let payload_length = message.payload_length();
        if payload_length > MAX_PAYLOAD_LEN {
            return Err(SchemaError::PayloadTooLarge {
                size: payload_length,
                max: MAX_PAYLOAD_LEN,
            }
            .into());
        }

        let layout = Layout::from_fields(message.fields())?;
        if layout.payload_length != payload_length {
            return Err(SchemaError::PayloadLengthMismatch {
                message: message.name().to_string(),
                declared: payload_length,
                computed: layout.payload_length,
            }
            .into());
        }

        let header = FrameHeader::new(
            payload_length,
            message.system_id(),
            message.component_id(),
            message.message_id(),
        )?;

        let total_length = payload_length + FRAME_OVERHEAD;
        let mut buf = BytesMut::zeroed(total_length);
        header.write(&mut buf)?;

        let mut deviations = Vec::new();
        for field in &layout.slots {
            let value = message
                .value(&field.name)
                .ok_or_else(|| FrameError::MissingValue {
                    field: field.name.clone(),
                })?;
            let start = HEADER_SIZE + field.offset;
            for kind in encode_field(&field.name, value, &mut buf, start, field.descriptor)? {
                let deviation = Deviation {
                    field: field.name.clone(),
                    kind,
                };
                match self.config.overflow {
                    OverflowPolicy::Reject => return Err(FrameError::ValueRejected(deviation)),
                    OverflowPolicy::Truncate => {
                        warn!(name = message.name(), %deviation, "value written lossily");
                        deviations.push(deviation);
                    }
                }
            }
        }

        let crc_extra = if self.config.apply_crc_extra {
            message.crc_extra()
        } else {
            None
        };
        let checksum_at = total_length - CHECKSUM_SIZE;
        let checksum = frame_checksum(&buf[1..checksum_at], crc_extra);
        slot(&mut buf, checksum_at, CHECKSUM_SIZE)?.copy_from_slice(&checksum.to_le_bytes());

        debug!(
            name = message.name(),
            id = message.message_id(),
            payload_length,
            checksum,
            deviations = deviations.len(),
            "packed frame"
        );

        Ok(PackOutcome {
            frame: Frame {
                bytes: buf.freeze(),
            },
            deviations,
        })
    }
}

/// Pack a message with default configuration, returning just the frame.
pub fn pack<M: MessageSource + ?Sized>(message: &M) -> Result<Frame> {
    Packer::new().pack(message).map(|outcome| outcome.frame)
}

fn frame_checksum(covered: &[u8], crc_extra: Option<u8>) -> u16 {
    let crc = crc16_mcrf4xx(covered);
    match crc_extra {
        Some(extra) => crc16_mcrf4xx_update(crc, &[extra]),
        None => crc,
    }
}
