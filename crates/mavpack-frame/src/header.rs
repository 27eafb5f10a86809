//! The 10-byte MAVLink v2 frame header.
//!
//! ```text
//! ┌─────┬─────┬────────┬────────┬─────┬───────┬───────┬──────────────┐
//! │ STX │ LEN │ INCOMP │ COMPAT │ SEQ │ SYSID │ COMPID│ MSGID (3B LE)│
//! │ 0xFD│     │ 0      │ 0      │ 0   │       │       │              │
//! └─────┴─────┴────────┴────────┴─────┴───────┴───────┴──────────────┘
//! ```

use mavpack_schema::{SchemaError, MAX_MESSAGE_ID, MAX_PAYLOAD_LEN};

use crate::error::Result;
use crate::scalar::slot;

/// Start-of-frame marker for protocol v2.
pub const STX_V2: u8 = 0xFD;

/// Header: stx (1) + len (1) + flags (2) + seq (1) + sysid (1) + compid (1) + msgid (3).
pub const HEADER_SIZE: usize = 10;

/// Trailing checksum size.
pub const CHECKSUM_SIZE: usize = 2;

/// Bytes a frame adds around its payload.
pub const FRAME_OVERHEAD: usize = HEADER_SIZE + CHECKSUM_SIZE;

/// Identity fields of a frame header.
///
/// Incompatibility flags, compatibility flags and the sequence number are
/// always written as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    payload_length: u8,
    system_id: u8,
    component_id: u8,
    message_id: u32,
}

impl FrameHeader {
    pub fn new(
        payload_length: usize,
        system_id: u8,
        component_id: u8,
        message_id: u32,
    ) -> Result<Self> {
        let payload_length = u8::try_from(payload_length).map_err(|_| {
            SchemaError::PayloadTooLarge {
                size: payload_length,
                max: MAX_PAYLOAD_LEN,
            }
        })?;
        if message_id > MAX_MESSAGE_ID {
            return Err(SchemaError::MessageIdOutOfRange(message_id).into());
        }

        Ok(Self {
            payload_length,
            system_id,
            component_id,
            message_id,
        })
    }

    pub fn payload_length(&self) -> usize {
        usize::from(self.payload_length)
    }

    pub fn system_id(&self) -> u8 {
        self.system_id
    }

    pub fn component_id(&self) -> u8 {
        self.component_id
    }

    pub fn message_id(&self) -> u32 {
        self.message_id
    }

    /// Write the header into the first [`HEADER_SIZE`] bytes of `buf`.
    pub fn write(&self, buf: &mut [u8]) -> Result<()> {
        let dst = slot(buf, 0, HEADER_SIZE)?;
        let id = self.message_id.to_le_bytes();
        dst.copy_from_slice(&[
            STX_V2,
            self.payload_length,
            0, // incompatibility flags
            0, // compatibility flags
            0, // sequence
            self.system_id,
            self.component_id,
            id[0],
            id[1],
            id[2],
        ]);
        Ok(())
    }
}
