//! MAVLink v2 frame packing.
//!
//! Every frame is laid out as:
//! - A 10-byte header (start marker 0xFD, payload length, zeroed flags and
//!   sequence, system id, component id, 24-bit message id)
//! - The payload, fields packed in schema order at fixed widths
//! - A 2-byte little-endian CRC-16/MCRF4XX over everything after the marker
//!
//! Values that do not fit their field are written lossily and reported, or
//! rejected when [`OverflowPolicy::Reject`] is configured.

pub mod codec;
pub mod crc;
pub mod error;
pub mod field;
pub mod header;
pub mod outcome;
pub mod scalar;

pub use codec::{pack, Frame, PackConfig, PackOutcome, Packer};
pub use error::{FrameError, Result};
pub use field::{encode_field, encode_tagged};
pub use header::{FrameHeader, CHECKSUM_SIZE, FRAME_OVERHEAD, HEADER_SIZE, STX_V2};
pub use outcome::{Deviation, DeviationKind, OverflowPolicy};
pub use scalar::{encode_scalar, write_u64_words, Fit};
