use mavpack_schema::SchemaError;

use crate::outcome::Deviation;

/// Errors that can occur while packing a frame.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The message's schema is inconsistent; nothing was packed.
    #[error("schema integrity: {0}")]
    Schema(#[from] SchemaError),

    /// The message has no value for a non-extension field.
    #[error("no value for field {field:?}")]
    MissingValue { field: String },

    /// The value's shape does not match the field (e.g. an array for a scalar).
    #[error("field {field}: expected {expected} value, got {found}")]
    ShapeMismatch {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    /// An array value has fewer elements than the field's arity.
    #[error("field {field}: expected {expected} elements, got {actual}")]
    ArityMismatch {
        field: String,
        expected: usize,
        actual: usize,
    },

    /// A value did not fit and the overflow policy is `Reject`.
    #[error("value rejected: {0}")]
    ValueRejected(Deviation),

    /// A write would land outside the frame buffer.
    #[error("write of {width} bytes at offset {offset} exceeds buffer of {len} bytes")]
    OutOfBounds {
        offset: usize,
        width: usize,
        len: usize,
    },
}

pub type Result<T> = std::result::Result<T, FrameError>;
