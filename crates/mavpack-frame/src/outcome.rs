//! Values that were written lossily.
//!
//! Fixed-width fields cannot hold every value a caller may supply. The packer
//! writes what fits and records a [`Deviation`] for everything it cut.

use std::fmt;

use mavpack_schema::BaseType;

/// What happened to a value that did not fit its field.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviationKind {
    /// A numeric element was outside the target type's range or lost its
    /// fractional part; the low-order bits were written.
    NumericTruncated { base: BaseType, index: usize },
    /// Text longer than the field capacity was cut at the capacity.
    TextTruncated { capacity: usize, length: usize },
    /// An array with more elements than the field arity; extra elements dropped.
    ArrayTruncated { arity: usize, length: usize },
    /// Non-ASCII characters were written as the low byte of their code point.
    NonAsciiText,
}

impl fmt::Display for DeviationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviationKind::NumericTruncated { base, index } => {
                write!(f, "element {index} does not fit {base}")
            }
            DeviationKind::TextTruncated { capacity, length } => {
                write!(f, "text of {length} chars cut to capacity {capacity}")
            }
            DeviationKind::ArrayTruncated { arity, length } => {
                write!(f, "array of {length} elements cut to arity {arity}")
            }
            DeviationKind::NonAsciiText => f.write_str("non-ASCII text written lossily"),
        }
    }
}

/// A lossy write attributed to a field.
#[derive(Debug, Clone, PartialEq)]
pub struct Deviation {
    pub field: String,
    pub kind: DeviationKind,
}

impl fmt::Display for Deviation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "field {}: {}", self.field, self.kind)
    }
}

/// How the packer treats values that do not fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Write what fits and report it.
    #[default]
    Truncate,
    /// Fail the pack on the first value that does not fit.
    Reject,
}
