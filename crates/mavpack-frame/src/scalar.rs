//! Fixed-width little-endian element writes.

use mavpack_schema::{BaseType, Scalar};

use crate::error::{FrameError, Result};

/// Whether a value survived narrowing to its wire type unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fit {
    Exact,
    Truncated,
}

/// Borrow `width` bytes at `offset`, failing instead of writing out of bounds.
pub(crate) fn slot(buf: &mut [u8], offset: usize, width: usize) -> Result<&mut [u8]> {
    let len = buf.len();
    offset
        .checked_add(width)
        .and_then(|end| buf.get_mut(offset..end))
        .ok_or(FrameError::OutOfBounds { offset, width, len })
}

/// Write a 64-bit value as two 32-bit little-endian words.
///
/// The low word (`value mod 2^32`) goes at `offset`, the high word
/// (`value div 2^32`) at `offset + 4`.
pub fn write_u64_words(buf: &mut [u8], offset: usize, value: u64) -> Result<()> {
    const WORD: u64 = 1 << 32;
    let low = (value % WORD) as u32;
    let high = (value / WORD) as u32;

    let dst = slot(buf, offset, 8)?;
    dst[..4].copy_from_slice(&low.to_le_bytes());
    dst[4..].copy_from_slice(&high.to_le_bytes());
    Ok(())
}

/// Encode one element of type `base` at `offset`.
///
/// Writes exactly `base.width()` bytes. Values outside the target range are
/// written as their low-order bits and reported as [`Fit::Truncated`].
pub fn encode_scalar(buf: &mut [u8], offset: usize, base: BaseType, value: Scalar) -> Result<Fit> {
    match base {
        BaseType::UInt8 | BaseType::Char => {
            let (bits, fit) = integer_bits(value, 0, i128::from(u8::MAX));
            slot(buf, offset, 1)?[0] = bits as u8;
            Ok(fit)
        }
        BaseType::Int8 => {
            let (bits, fit) = integer_bits(value, i128::from(i8::MIN), i128::from(i8::MAX));
            slot(buf, offset, 1)?[0] = bits as u8;
            Ok(fit)
        }
        BaseType::UInt16 => {
            let (bits, fit) = integer_bits(value, 0, i128::from(u16::MAX));
            slot(buf, offset, 2)?.copy_from_slice(&(bits as u16).to_le_bytes());
            Ok(fit)
        }
        BaseType::Int16 => {
            let (bits, fit) = integer_bits(value, i128::from(i16::MIN), i128::from(i16::MAX));
            slot(buf, offset, 2)?.copy_from_slice(&(bits as u16).to_le_bytes());
            Ok(fit)
        }
        BaseType::UInt32 => {
            let (bits, fit) = integer_bits(value, 0, i128::from(u32::MAX));
            slot(buf, offset, 4)?.copy_from_slice(&(bits as u32).to_le_bytes());
            Ok(fit)
        }
        BaseType::Int32 => {
            let (bits, fit) = integer_bits(value, i128::from(i32::MIN), i128::from(i32::MAX));
            slot(buf, offset, 4)?.copy_from_slice(&(bits as u32).to_le_bytes());
            Ok(fit)
        }
        BaseType::UInt64 => {
            let (bits, fit) = integer_bits(value, 0, i128::from(u64::MAX));
            write_u64_words(buf, offset, bits)?;
            Ok(fit)
        }
        BaseType::Int64 => {
            let (bits, fit) = integer_bits(value, i128::from(i64::MIN), i128::from(i64::MAX));
            write_u64_words(buf, offset, bits)?;
            Ok(fit)
        }
        BaseType::Float32 => {
            let (narrow, fit) = float32_value(value);
            slot(buf, offset, 4)?.copy_from_slice(&narrow.to_le_bytes());
            Ok(fit)
        }
        BaseType::Float64 => {
            let (wide, fit) = float64_value(value);
            slot(buf, offset, 8)?.copy_from_slice(&wide.to_le_bytes());
            Ok(fit)
        }
    }
}

/// Low 64 bits of the value's two's-complement form, plus whether the value
/// lies in `[min, max]` without a fractional part.
fn integer_bits(value: Scalar, min: i128, max: i128) -> (u64, Fit) {
    let (wide, exact) = match value.as_i128() {
        Some(wide) => (wide, true),
        None => {
            let float = value.as_f64();
            // `as` saturates and maps NaN to 0.
            (float as i128, float.is_finite() && float.fract() == 0.0)
        }
    };

    let fit = if exact && (min..=max).contains(&wide) {
        Fit::Exact
    } else {
        Fit::Truncated
    };
    (wide as u64, fit)
}

fn float32_value(value: Scalar) -> (f32, Fit) {
    match value {
        Scalar::F32(v) => (v, Fit::Exact),
        Scalar::F64(v) => {
            let narrow = v as f32;
            let fit = if v.is_finite() && narrow.is_infinite() {
                Fit::Truncated
            } else {
                Fit::Exact
            };
            (narrow, fit)
        }
        other => {
            let wide = other.as_i128().unwrap_or_default();
            let narrow = wide as f32;
            (narrow, round_trips(wide, f64::from(narrow)))
        }
    }
}

fn float64_value(value: Scalar) -> (f64, Fit) {
    match value {
        Scalar::F32(v) => (f64::from(v), Fit::Exact),
        Scalar::F64(v) => (v, Fit::Exact),
        other => {
            let wide = other.as_i128().unwrap_or_default();
            let float = wide as f64;
            (float, round_trips(wide, float))
        }
    }
}

fn round_trips(wide: i128, float: f64) -> Fit {
    if float as i128 == wide {
        Fit::Exact
    } else {
        Fit::Truncated
    }
}
