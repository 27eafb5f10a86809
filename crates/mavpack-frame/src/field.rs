//! Encodes one field (scalar, scalar array or fixed-capacity string).

use mavpack_schema::{BaseType, FieldValue, Scalar, TypeDescriptor};

use crate::error::{FrameError, Result};
use crate::outcome::DeviationKind;
use crate::scalar::{encode_scalar, slot, Fit};

/// Encode `value` for a field of type `desc` starting at `start`.
///
/// Returns every lossy write made along the way; an empty list means the
/// value was written exactly.
pub fn encode_field(
    name: &str,
    value: &FieldValue,
    buf: &mut [u8],
    start: usize,
    desc: TypeDescriptor,
) -> Result<Vec<DeviationKind>> {
    let mut deviations = Vec::new();

    if desc.is_string() {
        let FieldValue::Text(text) = value else {
            return Err(mismatch(name, "text", value));
        };
        encode_text(text, buf, start, desc.arity, &mut deviations)?;
        return Ok(deviations);
    }

    if !desc.is_array() {
        let scalar = match value {
            FieldValue::Scalar(scalar) => *scalar,
            FieldValue::Text(text) if desc.base == BaseType::Char => {
                single_char(text, &mut deviations)
            }
            other => return Err(mismatch(name, "scalar", other)),
        };
        if encode_scalar(buf, start, desc.base, scalar)? == Fit::Truncated {
            deviations.push(DeviationKind::NumericTruncated {
                base: desc.base,
                index: 0,
            });
        }
        return Ok(deviations);
    }

    let FieldValue::Array(items) = value else {
        return Err(mismatch(name, "array", value));
    };
    if items.len() < desc.arity {
        return Err(FrameError::ArityMismatch {
            field: name.to_string(),
            expected: desc.arity,
            actual: items.len(),
        });
    }
    if items.len() > desc.arity {
        deviations.push(DeviationKind::ArrayTruncated {
            arity: desc.arity,
            length: items.len(),
        });
    }

    let width = desc.base.width();
    for (index, item) in items.iter().take(desc.arity).enumerate() {
        let offset = start + index * width;
        if encode_scalar(buf, offset, desc.base, *item)? == Fit::Truncated {
            deviations.push(DeviationKind::NumericTruncated {
                base: desc.base,
                index,
            });
        }
    }
    Ok(deviations)
}

/// Parse `type_tag` and encode `value` with it.
pub fn encode_tagged(
    name: &str,
    value: &FieldValue,
    buf: &mut [u8],
    start: usize,
    type_tag: &str,
) -> Result<Vec<DeviationKind>> {
    let desc = TypeDescriptor::parse(type_tag)?;
    encode_field(name, value, buf, start, desc)
}

/// Write up to `capacity` characters, then zero-fill the rest of the field.
fn encode_text(
    text: &str,
    buf: &mut [u8],
    start: usize,
    capacity: usize,
    deviations: &mut Vec<DeviationKind>,
) -> Result<()> {
    let dst = slot(buf, start, capacity)?;

    let mut written = 0;
    let mut lossy = false;
    for (byte, ch) in dst.iter_mut().zip(text.chars()) {
        lossy |= !ch.is_ascii();
        *byte = ascii_byte(ch);
        written += 1;
    }
    dst[written..].fill(0);

    if lossy {
        deviations.push(DeviationKind::NonAsciiText);
    }
    let length = text.chars().count();
    if length > capacity {
        deviations.push(DeviationKind::TextTruncated { capacity, length });
    }
    Ok(())
}

fn single_char(text: &str, deviations: &mut Vec<DeviationKind>) -> Scalar {
    let mut chars = text.chars();
    let Some(first) = chars.next() else {
        return Scalar::Char(0);
    };
    if !first.is_ascii() {
        deviations.push(DeviationKind::NonAsciiText);
    }
    let extra = chars.count();
    if extra > 0 {
        deviations.push(DeviationKind::TextTruncated {
            capacity: 1,
            length: extra + 1,
        });
    }
    Scalar::Char(ascii_byte(first))
}

/// Low byte of the code point.
fn ascii_byte(ch: char) -> u8 {
    (u32::from(ch) & 0xFF) as u8
}

fn mismatch(name: &str, expected: &'static str, found: &FieldValue) -> FrameError {
    FrameError::ShapeMismatch {
        field: name.to_string(),
        expected,
        found: found.kind(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(tag: &str, value: FieldValue, width: usize) -> (Vec<u8>, Vec<DeviationKind>) {
        let mut buf = vec![0xEEu8; width];
        let deviations = encode_tagged("f", &value, &mut buf, 0, tag).unwrap();
        (buf, deviations)
    }

    #[test]
    fn short_string_is_zero_padded() {
        let (buf, deviations) = encode("char[4]", FieldValue::text("AB"), 4);
        assert_eq!(buf, vec![0x41, 0x42, 0x00, 0x00]);
        assert!(deviations.is_empty());
    }

    #[test]
    fn exact_string_has_no_padding() {
        let (buf, deviations) = encode("char[4]", FieldValue::text("ABCD"), 4);
        assert_eq!(buf, b"ABCD".to_vec());
        assert!(deviations.is_empty());
    }

    #[test]
    fn long_string_is_cut_at_capacity() {
        let (buf, deviations) = encode("char[4]", FieldValue::text("ABCDEFG"), 4);
        assert_eq!(buf, b"ABCD".to_vec());
        assert_eq!(
            deviations,
            vec![DeviationKind::TextTruncated {
                capacity: 4,
                length: 7
            }]
        );
    }

    #[test]
    fn empty_string_is_all_zero() {
        let (buf, _) = encode("char[3]", FieldValue::text(""), 3);
        assert_eq!(buf, vec![0, 0, 0]);
    }

    #[test]
    fn non_ascii_text_reported() {
        let (buf, deviations) = encode("char[3]", FieldValue::text("é"), 3);
        assert_eq!(buf, vec![0xE9, 0, 0]);
        assert_eq!(deviations, vec![DeviationKind::NonAsciiText]);
    }

    #[test]
    fn string_field_stays_inside_its_slot() {
        let mut buf = vec![0xEEu8; 6];
        encode_tagged("f", &FieldValue::text("hi"), &mut buf, 1, "char[3]").unwrap();
        assert_eq!(buf, vec![0xEE, b'h', b'i', 0x00, 0xEE, 0xEE]);
    }

    #[test]
    fn u16_array_in_source_order() {
        let (buf, deviations) = encode("uint16_t[2]", FieldValue::array([300u16, 65535]), 4);
        assert_eq!(buf, vec![0x2C, 0x01, 0xFF, 0xFF]);
        assert!(deviations.is_empty());
    }

    #[test]
    fn array_elements_at_element_width() {
        let (buf, _) = encode("int32_t[3]", FieldValue::array([1i32, -1, 2]), 12);
        assert_eq!(
            buf,
            vec![1, 0, 0, 0, 0xFF, 0xFF, 0xFF, 0xFF, 2, 0, 0, 0]
        );
    }

    #[test]
    fn array_element_overflow_reports_index() {
        let (buf, deviations) = encode("uint8_t[3]", FieldValue::array([1i64, 256, 3]), 3);
        assert_eq!(buf, vec![1, 0, 3]);
        assert_eq!(
            deviations,
            vec![DeviationKind::NumericTruncated {
                base: BaseType::UInt8,
                index: 1
            }]
        );
    }

    #[test]
    fn long_array_is_cut_at_arity() {
        let (buf, deviations) = encode("uint8_t[2]", FieldValue::array([1u8, 2, 3]), 2);
        assert_eq!(buf, vec![1, 2]);
        assert_eq!(
            deviations,
            vec![DeviationKind::ArrayTruncated {
                arity: 2,
                length: 3
            }]
        );
    }

    #[test]
    fn short_array_is_an_error() {
        let mut buf = vec![0u8; 4];
        let err = encode_tagged("f", &FieldValue::array([1u8]), &mut buf, 0, "uint8_t[4]")
            .unwrap_err();
        assert!(matches!(
            err,
            FrameError::ArityMismatch {
                expected: 4,
                actual: 1,
                ..
            }
        ));
    }

    #[test]
    fn shape_mismatches_are_errors() {
        let mut buf = vec![0u8; 8];
        assert!(matches!(
            encode_tagged("f", &FieldValue::array([1u8]), &mut buf, 0, "uint8_t"),
            Err(FrameError::ShapeMismatch { expected: "scalar", found: "array", .. })
        ));
        assert!(matches!(
            encode_tagged("f", &FieldValue::from(1u8), &mut buf, 0, "char[4]"),
            Err(FrameError::ShapeMismatch { expected: "text", .. })
        ));
        assert!(matches!(
            encode_tagged("f", &FieldValue::text("ab"), &mut buf, 0, "uint8_t[2]"),
            Err(FrameError::ShapeMismatch { expected: "array", .. })
        ));
    }

    #[test]
    fn single_char_from_text() {
        let (buf, deviations) = encode("char", FieldValue::text("Z"), 1);
        assert_eq!(buf, vec![b'Z']);
        assert!(deviations.is_empty());

        let (buf, deviations) = encode("char", FieldValue::text("XY"), 1);
        assert_eq!(buf, vec![b'X']);
        assert_eq!(
            deviations,
            vec![DeviationKind::TextTruncated {
                capacity: 1,
                length: 2
            }]
        );
    }

    #[test]
    fn bad_tag_is_schema_error() {
        let mut buf = vec![0u8; 4];
        assert!(matches!(
            encode_tagged("f", &FieldValue::from(1u8), &mut buf, 0, "uint8_t[x]"),
            Err(FrameError::Schema(_))
        ));
    }

    #[test]
    fn field_past_buffer_end_fails() {
        let mut buf = vec![0u8; 4];
        assert!(matches!(
            encode_tagged("f", &FieldValue::text("abc"), &mut buf, 2, "char[4]"),
            Err(FrameError::OutOfBounds { .. })
        ));
        assert!(matches!(
            encode_tagged("f", &FieldValue::array([1u16, 2]), &mut buf, 2, "uint16_t[2]"),
            Err(FrameError::OutOfBounds { .. })
        ));
    }
}
