//! Field values handed to the encoder.

use serde_json::Value;

use crate::error::{Result, SchemaError};
use crate::types::{BaseType, TypeDescriptor};

/// One element value. The variant does not have to match the field's base
/// type; the encoder converts and reports values that do not fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    U64(u64),
    I64(i64),
    F32(f32),
    F64(f64),
    /// A single ASCII byte.
    Char(u8),
}

impl Scalar {
    /// The value as a wide integer, or `None` for floats.
    pub fn as_i128(self) -> Option<i128> {
        let wide = match self {
            Scalar::U8(v) | Scalar::Char(v) => i128::from(v),
            Scalar::I8(v) => i128::from(v),
            Scalar::U16(v) => i128::from(v),
            Scalar::I16(v) => i128::from(v),
            Scalar::U32(v) => i128::from(v),
            Scalar::I32(v) => i128::from(v),
            Scalar::U64(v) => i128::from(v),
            Scalar::I64(v) => i128::from(v),
            Scalar::F32(_) | Scalar::F64(_) => return None,
        };
        Some(wide)
    }

    /// The value as a double. Integers above 2^53 lose precision.
    pub fn as_f64(self) -> f64 {
        match self {
            Scalar::F32(v) => f64::from(v),
            Scalar::F64(v) => v,
            other => other.as_i128().unwrap_or_default() as f64,
        }
    }
}

macro_rules! scalar_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Scalar {
                fn from(v: $ty) -> Self {
                    Scalar::$variant(v)
                }
            }

            impl From<$ty> for FieldValue {
                fn from(v: $ty) -> Self {
                    FieldValue::Scalar(Scalar::$variant(v))
                }
            }
        )*
    };
}

scalar_from! {
    u8 => U8,
    i8 => I8,
    u16 => U16,
    i16 => I16,
    u32 => U32,
    i32 => I32,
    u64 => U64,
    i64 => I64,
    f32 => F32,
    f64 => F64,
}

/// The value of one field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Scalar(Scalar),
    Array(Vec<Scalar>),
    /// Contents of a `char[N]` field.
    Text(String),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    pub fn array<T: Into<Scalar>>(values: impl IntoIterator<Item = T>) -> Self {
        FieldValue::Array(values.into_iter().map(Into::into).collect())
    }

    /// Short name of the variant, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Scalar(_) => "scalar",
            FieldValue::Array(_) => "array",
            FieldValue::Text(_) => "text",
        }
    }

    /// Convert a JSON value for a field of the given type.
    ///
    /// Integers become `I64` (or `U64` above `i64::MAX`), other numbers `F64`;
    /// narrowing happens at encode time so out-of-range values get reported
    /// there instead of being rejected here.
    pub fn from_json(field: &str, desc: &TypeDescriptor, value: &Value) -> Result<Self> {
        if desc.is_string() {
            return match value {
                Value::String(text) => Ok(FieldValue::Text(text.clone())),
                other => Err(shape(field, format!("expected a string, got {other}"))),
            };
        }

        if desc.is_array() {
            let items = value
                .as_array()
                .ok_or_else(|| shape(field, format!("expected an array, got {value}")))?;
            let scalars = items
                .iter()
                .map(|item| scalar_from_json(field, desc.base, item))
                .collect::<Result<Vec<_>>>()?;
            return Ok(FieldValue::Array(scalars));
        }

        scalar_from_json(field, desc.base, value).map(FieldValue::Scalar)
    }
}

impl From<Scalar> for FieldValue {
    fn from(v: Scalar) -> Self {
        FieldValue::Scalar(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

fn scalar_from_json(field: &str, base: BaseType, value: &Value) -> Result<Scalar> {
    match value {
        Value::Number(number) => {
            if let Some(v) = number.as_i64() {
                Ok(Scalar::I64(v))
            } else if let Some(v) = number.as_u64() {
                Ok(Scalar::U64(v))
            } else if let Some(v) = number.as_f64() {
                Ok(Scalar::F64(v))
            } else {
                Err(shape(field, format!("unrepresentable number {number}")))
            }
        }
        Value::String(text) if base == BaseType::Char => {
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (None, _) => Ok(Scalar::Char(0)),
                (Some(c), None) if c.is_ascii() => Ok(Scalar::Char(c as u8)),
                _ => Err(shape(
                    field,
                    format!("expected a single ASCII character, got {text:?}"),
                )),
            }
        }
        other => Err(shape(field, format!("expected a number, got {other}"))),
    }
}

fn shape(field: &str, reason: String) -> SchemaError {
    SchemaError::ValueShape {
        field: field.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn json_integers_stay_wide() {
        let desc = TypeDescriptor::scalar(BaseType::UInt8);
        assert_eq!(
            FieldValue::from_json("x", &desc, &json!(300)).unwrap(),
            FieldValue::Scalar(Scalar::I64(300))
        );
        assert_eq!(
            FieldValue::from_json("x", &desc, &json!(u64::MAX)).unwrap(),
            FieldValue::Scalar(Scalar::U64(u64::MAX))
        );
        assert_eq!(
            FieldValue::from_json("x", &desc, &json!(1.5)).unwrap(),
            FieldValue::Scalar(Scalar::F64(1.5))
        );
    }

    #[test]
    fn json_arrays_and_strings() {
        let arr = TypeDescriptor::array(BaseType::UInt16, 2);
        assert_eq!(
            FieldValue::from_json("a", &arr, &json!([300, 65535])).unwrap(),
            FieldValue::Array(vec![Scalar::I64(300), Scalar::I64(65535)])
        );

        let text = TypeDescriptor::array(BaseType::Char, 4);
        assert_eq!(
            FieldValue::from_json("s", &text, &json!("AB")).unwrap(),
            FieldValue::text("AB")
        );
    }

    #[test]
    fn json_single_char_field() {
        let desc = TypeDescriptor::scalar(BaseType::Char);
        assert_eq!(
            FieldValue::from_json("c", &desc, &json!("Z")).unwrap(),
            FieldValue::Scalar(Scalar::Char(b'Z'))
        );
        assert_eq!(
            FieldValue::from_json("c", &desc, &json!(65)).unwrap(),
            FieldValue::Scalar(Scalar::I64(65))
        );
        assert!(FieldValue::from_json("c", &desc, &json!("ZZ")).is_err());
    }

    #[test]
    fn json_shape_mismatches_are_rejected() {
        let scalar = TypeDescriptor::scalar(BaseType::Int32);
        let arr = TypeDescriptor::array(BaseType::Int32, 3);
        let text = TypeDescriptor::array(BaseType::Char, 3);

        assert!(matches!(
            FieldValue::from_json("f", &scalar, &json!("12")),
            Err(SchemaError::ValueShape { .. })
        ));
        assert!(FieldValue::from_json("f", &arr, &json!(12)).is_err());
        assert!(FieldValue::from_json("f", &arr, &json!([1, "2", 3])).is_err());
        assert!(FieldValue::from_json("f", &text, &json!([65, 66])).is_err());
    }

    #[test]
    fn scalar_widening() {
        assert_eq!(Scalar::I8(-3).as_i128(), Some(-3));
        assert_eq!(Scalar::U64(u64::MAX).as_i128(), Some(i128::from(u64::MAX)));
        assert_eq!(Scalar::F32(2.5).as_i128(), None);
        assert_eq!(Scalar::U16(7).as_f64(), 7.0);
    }

    #[test]
    fn conversions_into_field_values() {
        assert_eq!(FieldValue::from(7u8), FieldValue::Scalar(Scalar::U8(7)));
        assert_eq!(FieldValue::from("hi"), FieldValue::Text("hi".to_string()));
        assert_eq!(
            FieldValue::array([1u16, 2]),
            FieldValue::Array(vec![Scalar::U16(1), Scalar::U16(2)])
        );
        assert_eq!(FieldValue::text("x").kind(), "text");
    }
}
