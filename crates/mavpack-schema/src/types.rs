//! Type tags as they appear in message definitions.
//!
//! A tag is a C-style base type with an optional array suffix: `uint16_t`,
//! `float[4]`, `char[16]`. A `char` array is a fixed-capacity ASCII string,
//! not a byte array.

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SchemaError};
use crate::message::MAX_PAYLOAD_LEN;

/// The closed set of wire types a field element can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    UInt8,
    Int8,
    UInt16,
    Int16,
    UInt32,
    Int32,
    UInt64,
    Int64,
    Float32,
    Float64,
    Char,
}

impl BaseType {
    /// Encoded width of one element in bytes.
    pub const fn width(self) -> usize {
        match self {
            BaseType::UInt8 | BaseType::Int8 | BaseType::Char => 1,
            BaseType::UInt16 | BaseType::Int16 => 2,
            BaseType::UInt32 | BaseType::Int32 | BaseType::Float32 => 4,
            BaseType::UInt64 | BaseType::Int64 | BaseType::Float64 => 8,
        }
    }

    /// The canonical C tag for this type.
    pub const fn tag(self) -> &'static str {
        match self {
            BaseType::UInt8 => "uint8_t",
            BaseType::Int8 => "int8_t",
            BaseType::UInt16 => "uint16_t",
            BaseType::Int16 => "int16_t",
            BaseType::UInt32 => "uint32_t",
            BaseType::Int32 => "int32_t",
            BaseType::UInt64 => "uint64_t",
            BaseType::Int64 => "int64_t",
            BaseType::Float32 => "float",
            BaseType::Float64 => "double",
            BaseType::Char => "char",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        let base = match tag {
            "uint8_t" | "uint8_t_mavlink_version" => BaseType::UInt8,
            "int8_t" => BaseType::Int8,
            "uint16_t" => BaseType::UInt16,
            "int16_t" => BaseType::Int16,
            "uint32_t" => BaseType::UInt32,
            "int32_t" => BaseType::Int32,
            "uint64_t" => BaseType::UInt64,
            "int64_t" => BaseType::Int64,
            "float" => BaseType::Float32,
            "double" => BaseType::Float64,
            "char" => BaseType::Char,
            _ => return None,
        };
        Some(base)
    }
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A resolved type tag: base type plus element count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeDescriptor {
    pub base: BaseType,
    /// 1 for scalars, N for `T[N]`.
    pub arity: usize,
}

impl TypeDescriptor {
    pub const fn scalar(base: BaseType) -> Self {
        Self { base, arity: 1 }
    }

    pub const fn array(base: BaseType, arity: usize) -> Self {
        Self { base, arity }
    }

    /// Parse a tag such as `uint16_t` or `char[16]`.
    pub fn parse(tag: &str) -> Result<Self> {
        let (base_tag, arity) = match tag.split_once('[') {
            None => (tag, 1),
            Some((base_tag, rest)) => {
                let digits = rest.strip_suffix(']').ok_or(SchemaError::MalformedTypeTag {
                    tag: tag.to_string(),
                    reason: "array suffix is not closed by ']'",
                })?;
                if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(SchemaError::MalformedTypeTag {
                        tag: tag.to_string(),
                        reason: "array length is not a decimal literal",
                    });
                }
                let arity: usize = digits.parse().map_err(|_| SchemaError::MalformedTypeTag {
                    tag: tag.to_string(),
                    reason: "array length does not fit a usize",
                })?;
                if arity == 0 {
                    return Err(SchemaError::MalformedTypeTag {
                        tag: tag.to_string(),
                        reason: "array length must be positive",
                    });
                }
                if arity > MAX_PAYLOAD_LEN {
                    return Err(SchemaError::MalformedTypeTag {
                        tag: tag.to_string(),
                        reason: "array length exceeds the largest payload",
                    });
                }
                (base_tag, arity)
            }
        };

        let base = BaseType::from_tag(base_tag)
            .ok_or_else(|| SchemaError::UnknownBaseType(base_tag.to_string()))?;
        Ok(Self { base, arity })
    }

    /// True for `char[N]` with N > 1.
    pub const fn is_string(&self) -> bool {
        matches!(self.base, BaseType::Char) && self.arity > 1
    }

    pub const fn is_array(&self) -> bool {
        self.arity > 1
    }

    /// Encoded width of the whole field in bytes, saturating for
    /// descriptors built directly with an oversized arity.
    pub const fn width(&self) -> usize {
        self.base.width().saturating_mul(self.arity)
    }
}

impl FromStr for TypeDescriptor {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.arity == 1 {
            write!(f, "{}", self.base)
        } else {
            write!(f, "{}[{}]", self.base, self.arity)
        }
    }
}

/// Width in bytes of the field described by `tag`.
pub fn sizeof(tag: &str) -> Result<usize> {
    TypeDescriptor::parse(tag).map(|desc| desc.width())
}
