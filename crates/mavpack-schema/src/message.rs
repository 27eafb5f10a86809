use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, SchemaError};
use crate::types::TypeDescriptor;
use crate::value::FieldValue;

/// Largest payload the one-byte length field can describe.
pub const MAX_PAYLOAD_LEN: usize = 255;

/// Largest message id the 24-bit header field can carry.
pub const MAX_MESSAGE_ID: u32 = 0x00FF_FFFF;

/// One entry of a message's ordered field list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub type_tag: String,
    /// Extension fields are not written by the base packer.
    #[serde(default)]
    pub extension: bool,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, type_tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_tag: type_tag.into(),
            extension: false,
        }
    }

    pub fn extension(name: impl Into<String>, type_tag: impl Into<String>) -> Self {
        Self {
            extension: true,
            ..Self::new(name, type_tag)
        }
    }
}

/// Placement of one non-extension field inside the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSlot {
    pub name: String,
    pub descriptor: TypeDescriptor,
    /// Offset from the start of the payload.
    pub offset: usize,
}

/// Payload layout derived from a field list.
///
/// Offsets follow declaration order; extension fields take no space.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Layout {
    pub slots: Vec<FieldSlot>,
    pub payload_length: usize,
}

impl Layout {
    /// Resolve every non-extension field and assign running offsets.
    pub fn from_fields(fields: &[FieldDescriptor]) -> Result<Self> {
        let mut slots = Vec::with_capacity(fields.len());
        let mut offset = 0usize;

        for field in fields {
            let descriptor = TypeDescriptor::parse(&field.type_tag)?;
            if field.extension {
                continue;
            }
            slots.push(FieldSlot {
                name: field.name.clone(),
                descriptor,
                offset,
            });
            offset = offset
                .checked_add(descriptor.width())
                .ok_or(SchemaError::PayloadTooLarge {
                    size: usize::MAX,
                    max: MAX_PAYLOAD_LEN,
                })?;
        }

        Ok(Self {
            slots,
            payload_length: offset,
        })
    }

    pub fn slot(&self, name: &str) -> Option<&FieldSlot> {
        self.slots.iter().find(|slot| slot.name == name)
    }
}

/// A validated message definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDefinition {
    name: String,
    id: u32,
    crc_extra: Option<u8>,
    fields: Vec<FieldDescriptor>,
    layout: Layout,
}

impl MessageDefinition {
    /// Build a definition, resolving every type tag up front.
    pub fn new(
        name: impl Into<String>,
        id: u32,
        crc_extra: Option<u8>,
        fields: Vec<FieldDescriptor>,
    ) -> Result<Self> {
        let name = name.into();
        if id > MAX_MESSAGE_ID {
            return Err(SchemaError::MessageIdOutOfRange(id));
        }

        let mut seen = HashSet::with_capacity(fields.len());
        for field in &fields {
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateField {
                    message: name,
                    field: field.name.clone(),
                });
            }
        }

        let layout = Layout::from_fields(&fields)?;
        if layout.payload_length > MAX_PAYLOAD_LEN {
            return Err(SchemaError::PayloadTooLarge {
                size: layout.payload_length,
                max: MAX_PAYLOAD_LEN,
            });
        }

        Ok(Self {
            name,
            id,
            crc_extra,
            fields,
            layout,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn crc_extra(&self) -> Option<u8> {
        self.crc_extra
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Sum of the widths of all non-extension fields.
    pub fn payload_length(&self) -> usize {
        self.layout.payload_length
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }
}

/// What the packer needs to know about a message.
pub trait MessageSource {
    /// Ordered field list, extension fields included.
    fn fields(&self) -> &[FieldDescriptor];

    /// Declared non-extension payload length.
    fn payload_length(&self) -> usize;

    fn system_id(&self) -> u8;

    fn component_id(&self) -> u8;

    fn message_id(&self) -> u32;

    fn value(&self, name: &str) -> Option<&FieldValue>;

    /// Per-message checksum seed, when the definition carries one.
    fn crc_extra(&self) -> Option<u8> {
        None
    }

    /// Name used in logs and errors.
    fn name(&self) -> &str {
        "<anonymous>"
    }
}

/// A definition bound to sender identity and field values.
#[derive(Debug, Clone)]
pub struct Message {
    definition: Arc<MessageDefinition>,
    system_id: u8,
    component_id: u8,
    values: HashMap<String, FieldValue>,
}

impl Message {
    pub fn new(definition: Arc<MessageDefinition>, system_id: u8, component_id: u8) -> Self {
        Self {
            definition,
            system_id,
            component_id,
            values: HashMap::new(),
        }
    }

    /// Build a message from a JSON object keyed by field name.
    pub fn from_json(
        definition: Arc<MessageDefinition>,
        system_id: u8,
        component_id: u8,
        values: &Value,
    ) -> Result<Self> {
        let object = values.as_object().ok_or_else(|| SchemaError::ValueShape {
            field: definition.name().to_string(),
            reason: format!("expected a JSON object of field values, got {values}"),
        })?;

        let mut message = Self::new(definition, system_id, component_id);
        for (name, raw) in object {
            let field = message.definition.field(name).ok_or_else(|| SchemaError::UnknownField {
                message: message.definition.name().to_string(),
                field: name.clone(),
            })?;
            let descriptor = TypeDescriptor::parse(&field.type_tag)?;
            let value = FieldValue::from_json(name, &descriptor, raw)?;
            message.values.insert(name.clone(), value);
        }
        Ok(message)
    }

    /// Set a field value; unknown names are rejected.
    pub fn set(&mut self, name: &str, value: impl Into<FieldValue>) -> Result<&mut Self> {
        if self.definition.field(name).is_none() {
            return Err(SchemaError::UnknownField {
                message: self.definition.name().to_string(),
                field: name.to_string(),
            });
        }
        self.values.insert(name.to_string(), value.into());
        Ok(self)
    }

    /// Builder-style `set`.
    pub fn with(mut self, name: &str, value: impl Into<FieldValue>) -> Result<Self> {
        self.set(name, value)?;
        Ok(self)
    }

    pub fn definition(&self) -> &MessageDefinition {
        &self.definition
    }
}

impl MessageSource for Message {
    fn fields(&self) -> &[FieldDescriptor] {
        self.definition.fields()
    }

    fn payload_length(&self) -> usize {
        self.definition.payload_length()
    }

    fn system_id(&self) -> u8 {
        self.system_id
    }

    fn component_id(&self) -> u8 {
        self.component_id
    }

    fn message_id(&self) -> u32 {
        self.definition.id()
    }

    fn value(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    fn crc_extra(&self) -> Option<u8> {
        self.definition.crc_extra()
    }

    fn name(&self) -> &str {
        self.definition.name()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::value::Scalar;

    fn attitude_fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::new("time_boot_ms", "uint32_t"),
            FieldDescriptor::new("roll", "float"),
            FieldDescriptor::new("label", "char[6]"),
            FieldDescriptor::extension("quality", "uint8_t"),
            FieldDescriptor::new("flags", "uint16_t[2]"),
        ]
    }

    #[test]
    fn oversized_arrays_are_schema_errors() {
        let err = MessageDefinition::new(
            "X",
            1,
            None,
            vec![FieldDescriptor::new("a", "uint64_t[2305843009213693952]")],
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::MalformedTypeTag { .. }));

        let err = Layout::from_fields(&[
            FieldDescriptor::new("a", "uint8_t[18446744073709551615]"),
            FieldDescriptor::new("b", "uint8_t[2]"),
        ])
        .unwrap_err();
        assert!(matches!(err, SchemaError::MalformedTypeTag { .. }));
    }

    #[test]
    fn wide_fields_sum_past_payload_limit() {
        let fields: Vec<FieldDescriptor> = (0..3)
            .map(|i| FieldDescriptor::new(format!("f{i}"), "double[32]"))
            .collect();
        let layout = Layout::from_fields(&fields).unwrap();
        assert_eq!(layout.payload_length, 768);
        assert!(matches!(
            MessageDefinition::new("WIDE", 5, None, fields),
            Err(SchemaError::PayloadTooLarge { size: 768, .. })
        ));
    }

    #[test]
    fn layout_skips_extensions() {
        let layout = Layout::from_fields(&attitude_fields()).unwrap();
        let offsets: Vec<(&str, usize)> = layout
            .slots
            .iter()
            .map(|slot| (slot.name.as_str(), slot.offset))
            .collect();
        assert_eq!(
            offsets,
            vec![("time_boot_ms", 0), ("roll", 4), ("label", 8), ("flags", 14)]
        );
        assert_eq!(layout.payload_length, 18);
        assert!(layout.slot("quality").is_none());
    }

    #[test]
    fn layout_rejects_bad_extension_tag() {
        let fields = vec![FieldDescriptor::extension("x", "uint8_t[")];
        assert!(matches!(
            Layout::from_fields(&fields),
            Err(SchemaError::MalformedTypeTag { .. })
        ));
    }

    #[test]
    fn definition_validates_ids_and_names() {
        assert!(matches!(
            MessageDefinition::new("BIG", MAX_MESSAGE_ID + 1, None, vec![]),
            Err(SchemaError::MessageIdOutOfRange(_))
        ));

        let dup = vec![
            FieldDescriptor::new("a", "uint8_t"),
            FieldDescriptor::new("a", "uint16_t"),
        ];
        assert!(matches!(
            MessageDefinition::new("DUP", 1, None, dup),
            Err(SchemaError::DuplicateField { .. })
        ));
    }

    #[test]
    fn definition_rejects_oversized_payload() {
        let fields = vec![
            FieldDescriptor::new("a", "uint8_t[200]"),
            FieldDescriptor::new("b", "uint8_t[56]"),
        ];
        assert!(matches!(
            MessageDefinition::new("HUGE", 1, None, fields),
            Err(SchemaError::PayloadTooLarge { size: 256, .. })
        ));
    }

    #[test]
    fn message_set_and_lookup() {
        let def = Arc::new(MessageDefinition::new("ATT", 30, Some(39), attitude_fields()).unwrap());
        let msg = Message::new(def, 1, 2)
            .with("time_boot_ms", 1000u32)
            .unwrap()
            .with("label", "abc")
            .unwrap();

        assert_eq!(msg.system_id(), 1);
        assert_eq!(msg.component_id(), 2);
        assert_eq!(msg.message_id(), 30);
        assert_eq!(msg.crc_extra(), Some(39));
        assert_eq!(msg.payload_length(), 18);
        assert_eq!(
            msg.value("time_boot_ms"),
            Some(&FieldValue::Scalar(Scalar::U32(1000)))
        );
        assert!(msg.value("roll").is_none());
    }

    #[test]
    fn message_set_rejects_unknown_field() {
        let def = Arc::new(MessageDefinition::new("ATT", 30, None, attitude_fields()).unwrap());
        let mut msg = Message::new(def, 1, 1);
        assert!(matches!(
            msg.set("yaw", 1.0f32),
            Err(SchemaError::UnknownField { .. })
        ));
    }

    #[test]
    fn message_from_json() {
        let def = Arc::new(MessageDefinition::new("ATT", 30, None, attitude_fields()).unwrap());
        let msg = Message::from_json(
            def.clone(),
            1,
            1,
            &json!({"time_boot_ms": 5, "label": "hi", "flags": [1, 2]}),
        )
        .unwrap();
        assert_eq!(msg.value("label"), Some(&FieldValue::text("hi")));
        assert_eq!(
            msg.value("flags"),
            Some(&FieldValue::Array(vec![Scalar::I64(1), Scalar::I64(2)]))
        );

        assert!(Message::from_json(def.clone(), 1, 1, &json!({"nope": 1})).is_err());
        assert!(Message::from_json(def, 1, 1, &json!([1, 2])).is_err());
    }
}
