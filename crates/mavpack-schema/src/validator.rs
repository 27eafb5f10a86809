use jsonschema::Validator;
use serde_json::{json, Value};

use crate::error::{Result, SchemaError};

/// JSON Schema for a definition document.
pub(crate) fn document_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "type": "object",
        "required": ["messages"],
        "properties": {
            "messages": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["name", "id", "fields"],
                    "properties": {
                        "name": { "type": "string", "minLength": 1 },
                        "id": { "type": "integer", "minimum": 0, "maximum": 16777215 },
                        "crc_extra": { "type": "integer", "minimum": 0, "maximum": 255 },
                        "description": { "type": "string" },
                        "fields": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "required": ["name", "type"],
                                "properties": {
                                    "name": { "type": "string", "minLength": 1 },
                                    "type": { "type": "string", "minLength": 1 },
                                    "extension": { "type": "boolean" },
                                    "description": { "type": "string" }
                                }
                            }
                        }
                    }
                }
            }
        }
    })
}

/// Close every object schema so unknown keys fail validation.
pub(crate) fn apply_strict_mode(value: &mut Value) {
    if let Value::Object(map) = value {
        if map.get("type") == Some(&Value::String("object".to_string()))
            && !map.contains_key("additionalProperties")
        {
            map.insert("additionalProperties".to_string(), Value::Bool(false));
        }
        if let Some(Value::Object(properties)) = map.get_mut("properties") {
            for child in properties.values_mut() {
                apply_strict_mode(child);
            }
        }
        if let Some(items) = map.get_mut("items") {
            apply_strict_mode(items);
        }
    }
}

pub(crate) fn compile(strict_mode: bool) -> Result<Validator> {
    let mut schema = document_schema();
    if strict_mode {
        apply_strict_mode(&mut schema);
    }
    jsonschema::validator_for(&schema).map_err(|err| SchemaError::CompileFailed(err.to_string()))
}

pub(crate) fn validate_document(document: &Value, validator: &Validator) -> Result<()> {
    let mut errors = validator.iter_errors(document);
    if let Some(first) = errors.next() {
        let mut message = first.to_string();
        for err in errors.take(3) {
            message.push_str("; ");
            message.push_str(&err.to_string());
        }
        return Err(SchemaError::ValidationFailed(message));
    }

    Ok(())
}
