/// Errors raised while resolving type tags, loading definitions or building messages.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// The type tag has an unparseable array suffix or a zero arity.
    #[error("malformed type tag {tag:?}: {reason}")]
    MalformedTypeTag { tag: String, reason: &'static str },

    /// The base part of the type tag names no known wire type.
    #[error("unknown base type {0:?}")]
    UnknownBaseType(String),

    /// The declared payload length disagrees with the field list.
    #[error("message {message}: declared payload length {declared}, fields sum to {computed}")]
    PayloadLengthMismatch {
        message: String,
        declared: usize,
        computed: usize,
    },

    /// The payload does not fit the one-byte length field of the header.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The message id does not fit the 24-bit header field.
    #[error("message id {0} exceeds 24 bits")]
    MessageIdOutOfRange(u32),

    /// Two fields of one message share a name.
    #[error("message {message}: duplicate field {field:?}")]
    DuplicateField { message: String, field: String },

    /// A value was supplied for a field the message does not declare.
    #[error("message {message} has no field {field:?}")]
    UnknownField { message: String, field: String },

    /// A JSON value cannot be converted for the field's type.
    #[error("field {field}: {reason}")]
    ValueShape { field: String, reason: String },

    /// No definition is registered under the given name or id.
    #[error("unknown message {0}")]
    UnknownMessage(String),

    /// A message name or id is registered twice.
    #[error("message {0} is already registered")]
    AlreadyRegistered(String),

    /// A definition document could not be loaded.
    #[error("failed to load definitions: {0}")]
    LoadFailed(String),

    /// The embedded document schema could not be compiled.
    #[error("failed to compile document schema: {0}")]
    CompileFailed(String),

    /// The definition document does not match the expected shape.
    #[error("definition document is invalid: {0}")]
    ValidationFailed(String),

    /// The document is not valid JSON or does not deserialize.
    #[error("definition document is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SchemaError>;
