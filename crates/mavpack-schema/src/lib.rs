//! Message definitions for MAVLink v2 packing.
//!
//! Resolves field type tags, holds message definitions loaded from JSON
//! documents, and binds definitions to field values. The packer consumes
//! messages through the [`MessageSource`] trait.

pub mod config;
pub mod error;
pub mod message;
pub mod registry;
pub mod types;
pub mod validator;
pub mod value;

pub use config::RegistryConfig;
pub use error::{Result, SchemaError};
pub use message::{
    FieldDescriptor, FieldSlot, Layout, Message, MessageDefinition, MessageSource,
    MAX_MESSAGE_ID, MAX_PAYLOAD_LEN,
};
pub use registry::DefinitionRegistry;
pub use types::{sizeof, BaseType, TypeDescriptor};
pub use value::{FieldValue, Scalar};
