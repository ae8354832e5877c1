//! Schema Forge SDK - Schema-driven object modelling for Rust
//!
//! Provides unified building blocks for:
//! - Declarative field definitions collected into ordinal-indexed tables
//! - Idempotent schema registration with inheritance and conflict checks
//! - Factory-built model types with lazy default resolution and
//!   behavioral mixing
//! - Tuple, keyed-object and JSON views on instances
//! - Byte encoding plus base64/hex text rendering

pub mod factory;
pub mod schema;
pub mod serialize;
pub mod values;

// Re-export commonly used types
pub use schema::{
    Cardinality, DefaultContext, EnumDescriptor, EnumVariant, FieldType, MetadataError, Property,
    PropertySpec, PropertyTable, RegistrationError, Schema, SchemaBuilder,
};
pub use schema::{
    get_metadata, has_metadata, register, set_description, set_metadata, set_metadata_validator,
};

pub use factory::{Behavior, Factory, FactoryError, Forge, Instance, ModelType, is_factory_built};

pub use serialize::{ConversionError, JSONSerializer, Serializer, TextEncoding};

pub use values::Value;
