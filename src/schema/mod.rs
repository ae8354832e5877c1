//! Schema definition and registration
//!
//! Provides the property registry:
//! - Field declaration via [`SchemaBuilder`] (explicit ordinals and keys)
//! - Idempotent, memoized registration per schema type
//! - Ordinal-indexed [`PropertyTable`]s with key lookup
//! - Post-registration metadata accessors
//! - The explicit [`EnumDescriptor`] enumeration capability

pub mod builder;
pub mod enums;
pub mod error;
pub mod metadata;
pub mod property;
pub mod registry;
pub mod table;

pub use builder::SchemaBuilder;
pub use enums::{EnumDescriptor, EnumError, EnumVariant};
pub use error::{MetadataError, RegistrationError};
pub use metadata::{
    get_metadata, has_metadata, reset_metadata_validator, set_description, set_metadata,
    set_metadata_validator,
};
pub use property::{Cardinality, DefaultContext, FieldType, Property, PropertySpec};
pub use registry::{clear_reflection_hook, lookup, register, set_reflection_hook, Schema};
pub use table::PropertyTable;
