//! Error types for schema registration and metadata access

use thiserror::Error;

/// Errors raised while building or registering a property table
///
/// All of these are fatal to the schema type: nothing is cached on failure
/// and a retry fails identically.
#[derive(Error, Debug)]
pub enum RegistrationError {
    /// The same ordinal was declared twice in one schema
    #[error("schema {schema}: ordinal {id} declared twice")]
    DuplicateOrdinal { schema: String, id: usize },

    /// The same field key was declared twice in one schema
    #[error("schema {schema}: property key {key} declared twice")]
    DuplicateKey { schema: String, key: String },

    /// The ordinal range has a hole
    #[error("schema {schema}: missing property at ordinal {id}")]
    MissingOrdinal { schema: String, id: usize },

    /// A field key does not match the identifier pattern
    #[error("schema {schema}: invalid property key {key:?}")]
    InvalidKey { schema: String, key: String },

    /// A key from the base schema was re-declared under a different ordinal
    #[error(
        "schema {schema}: property {key} conflicts with base ordinal {base_id} (declared as {id})"
    )]
    OrdinalConflict {
        schema: String,
        key: String,
        base_id: usize,
        id: usize,
    },

    /// An ordinal already bound to a base property was reused for a new key
    #[error("schema {schema}: ordinal {id} is already bound to base property {base_key}")]
    OrdinalReuse {
        schema: String,
        id: usize,
        base_key: String,
    },

    /// A key from the base schema was re-declared with a different type
    #[error("schema {schema}: property {key} re-declared with a different type")]
    TypeConflict { schema: String, key: String },
}

/// Errors raised by the metadata accessors
///
/// Local to the single call; the property table is never corrupted.
#[derive(Error, Debug)]
pub enum MetadataError {
    /// The field key is not part of the table
    #[error("property key {key} was not found")]
    UnknownProperty { key: String },

    /// The metadata key collides with a structural property field
    #[error("cannot replace key {key}")]
    ReservedKey { key: String },

    /// The metadata key is not set on the property
    #[error("metadata key {key} is not set on property {property}")]
    MissingMetadata { property: String, key: String },

    /// The pluggable validation hook rejected the write
    #[error("metadata validation failed: {0}")]
    Validation(anyhow::Error),
}
