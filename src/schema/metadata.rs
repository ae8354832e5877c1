//! Metadata accessors
//!
//! Auxiliary per-field metadata may be read and written after registration.
//! Structural keys are off-limits, unknown field keys fault, and a
//! pluggable validation hook runs before every write. The default hook
//! checks that `description` values are strings; hosts swap it with
//! [`set_metadata_validator`] to add domain-specific rules.

use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;

use crate::schema::error::MetadataError;
use crate::schema::property::Property;
use crate::schema::table::PropertyTable;

/// Structural keys that can never be replaced through the metadata surface.
const RESERVED_KEYS: [&str; 6] = ["id", "key", "nullable", "nullable_item", "default", "type"];

/// Validation hook invoked before every metadata write.
pub type MetadataValidator =
    dyn Fn(&PropertyTable, &Property, &str, &serde_json::Value) -> anyhow::Result<()>
        + Send
        + Sync;

static VALIDATOR: Lazy<RwLock<Arc<MetadataValidator>>> =
    Lazy::new(|| RwLock::new(Arc::new(default_validator)));

fn default_validator(
    _table: &PropertyTable,
    _property: &Property,
    meta_key: &str,
    value: &serde_json::Value,
) -> anyhow::Result<()> {
    if meta_key == "description" && !value.is_string() {
        anyhow::bail!("the value for description must be a string");
    }
    Ok(())
}

/// Replace the metadata validation hook.
pub fn set_metadata_validator<F>(validator: F)
where
    F: Fn(&PropertyTable, &Property, &str, &serde_json::Value) -> anyhow::Result<()>
        + Send
        + Sync
        + 'static,
{
    *VALIDATOR.write().expect("metadata validator lock poisoned") = Arc::new(validator);
}

/// Restore the default metadata validation hook.
pub fn reset_metadata_validator() {
    *VALIDATOR.write().expect("metadata validator lock poisoned") = Arc::new(default_validator);
}

/// Write one metadata entry on a field.
pub fn set_metadata(
    table: &PropertyTable,
    field_key: &str,
    meta_key: &str,
    value: serde_json::Value,
) -> Result<(), MetadataError> {
    if RESERVED_KEYS.contains(&meta_key) {
        return Err(MetadataError::ReservedKey {
            key: meta_key.to_string(),
        });
    }
    let property = table
        .by_key(field_key)
        .ok_or_else(|| MetadataError::UnknownProperty {
            key: field_key.to_string(),
        })?;

    let validator = VALIDATOR
        .read()
        .expect("metadata validator lock poisoned")
        .clone();
    validator(table, property, meta_key, &value).map_err(MetadataError::Validation)?;

    property.write_metadata(meta_key, value);
    Ok(())
}

/// Read one metadata entry from a field. Faults when the field or the
/// metadata key is unknown.
pub fn get_metadata(
    table: &PropertyTable,
    field_key: &str,
    meta_key: &str,
) -> Result<serde_json::Value, MetadataError> {
    let property = table
        .by_key(field_key)
        .ok_or_else(|| MetadataError::UnknownProperty {
            key: field_key.to_string(),
        })?;
    property
        .metadata(meta_key)
        .ok_or_else(|| MetadataError::MissingMetadata {
            property: field_key.to_string(),
            key: meta_key.to_string(),
        })
}

/// Check whether a metadata entry is set on a field. Faults only when the
/// field key is unknown.
pub fn has_metadata(
    table: &PropertyTable,
    field_key: &str,
    meta_key: &str,
) -> Result<bool, MetadataError> {
    let property = table
        .by_key(field_key)
        .ok_or_else(|| MetadataError::UnknownProperty {
            key: field_key.to_string(),
        })?;
    Ok(property.has_metadata_key(meta_key))
}

/// Sugar for writing the `description` metadata entry.
pub fn set_description(
    table: &PropertyTable,
    field_key: &str,
    description: impl Into<String>,
) -> Result<(), MetadataError> {
    let text: String = description.into();
    set_metadata(table, field_key, "description", serde_json::Value::String(text))
}
