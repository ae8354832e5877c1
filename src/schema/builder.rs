//! Schema builder
//!
//! Fields are declared by calling [`SchemaBuilder::field`] with an explicit
//! ordinal and key, so both halves of a declaration live at a single site.
//! Validation happens once when the registry finishes the build: ordinal
//! contiguity, duplicate detection, key naming and inheritance conflicts.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::schema::error::RegistrationError;
use crate::schema::property::{Property, PropertySpec};
use crate::schema::registry::{self, Schema};
use crate::schema::table::PropertyTable;
use std::sync::Arc;

static KEY_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

type BaseResolver = Box<dyn FnOnce() -> Result<Arc<PropertyTable>, RegistrationError>>;

#[derive(Clone, Copy, PartialEq)]
enum Origin {
    Base,
    Own,
}

/// Collects field declarations for one schema type.
///
/// Handed to [`Schema::describe`] by the registry; not constructed directly.
pub struct SchemaBuilder {
    schema_name: String,
    base: Option<BaseResolver>,
    declared: Vec<(usize, String, PropertySpec)>,
}

impl SchemaBuilder {
    pub(crate) fn new(schema_name: &str) -> Self {
        Self {
            schema_name: schema_name.to_string(),
            base: None,
            declared: Vec::new(),
        }
    }

    /// Declare that this schema extends another schema type.
    ///
    /// The base table becomes the ordinal prefix of this one. Resolution is
    /// deferred to `finish`, so a broken base surfaces as this schema's
    /// registration fault.
    pub fn extends<B: Schema>(&mut self) -> &mut Self {
        self.base = Some(Box::new(|| registry::register::<B>()));
        self
    }

    /// Declare extension from an already-built table.
    pub fn extends_table(&mut self, base: &Arc<PropertyTable>) -> &mut Self {
        let base = base.clone();
        self.base = Some(Box::new(move || Ok(base)));
        self
    }

    /// Declare one field at an explicit ordinal.
    pub fn field(&mut self, id: usize, key: &str, spec: PropertySpec) -> &mut Self {
        self.declared.push((id, key.to_string(), spec));
        self
    }

    pub(crate) fn finish(self) -> Result<PropertyTable, RegistrationError> {
        let schema = self.schema_name;
        let base = match self.base {
            Some(resolve) => Some(resolve()?),
            None => None,
        };

        let mut slots: Vec<Option<(Property, Origin)>> = Vec::new();
        let mut key_to_id: BTreeMap<String, (usize, Origin)> = BTreeMap::new();

        if let Some(base) = &base {
            for property in base.iter() {
                key_to_id.insert(property.key().to_string(), (property.id(), Origin::Base));
                slots.push(Some((property.clone(), Origin::Base)));
            }
        }

        for (id, key, spec) in self.declared {
            if !KEY_REGEX.is_match(&key) {
                return Err(RegistrationError::InvalidKey { schema, key });
            }
            if slots.len() <= id {
                slots.resize_with(id + 1, || None);
            }

            match key_to_id.get(&key) {
                Some((base_id, Origin::Base)) if *base_id != id => {
                    return Err(RegistrationError::OrdinalConflict {
                        schema,
                        key,
                        base_id: *base_id,
                        id,
                    });
                }
                Some((_, Origin::Own)) => {
                    return Err(RegistrationError::DuplicateKey { schema, key });
                }
                _ => {}
            }

            match &slots[id] {
                Some((existing, Origin::Base)) if existing.key() == key => {
                    // Re-declaration of an inherited field: ordinal agrees,
                    // the type must too.
                    if !existing.ty().kind_eq(&spec.ty) {
                        return Err(RegistrationError::TypeConflict { schema, key });
                    }
                }
                Some((existing, Origin::Base)) => {
                    return Err(RegistrationError::OrdinalReuse {
                        schema,
                        id,
                        base_key: existing.key().to_string(),
                    });
                }
                Some((_, Origin::Own)) => {
                    return Err(RegistrationError::DuplicateOrdinal { schema, id });
                }
                None => {}
            }

            key_to_id.insert(key.clone(), (id, Origin::Own));
            slots[id] = Some((Property::from_spec(id, key, spec), Origin::Own));
        }

        let mut properties = Vec::with_capacity(slots.len());
        for (id, slot) in slots.into_iter().enumerate() {
            match slot {
                Some((property, _)) => properties.push(property),
                None => return Err(RegistrationError::MissingOrdinal { schema, id }),
            }
        }

        Ok(PropertyTable::new(schema, properties))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::property::FieldType;

    #[test]
    fn test_empty_schema() {
        let table = SchemaBuilder::new("Empty").finish().unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_declaration_order_is_irrelevant() {
        let mut builder = SchemaBuilder::new("Sample");
        builder
            .field(1, "name", PropertySpec::new(FieldType::Text))
            .field(0, "id", PropertySpec::new(FieldType::Text));
        let table = builder.finish().unwrap();
        assert_eq!(table.keys(), vec!["id", "name"]);
    }

    #[test]
    fn test_gap_faults() {
        let mut builder = SchemaBuilder::new("Gappy");
        builder
            .field(0, "a", PropertySpec::new(FieldType::Text))
            .field(1, "b", PropertySpec::new(FieldType::Text))
            .field(3, "c", PropertySpec::new(FieldType::Text));
        let err = builder.finish().unwrap_err();
        assert!(matches!(err, RegistrationError::MissingOrdinal { id: 2, .. }));
    }

    #[test]
    fn test_duplicate_ordinal_faults() {
        let mut builder = SchemaBuilder::new("Dup");
        builder
            .field(0, "a", PropertySpec::new(FieldType::Text))
            .field(1, "b", PropertySpec::new(FieldType::Text))
            .field(1, "c", PropertySpec::new(FieldType::Text));
        let err = builder.finish().unwrap_err();
        assert!(matches!(err, RegistrationError::DuplicateOrdinal { id: 1, .. }));
    }

    #[test]
    fn test_invalid_key_faults() {
        let mut builder = SchemaBuilder::new("Bad");
        builder.field(0, "not a key", PropertySpec::new(FieldType::Text));
        let err = builder.finish().unwrap_err();
        assert!(matches!(err, RegistrationError::InvalidKey { .. }));
    }
}
