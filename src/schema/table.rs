//! Ordinal-indexed property tables

use std::collections::BTreeMap;

use serde::Serialize;

use crate::schema::property::{Cardinality, Property};
use crate::values::Value;

/// Ordered registry of a schema's field definitions, indexed by ordinal and
/// by key.
///
/// Built once per schema type by the [`crate::schema::SchemaBuilder`] and
/// cached by the registry for the lifetime of the process. Structurally
/// immutable after creation; only per-property metadata may change, via the
/// accessors in [`crate::schema::metadata`].
#[derive(Debug, Clone)]
pub struct PropertyTable {
    schema_name: String,
    properties: Vec<Property>,
    key_index: BTreeMap<String, usize>,
}

impl PropertyTable {
    pub(crate) fn new(schema_name: String, properties: Vec<Property>) -> Self {
        let key_index = properties
            .iter()
            .map(|p| (p.key().to_string(), p.id()))
            .collect();
        Self {
            schema_name,
            properties,
            key_index,
        }
    }

    /// Name of the schema type the table was built from.
    pub fn schema_name(&self) -> &str {
        &self.schema_name
    }

    /// Number of declared fields.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Whether the schema declares no fields.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Look up a property by ordinal.
    pub fn get(&self, id: usize) -> Option<&Property> {
        self.properties.get(id)
    }

    /// Look up a property by field key.
    pub fn by_key(&self, key: &str) -> Option<&Property> {
        self.key_index.get(key).map(|id| &self.properties[*id])
    }

    /// Whether a field key is declared.
    pub fn has_key(&self, key: &str) -> bool {
        self.key_index.contains_key(key)
    }

    /// Field keys in ascending ordinal order.
    pub fn keys(&self) -> Vec<&str> {
        self.properties.iter().map(Property::key).collect()
    }

    /// Iterate properties in ascending ordinal order.
    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.properties.iter()
    }

    /// The blank field-default state: one `Null` placeholder per ordinal.
    ///
    /// Construction starts from this vector; defaults stay pending until
    /// the second ordinal-ordered pass resolves them.
    pub fn blank_values(&self) -> Vec<Value> {
        vec![Value::Null; self.properties.len()]
    }

    /// JSON summary of the table shape, for external tooling.
    pub fn schema_summary(&self) -> serde_json::Value {
        let properties: Vec<PropertySummary<'_>> = self
            .properties
            .iter()
            .map(|p| PropertySummary {
                id: p.id(),
                key: p.key(),
                ty: format!("{:?}", p.ty()),
                cardinality: match p.cardinality() {
                    Cardinality::One => "one",
                    Cardinality::Many => "many",
                },
                nullable: p.nullable(),
                nullable_item: p.nullable_item(),
                has_default: p.has_default(),
                description: p.description(),
            })
            .collect();
        serde_json::json!({
            "schema": self.schema_name,
            "properties": serde_json::to_value(properties).unwrap_or(serde_json::Value::Null),
        })
    }
}

#[derive(Debug, Serialize)]
struct PropertySummary<'a> {
    id: usize,
    key: &'a str,
    #[serde(rename = "type")]
    ty: String,
    cardinality: &'static str,
    nullable: bool,
    nullable_item: bool,
    has_default: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}
