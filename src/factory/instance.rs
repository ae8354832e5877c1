//! Constructed instances
//!
//! An [`Instance`] stores its resolved field values in ordinal order and
//! borrows everything else (keys, types, operations) from its model type.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::factory::model::ModelType;
use crate::factory::FactoryError;
use crate::schema::Cardinality;
use crate::serialize::text;
use crate::serialize::{ConversionError, TextEncoding};
use crate::values::Value;

/// A constructed value of a factory-built model type.
#[derive(Clone)]
pub struct Instance {
    model: Arc<ModelType>,
    values: Vec<Value>,
}

impl Instance {
    pub(crate) fn new(model: Arc<ModelType>, values: Vec<Value>) -> Self {
        Self { model, values }
    }

    /// The model type this instance was constructed from.
    pub fn model(&self) -> &Arc<ModelType> {
        &self.model
    }

    /// Read a field by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.model
            .properties()
            .by_key(key)
            .map(|p| &self.values[p.id()])
    }

    /// Read a field by ordinal.
    pub fn get_at(&self, id: usize) -> Option<&Value> {
        self.values.get(id)
    }

    /// Overwrite a field by key. Used by constructor hooks; faults on an
    /// unknown key.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<(), FactoryError> {
        let id = self
            .model
            .properties()
            .by_key(key)
            .map(crate::schema::Property::id)
            .ok_or_else(|| FactoryError::UnknownKey {
                key: key.to_string(),
            })?;
        self.values[id] = value.into();
        Ok(())
    }

    /// The ordinal tuple view: one value per declared field, in ordinal
    /// order.
    pub fn to_values(&self) -> Vec<Value> {
        self.values.clone()
    }

    /// The keyed view: field name → value.
    pub fn to_plain_object(&self) -> BTreeMap<String, Value> {
        self.model
            .properties()
            .iter()
            .map(|p| (p.key().to_string(), self.values[p.id()].clone()))
            .collect()
    }

    /// The keyed JSON view, the human-debuggable form.
    pub fn to_json(&self) -> Result<serde_json::Value, ConversionError> {
        let mut object = serde_json::Map::new();
        for property in self.model.properties().iter() {
            object.insert(property.key().to_string(), self.field_to_json(property)?);
        }
        Ok(serde_json::Value::Object(object))
    }

    /// The ordinal-tuple JSON view, the compact form.
    pub fn to_json_values(&self) -> Result<serde_json::Value, ConversionError> {
        let mut values = Vec::with_capacity(self.values.len());
        for property in self.model.properties().iter() {
            values.push(self.field_to_json(property)?);
        }
        Ok(serde_json::Value::Array(values))
    }

    fn field_to_json(
        &self,
        property: &crate::schema::Property,
    ) -> Result<serde_json::Value, ConversionError> {
        let serializer = self.model.serializer();
        let value = &self.values[property.id()];

        if value.is_null() {
            return Ok(serde_json::Value::Null);
        }
        match property.cardinality() {
            Cardinality::One => serializer.to_json(property.ty(), value),
            Cardinality::Many => {
                let items = value.as_list().ok_or_else(|| ConversionError::TypeMismatch {
                    expected: format!("list for repeated property {}", property.key()),
                    found: format!("{value:?}"),
                })?;
                let mut rendered = Vec::with_capacity(items.len());
                for item in items {
                    // null elements pass through verbatim
                    if item.is_null() {
                        rendered.push(serde_json::Value::Null);
                    } else {
                        rendered.push(serializer.to_json(property.ty(), item)?);
                    }
                }
                Ok(serde_json::Value::Array(rendered))
            }
        }
    }

    /// Serialize to bytes with the model's active serializer.
    pub fn encode(&self) -> Result<Vec<u8>, ConversionError> {
        self.model.serializer().encode_value(&self.model, self)
    }

    /// Serialize to bytes and render as text.
    pub fn stringify(&self, encoding: TextEncoding) -> Result<String, ConversionError> {
        Ok(text::render(&self.encode()?, encoding))
    }

    /// Invoke a named behavior operation.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value, FactoryError> {
        let op = self
            .model
            .method(name)
            .ok_or_else(|| FactoryError::UnknownOperation {
                name: name.to_string(),
            })?;
        Ok(op(self, args))
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.model, &other.model) && self.values == other.values
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct(self.model.name());
        for property in self.model.properties().iter() {
            s.field(property.key(), &self.values[property.id()]);
        }
        s.finish()
    }
}
