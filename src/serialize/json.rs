//! Default JSON serializer
//!
//! Encodes a factory-built instance as the compact JSON rendering of its
//! ordinal tuple. Decoding parses the byte buffer as JSON and routes
//! through the model's shared `from_json`, so both the tuple (array) and
//! keyed (object) forms are accepted.

use crate::factory::{Instance, ModelType};

use super::{ConversionError, Serializer};

/// Ordinal-tuple JSON byte encoding.
#[derive(Debug, Default, Clone, Copy)]
pub struct JSONSerializer;

impl JSONSerializer {
    pub fn new() -> Self {
        Self
    }
}

impl Serializer for JSONSerializer {
    fn encode_value(
        &self,
        _model: &ModelType,
        instance: &Instance,
    ) -> Result<Vec<u8>, ConversionError> {
        let values = instance.to_json_values()?;
        Ok(serde_json::to_vec(&values)?)
    }

    fn decode_value(&self, model: &ModelType, bytes: &[u8]) -> Result<Instance, ConversionError> {
        let json: serde_json::Value = serde_json::from_slice(bytes)?;
        model
            .from_json(&json)
            .map_err(|e| ConversionError::Construction(e.to_string()))
    }
}
