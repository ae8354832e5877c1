//! Serialization
//!
//! Provides the conversion layer between typed instance values and their
//! JSON-compatible renderings, plus the byte and text encodings:
//! - [`Serializer`] — abstract encode/decode contract with shared
//!   per-field JSON conversion
//! - [`JSONSerializer`] — default implementation, ordinal-tuple JSON bytes
//! - [`TextEncoding`] — base64/hex rendering for `stringify`/`parse`

pub mod json;
pub mod text;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::factory::{Instance, ModelType};
use crate::schema::FieldType;
use crate::values::Value;

/// Error during value conversion or encoding
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("enumeration {enumeration} has no variant named {name}")]
    UnknownEnumName { enumeration: String, name: String },

    #[error("enumeration {enumeration} has no ordinal {ordinal}")]
    UnknownEnumOrdinal { enumeration: String, ordinal: i64 },

    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("timestamp parse error: {0}")]
    Timestamp(#[from] chrono::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("text decoding error: {0}")]
    Text(String),

    #[error("decoded payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("construction from decoded payload failed: {0}")]
    Construction(String),
}

/// Converts typed values to/from JSON-compatible values and instances
/// to/from byte buffers.
///
/// The per-field `to_json`/`from_json` conversions have shared default
/// implementations; custom serializers usually only replace the byte
/// encoding.
pub trait Serializer: Send + Sync {
    /// Serialize one instance to bytes.
    fn encode_value(
        &self,
        model: &ModelType,
        instance: &Instance,
    ) -> Result<Vec<u8>, ConversionError>;

    /// Reconstruct an instance from bytes.
    fn decode_value(&self, model: &ModelType, bytes: &[u8]) -> Result<Instance, ConversionError>;

    /// Convert one field value to its JSON rendering.
    fn to_json(&self, ty: &FieldType, value: &Value) -> Result<serde_json::Value, ConversionError> {
        value_to_json(ty, value)
    }

    /// Convert one JSON value back to a typed field value.
    fn from_json(
        &self,
        ty: &FieldType,
        value: &serde_json::Value,
    ) -> Result<Value, ConversionError> {
        value_from_json(ty, value)
    }
}

fn mismatch(expected: &str, found: &impl std::fmt::Debug) -> ConversionError {
    ConversionError::TypeMismatch {
        expected: expected.to_string(),
        found: format!("{found:?}"),
    }
}

/// Render a timestamp the way the JSON surface expects it: RFC 3339 with
/// millisecond precision, UTC designator `Z`.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse an RFC 3339 timestamp into UTC.
pub fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, ConversionError> {
    Ok(DateTime::parse_from_rfc3339(text)?.with_timezone(&Utc))
}

/// Shared element-level conversion to JSON.
///
/// Enumerations render as variant names, timestamps as RFC 3339 strings,
/// nested factory-built values as their keyed JSON objects; primitives pass
/// through unchanged.
pub fn value_to_json(ty: &FieldType, value: &Value) -> Result<serde_json::Value, ConversionError> {
    if value.is_null() {
        return Ok(serde_json::Value::Null);
    }
    match ty {
        FieldType::Enum(desc) => match value {
            Value::Integer(ordinal) => desc
                .name_of(*ordinal)
                .map(|name| serde_json::Value::String(name.to_string()))
                .ok_or_else(|| ConversionError::UnknownEnumOrdinal {
                    enumeration: desc.name().to_string(),
                    ordinal: *ordinal,
                }),
            Value::Text(name) => {
                if desc.ordinal_of(name).is_some() {
                    Ok(serde_json::Value::String(name.clone()))
                } else {
                    Err(ConversionError::UnknownEnumName {
                        enumeration: desc.name().to_string(),
                        name: name.clone(),
                    })
                }
            }
            other => Err(mismatch("enum ordinal or name", other)),
        },
        FieldType::Timestamp => match value {
            Value::Timestamp(ts) => Ok(serde_json::Value::String(format_timestamp(ts))),
            Value::Text(text) => Ok(serde_json::Value::String(text.clone())),
            other => Err(mismatch("timestamp", other)),
        },
        FieldType::Model(_) => match value {
            Value::Instance(instance) => instance.to_json(),
            other => Err(mismatch("factory-built instance", other)),
        },
        FieldType::Json
        | FieldType::Text
        | FieldType::Integer
        | FieldType::Float
        | FieldType::Boolean => plain_json(value),
    }
}

fn plain_json(value: &Value) -> Result<serde_json::Value, ConversionError> {
    match value {
        Value::Null => Ok(serde_json::Value::Null),
        Value::Boolean(v) => Ok(serde_json::Value::Bool(*v)),
        Value::Integer(v) => Ok(serde_json::Value::Number((*v).into())),
        Value::Float(v) => serde_json::Number::from_f64(*v)
            .map(serde_json::Value::Number)
            .ok_or_else(|| mismatch("finite number", v)),
        Value::Text(v) => Ok(serde_json::Value::String(v.clone())),
        Value::Timestamp(ts) => Ok(serde_json::Value::String(format_timestamp(ts))),
        Value::Json(v) => Ok(v.clone()),
        other => Err(mismatch("scalar value", other)),
    }
}

/// Shared element-level conversion from JSON.
pub fn value_from_json(
    ty: &FieldType,
    value: &serde_json::Value,
) -> Result<Value, ConversionError> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    match ty {
        FieldType::Model(resolver) => {
            let model = resolver();
            let instance = model
                .from_json(value)
                .map_err(|e| ConversionError::Construction(e.to_string()))?;
            Ok(Value::Instance(instance))
        }
        FieldType::Timestamp => match value {
            serde_json::Value::String(text) => Ok(Value::Timestamp(parse_timestamp(text)?)),
            other => Err(mismatch("RFC 3339 string", other)),
        },
        FieldType::Enum(desc) => match value {
            serde_json::Value::String(name) => desc
                .ordinal_of(name)
                .map(Value::Integer)
                .ok_or_else(|| ConversionError::UnknownEnumName {
                    enumeration: desc.name().to_string(),
                    name: name.clone(),
                }),
            serde_json::Value::Number(num) => {
                let ordinal = num
                    .as_i64()
                    .ok_or_else(|| mismatch("integral enum ordinal", num))?;
                if desc.has_ordinal(ordinal) {
                    Ok(Value::Integer(ordinal))
                } else {
                    Err(ConversionError::UnknownEnumOrdinal {
                        enumeration: desc.name().to_string(),
                        ordinal,
                    })
                }
            }
            other => Err(mismatch("enum name or ordinal", other)),
        },
        FieldType::Text => match value {
            serde_json::Value::String(text) => Ok(Value::Text(text.clone())),
            other => Err(mismatch("string", other)),
        },
        FieldType::Integer => match value {
            serde_json::Value::Number(num) => num
                .as_i64()
                .map(Value::Integer)
                .ok_or_else(|| mismatch("integer", num)),
            other => Err(mismatch("integer", other)),
        },
        FieldType::Float => match value {
            serde_json::Value::Number(num) => num
                .as_f64()
                .map(Value::Float)
                .ok_or_else(|| mismatch("number", num)),
            other => Err(mismatch("number", other)),
        },
        FieldType::Boolean => match value {
            serde_json::Value::Bool(v) => Ok(Value::Boolean(*v)),
            other => Err(mismatch("boolean", other)),
        },
        FieldType::Json => Ok(Value::Json(value.clone())),
    }
}

pub use json::JSONSerializer;
pub use text::TextEncoding;
