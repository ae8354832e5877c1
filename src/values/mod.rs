//! Runtime value model shared by the schema, factory and serialize modules
//!
//! Every field of a constructed instance holds one of these variants. The
//! enum is deliberately close to the JSON data model so the keyed and tuple
//! JSON surfaces stay cheap, with two typed additions: `Timestamp` for
//! calendar values and `Instance` for nested factory-built values.

use chrono::{DateTime, Utc};

use crate::factory::Instance;

/// A dynamic value held by an instance field.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent or explicit null.
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    /// Calendar timestamp, always UTC.
    Timestamp(DateTime<Utc>),
    /// Elements of a repeated field.
    List(Vec<Value>),
    /// A nested factory-built value.
    Instance(Instance),
    /// Raw JSON passthrough for extension payloads.
    Json(serde_json::Value),
}

impl Value {
    /// Check if the value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Try to get as bool.
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Self::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as i64.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as f64. Integers widen.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Try to get as text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Try to get as a timestamp.
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Timestamp(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as a list slice.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(v) => Some(v),
            _ => None,
        }
    }

    /// Try to get as a nested instance.
    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Self::Instance(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Timestamp(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::List(v)
    }
}

impl From<Instance> for Value {
    fn from(v: Instance) -> Self {
        Self::Instance(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => Self::Null,
        }
    }
}
