//! Forge input for construction

use std::collections::BTreeMap;

use crate::values::Value;

/// A partial keyed-value map used to construct an instance.
///
/// Entries explicitly set to `Null` count as absent: the field's default
/// (if any) still applies, matching the construction contract.
///
/// # Example
///
/// ```rust
/// use schema_forge_sdk::factory::Forge;
///
/// let forge = Forge::new()
///     .set("id", "1")
///     .set("givenName", "John");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Forge {
    entries: BTreeMap<String, Value>,
}

impl Forge {
    /// Create an empty forge.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one field value, chaining.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Set one field value in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Read one field value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Whether the forge carries no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl From<BTreeMap<String, Value>> for Forge {
    fn from(entries: BTreeMap<String, Value>) -> Self {
        Self { entries }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Forge {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
