//! Enumeration capability for serialization
//!
//! An [`EnumDescriptor`] is an explicit, reversible name↔ordinal map. Field
//! values of an enum-typed property are stored as ordinals; the serializer
//! renders them as variant names and parses either form back. Reversibility
//! is enforced at construction: a map with duplicate names or duplicate
//! ordinals cannot be represented.

use std::collections::BTreeMap;

use thiserror::Error;

/// One variant of an enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumVariant {
    /// Variant name as it appears in JSON.
    pub name: String,
    /// Variant ordinal as it appears in instance values.
    pub ordinal: i64,
}

impl EnumVariant {
    /// Create an enum variant.
    pub fn new(name: impl Into<String>, ordinal: i64) -> Self {
        Self {
            name: name.into(),
            ordinal,
        }
    }
}

/// Error raised when an enumeration map is not reversible
#[derive(Error, Debug)]
pub enum EnumError {
    #[error("enumeration {name}: variant name {variant} declared twice")]
    DuplicateName { name: String, variant: String },

    #[error("enumeration {name}: ordinal {ordinal} declared twice")]
    DuplicateOrdinal { name: String, ordinal: i64 },
}

/// A named, reversible name↔ordinal enumeration map.
#[derive(Debug, Clone)]
pub struct EnumDescriptor {
    name: String,
    variants: Vec<EnumVariant>,
    by_name: BTreeMap<String, i64>,
    by_ordinal: BTreeMap<i64, usize>,
}

impl EnumDescriptor {
    /// Build a descriptor from (name, ordinal) pairs.
    ///
    /// Rejects duplicate names and duplicate ordinals, so the resulting map
    /// is reversible in both directions.
    pub fn new<I, S>(name: impl Into<String>, pairs: I) -> Result<Self, EnumError>
    where
        I: IntoIterator<Item = (S, i64)>,
        S: Into<String>,
    {
        let name = name.into();
        let mut variants = Vec::new();
        let mut by_name = BTreeMap::new();
        let mut by_ordinal = BTreeMap::new();

        for (variant_name, ordinal) in pairs {
            let variant = EnumVariant::new(variant_name, ordinal);
            if by_name.contains_key(&variant.name) {
                return Err(EnumError::DuplicateName {
                    name,
                    variant: variant.name,
                });
            }
            if by_ordinal.contains_key(&ordinal) {
                return Err(EnumError::DuplicateOrdinal { name, ordinal });
            }
            by_name.insert(variant.name.clone(), ordinal);
            by_ordinal.insert(ordinal, variants.len());
            variants.push(variant);
        }

        Ok(Self {
            name,
            variants,
            by_name,
            by_ordinal,
        })
    }

    /// Enumeration name used in diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All variants in declaration order.
    pub fn variants(&self) -> &[EnumVariant] {
        &self.variants
    }

    /// Look up the ordinal for a variant name.
    pub fn ordinal_of(&self, name: &str) -> Option<i64> {
        self.by_name.get(name).copied()
    }

    /// Look up the variant name for an ordinal.
    pub fn name_of(&self, ordinal: i64) -> Option<&str> {
        self.by_ordinal
            .get(&ordinal)
            .map(|idx| self.variants[*idx].name.as_str())
    }

    /// Check whether an ordinal belongs to the enumeration.
    pub fn has_ordinal(&self, ordinal: i64) -> bool {
        self.by_ordinal.contains_key(&ordinal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reversible_lookup() {
        let status = EnumDescriptor::new("UserStatus", [("ACTIVE", 1), ("INACTIVE", 2)]).unwrap();
        assert_eq!(status.ordinal_of("ACTIVE"), Some(1));
        assert_eq!(status.name_of(2), Some("INACTIVE"));
        assert_eq!(status.name_of(3), None);
        assert_eq!(status.ordinal_of("UNKNOWN"), None);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let err = EnumDescriptor::new("Color", [("RED", 0), ("RED", 1)]).unwrap_err();
        assert!(err.to_string().contains("declared twice"));
    }

    #[test]
    fn test_duplicate_ordinal_rejected() {
        let err = EnumDescriptor::new("Color", [("RED", 0), ("GREEN", 0)]).unwrap_err();
        assert!(matches!(err, EnumError::DuplicateOrdinal { ordinal: 0, .. }));
    }
}
