//! Property definitions
//!
//! A [`Property`] is one declared field of a schema: a stable ordinal, a
//! key, an explicit type descriptor and the declaration flags. Structural
//! fields are immutable once the table is built; only the open metadata bag
//! may change afterwards, through the accessors in [`crate::schema::metadata`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use crate::factory::ModelType;
use crate::schema::enums::EnumDescriptor;
use crate::schema::table::PropertyTable;
use crate::values::Value;

/// Lazy resolver for a factory-built field type.
///
/// Model references stay zero-argument closures so self-referential schemas
/// (a `User` whose `followers` are `User`s) can be expressed; every other
/// type is an explicit descriptor.
pub type ModelResolver = Arc<dyn Fn() -> Arc<ModelType> + Send + Sync>;

/// Default-value producer, invoked lazily during construction.
///
/// The context restricts reads to fields already resolved in the same
/// ordinal-ordered pass; higher ordinals observe the unresolved `Null`
/// placeholder.
pub type DefaultFn = Arc<dyn Fn(&DefaultContext<'_>) -> Value + Send + Sync>;

/// Scalar type descriptor for a property.
#[derive(Clone)]
pub enum FieldType {
    Text,
    Integer,
    Float,
    Boolean,
    Timestamp,
    /// Enumeration, serialized by variant name.
    Enum(Arc<EnumDescriptor>),
    /// Nested factory-built type, resolved lazily.
    Model(ModelResolver),
    /// Raw JSON passthrough.
    Json,
}

impl FieldType {
    /// Convenience constructor for a model reference.
    pub fn model<F>(resolver: F) -> Self
    where
        F: Fn() -> Arc<ModelType> + Send + Sync + 'static,
    {
        Self::Model(Arc::new(resolver))
    }

    /// Whether two descriptors describe the same kind of field.
    ///
    /// Used for inheritance conflict checks. Enumerations compare by
    /// descriptor identity; model references are deferred and treated as
    /// agreeing (the resolver cannot run before the model exists).
    pub fn kind_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Text, Self::Text)
            | (Self::Integer, Self::Integer)
            | (Self::Float, Self::Float)
            | (Self::Boolean, Self::Boolean)
            | (Self::Timestamp, Self::Timestamp)
            | (Self::Model(_), Self::Model(_))
            | (Self::Json, Self::Json) => true,
            (Self::Enum(a), Self::Enum(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "Text"),
            Self::Integer => write!(f, "Integer"),
            Self::Float => write!(f, "Float"),
            Self::Boolean => write!(f, "Boolean"),
            Self::Timestamp => write!(f, "Timestamp"),
            Self::Enum(desc) => write!(f, "Enum({})", desc.name()),
            Self::Model(_) => write!(f, "Model(..)"),
            Self::Json => write!(f, "Json"),
        }
    }
}

/// Whether a property holds one value or a repeated list of values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    One,
    Many,
}

/// Restricted read view handed to default producers.
///
/// `get` only observes fields with a lower ordinal than the one being
/// resolved; anything else reads as the unresolved `Null` placeholder.
pub struct DefaultContext<'a> {
    table: &'a PropertyTable,
    values: &'a [Value],
    current: usize,
}

impl<'a> DefaultContext<'a> {
    pub(crate) fn new(table: &'a PropertyTable, values: &'a [Value], current: usize) -> Self {
        Self {
            table,
            values,
            current,
        }
    }

    /// Read an already-resolved field by key.
    ///
    /// Unknown keys and fields at or above the ordinal being resolved
    /// return `Null`.
    pub fn get(&self, key: &str) -> Value {
        match self.table.by_key(key) {
            Some(property) if property.id() < self.current => {
                self.values[property.id()].clone()
            }
            _ => Value::Null,
        }
    }

    /// Ordinal of the field currently being resolved.
    pub fn current_ordinal(&self) -> usize {
        self.current
    }
}

/// One declared field of a schema.
pub struct Property {
    id: usize,
    key: String,
    ty: FieldType,
    cardinality: Cardinality,
    nullable: bool,
    nullable_item: bool,
    default: Option<DefaultFn>,
    metadata: RwLock<BTreeMap<String, serde_json::Value>>,
}

impl Property {
    pub(crate) fn from_spec(id: usize, key: String, spec: PropertySpec) -> Self {
        let mut metadata = spec.metadata;
        if let Some(description) = spec.description {
            metadata.insert("description".to_string(), description.into());
        }
        Self {
            id,
            key,
            ty: spec.ty,
            cardinality: spec.cardinality,
            nullable: spec.nullable,
            nullable_item: spec.nullable_item,
            default: spec.default,
            metadata: RwLock::new(metadata),
        }
    }

    /// Stable ordinal of the field.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Field name.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Type descriptor.
    pub fn ty(&self) -> &FieldType {
        &self.ty
    }

    /// One value or a repeated list.
    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    /// Whether explicit null is a valid value.
    pub fn nullable(&self) -> bool {
        self.nullable
    }

    /// Whether elements of a repeated field may be null.
    pub fn nullable_item(&self) -> bool {
        self.nullable_item
    }

    /// Whether a default producer was declared.
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    pub(crate) fn default_fn(&self) -> Option<&DefaultFn> {
        self.default.as_ref()
    }

    /// Description text, if set at declaration or via the metadata surface.
    pub fn description(&self) -> Option<String> {
        self.metadata("description")
            .and_then(|v| v.as_str().map(str::to_string))
    }

    /// Read one metadata entry.
    pub fn metadata(&self, key: &str) -> Option<serde_json::Value> {
        self.metadata
            .read()
            .expect("property metadata lock poisoned")
            .get(key)
            .cloned()
    }

    pub(crate) fn has_metadata_key(&self, key: &str) -> bool {
        self.metadata
            .read()
            .expect("property metadata lock poisoned")
            .contains_key(key)
    }

    pub(crate) fn write_metadata(&self, key: &str, value: serde_json::Value) {
        self.metadata
            .write()
            .expect("property metadata lock poisoned")
            .insert(key.to_string(), value);
    }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("id", &self.id)
            .field("key", &self.key)
            .field("ty", &self.ty)
            .field("cardinality", &self.cardinality)
            .field("nullable", &self.nullable)
            .field("nullable_item", &self.nullable_item)
            .field("has_default", &self.default.is_some())
            .finish()
    }
}

impl Clone for Property {
    fn clone(&self) -> Self {
        let snapshot = self
            .metadata
            .read()
            .expect("property metadata lock poisoned")
            .clone();
        Self {
            id: self.id,
            key: self.key.clone(),
            ty: self.ty.clone(),
            cardinality: self.cardinality,
            nullable: self.nullable,
            nullable_item: self.nullable_item,
            default: self.default.clone(),
            metadata: RwLock::new(snapshot),
        }
    }
}

/// Declaration input for one field, consumed by the schema builder.
///
/// # Example
///
/// ```rust
/// use schema_forge_sdk::schema::{FieldType, PropertySpec};
///
/// let spec = PropertySpec::new(FieldType::Text)
///     .nullable()
///     .with_description("Preferred display name");
/// ```
#[derive(Clone)]
pub struct PropertySpec {
    pub(crate) ty: FieldType,
    pub(crate) cardinality: Cardinality,
    pub(crate) nullable: bool,
    pub(crate) nullable_item: bool,
    pub(crate) default: Option<DefaultFn>,
    pub(crate) description: Option<String>,
    pub(crate) metadata: BTreeMap<String, serde_json::Value>,
}

impl PropertySpec {
    /// Create a spec for a single-valued, non-nullable field with no default.
    pub fn new(ty: FieldType) -> Self {
        Self {
            ty,
            cardinality: Cardinality::One,
            nullable: false,
            nullable_item: false,
            default: None,
            description: None,
            metadata: BTreeMap::new(),
        }
    }

    /// Mark the field as repeated.
    pub fn repeated(mut self) -> Self {
        self.cardinality = Cardinality::Many;
        self
    }

    /// Allow explicit null as a value.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Allow null elements in a repeated field.
    pub fn nullable_item(mut self) -> Self {
        self.nullable_item = true;
        self
    }

    /// Attach a lazy default producer.
    pub fn with_default<F>(mut self, producer: F) -> Self
    where
        F: Fn(&DefaultContext<'_>) -> Value + Send + Sync + 'static,
    {
        self.default = Some(Arc::new(producer));
        self
    }

    /// Set the description text.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attach one open metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}
