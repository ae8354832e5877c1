//! Model types
//!
//! A [`ModelType`] is a factory-built, instantiable type: a property table
//! plus the composed behavior set and the active serializer. The fixed
//! capability surface (construction, tuple/keyed/JSON views, byte and text
//! encoding) is implemented once, generically over any table; behavioral
//! bases are mixed in by capability copy rather than inheritance.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Weak};

use crate::factory::behavior::{Behavior, ConstructHook, InstanceOp, StaticOp};
use crate::factory::forge::Forge;
use crate::factory::instance::Instance;
use crate::factory::FactoryError;
use crate::schema::property::DefaultContext;
use crate::schema::{Cardinality, PropertyTable, RegistrationError};
use crate::serialize::text;
use crate::serialize::{ConversionError, JSONSerializer, Serializer, TextEncoding};
use crate::values::Value;

/// Builds model types from property tables.
pub struct Factory;

impl Factory {
    /// Build a plain model type from a schema table.
    pub fn build(table: Arc<PropertyTable>) -> Arc<ModelType> {
        let name = format!("Factory({})", table.schema_name());
        ModelType::assemble(name, table, Behavior::default(), None)
    }

    /// Build a model type carrying a behavior (named operations and an
    /// optional constructor hook).
    pub fn build_with(behavior: Behavior, table: Arc<PropertyTable>) -> Arc<ModelType> {
        let name = behavior.name().to_string();
        ModelType::assemble(name, table, behavior, None)
    }

    /// Mixin form: extend a behavioral base with a replacement schema.
    ///
    /// The new model keeps the base's operations and constructor hooks
    /// (capability copy) but instances are shaped by `table`. Keys shared
    /// with the base must agree on ordinal and type; disagreement faults
    /// here, at type-build time.
    pub fn extend(
        base: &Arc<ModelType>,
        table: Arc<PropertyTable>,
    ) -> Result<Arc<ModelType>, RegistrationError> {
        for base_property in base.table.iter() {
            if let Some(own) = table.by_key(base_property.key()) {
                if own.id() != base_property.id() {
                    return Err(RegistrationError::OrdinalConflict {
                        schema: table.schema_name().to_string(),
                        key: own.key().to_string(),
                        base_id: base_property.id(),
                        id: own.id(),
                    });
                }
                if !own.ty().kind_eq(base_property.ty()) {
                    return Err(RegistrationError::TypeConflict {
                        schema: table.schema_name().to_string(),
                        key: own.key().to_string(),
                    });
                }
            }
        }

        let name = format!("Mixin({})", base.name());
        Ok(ModelType::assemble(
            name,
            table,
            Behavior::default(),
            Some(base.clone()),
        ))
    }
}

/// A concrete, instantiable type produced by the factory.
pub struct ModelType {
    self_ref: Weak<ModelType>,
    name: String,
    table: Arc<PropertyTable>,
    serializer: Arc<dyn Serializer>,
    methods: BTreeMap<String, InstanceOp>,
    statics: BTreeMap<String, StaticOp>,
    construct_hooks: Vec<ConstructHook>,
    base: Option<Arc<ModelType>>,
}

impl ModelType {
    fn assemble(
        name: String,
        table: Arc<PropertyTable>,
        behavior: Behavior,
        base: Option<Arc<ModelType>>,
    ) -> Arc<Self> {
        let mut methods = behavior.methods;
        let mut statics = behavior.statics;
        let mut construct_hooks = Vec::new();
        let serializer: Arc<dyn Serializer> = match &base {
            Some(base) => base.serializer.clone(),
            None => Arc::new(JSONSerializer::new()),
        };

        if let Some(base) = &base {
            // Capability copy: operations not already defined on the new
            // type are shared from the base.
            for (op_name, op) in &base.methods {
                methods.entry(op_name.clone()).or_insert_with(|| op.clone());
            }
            for (op_name, op) in &base.statics {
                statics.entry(op_name.clone()).or_insert_with(|| op.clone());
            }
            construct_hooks.extend(base.construct_hooks.iter().cloned());
        }
        if let Some(hook) = behavior.construct {
            construct_hooks.push(hook);
        }

        tracing::debug!(
            model = name.as_str(),
            schema = table.schema_name(),
            fields = table.len(),
            "built model type"
        );

        Arc::new_cyclic(|self_ref| Self {
            self_ref: self_ref.clone(),
            name,
            table,
            serializer,
            methods,
            statics,
            construct_hooks,
            base,
        })
    }

    fn arc(&self) -> Arc<Self> {
        self.self_ref
            .upgrade()
            .expect("model types are always owned by an Arc")
    }

    /// Model name, e.g. `Factory(User)` or `Mixin(Node)`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The property table backing this model.
    pub fn properties(&self) -> &Arc<PropertyTable> {
        &self.table
    }

    /// Field names in ascending ordinal order.
    pub fn property_names(&self) -> Vec<&str> {
        self.table.keys()
    }

    /// The active serializer.
    pub fn serializer(&self) -> &Arc<dyn Serializer> {
        &self.serializer
    }

    /// The behavioral base this model extends, if any.
    pub fn base(&self) -> Option<&Arc<ModelType>> {
        self.base.as_ref()
    }

    /// Derive a model that uses a different serializer.
    pub fn with_serializer(&self, serializer: Arc<dyn Serializer>) -> Arc<Self> {
        let clone = Self {
            self_ref: Weak::new(),
            name: self.name.clone(),
            table: self.table.clone(),
            serializer,
            methods: self.methods.clone(),
            statics: self.statics.clone(),
            construct_hooks: self.construct_hooks.clone(),
            base: self.base.clone(),
        };
        Arc::new_cyclic(|self_ref| Self {
            self_ref: self_ref.clone(),
            ..clone
        })
    }

    /// Look up a named instance operation.
    pub fn method(&self, name: &str) -> Option<InstanceOp> {
        self.methods.get(name).cloned()
    }

    /// Look up a named static operation.
    pub fn static_op(&self, name: &str) -> Option<StaticOp> {
        self.statics.get(name).cloned()
    }

    /// Invoke a named static operation.
    pub fn call_static(&self, name: &str, args: &[Value]) -> Result<Value, FactoryError> {
        let op = self
            .static_op(name)
            .ok_or_else(|| FactoryError::UnknownOperation {
                name: name.to_string(),
            })?;
        Ok(op(self, args))
    }

    /// Construct an instance from a forge.
    ///
    /// Resolution is two ordinal-ordered passes: explicit non-null forge
    /// values first, then pending default producers, each reading only
    /// fields already resolved in the same forward pass (higher ordinals
    /// observe `Null`). An absent field with no default resolves to `Null`
    /// rather than faulting; required-ness is a schema-design concern.
    /// Constructor hooks of the behavior chain then run exactly once each,
    /// base-first, over the fully-resolved instance.
    pub fn construct(&self, forge: &Forge) -> Result<Instance, FactoryError> {
        let mut values = self.table.blank_values();
        let mut pending = vec![false; self.table.len()];

        for property in self.table.iter() {
            match forge.get(property.key()) {
                Some(value) if !value.is_null() => values[property.id()] = value.clone(),
                _ => pending[property.id()] = property.has_default(),
            }
        }

        for property in self.table.iter() {
            if !pending[property.id()] {
                continue;
            }
            if let Some(producer) = property.default_fn() {
                let resolved = {
                    let context = DefaultContext::new(&self.table, &values, property.id());
                    producer(&context)
                };
                values[property.id()] = resolved;
            }
        }

        let mut instance = Instance::new(self.arc(), values);
        for hook in &self.construct_hooks {
            hook(&mut instance).map_err(FactoryError::Behavior)?;
        }
        Ok(instance)
    }

    /// Construct from a keyed map.
    pub fn from_plain_object(
        &self,
        object: BTreeMap<String, Value>,
    ) -> Result<Instance, FactoryError> {
        self.construct(&Forge::from(object))
    }

    /// Construct from an ordinal-indexed tuple. Missing positions resolve
    /// like absent forge entries; extra positions are ignored.
    pub fn from_values(&self, values: Vec<Value>) -> Result<Instance, FactoryError> {
        let mut forge = Forge::new();
        for property in self.table.iter() {
            if let Some(value) = values.get(property.id()) {
                if !value.is_null() {
                    forge.insert(property.key(), value.clone());
                }
            }
        }
        self.construct(&forge)
    }

    /// Length-checked variant of [`Self::from_values`].
    pub fn from_strict_values(&self, values: Vec<Value>) -> Result<Instance, FactoryError> {
        if values.len() != self.table.len() {
            return Err(FactoryError::LengthMismatch {
                expected: self.table.len(),
                found: values.len(),
            });
        }
        self.from_values(values)
    }

    /// Construct from a JSON value: an object keyed by field name, or an
    /// ordinal-indexed array.
    pub fn from_json(&self, json: &serde_json::Value) -> Result<Instance, FactoryError> {
        if !json.is_array() && !json.is_object() {
            return Err(ConversionError::TypeMismatch {
                expected: "JSON array or object".to_string(),
                found: format!("{json:?}"),
            }
            .into());
        }

        let mut forge = Forge::new();
        for property in self.table.iter() {
            let item = match json {
                serde_json::Value::Array(items) => items.get(property.id()),
                serde_json::Value::Object(map) => map.get(property.key()),
                _ => None,
            };
            let Some(item) = item else { continue };
            if item.is_null() {
                continue;
            }

            let value = match property.cardinality() {
                Cardinality::One => self.serializer.from_json(property.ty(), item)?,
                Cardinality::Many => {
                    let items =
                        item.as_array()
                            .ok_or_else(|| ConversionError::TypeMismatch {
                                expected: format!(
                                    "JSON array for repeated property {}",
                                    property.key()
                                ),
                                found: format!("{item:?}"),
                            })?;
                    let mut converted = Vec::with_capacity(items.len());
                    for element in items {
                        // null elements pass through verbatim
                        if element.is_null() {
                            converted.push(Value::Null);
                        } else {
                            converted.push(self.serializer.from_json(property.ty(), element)?);
                        }
                    }
                    Value::List(converted)
                }
            };
            forge.insert(property.key(), value);
        }
        self.construct(&forge)
    }

    /// Construct from a JSON string.
    pub fn from_json_str(&self, json: &str) -> Result<Instance, FactoryError> {
        let value: serde_json::Value = serde_json::from_str(json).map_err(ConversionError::Json)?;
        self.from_json(&value)
    }

    /// Construct and serialize to bytes in one step.
    pub fn encode(&self, forge: &Forge) -> Result<Vec<u8>, FactoryError> {
        Ok(self.construct(forge)?.encode()?)
    }

    /// Reconstruct an instance from bytes.
    pub fn decode(&self, bytes: &[u8]) -> Result<Instance, FactoryError> {
        Ok(self.serializer.decode_value(self, bytes)?)
    }

    /// Construct, serialize and render as text in one step.
    pub fn stringify(&self, forge: &Forge, encoding: TextEncoding) -> Result<String, FactoryError> {
        Ok(self.construct(forge)?.stringify(encoding)?)
    }

    /// Reverse of [`Self::stringify`], via JSON-string decoding.
    pub fn parse(&self, text: &str, encoding: TextEncoding) -> Result<Instance, FactoryError> {
        let bytes = text::decode(text, encoding)?;
        let json = String::from_utf8(bytes).map_err(ConversionError::Utf8)?;
        self.from_json_str(&json)
    }

    /// Type-membership predicate: whether the value is an instance of this
    /// model or of a model extending it.
    pub fn is_instance(&self, value: &Value) -> bool {
        let Value::Instance(instance) = value else {
            return false;
        };
        let mut current = Some(instance.model().clone());
        while let Some(model) = current {
            if std::ptr::eq(Arc::as_ptr(&model), self) {
                return true;
            }
            current = model.base.clone();
        }
        false
    }
}

/// Whether a value is an instance of any factory-built type.
pub fn is_factory_built(value: &Value) -> bool {
    matches!(value, Value::Instance(_))
}

impl fmt::Debug for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelType")
            .field("name", &self.name)
            .field("schema", &self.table.schema_name())
            .field("fields", &self.table.len())
            .field("base", &self.base.as_ref().map(|b| b.name()))
            .finish()
    }
}
