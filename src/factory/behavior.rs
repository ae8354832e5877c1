//! Behavioral mixing
//!
//! A [`Behavior`] carries named operations and an optional constructor
//! hook. The factory composes behaviors into model types by capability
//! copy: operations not already defined on the new type are shared (same
//! `Arc`) from the behavior, so unrelated bases combine without
//! inheritance diamonds.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::factory::instance::Instance;
use crate::factory::model::ModelType;
use crate::values::Value;

/// Named operation on an instance.
pub type InstanceOp = Arc<dyn Fn(&Instance, &[Value]) -> Value + Send + Sync>;

/// Named operation on a model type.
pub type StaticOp = Arc<dyn Fn(&ModelType, &[Value]) -> Value + Send + Sync>;

/// Constructor hook, invoked exactly once per construction with the
/// fully-resolved instance.
pub type ConstructHook = Arc<dyn Fn(&mut Instance) -> anyhow::Result<()> + Send + Sync>;

/// A named set of operations mixed into factory-built types.
#[derive(Clone, Default)]
pub struct Behavior {
    name: String,
    pub(crate) construct: Option<ConstructHook>,
    pub(crate) methods: BTreeMap<String, InstanceOp>,
    pub(crate) statics: BTreeMap<String, StaticOp>,
}

impl Behavior {
    /// Create an empty behavior.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            construct: None,
            methods: BTreeMap::new(),
            statics: BTreeMap::new(),
        }
    }

    /// Behavior name used in model naming.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attach the constructor hook.
    pub fn on_construct<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Instance) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.construct = Some(Arc::new(hook));
        self
    }

    /// Attach a named instance operation.
    pub fn method<F>(mut self, name: impl Into<String>, op: F) -> Self
    where
        F: Fn(&Instance, &[Value]) -> Value + Send + Sync + 'static,
    {
        self.methods.insert(name.into(), Arc::new(op));
        self
    }

    /// Attach a named static operation.
    pub fn static_op<F>(mut self, name: impl Into<String>, op: F) -> Self
    where
        F: Fn(&ModelType, &[Value]) -> Value + Send + Sync + 'static,
    {
        self.statics.insert(name.into(), Arc::new(op));
        self
    }
}

impl std::fmt::Debug for Behavior {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Behavior")
            .field("name", &self.name)
            .field("construct", &self.construct.is_some())
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .field("statics", &self.statics.keys().collect::<Vec<_>>())
            .finish()
    }
}
