//! Schema registration
//!
//! Registration is idempotent per schema type: the first successful build
//! is cached by `TypeId` for the lifetime of the process and every later
//! call returns the cached table. Faults are never cached — a broken schema
//! fails identically on every attempt.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;

use crate::schema::builder::SchemaBuilder;
use crate::schema::error::RegistrationError;
use crate::schema::property::Property;
use crate::schema::table::PropertyTable;

/// A schema type: a name plus a pure describe function.
///
/// Schema types only describe shape; they are never instantiated. Use the
/// factory to obtain constructible types.
///
/// # Example
///
/// ```rust
/// use schema_forge_sdk::schema::{FieldType, PropertySpec, Schema, SchemaBuilder};
///
/// struct PointSchema;
///
/// impl Schema for PointSchema {
///     fn schema_name() -> &'static str {
///         "Point"
///     }
///
///     fn describe(schema: &mut SchemaBuilder) {
///         schema
///             .field(0, "x", PropertySpec::new(FieldType::Float))
///             .field(1, "y", PropertySpec::new(FieldType::Float));
///     }
/// }
/// ```
pub trait Schema: 'static {
    /// Schema name used in diagnostics and model naming.
    fn schema_name() -> &'static str;

    /// Declare the schema's fields on the builder.
    fn describe(schema: &mut SchemaBuilder);
}

/// Host hook receiving per-field type-reflection hints after registration.
pub type ReflectionHook = dyn Fn(&str, &Property) -> anyhow::Result<()> + Send + Sync;

static REGISTRY: Lazy<RwLock<HashMap<TypeId, Arc<PropertyTable>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

static REFLECTION_HOOK: Lazy<RwLock<Option<Arc<ReflectionHook>>>> =
    Lazy::new(|| RwLock::new(None));

/// Build (or fetch the cached) property table for a schema type.
pub fn register<S: Schema>() -> Result<Arc<PropertyTable>, RegistrationError> {
    let type_id = TypeId::of::<S>();
    if let Some(table) = REGISTRY
        .read()
        .expect("schema registry lock poisoned")
        .get(&type_id)
    {
        return Ok(table.clone());
    }

    let mut builder = SchemaBuilder::new(S::schema_name());
    S::describe(&mut builder);
    let table = Arc::new(builder.finish()?);

    publish_reflection_hints(&table);

    let mut registry = REGISTRY.write().expect("schema registry lock poisoned");
    let table = registry.entry(type_id).or_insert(table).clone();
    tracing::debug!(
        schema = table.schema_name(),
        fields = table.len(),
        "registered property table"
    );
    Ok(table)
}

/// Fetch the cached table for an already-registered schema type.
pub fn lookup<S: Schema>() -> Option<Arc<PropertyTable>> {
    REGISTRY
        .read()
        .expect("schema registry lock poisoned")
        .get(&TypeId::of::<S>())
        .cloned()
}

/// Install a host reflection hook. Publication is best-effort: hook errors
/// are logged and never fail registration.
pub fn set_reflection_hook<F>(hook: F)
where
    F: Fn(&str, &Property) -> anyhow::Result<()> + Send + Sync + 'static,
{
    *REFLECTION_HOOK
        .write()
        .expect("reflection hook lock poisoned") = Some(Arc::new(hook));
}

/// Remove the installed reflection hook.
pub fn clear_reflection_hook() {
    *REFLECTION_HOOK
        .write()
        .expect("reflection hook lock poisoned") = None;
}

fn publish_reflection_hints(table: &PropertyTable) {
    let hook = REFLECTION_HOOK
        .read()
        .expect("reflection hook lock poisoned")
        .clone();
    let Some(hook) = hook else {
        return;
    };
    for property in table.iter() {
        if let Err(error) = hook(table.schema_name(), property) {
            tracing::warn!(
                schema = table.schema_name(),
                key = property.key(),
                %error,
                "reflection hint publication failed"
            );
        }
    }
}
