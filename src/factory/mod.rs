//! Factory/mixin engine
//!
//! Turns property tables into constructible model types:
//! - Two-pass, ordinal-ordered construction with lazy default resolution
//! - Behavioral mixing by capability copy
//! - Tuple, keyed, JSON, byte and text views on instances

pub mod behavior;
pub mod forge;
pub mod instance;
pub mod model;

use crate::schema::RegistrationError;
use crate::serialize::ConversionError;

/// Error during model construction or a factory operation
#[derive(Debug, thiserror::Error)]
pub enum FactoryError {
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error("behavior constructor failed: {0}")]
    Behavior(anyhow::Error),

    #[error("unknown operation {name}")]
    UnknownOperation { name: String },

    #[error("unknown property key {key}")]
    UnknownKey { key: String },

    #[error("expected {expected} tuple values, got {found}")]
    LengthMismatch { expected: usize, found: usize },
}

pub use behavior::{Behavior, ConstructHook, InstanceOp, StaticOp};
pub use forge::Forge;
pub use instance::Instance;
pub use model::{is_factory_built, Factory, ModelType};
