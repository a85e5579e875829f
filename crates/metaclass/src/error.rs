//! Error types for synthesis and realm operations

use crate::realm::ObjectId;

/// Result type for metaclass and realm operations
pub type MetaResult<T> = Result<T, MetaError>;

/// Faults raised while synthesizing or invoking constructible entities
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MetaError {
    /// The behavior template is not a plain object
    #[error("MetaClass prototype must be an object (got {found})")]
    InvalidTemplateKind {
        /// Kind of the value that was supplied
        found: &'static str,
    },

    /// No `constructor` slot anywhere in the template's delegation chain
    #[error("Could not find the constructor in MetaClass prototype")]
    ConstructorNotFound,

    /// The resolved `constructor` slot is an accessor
    #[error("MetaClass prototype constructor must be a value (no getters/setters)")]
    ConstructorMustBeValue,

    /// The resolved `constructor` slot cannot be replaced
    #[error("MetaClass prototype constructor must be configurable")]
    ConstructorMustBeConfigurable,

    /// The resolved `constructor` slot holds something that cannot be called
    #[error("MetaClass prototype constructor must be callable (got {found})")]
    ConstructorNotCallable {
        /// Kind of the value found in the slot
        found: &'static str,
    },

    /// A behavior that enforces its own arity received too many arguments
    #[error("Too many arguments to construct {name} (expected: {expected}, got: {got})")]
    TooManyArguments {
        /// Entity name
        name: String,
        /// Maximum accepted argument count
        expected: usize,
        /// Supplied argument count
        got: usize,
    },

    /// Neither synthesis strategy works in this realm
    #[error("No synthesis strategy available (native: {native}; manual: {manual})")]
    StrategyUnavailable {
        /// Why the native-reflection trial failed
        native: String,
        /// Why the manual-fallback trial failed
        manual: String,
    },

    /// The realm has the required host capability disabled
    #[error("Unsupported in this realm: {0}")]
    Unsupported(&'static str),

    /// Call on a value that has no call behavior
    #[error("{0} is not a function")]
    NotCallable(String),

    /// Construct on a callable that cannot be constructed
    #[error("{0} is not a constructor")]
    NotConstructible(String),

    /// A strict (class) constructor was called without a construction target
    #[error("Class constructor {0} cannot be invoked without a construction target")]
    ConstructionTargetRequired(String),

    /// Redefinition of a non-configurable slot
    #[error("Cannot redefine property: {0}")]
    NonConfigurable(String),

    /// Assignment to a read-only slot
    #[error("Cannot assign to read only property '{0}'")]
    ReadOnly(String),

    /// Setting a delegation parent would create a cycle
    #[error("Cyclic prototype value")]
    PrototypeCycle,

    /// Object id does not belong to this realm
    #[error("Unknown object {0:?}")]
    UnknownObject(ObjectId),

    /// Call depth exceeded `RealmOptions::max_call_depth`
    #[error("Maximum call stack size exceeded (depth {0})")]
    StackOverflow(usize),

    /// Error raised by a behavior implementation
    #[error("{0}")]
    Thrown(String),
}

impl From<String> for MetaError {
    fn from(s: String) -> Self {
        MetaError::Thrown(s)
    }
}

impl From<&str> for MetaError {
    fn from(s: &str) -> Self {
        MetaError::Thrown(s.to_string())
    }
}
