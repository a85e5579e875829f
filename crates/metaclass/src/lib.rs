//! MetaClass: runtime synthesis of constructible entities
//!
//! This crate builds named, arity-correct, subclassable constructible types
//! at runtime from a plain behavior template, inside a dynamic object model:
//! - **Realm**: arena-backed host object model (`realm` module)
//! - **Synthesis**: template validation, strategies, binding (`runtime` module)
//! - **Dispatch**: call/construct resolution for entities (`dispatch` module)
//!
//! # Example
//!
//! ```rust,ignore
//! use metaclass::{MetaClass, Realm, Value};
//!
//! let mut realm = Realm::new();
//! let runtime = MetaClass::install(&mut realm)?;
//!
//! // The behavior template: instances delegate to it, its `constructor`
//! // initializes them.
//! let template = realm.new_object();
//! realm.define_method(template, "constructor", 1, |realm, inv| {
//!     let this = inv.this_object().ok_or("no receiver")?;
//!     realm.set(this, "value", inv.arg(0))?;
//!     Ok(Value::Undefined)
//! })?;
//!
//! let optional = runtime.synthesize(&mut realm, "Optional", template)?;
//! assert_eq!(optional.arity(), 1);
//!
//! // Works with and without construct
//! let a = optional.construct(&mut realm, &[Value::from(1)])?;
//! let b = optional.invoke(&mut realm, &[])?;
//! assert!(optional.is_instance(&mut realm, &a)?);
//! assert!(optional.is_instance(&mut realm, &b)?);
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// ============================================================================
// Core Modules
// ============================================================================

/// Host object model
pub mod realm;

/// Error types
pub mod error;

// ============================================================================
// Synthesis Engine
// ============================================================================

/// Behavior-template validation
pub mod descriptor;

/// Dispatch resolution for entity invocations
pub mod dispatch;

/// Source-literal escaping
pub mod escape;

/// Identity and metadata binding
pub mod binder;

/// Entity synthesis strategies
pub mod strategy;

/// Capability probe
pub mod probe;

/// Entity registry
pub mod registry;

/// Entity handles
pub mod entity;

/// MetaClass runtime
pub mod runtime;

// ============================================================================
// Re-exports
// ============================================================================

pub use descriptor::{ConstructorBehavior, Style, ValidatedDescriptor};
pub use dispatch::{Allocation, DispatchContext, Membership, Wiring};
pub use entity::{Entity, EntityMetadata};
pub use error::{MetaError, MetaResult};
pub use realm::{
    Attributes, ClassDeclaration, HostCapabilities, Invocation, ObjectId, Property, PropertyKey,
    Realm, RealmOptions, SymbolId, Value,
};
pub use registry::{EntityId, EntityRecord};
pub use runtime::{synthesize, MetaClass, MetaClassOptions, StrategySelection};
pub use strategy::StrategyKind;
