//! Entity synthesis strategies
//!
//! Two interchangeable ways to build the callable behind an entity:
//!
//! | Strategy           | Callable created with        | Context lookup        |
//! |--------------------|------------------------------|-----------------------|
//! | `NativeReflection` | `Realm::extend_callable`     | captured by the body  |
//! | `ManualFallback`   | `Realm::create_function`     | hidden token slot     |
//!
//! Both produce a callable whose `length` equals the behavior's arity, whose
//! delegation parent is the MetaClass prototype, and whose body forwards every
//! invocation to [`dispatch::resolve`](crate::dispatch::resolve). Naming and
//! template binding happen afterwards in the binder, identically for both.

mod manual;
mod native;

pub use manual::{ManualFallback, Trampoline};
pub use native::NativeReflection;

use serde::{Deserialize, Serialize};

use crate::descriptor::ConstructorBehavior;
use crate::dispatch::Wiring;
use crate::error::MetaResult;
use crate::realm::{ObjectId, Realm, SymbolId};

/// Which strategy built an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Declared extension of the base callable type
    NativeReflection,
    /// First-order callable re-parented onto the MetaClass prototype
    ManualFallback,
}

impl StrategyKind {
    /// Strategy implementation for this kind
    pub fn strategy(self) -> &'static dyn SynthesisStrategy {
        match self {
            StrategyKind::NativeReflection => &NativeReflection,
            StrategyKind::ManualFallback => &ManualFallback,
        }
    }
}

/// Inputs for building one entity callable
#[derive(Debug, Clone)]
pub struct SynthesisPlan {
    /// Entity name
    pub name: String,
    /// Declared parameter count
    pub arity: usize,
    /// Validated constructor behavior
    pub behavior: ConstructorBehavior,
    /// Shared MetaClass prototype (delegation parent of every entity)
    pub prototype: ObjectId,
    /// Runtime side-table key
    pub token: SymbolId,
}

/// A built, not yet bound, entity callable
#[derive(Debug, Clone)]
pub struct BuiltEntity {
    /// The callable
    pub object: ObjectId,
    /// Host facilities the body dispatches with
    pub wiring: Wiring,
    /// Diagnostic source text of the trampoline, if any
    pub source: Option<String>,
}

/// Strategy interface
pub trait SynthesisStrategy {
    /// Which strategy this is
    fn kind(&self) -> StrategyKind;

    /// Build the callable for `plan`
    fn build(&self, realm: &mut Realm, plan: &SynthesisPlan) -> MetaResult<BuiltEntity>;
}
