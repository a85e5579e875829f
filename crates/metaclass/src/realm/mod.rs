//! Host object model
//!
//! A [`Realm`] is a single-threaded, arena-backed dynamic object model:
//! objects delegate to a prototype, carry data and accessor slots, and may be
//! callable. Callables come in two styles:
//!
//! - **Native functions** run with or without a receiver and may return a
//!   replacement object when constructed.
//! - **Declared classes** can only be constructed. A derived class forwards
//!   the construction target to its parent so the most-derived type's
//!   instance template is used for allocation.
//!
//! ```text
//! construct(Derived)             new_target = Derived
//!   └─ construct(Parent, ..)     new_target = Derived  (forwarded)
//!        └─ allocate(Derived.prototype)
//!   └─ Derived initializer(this)
//! ```
//!
//! Host capabilities ([`HostCapabilities`]) gate explicit-target
//! construction and declared-type extension.

mod context;
mod functions;
mod heap;
mod object;
mod options;
mod property;
mod value;

pub use context::{Intrinsics, Realm};
pub use functions::{CallableExtension, ClassDeclaration};
pub use heap::{Heap, ObjectId};
pub use object::{
    ClassCode, FunctionCode, FunctionObject, HeapObject, Initializer, Invocation, NativeFn,
    ObjectKind, SuperArgs,
};
pub use options::{HostCapabilities, RealmOptions};
pub use property::{Attributes, Property};
pub use value::{number_to_string, PropertyKey, SymbolId, Value};
