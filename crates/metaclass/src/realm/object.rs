//! Heap objects and callable code

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use super::heap::ObjectId;
use super::property::Property;
use super::value::{PropertyKey, Value};
use super::Realm;
use crate::error::MetaResult;

/// Native function body.
///
/// Receives the realm and the invocation record; whatever it returns is the
/// call result (and, when constructed, supersedes the receiver if it is an
/// object).
pub type NativeFn = Rc<dyn Fn(&mut Realm, Invocation<'_>) -> MetaResult<Value>>;

/// Class initializer: runs against an already-allocated receiver.
pub type Initializer = Rc<dyn Fn(&mut Realm, ObjectId, &[Value]) -> MetaResult<()>>;

/// Maps a derived class's arguments to the arguments of its parent.
pub type SuperArgs = Rc<dyn Fn(&mut Realm, &[Value]) -> MetaResult<Vec<Value>>>;

/// One call or construct request as seen by a native body
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    /// The function being invoked
    pub callee: ObjectId,
    /// Receiver (`undefined` for bare calls)
    pub this: &'a Value,
    /// Positional arguments
    pub args: &'a [Value],
    /// Construction target, present only when invoked through construct
    pub new_target: Option<ObjectId>,
}

impl<'a> Invocation<'a> {
    /// Get an argument or `undefined`
    pub fn arg(&self, index: usize) -> Value {
        self.args.get(index).cloned().unwrap_or(Value::Undefined)
    }

    /// Receiver as an object, if it is one
    pub fn this_object(&self) -> Option<ObjectId> {
        self.this.as_object()
    }
}

/// Strict-style (declared class) constructor code
#[derive(Clone)]
pub struct ClassCode {
    /// Parent constructor (derived classes)
    pub parent: Option<ObjectId>,
    /// Per-instance initialization run after the parent constructed the receiver
    pub initializer: Option<Initializer>,
    /// Argument mapping for the parent call (identity when absent)
    pub super_args: Option<SuperArgs>,
}

/// Executable part of a function object
#[derive(Clone)]
pub enum FunctionCode {
    /// Flexible-style body
    Native(NativeFn),
    /// Strict-style declared class
    Class(Rc<ClassCode>),
}

/// Function object internals
#[derive(Clone)]
pub struct FunctionObject {
    /// Declared parameter count
    pub length: usize,
    /// Whether construct is allowed
    pub constructible: bool,
    /// Code to run
    pub code: FunctionCode,
}

impl FunctionObject {
    /// Check if this is a declared class constructor
    pub fn is_class(&self) -> bool {
        matches!(self.code, FunctionCode::Class(_))
    }
}

/// Object internals
#[derive(Clone)]
pub enum ObjectKind {
    /// Plain object
    Ordinary,
    /// Callable object
    Function(FunctionObject),
    /// Opaque host payload
    HostData(Rc<dyn Any>),
}

/// Object instance stored in the realm heap
#[derive(Clone)]
pub struct HeapObject {
    /// Delegation parent
    pub(crate) prototype: Option<ObjectId>,
    /// Own slots
    pub(crate) properties: FxHashMap<PropertyKey, Property>,
    /// Own keys in insertion order
    pub(crate) keys: Vec<PropertyKey>,
    /// Object internals
    pub(crate) kind: ObjectKind,
}

impl HeapObject {
    /// Create an object with no slots
    pub fn new(prototype: Option<ObjectId>, kind: ObjectKind) -> Self {
        Self {
            prototype,
            properties: FxHashMap::default(),
            keys: Vec::new(),
            kind,
        }
    }

    /// Delegation parent
    pub fn prototype(&self) -> Option<ObjectId> {
        self.prototype
    }

    /// Object internals
    pub fn kind(&self) -> &ObjectKind {
        &self.kind
    }

    /// Function internals, if callable
    pub fn function(&self) -> Option<&FunctionObject> {
        match &self.kind {
            ObjectKind::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Look up an own slot
    pub fn own_property(&self, key: &PropertyKey) -> Option<&Property> {
        self.properties.get(key)
    }

    /// Own keys in insertion order
    pub fn own_keys(&self) -> &[PropertyKey] {
        &self.keys
    }

    pub(crate) fn insert_property(&mut self, key: PropertyKey, property: Property) {
        if self.properties.insert(key.clone(), property).is_none() {
            self.keys.push(key);
        }
    }

    pub(crate) fn remove_property(&mut self, key: &PropertyKey) -> Option<Property> {
        let removed = self.properties.remove(key);
        if removed.is_some() {
            self.keys.retain(|k| k != key);
        }
        removed
    }
}

impl fmt::Debug for HeapObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.kind {
            ObjectKind::Ordinary => "ordinary",
            ObjectKind::Function(func) if func.is_class() => "class",
            ObjectKind::Function(_) => "function",
            ObjectKind::HostData(_) => "host-data",
        };
        f.debug_struct("HeapObject")
            .field("kind", &kind)
            .field("prototype", &self.prototype)
            .field("keys", &self.keys)
            .finish()
    }
}
