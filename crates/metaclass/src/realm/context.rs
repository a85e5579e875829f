//! Realm: heap, symbols, intrinsics and slot operations

use std::any::Any;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use super::heap::{Heap, ObjectId};
use super::object::{HeapObject, ObjectKind};
use super::options::{HostCapabilities, RealmOptions};
use super::property::{Attributes, Property};
use super::value::{number_to_string, PropertyKey, SymbolId, Value};
use crate::error::{MetaError, MetaResult};

/// Objects and symbols every realm starts with
#[derive(Debug, Clone, Copy)]
pub struct Intrinsics {
    /// Root of ordinary delegation chains
    pub object_prototype: ObjectId,
    /// Shared parent of every function object
    pub function_prototype: ObjectId,
    /// Well-known `Symbol.toStringTag`
    pub to_string_tag: SymbolId,
}

#[derive(Debug, Clone)]
struct SymbolRecord {
    description: String,
}

/// Isolated object model instance
pub struct Realm {
    heap: Heap,
    symbols: Vec<SymbolRecord>,
    /// Registered symbols (`symbol_for`)
    symbol_registry: FxHashMap<String, SymbolId>,
    intrinsics: Intrinsics,
    options: RealmOptions,
    /// Current call/construct nesting
    pub(super) depth: usize,
}

impl Realm {
    /// Create a realm with default options
    pub fn new() -> Self {
        Self::with_options(RealmOptions::default())
    }

    /// Create a realm with specific options
    pub fn with_options(options: RealmOptions) -> Self {
        let mut heap = Heap::new();
        let object_prototype = heap.allocate(HeapObject::new(None, ObjectKind::Ordinary));
        let function_prototype =
            heap.allocate(HeapObject::new(Some(object_prototype), ObjectKind::Ordinary));

        let symbols = vec![SymbolRecord {
            description: "Symbol.toStringTag".to_string(),
        }];

        Self {
            heap,
            symbols,
            symbol_registry: FxHashMap::default(),
            intrinsics: Intrinsics {
                object_prototype,
                function_prototype,
                to_string_tag: SymbolId(0),
            },
            options,
            depth: 0,
        }
    }

    /// Realm options
    pub fn options(&self) -> &RealmOptions {
        &self.options
    }

    /// Available host features
    pub fn capabilities(&self) -> HostCapabilities {
        self.options.capabilities
    }

    /// Built-in objects and symbols
    pub fn intrinsics(&self) -> Intrinsics {
        self.intrinsics
    }

    /// Number of objects allocated so far
    pub fn heap_size(&self) -> usize {
        self.heap.len()
    }

    /// Borrow an object
    pub fn object(&self, id: ObjectId) -> MetaResult<&HeapObject> {
        self.heap.get(id).ok_or(MetaError::UnknownObject(id))
    }

    fn object_mut(&mut self, id: ObjectId) -> MetaResult<&mut HeapObject> {
        self.heap.get_mut(id).ok_or(MetaError::UnknownObject(id))
    }

    pub(super) fn allocate(&mut self, object: HeapObject) -> ObjectId {
        self.heap.allocate(object)
    }

    // ------------------------------------------------------------------
    // Symbols
    // ------------------------------------------------------------------

    /// Create a fresh, unregistered symbol
    pub fn new_symbol(&mut self, description: impl Into<String>) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(SymbolRecord {
            description: description.into(),
        });
        id
    }

    /// Look up or create the registered symbol for `key`
    pub fn symbol_for(&mut self, key: &str) -> SymbolId {
        if let Some(id) = self.symbol_registry.get(key) {
            return *id;
        }
        let id = self.new_symbol(key);
        self.symbol_registry.insert(key.to_string(), id);
        id
    }

    /// Description a symbol was created with
    pub fn symbol_description(&self, id: SymbolId) -> Option<&str> {
        self.symbols.get(id.0 as usize).map(|s| s.description.as_str())
    }

    // ------------------------------------------------------------------
    // Object creation
    // ------------------------------------------------------------------

    /// Create an ordinary object with the given delegation parent
    pub fn create_object(&mut self, prototype: Option<ObjectId>) -> ObjectId {
        self.heap
            .allocate(HeapObject::new(prototype, ObjectKind::Ordinary))
    }

    /// Create an ordinary object delegating to the object prototype
    pub fn new_object(&mut self) -> ObjectId {
        let proto = self.intrinsics.object_prototype;
        self.create_object(Some(proto))
    }

    /// Create an object carrying an opaque host payload
    pub fn create_host_data(&mut self, prototype: Option<ObjectId>, data: Rc<dyn Any>) -> ObjectId {
        self.heap
            .allocate(HeapObject::new(prototype, ObjectKind::HostData(data)))
    }

    /// Get the host payload of an object, if it has one of type `T`
    pub fn host_data<T: Any>(&self, id: ObjectId) -> Option<Rc<T>> {
        match &self.heap.get(id)?.kind {
            ObjectKind::HostData(data) => Rc::clone(data).downcast::<T>().ok(),
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // Delegation chain
    // ------------------------------------------------------------------

    /// Get an object's delegation parent
    pub fn get_prototype_of(&self, id: ObjectId) -> MetaResult<Option<ObjectId>> {
        Ok(self.object(id)?.prototype)
    }

    /// Replace an object's delegation parent
    pub fn set_prototype_of(&mut self, id: ObjectId, prototype: Option<ObjectId>) -> MetaResult<()> {
        let mut current = prototype;
        while let Some(link) = current {
            if link == id {
                return Err(MetaError::PrototypeCycle);
            }
            current = self.object(link)?.prototype;
        }
        self.object_mut(id)?.prototype = prototype;
        Ok(())
    }

    /// Check if `prototype` appears on `object`'s delegation chain
    pub fn is_prototype_of(&self, prototype: ObjectId, object: ObjectId) -> bool {
        let mut current = self.heap.get(object).and_then(|o| o.prototype);
        while let Some(link) = current {
            if link == prototype {
                return true;
            }
            current = self.heap.get(link).and_then(|o| o.prototype);
        }
        false
    }

    // ------------------------------------------------------------------
    // Slots
    // ------------------------------------------------------------------

    /// Get a copy of an own slot
    pub fn get_own_property(
        &self,
        id: ObjectId,
        key: impl Into<PropertyKey>,
    ) -> MetaResult<Option<Property>> {
        Ok(self.object(id)?.own_property(&key.into()).cloned())
    }

    /// Own keys in insertion order
    pub fn own_keys(&self, id: ObjectId) -> MetaResult<Vec<PropertyKey>> {
        Ok(self.object(id)?.own_keys().to_vec())
    }

    /// Check for an own slot
    pub fn has_own_property(&self, id: ObjectId, key: impl Into<PropertyKey>) -> MetaResult<bool> {
        Ok(self.object(id)?.own_property(&key.into()).is_some())
    }

    /// Check for a slot anywhere on the delegation chain
    pub fn has_property(&self, id: ObjectId, key: impl Into<PropertyKey>) -> MetaResult<bool> {
        let key = key.into();
        let mut current = Some(id);
        while let Some(link) = current {
            let object = self.object(link)?;
            if object.own_property(&key).is_some() {
                return Ok(true);
            }
            current = object.prototype;
        }
        Ok(false)
    }

    /// Define or redefine an own slot
    pub fn define_property(
        &mut self,
        id: ObjectId,
        key: impl Into<PropertyKey>,
        property: Property,
    ) -> MetaResult<()> {
        let key = key.into();
        let object = self.object_mut(id)?;
        if let Some(existing) = object.own_property(&key) {
            if !existing.permits_redefinition(&property) {
                return Err(MetaError::NonConfigurable(key.to_string()));
            }
        }
        object.insert_property(key, property);
        Ok(())
    }

    /// Remove an own slot; returns false for non-configurable slots
    pub fn delete_property(&mut self, id: ObjectId, key: impl Into<PropertyKey>) -> MetaResult<bool> {
        let key = key.into();
        let object = self.object_mut(id)?;
        match object.own_property(&key) {
            Some(existing) if !existing.is_configurable() => Ok(false),
            Some(_) => {
                object.remove_property(&key);
                Ok(true)
            }
            None => Ok(true),
        }
    }

    /// Read a slot through the delegation chain, running getters
    pub fn get(&mut self, id: ObjectId, key: impl Into<PropertyKey>) -> MetaResult<Value> {
        let key = key.into();
        let mut current = Some(id);
        while let Some(link) = current {
            let (found, parent) = {
                let object = self.object(link)?;
                (object.own_property(&key).cloned(), object.prototype)
            };
            match found {
                Some(Property::Data { value, .. }) => return Ok(value),
                Some(Property::Accessor { get: Some(getter), .. }) => {
                    return self.call(getter, &Value::Object(id), &[]);
                }
                Some(Property::Accessor { get: None, .. }) => return Ok(Value::Undefined),
                None => current = parent,
            }
        }
        Ok(Value::Undefined)
    }

    /// Assign a slot, running setters found on the delegation chain
    pub fn set(
        &mut self,
        id: ObjectId,
        key: impl Into<PropertyKey>,
        value: impl Into<Value>,
    ) -> MetaResult<()> {
        let key = key.into();
        let value = value.into();
        let mut current = Some(id);
        while let Some(link) = current {
            let (found, parent) = {
                let object = self.object(link)?;
                (object.own_property(&key).cloned(), object.prototype)
            };
            match found {
                Some(Property::Accessor { set: Some(setter), .. }) => {
                    self.call(setter, &Value::Object(id), &[value])?;
                    return Ok(());
                }
                Some(Property::Accessor { set: None, .. }) => {
                    return Err(MetaError::ReadOnly(key.to_string()));
                }
                Some(Property::Data { attributes, .. }) if !attributes.writable => {
                    return Err(MetaError::ReadOnly(key.to_string()));
                }
                Some(Property::Data { attributes, .. }) if link == id => {
                    self.object_mut(id)?
                        .insert_property(key, Property::Data { value, attributes });
                    return Ok(());
                }
                Some(Property::Data { .. }) => break,
                None => current = parent,
            }
        }
        self.object_mut(id)?
            .insert_property(key, Property::data(value, Attributes::open()));
        Ok(())
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    /// Check if a value can be called
    pub fn is_callable(&self, value: &Value) -> bool {
        value
            .as_object()
            .and_then(|id| self.heap.get(id))
            .is_some_and(|o| o.function().is_some())
    }

    /// Check if a value can be constructed
    pub fn is_constructible(&self, value: &Value) -> bool {
        value
            .as_object()
            .and_then(|id| self.heap.get(id))
            .and_then(|o| o.function())
            .is_some_and(|f| f.constructible)
    }

    /// Check if an object is a declared class constructor
    pub fn is_class_constructor(&self, id: ObjectId) -> bool {
        self.heap
            .get(id)
            .and_then(|o| o.function())
            .is_some_and(|f| f.is_class())
    }

    /// Declared parameter count of a callable
    pub fn function_length(&self, id: ObjectId) -> Option<usize> {
        self.heap.get(id).and_then(|o| o.function()).map(|f| f.length)
    }

    /// The callable's own `name` slot, or `anonymous`
    pub fn function_name(&self, id: ObjectId) -> String {
        self.heap
            .get(id)
            .and_then(|o| o.own_property(&PropertyKey::from("name")))
            .and_then(|p| p.value())
            .and_then(|v| v.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or("anonymous")
            .to_string()
    }

    /// Instance template used when `target` is the construction target
    pub fn prototype_for_target(&mut self, target: ObjectId) -> MetaResult<ObjectId> {
        match self.get(target, "prototype")? {
            Value::Object(proto) => Ok(proto),
            _ => Ok(self.intrinsics.object_prototype),
        }
    }

    /// Native membership check: is `ctor.prototype` on `value`'s chain
    pub fn instance_of(&mut self, value: &Value, ctor: ObjectId) -> MetaResult<bool> {
        if !self.is_callable(&Value::Object(ctor)) {
            return Err(MetaError::NotCallable(
                self.to_display_string(&Value::Object(ctor)),
            ));
        }
        let Some(object) = value.as_object() else {
            return Ok(false);
        };
        match self.get(ctor, "prototype")? {
            Value::Object(proto) => Ok(self.is_prototype_of(proto, object)),
            _ => Err(MetaError::Thrown(format!(
                "Function has non-object prototype '{}' in instanceof check",
                self.to_display_string(&Value::Object(ctor))
            ))),
        }
    }

    /// String coercion that never fails and never runs code
    pub fn to_display_string(&self, value: &Value) -> String {
        match value {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => number_to_string(*n),
            Value::String(s) => s.to_string(),
            Value::Symbol(id) => {
                format!("Symbol({})", self.symbol_description(*id).unwrap_or(""))
            }
            Value::Object(id) => {
                if self.is_callable(value) {
                    return self.function_name(*id);
                }
                format!("[object {}]", self.string_tag(*id).unwrap_or("Object"))
            }
        }
    }

    /// First string-valued `toStringTag` data slot on the chain
    fn string_tag(&self, id: ObjectId) -> Option<&str> {
        let key = PropertyKey::Symbol(self.intrinsics.to_string_tag);
        let mut current = Some(id);
        while let Some(link) = current {
            let object = self.heap.get(link)?;
            if let Some(property) = object.own_property(&key) {
                return property.value().and_then(|v| v.as_str());
            }
            current = object.prototype;
        }
        None
    }
}

impl Default for Realm {
    fn default() -> Self {
        Self::new()
    }
}
