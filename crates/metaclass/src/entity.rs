//! Handles to synthesized entities

use std::rc::Rc;

use crate::descriptor::ConstructorBehavior;
use crate::dispatch::{self, Wiring};
use crate::error::MetaResult;
use crate::escape;
use crate::realm::{ObjectId, Realm, Value};
use crate::registry::{EntityId, EntityRecord};
use crate::strategy::StrategyKind;

/// Naming and arity as observed through the entity's slots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityMetadata {
    /// `name` slot
    pub name: String,
    /// `displayName` slot
    pub display_name: String,
    /// `[Symbol.toStringTag]` slot
    pub string_tag: String,
    /// `length` slot
    pub arity: usize,
}

/// A synthesized constructible entity
#[derive(Debug, Clone)]
pub struct Entity {
    record: Rc<EntityRecord>,
}

impl Entity {
    pub(crate) fn new(record: Rc<EntityRecord>) -> Self {
        Self { record }
    }

    /// Registry index
    pub fn id(&self) -> EntityId {
        self.record.id
    }

    /// The entity callable
    pub fn object(&self) -> ObjectId {
        self.record.object
    }

    /// Bound name
    pub fn name(&self) -> &str {
        &self.record.name
    }

    /// Declared parameter count
    pub fn arity(&self) -> usize {
        self.record.arity
    }

    /// Instance template (the `prototype` slot)
    pub fn instance_template(&self) -> ObjectId {
        self.record.instance_template
    }

    /// Constructor behavior from the template
    pub fn behavior(&self) -> ConstructorBehavior {
        self.record.behavior
    }

    /// Strategy that built this entity
    pub fn strategy(&self) -> StrategyKind {
        self.record.strategy
    }

    /// Host facilities this entity dispatches with
    pub fn wiring(&self) -> Wiring {
        self.record.wiring
    }

    /// Diagnostic trampoline source (manual-fallback entities only)
    pub fn source(&self) -> Option<&str> {
        self.record.source.as_deref()
    }

    /// Call without a receiver
    pub fn invoke(&self, realm: &mut Realm, args: &[Value]) -> MetaResult<Value> {
        realm.call(self.object(), &Value::Undefined, args)
    }

    /// Call with an explicit receiver
    pub fn invoke_with(&self, realm: &mut Realm, receiver: &Value, args: &[Value]) -> MetaResult<Value> {
        realm.call(self.object(), receiver, args)
    }

    /// Allocate and initialize an instance
    pub fn construct(&self, realm: &mut Realm, args: &[Value]) -> MetaResult<Value> {
        realm.construct(self.object(), args)
    }

    /// Allocate and initialize with an explicit construction target
    pub fn construct_as(&self, realm: &mut Realm, args: &[Value], target: ObjectId) -> MetaResult<Value> {
        realm.reflect_construct(self.object(), args, target)
    }

    /// Check whether `value` is an instance of this entity
    pub fn is_instance(&self, realm: &mut Realm, value: &Value) -> MetaResult<bool> {
        match value {
            Value::Object(object) => {
                dispatch::is_member(realm, self.record.wiring.membership, *object, self.object())
            }
            _ => Ok(false),
        }
    }

    /// Read naming and arity back from the bound slots
    pub fn metadata(&self, realm: &mut Realm) -> MetaResult<EntityMetadata> {
        let object = self.object();
        let to_string_tag = realm.intrinsics().to_string_tag;
        let name = realm.get(object, "name")?;
        let display_name = realm.get(object, "displayName")?;
        let string_tag = realm.get(object, to_string_tag)?;
        let arity = realm.get(object, "length")?;

        Ok(EntityMetadata {
            name: realm.to_display_string(&name),
            display_name: realm.to_display_string(&display_name),
            string_tag: realm.to_display_string(&string_tag),
            arity: arity.as_number().map_or(0, |n| n as usize),
        })
    }

    /// `(new MetaClass('Name', [[prototype]]))`
    pub fn describe(&self) -> String {
        escape::describe(self.name())
    }

    /// New template delegating to this entity's instance template, for
    /// synthesizing a derived entity
    pub fn derive_template(&self, realm: &mut Realm) -> ObjectId {
        realm.create_object(Some(self.instance_template()))
    }
}

impl From<&Entity> for Value {
    fn from(entity: &Entity) -> Self {
        Value::Object(entity.object())
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.record, &other.record)
    }
}

impl Eq for Entity {}
