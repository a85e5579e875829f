//! Entity registry for synthesized entity descriptors

use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::descriptor::ConstructorBehavior;
use crate::dispatch::Wiring;
use crate::realm::ObjectId;
use crate::strategy::StrategyKind;

/// Index of an entity in its runtime's registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u32);

impl EntityId {
    /// Get the raw index
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

/// Descriptor of one synthesized entity
#[derive(Debug, Clone)]
pub struct EntityRecord {
    /// Registry index
    pub id: EntityId,
    /// The entity callable
    pub object: ObjectId,
    /// Bound name
    pub name: String,
    /// Declared parameter count
    pub arity: usize,
    /// Instance template (the behavior template)
    pub instance_template: ObjectId,
    /// Constructor behavior resolved from the template
    pub behavior: ConstructorBehavior,
    /// Strategy that built the callable
    pub strategy: StrategyKind,
    /// Host facilities the callable dispatches with
    pub wiring: Wiring,
    /// Diagnostic trampoline source (manual-fallback only)
    pub source: Option<String>,
}

/// Registry of entities synthesized by one runtime
#[derive(Debug, Default)]
pub struct EntityRegistry {
    /// Records indexed by ID
    records: Vec<Rc<EntityRecord>>,
    /// Entity object to ID mapping
    object_to_id: FxHashMap<ObjectId, EntityId>,
    /// Name to most recent ID mapping
    name_to_id: FxHashMap<String, EntityId>,
}

impl EntityRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Next ID to be assigned
    pub fn next_id(&self) -> EntityId {
        EntityId(self.records.len() as u32)
    }

    /// Register a record; its `id` must be [`next_id`](Self::next_id)
    pub fn register(&mut self, record: EntityRecord) -> Rc<EntityRecord> {
        debug_assert_eq!(record.id, self.next_id());
        let record = Rc::new(record);
        self.object_to_id.insert(record.object, record.id);
        self.name_to_id.insert(record.name.clone(), record.id);
        self.records.push(Rc::clone(&record));
        record
    }

    /// Get a record by ID
    pub fn get(&self, id: EntityId) -> Option<&Rc<EntityRecord>> {
        self.records.get(id.0 as usize)
    }

    /// Get the record of an entity object
    pub fn get_by_object(&self, object: ObjectId) -> Option<&Rc<EntityRecord>> {
        self.object_to_id.get(&object).and_then(|id| self.get(*id))
    }

    /// Get the most recently registered record with this name
    pub fn get_by_name(&self, name: &str) -> Option<&Rc<EntityRecord>> {
        self.name_to_id.get(name).and_then(|id| self.get(*id))
    }

    /// Iterate over all records in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Rc<EntityRecord>> {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Style;
    use crate::realm::{Realm, Value};

    fn record(registry: &EntityRegistry, realm: &mut Realm, name: &str) -> EntityRecord {
        let object = realm.create_function(name, 0, |_, _| Ok(Value::Undefined)).unwrap();
        EntityRecord {
            id: registry.next_id(),
            object,
            name: name.to_string(),
            arity: 0,
            instance_template: realm.new_object(),
            behavior: ConstructorBehavior {
                function: object,
                style: Style::Flexible,
            },
            strategy: StrategyKind::ManualFallback,
            wiring: Wiring::MANUAL,
            source: None,
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let mut realm = Realm::new();
        let mut registry = EntityRegistry::new();

        let point = record(&registry, &mut realm, "Point");
        let point_object = point.object;
        let id = registry.register(point).id;
        assert_eq!(id.as_u32(), 0);

        assert_eq!(registry.get(id).unwrap().name, "Point");
        assert_eq!(registry.get_by_object(point_object).unwrap().id, id);
        assert!(registry.get_by_object(realm.new_object()).is_none());
    }

    #[test]
    fn test_name_lookup_prefers_latest() {
        let mut realm = Realm::new();
        let mut registry = EntityRegistry::new();

        let first = record(&registry, &mut realm, "Point");
        registry.register(first);
        let second = record(&registry, &mut realm, "Point");
        let second = registry.register(second);

        assert_eq!(registry.iter().count(), 2);
        assert_eq!(registry.get_by_name("Point").unwrap().id, second.id);
    }
}
