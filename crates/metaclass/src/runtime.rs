//! MetaClass runtime
//!
//! One runtime is installed per realm. It owns the shared entity prototype
//! (home of `toString`/`toSource`), the `MetaClass` constructor function, the
//! side-table token used by the manual-fallback strategy, the cached strategy
//! selection and the entity registry.
//!
//! The runtime handle is cheap to clone; all clones share the same state.

use std::cell::RefCell;
use std::rc::Rc;

use once_cell::unsync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::binder;
use crate::descriptor;
use crate::entity::Entity;
use crate::error::{MetaError, MetaResult};
use crate::escape;
use crate::probe;
use crate::realm::{Attributes, Invocation, ObjectId, Property, Realm, SymbolId, Value};
use crate::registry::{EntityRecord, EntityRegistry};
use crate::strategy::{StrategyKind, SynthesisPlan};

/// Registered symbol under which the runtime is stored in its realm
const RUNTIME_KEY: &str = "metaclass::runtime";

/// How the synthesis strategy is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategySelection {
    /// Probe the realm once and cache the answer
    #[default]
    Auto,
    /// Always use native reflection
    NativeReflection,
    /// Always use the manual fallback
    ManualFallback,
}

/// Options for installing a MetaClass runtime
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetaClassOptions {
    /// Strategy selection
    pub strategy: StrategySelection,
}

impl MetaClassOptions {
    /// Force the native-reflection strategy
    pub fn native() -> Self {
        Self {
            strategy: StrategySelection::NativeReflection,
        }
    }

    /// Force the manual-fallback strategy
    pub fn manual() -> Self {
        Self {
            strategy: StrategySelection::ManualFallback,
        }
    }
}

#[derive(Debug)]
struct Engine {
    prototype: ObjectId,
    constructor: ObjectId,
    token: SymbolId,
    options: MetaClassOptions,
    strategy: OnceCell<StrategyKind>,
    registry: RefCell<EntityRegistry>,
}

/// Handle to the MetaClass runtime of a realm
#[derive(Debug, Clone)]
pub struct MetaClass {
    engine: Rc<Engine>,
}

impl MetaClass {
    /// Get the realm's runtime, installing one with default options if needed
    pub fn install(realm: &mut Realm) -> MetaResult<Self> {
        Self::with_options(realm, MetaClassOptions::default())
    }

    /// Get the realm's runtime, installing one with `options` if needed.
    ///
    /// A realm hosts a single runtime; when one already exists it is returned
    /// as is.
    pub fn with_options(realm: &mut Realm, options: MetaClassOptions) -> MetaResult<Self> {
        if let Some(existing) = Self::find(realm) {
            if existing.options() != &options {
                warn!(
                    requested = ?options.strategy,
                    installed = ?existing.options().strategy,
                    "MetaClass already installed with different options"
                );
            }
            return Ok(existing);
        }

        let function_prototype = realm.intrinsics().function_prototype;
        let prototype = realm.create_object(Some(function_prototype));
        let token = realm.symbol_for(&context_token_name());

        let constructor = realm.create_function("MetaClass", 2, construct_entity)?;
        realm.define_property(constructor, "prototype", Property::data(prototype, Attributes::locked()))?;
        realm.define_property(prototype, "constructor", Property::data(constructor, Attributes::hidden()))?;
        define_hidden_method(realm, prototype, "toString", entity_to_string)?;
        define_hidden_method(realm, prototype, "toSource", entity_to_source)?;

        let engine = Rc::new(Engine {
            prototype,
            constructor,
            token,
            options,
            strategy: OnceCell::new(),
            registry: RefCell::new(EntityRegistry::new()),
        });
        let key = realm.symbol_for(RUNTIME_KEY);
        let holder = realm.create_host_data(None, engine.clone());
        realm.define_property(function_prototype, key, Property::data(holder, Attributes::locked()))?;

        debug!(strategy = ?engine.options.strategy, "MetaClass installed");
        Ok(Self { engine })
    }

    /// Get the realm's runtime, if installed
    pub fn find(realm: &mut Realm) -> Option<Self> {
        let key = realm.symbol_for(RUNTIME_KEY);
        let function_prototype = realm.intrinsics().function_prototype;
        match realm.get_own_property(function_prototype, key).ok()? {
            Some(Property::Data {
                value: Value::Object(holder),
                ..
            }) => realm.host_data::<Engine>(holder).map(|engine| Self { engine }),
            _ => None,
        }
    }

    /// Shared delegation parent of every entity
    pub fn prototype(&self) -> ObjectId {
        self.engine.prototype
    }

    /// The `MetaClass` constructor function
    pub fn constructor(&self) -> ObjectId {
        self.engine.constructor
    }

    /// Side-table key of manual-fallback entities
    pub fn token(&self) -> SymbolId {
        self.engine.token
    }

    /// Installation options
    pub fn options(&self) -> &MetaClassOptions {
        &self.engine.options
    }

    /// The strategy used for synthesis, probing the realm on first use
    pub fn strategy(&self, realm: &mut Realm) -> MetaResult<StrategyKind> {
        if let Some(kind) = self.engine.strategy.get() {
            return Ok(*kind);
        }
        let kind = match self.engine.options.strategy {
            StrategySelection::Auto => probe::probe(realm, self)?,
            StrategySelection::NativeReflection => StrategyKind::NativeReflection,
            StrategySelection::ManualFallback => StrategyKind::ManualFallback,
        };
        Ok(*self.engine.strategy.get_or_init(|| kind))
    }

    /// Synthesize a constructible entity named `name` from a behavior template.
    ///
    /// Nothing is registered unless every step succeeds.
    pub fn synthesize(
        &self,
        realm: &mut Realm,
        name: impl Into<Value>,
        template: impl Into<Value>,
    ) -> MetaResult<Entity> {
        self.synthesize_under(realm, &name.into(), &template.into(), self.prototype())
    }

    /// Synthesize an entity that delegates to `prototype` instead of the
    /// shared entity prototype
    fn synthesize_under(
        &self,
        realm: &mut Realm,
        name: &Value,
        template: &Value,
        prototype: ObjectId,
    ) -> MetaResult<Entity> {
        let descriptor = descriptor::validate(realm, name, template)?;
        let kind = self.strategy(realm)?;

        let plan = SynthesisPlan {
            name: descriptor.name.clone(),
            arity: descriptor.arity,
            behavior: descriptor.behavior,
            prototype,
            token: self.token(),
        };
        let built = kind.strategy().build(realm, &plan)?;
        binder::bind(realm, built.object, &descriptor.name, descriptor.template)?;

        let record = {
            let mut registry = self.engine.registry.borrow_mut();
            let id = registry.next_id();
            registry.register(EntityRecord {
                id,
                object: built.object,
                name: descriptor.name,
                arity: descriptor.arity,
                instance_template: descriptor.template,
                behavior: descriptor.behavior,
                strategy: kind,
                wiring: built.wiring,
                source: built.source,
            })
        };
        debug!(
            name = %record.name,
            arity = record.arity,
            style = ?record.behavior.style,
            strategy = ?kind,
            "synthesized entity"
        );
        Ok(Entity::new(record))
    }

    /// Look up the entity behind a callable
    pub fn entity_of(&self, object: ObjectId) -> Option<Entity> {
        self.engine
            .registry
            .borrow()
            .get_by_object(object)
            .cloned()
            .map(Entity::new)
    }

    /// Most recently synthesized entity with this name
    pub fn entity_named(&self, name: &str) -> Option<Entity> {
        self.engine
            .registry
            .borrow()
            .get_by_name(name)
            .cloned()
            .map(Entity::new)
    }

    /// Every entity synthesized so far, in order
    pub fn entities(&self) -> Vec<Entity> {
        self.engine
            .registry
            .borrow()
            .iter()
            .cloned()
            .map(Entity::new)
            .collect()
    }

    /// Check whether a value is an entity of this runtime (`value instanceof MetaClass`)
    pub fn is_entity(&self, realm: &Realm, value: &Value) -> bool {
        value
            .as_object()
            .is_some_and(|object| realm.is_prototype_of(self.prototype(), object))
    }
}

/// Synthesize an entity with the realm's runtime, installing it on first use
pub fn synthesize(
    realm: &mut Realm,
    name: impl Into<Value>,
    template: impl Into<Value>,
) -> MetaResult<Entity> {
    MetaClass::install(realm)?.synthesize(realm, name, template)
}

/// Registered-symbol key of the manual-fallback side table.
///
/// Mixes quoting and control characters with a random component so no
/// ordinary key collides with it.
fn context_token_name() -> String {
    format!(
        "\t\n\u{ffff}\u{100}\u{ff}'\\\"\"'##__context_for_metaclass_function__@@{:016x}__##'\"\"\\'",
        rand::random::<u64>()
    )
}

fn define_hidden_method(
    realm: &mut Realm,
    target: ObjectId,
    name: &str,
    body: fn(&mut Realm, Invocation<'_>) -> MetaResult<Value>,
) -> MetaResult<()> {
    let method = realm.create_method(name, 0, body)?;
    realm.define_property(target, name, Property::data(method, Attributes::hidden()))
}

/// `new MetaClass(name, template)`
fn construct_entity(realm: &mut Realm, inv: Invocation<'_>) -> MetaResult<Value> {
    let runtime = MetaClass::find(realm)
        .ok_or_else(|| MetaError::Thrown("MetaClass is not installed in this realm".to_string()))?;

    // Subclasses of MetaClass get entities delegating to their own template
    let prototype = match inv.new_target.filter(|t| *t != runtime.constructor()) {
        Some(target) => realm.prototype_for_target(target)?,
        None => runtime.prototype(),
    };
    let entity = runtime.synthesize_under(realm, &inv.arg(0), &inv.arg(1), prototype)?;
    Ok(Value::from(&entity))
}

fn entity_name(realm: &mut Realm, inv: &Invocation<'_>) -> MetaResult<String> {
    let this = inv
        .this_object()
        .ok_or_else(|| MetaError::Thrown("MetaClass method called on a non-object".to_string()))?;
    let name = realm.get(this, "name")?;
    Ok(realm.to_display_string(&name))
}

fn entity_to_string(realm: &mut Realm, inv: Invocation<'_>) -> MetaResult<Value> {
    entity_name(realm, &inv).map(Value::string)
}

fn entity_to_source(realm: &mut Realm, inv: Invocation<'_>) -> MetaResult<Value> {
    entity_name(realm, &inv).map(|name| Value::string(escape::describe(&name)))
}
