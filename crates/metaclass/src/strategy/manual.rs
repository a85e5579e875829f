//! Manual-fallback strategy
//!
//! Works with first-order callables only. The callable is created as a plain
//! function padded to the behavior's arity and re-parented onto the MetaClass
//! prototype afterwards. Its body carries no state: the dispatch context lives
//! in a host-data object stored under the runtime token, and every invocation
//! looks it up through the callee.

use std::rc::Rc;

use super::{BuiltEntity, StrategyKind, SynthesisPlan, SynthesisStrategy};
use crate::dispatch::{self, Allocation, Dispatch, DispatchContext, Membership, Wiring};
use crate::error::{MetaError, MetaResult};
use crate::escape::escape;
use crate::realm::{Attributes, Invocation, ObjectId, Property, Realm, SymbolId, Value};

/// Side-table entry stored under the runtime token
#[derive(Debug, Clone)]
pub struct Trampoline {
    /// Dispatch context of the entity
    pub context: DispatchContext,
}

/// Builds entities from plain functions plus a side table
#[derive(Debug, Clone, Copy, Default)]
pub struct ManualFallback;

impl ManualFallback {
    fn wiring(realm: &Realm) -> Wiring {
        if realm.capabilities().reflective_construct {
            Wiring {
                allocation: Allocation::Reflective,
                membership: Membership::Native,
            }
        } else {
            Wiring::MANUAL
        }
    }
}

impl SynthesisStrategy for ManualFallback {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ManualFallback
    }

    fn build(&self, realm: &mut Realm, plan: &SynthesisPlan) -> MetaResult<BuiltEntity> {
        let wiring = Self::wiring(realm);
        let token = plan.token;
        let source = trampoline_source(realm, plan.arity, token);

        let body = move |realm: &mut Realm, inv: Invocation<'_>| {
            let trampoline = lookup(realm, inv.callee, token)?;
            dispatch::resolve(
                realm,
                &trampoline.context,
                Dispatch {
                    entity: inv.callee,
                    args: inv.args,
                    target: inv.new_target,
                    receiver: Some(inv.this),
                },
            )
        };
        let object = realm.create_function(&plan.name, plan.arity, body)?;
        realm.set_prototype_of(object, Some(plan.prototype))?;

        let holder = realm.create_host_data(
            None,
            Rc::new(Trampoline {
                context: DispatchContext {
                    behavior: plan.behavior,
                    wiring,
                },
            }),
        );
        realm.define_property(object, token, Property::data(holder, Attributes::read_only()))?;

        Ok(BuiltEntity {
            object,
            wiring,
            source: Some(source),
        })
    }
}

/// Fetch the side-table entry of an entity built by this strategy
pub(crate) fn lookup(realm: &Realm, entity: ObjectId, token: SymbolId) -> MetaResult<Rc<Trampoline>> {
    let holder = match realm.get_own_property(entity, token)? {
        Some(Property::Data {
            value: Value::Object(holder),
            ..
        }) => holder,
        _ => {
            return Err(MetaError::Thrown(format!(
                "{} has no dispatch context",
                realm.function_name(entity)
            )))
        }
    };
    realm
        .host_data::<Trampoline>(holder)
        .ok_or_else(|| MetaError::Thrown("dispatch context has the wrong type".to_string()))
}

fn trampoline_source(realm: &Realm, arity: usize, token: SymbolId) -> String {
    let params: Vec<String> = (0..arity).map(|i| format!("placeholder_{}", i)).collect();
    let key = escape(realm.symbol_description(token).unwrap_or_default());
    format!(
        "function anonymous({}) {{\nreturn callee[Symbol.for({})](arguments, new.target, this)\n}}",
        params.join(", "),
        key
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{ConstructorBehavior, Style};
    use crate::realm::RealmOptions;

    fn plan(realm: &mut Realm, arity: usize) -> SynthesisPlan {
        let behavior = realm
            .create_method("constructor", arity, |_, _| Ok(Value::Undefined))
            .unwrap();
        let prototype = realm.create_object(Some(realm.intrinsics().function_prototype));
        SynthesisPlan {
            name: "Pair".to_string(),
            arity,
            behavior: ConstructorBehavior {
                function: behavior,
                style: Style::Flexible,
            },
            prototype,
            token: realm.symbol_for("\t\u{0}token"),
        }
    }

    #[test]
    fn test_build_stores_context_under_token() {
        let mut realm = Realm::new();
        let plan = plan(&mut realm, 2);
        let built = ManualFallback.build(&mut realm, &plan).unwrap();

        assert_eq!(realm.function_length(built.object), Some(2));
        assert_eq!(realm.get_prototype_of(built.object).unwrap(), Some(plan.prototype));
        let slot = realm.get_own_property(built.object, plan.token).unwrap().unwrap();
        assert!(!slot.is_enumerable());
        assert!(!slot.is_writable());

        let trampoline = lookup(&realm, built.object, plan.token).unwrap();
        assert_eq!(trampoline.context.behavior, plan.behavior);
        assert_eq!(trampoline.context.wiring.allocation, Allocation::Reflective);
    }

    #[test]
    fn test_legacy_realm_uses_manual_wiring() {
        let mut realm = Realm::with_options(RealmOptions::legacy());
        let plan = plan(&mut realm, 0);
        let built = ManualFallback.build(&mut realm, &plan).unwrap();

        assert_eq!(built.wiring, Wiring::MANUAL);
    }

    #[test]
    fn test_trampoline_source_is_padded_and_escaped() {
        let mut realm = Realm::new();
        let plan = plan(&mut realm, 2);
        let built = ManualFallback.build(&mut realm, &plan).unwrap();
        let source = built.source.unwrap();

        assert!(source.starts_with("function anonymous(placeholder_0, placeholder_1)"));
        assert!(source.contains("Symbol.for('\\t\\x00token')"));
        assert!(source.is_ascii());
    }

    #[test]
    fn test_missing_context_is_an_error() {
        let mut realm = Realm::new();
        let plan = plan(&mut realm, 0);
        let plain = realm.create_function("plain", 0, |_, _| Ok(Value::Undefined)).unwrap();

        assert!(matches!(lookup(&realm, plain, plan.token), Err(MetaError::Thrown(_))));
    }
}
