//! Capability probe
//!
//! Picks a synthesis strategy by building and exercising one throwaway entity
//! per strategy, native reflection first.

use tracing::{debug, warn};

use crate::descriptor::{ConstructorBehavior, Style};
use crate::error::{MetaError, MetaResult};
use crate::realm::{Realm, Value};
use crate::runtime::MetaClass;
use crate::strategy::{StrategyKind, SynthesisPlan};

const TRIAL_ARITY: usize = 1;

/// Select the strategy this realm supports
pub fn probe(realm: &mut Realm, runtime: &MetaClass) -> MetaResult<StrategyKind> {
    let native = match trial(realm, runtime, StrategyKind::NativeReflection) {
        Ok(()) => {
            debug!(strategy = ?StrategyKind::NativeReflection, "strategy selected");
            return Ok(StrategyKind::NativeReflection);
        }
        Err(e) => e,
    };
    warn!(error = %native, "native reflection unavailable, using manual fallback");

    match trial(realm, runtime, StrategyKind::ManualFallback) {
        Ok(()) => {
            debug!(strategy = ?StrategyKind::ManualFallback, "strategy selected");
            Ok(StrategyKind::ManualFallback)
        }
        Err(manual) => Err(MetaError::StrategyUnavailable {
            native: native.to_string(),
            manual: manual.to_string(),
        }),
    }
}

/// Build one entity with `kind` and check call, construct and arity
fn trial(realm: &mut Realm, runtime: &MetaClass, kind: StrategyKind) -> MetaResult<()> {
    let behavior = realm.create_method("constructor", TRIAL_ARITY, |_, _| Ok(Value::Undefined))?;
    let plan = SynthesisPlan {
        name: "MetaClassProbe".to_string(),
        arity: TRIAL_ARITY,
        behavior: ConstructorBehavior {
            function: behavior,
            style: Style::Flexible,
        },
        prototype: runtime.prototype(),
        token: runtime.token(),
    };
    let built = kind.strategy().build(realm, &plan)?;

    if realm.function_length(built.object) != Some(TRIAL_ARITY) {
        return Err(MetaError::Thrown("trial entity has the wrong length".to_string()));
    }
    if !realm.is_prototype_of(plan.prototype, built.object) {
        return Err(MetaError::Thrown("trial entity does not delegate to MetaClass".to_string()));
    }

    let called = realm.call(built.object, &Value::Undefined, &[])?;
    let constructed = realm.construct(built.object, &[])?;
    for instance in [&called, &constructed] {
        if !realm.instance_of(instance, built.object)? {
            return Err(MetaError::Thrown("trial entity produced a foreign instance".to_string()));
        }
    }
    Ok(())
}
