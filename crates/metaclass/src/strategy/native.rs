//! Native-reflection strategy

use std::rc::Rc;

use super::{BuiltEntity, StrategyKind, SynthesisPlan, SynthesisStrategy};
use crate::dispatch::{self, Dispatch, DispatchContext, Wiring};
use crate::error::{MetaError, MetaResult};
use crate::realm::{CallableExtension, Invocation, Realm};

/// Builds entities as declared extensions of the base callable type
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeReflection;

impl SynthesisStrategy for NativeReflection {
    fn kind(&self) -> StrategyKind {
        StrategyKind::NativeReflection
    }

    fn build(&self, realm: &mut Realm, plan: &SynthesisPlan) -> MetaResult<BuiltEntity> {
        if !realm.capabilities().reflective_construct {
            return Err(MetaError::Unsupported("reflective construction"));
        }

        let ctx = DispatchContext {
            behavior: plan.behavior,
            wiring: Wiring::NATIVE,
        };
        let object = realm.extend_callable(CallableExtension {
            name: plan.name.clone(),
            length: plan.arity,
            prototype: plan.prototype,
            body: Rc::new(move |realm: &mut Realm, inv: Invocation<'_>| {
                dispatch::resolve(
                    realm,
                    &ctx,
                    Dispatch {
                        entity: inv.callee,
                        args: inv.args,
                        target: inv.new_target,
                        receiver: Some(inv.this),
                    },
                )
            }),
        })?;

        Ok(BuiltEntity {
            object,
            wiring: Wiring::NATIVE,
            source: None,
        })
    }
}
