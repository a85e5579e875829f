//! Dispatch resolution for synthesized entities
//!
//! Every call or construct of an entity ends up in [`resolve`], which picks the
//! semantics from the behavior's [`Style`]:
//!
//! ```text
//! Strict:    receiver initialized in place if there is no target and the
//!                   receiver is already a member, else
//!            construct(behavior, args) directed at (target ?? entity)
//! Flexible:  this = receiver if it is already a member, else
//!                   fresh object delegating to (target ?? entity).prototype
//!            ret  = behavior.call(this, args)
//!            ret if it is an object, else this
//! ```
//!
//! The [`Wiring`] records which host facilities the building strategy chose
//! for allocation and membership checks.

use tracing::trace;

use crate::descriptor::{ConstructorBehavior, Style};
use crate::error::MetaResult;
use crate::realm::{ObjectId, Property, Realm, Value};

/// How strict-style receivers are allocated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Allocation {
    /// Host construction with an explicit construction target
    Reflective,
    /// Receiver fabricated from the target's instance template, then initialized
    Manual,
}

/// How receiver membership is checked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    /// The realm's `instance_of`
    Native,
    /// Walk the receiver's delegation chain against the instance template
    ChainWalk,
}

/// Host facilities a strategy wired an entity to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wiring {
    /// Strict-style allocation
    pub allocation: Allocation,
    /// Receiver membership check
    pub membership: Membership,
}

impl Wiring {
    /// Reflective construction and native membership
    pub const NATIVE: Wiring = Wiring {
        allocation: Allocation::Reflective,
        membership: Membership::Native,
    };

    /// Manual allocation and chain-walk membership
    pub const MANUAL: Wiring = Wiring {
        allocation: Allocation::Manual,
        membership: Membership::ChainWalk,
    };
}

/// Everything the resolver needs about one entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchContext {
    /// Constructor behavior from the template
    pub behavior: ConstructorBehavior,
    /// Host facilities to use
    pub wiring: Wiring,
}

/// One invocation of an entity
#[derive(Debug, Clone, Copy)]
pub struct Dispatch<'a> {
    /// The entity being invoked
    pub entity: ObjectId,
    /// Positional arguments
    pub args: &'a [Value],
    /// Construction target, when invoked through construct
    pub target: Option<ObjectId>,
    /// Receiver of the invocation, if any
    pub receiver: Option<&'a Value>,
}

/// Resolve one invocation of an entity
pub fn resolve(realm: &mut Realm, ctx: &DispatchContext, dispatch: Dispatch<'_>) -> MetaResult<Value> {
    let target = dispatch.target.unwrap_or(dispatch.entity);
    match ctx.behavior.style {
        Style::Strict => {
            // A derived entity calling up with its own receiver
            if dispatch.target.is_none() {
                if let Some(receiver) = member_receiver(realm, ctx, &dispatch)? {
                    return initialize_strict(realm, ctx, dispatch, receiver);
                }
            }
            construct_strict(realm, ctx, dispatch.args, target)
        }
        Style::Flexible => {
            let reused = member_receiver(realm, ctx, &dispatch)?;
            let this = match reused {
                Some(receiver) => receiver,
                None => {
                    let proto = realm.prototype_for_target(target)?;
                    realm.create_object(Some(proto))
                }
            };
            trace!(
                entity = dispatch.entity.as_u32(),
                reused = reused.is_some(),
                argc = dispatch.args.len(),
                "flexible dispatch"
            );

            let this = Value::Object(this);
            let returned = realm.call(ctx.behavior.function, &this, dispatch.args)?;
            Ok(if returned.is_object() { returned } else { this })
        }
    }
}

fn member_receiver(
    realm: &mut Realm,
    ctx: &DispatchContext,
    dispatch: &Dispatch<'_>,
) -> MetaResult<Option<ObjectId>> {
    match dispatch.receiver {
        Some(Value::Object(receiver))
            if is_member(realm, ctx.wiring.membership, *receiver, dispatch.entity)? =>
        {
            Ok(Some(*receiver))
        }
        _ => Ok(None),
    }
}

fn construct_strict(
    realm: &mut Realm,
    ctx: &DispatchContext,
    args: &[Value],
    target: ObjectId,
) -> MetaResult<Value> {
    trace!(
        target = target.as_u32(),
        allocation = ?ctx.wiring.allocation,
        argc = args.len(),
        "strict dispatch"
    );
    match ctx.wiring.allocation {
        Allocation::Reflective => realm.reflect_construct(ctx.behavior.function, args, target),
        Allocation::Manual => {
            let proto = realm.prototype_for_target(target)?;
            let receiver = realm.create_object(Some(proto));
            realm.initialize_instance(ctx.behavior.function, receiver, args)?;
            Ok(Value::Object(receiver))
        }
    }
}

/// Strict behavior applied to an existing member receiver.
///
/// Reflective allocation constructs at the receiver's own `constructor` and
/// copies the resulting slots over; manual allocation initializes in place.
fn initialize_strict(
    realm: &mut Realm,
    ctx: &DispatchContext,
    dispatch: Dispatch<'_>,
    receiver: ObjectId,
) -> MetaResult<Value> {
    trace!(
        entity = dispatch.entity.as_u32(),
        receiver = receiver.as_u32(),
        allocation = ?ctx.wiring.allocation,
        "strict dispatch on member receiver"
    );
    match ctx.wiring.allocation {
        Allocation::Reflective => {
            let target = match realm.get(receiver, "constructor")? {
                Value::Object(ctor) if realm.is_constructible(&Value::Object(ctor)) => ctor,
                _ => dispatch.entity,
            };
            let constructed = realm.reflect_construct(ctx.behavior.function, dispatch.args, target)?;
            if let Some(constructed) = constructed.as_object() {
                for key in realm.own_keys(constructed)? {
                    if let Some(property) = realm.get_own_property(constructed, key.clone())? {
                        realm.define_property(receiver, key, property)?;
                    }
                }
            }
            Ok(Value::Object(receiver))
        }
        Allocation::Manual => realm.initialize_instance(ctx.behavior.function, receiver, dispatch.args),
    }
}

/// Check whether `object` already belongs to `entity`
pub fn is_member(
    realm: &mut Realm,
    membership: Membership,
    object: ObjectId,
    entity: ObjectId,
) -> MetaResult<bool> {
    match membership {
        Membership::Native => realm.instance_of(&Value::Object(object), entity),
        Membership::ChainWalk => {
            let template = match realm.get_own_property(entity, "prototype")? {
                Some(Property::Data {
                    value: Value::Object(template),
                    ..
                }) => template,
                _ => return Ok(false),
            };
            let mut current = realm.get_prototype_of(object)?;
            while let Some(link) = current {
                if link == template {
                    return Ok(true);
                }
                current = realm.get_prototype_of(link)?;
            }
            Ok(false)
        }
    }
}
