//! Behavior-template validation
//!
//! A behavior template is a plain object whose delegation chain holds exactly
//! one resolvable `constructor` slot. Validation walks the chain, stops at the
//! first own `constructor` slot and checks that it can be rebound to the
//! synthesized entity later on.

use crate::error::{MetaError, MetaResult};
use crate::realm::{ObjectId, Property, Realm, Value};

/// How a constructor behavior expects to be invoked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    /// Declared class: needs a construction target, never a bare call
    Strict,
    /// Plain callable: runs with or without a receiver and may return a replacement
    Flexible,
}

/// The constructor found in a behavior template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstructorBehavior {
    /// Callable that initializes instances
    pub function: ObjectId,
    /// Invocation style of `function`
    pub style: Style,
}

/// Output of [`validate`]
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedDescriptor {
    /// Entity name after string coercion
    pub name: String,
    /// The behavior template (becomes the entity's instance template)
    pub template: ObjectId,
    /// Resolved constructor behavior
    pub behavior: ConstructorBehavior,
    /// Declared parameter count of the behavior
    pub arity: usize,
}

/// Validate a `(name, template)` pair without modifying anything
pub fn validate(realm: &Realm, name: &Value, template: &Value) -> MetaResult<ValidatedDescriptor> {
    let name = realm.to_display_string(name);

    let template = match template {
        Value::Object(id) if !realm.is_callable(template) => *id,
        Value::Object(_) => return Err(MetaError::InvalidTemplateKind { found: "function" }),
        other => {
            return Err(MetaError::InvalidTemplateKind {
                found: other.kind_name(),
            })
        }
    };

    let function = resolve_constructor(realm, template)?;
    let callee = Value::Object(function);
    if !realm.is_callable(&callee) {
        return Err(MetaError::ConstructorNotCallable {
            found: "object",
        });
    }

    let style = if realm.is_class_constructor(function) {
        Style::Strict
    } else {
        Style::Flexible
    };
    let arity = realm.function_length(function).unwrap_or(0);

    Ok(ValidatedDescriptor {
        name,
        template,
        behavior: ConstructorBehavior { function, style },
        arity,
    })
}

/// Walk the delegation chain to the first own `constructor` slot
fn resolve_constructor(realm: &Realm, template: ObjectId) -> MetaResult<ObjectId> {
    let mut current = Some(template);
    while let Some(link) = current {
        match realm.get_own_property(link, "constructor")? {
            Some(Property::Accessor { .. }) => return Err(MetaError::ConstructorMustBeValue),
            Some(property) if !property.is_configurable() => {
                return Err(MetaError::ConstructorMustBeConfigurable)
            }
            Some(Property::Data { value, .. }) => {
                return match value {
                    Value::Object(id) => Ok(id),
                    other => Err(MetaError::ConstructorNotCallable {
                        found: other.kind_name(),
                    }),
                };
            }
            None => current = realm.get_prototype_of(link)?,
        }
    }
    Err(MetaError::ConstructorNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realm::{Attributes, ClassDeclaration};

    fn template_with_constructor(realm: &mut Realm, length: usize) -> (ObjectId, ObjectId) {
        let template = realm.new_object();
        let ctor = realm
            .define_method(template, "constructor", length, |_, _| Ok(Value::Undefined))
            .unwrap();
        (template, ctor)
    }

    #[test]
    fn test_validate_flexible() {
        let mut realm = Realm::new();
        let (template, ctor) = template_with_constructor(&mut realm, 1);

        let descriptor = validate(&realm, &Value::from("Optional"), &Value::Object(template)).unwrap();
        assert_eq!(descriptor.name, "Optional");
        assert_eq!(descriptor.template, template);
        assert_eq!(descriptor.behavior.function, ctor);
        assert_eq!(descriptor.behavior.style, Style::Flexible);
        assert_eq!(descriptor.arity, 1);
    }

    #[test]
    fn test_name_coercion() {
        let mut realm = Realm::new();
        let (template, _) = template_with_constructor(&mut realm, 0);
        let template = Value::Object(template);

        for (name, expected) in [
            (Value::from(5), "5"),
            (Value::from(1.5), "1.5"),
            (Value::Number(f64::NAN), "NaN"),
            (Value::Undefined, "undefined"),
            (Value::Null, "null"),
            (Value::Bool(true), "true"),
        ] {
            assert_eq!(validate(&realm, &name, &template).unwrap().name, expected);
        }
    }

    #[test]
    fn test_invalid_template_kinds() {
        let mut realm = Realm::new();
        let f = realm.create_function("f", 0, |_, _| Ok(Value::Undefined)).unwrap();
        let name = Value::from("X");

        assert_eq!(
            validate(&realm, &name, &Value::from(5)),
            Err(MetaError::InvalidTemplateKind { found: "number" })
        );
        assert_eq!(
            validate(&realm, &name, &Value::Null),
            Err(MetaError::InvalidTemplateKind { found: "null" })
        );
        assert_eq!(
            validate(&realm, &name, &Value::Object(f)),
            Err(MetaError::InvalidTemplateKind { found: "function" })
        );
    }

    #[test]
    fn test_missing_constructor() {
        let mut realm = Realm::new();
        let empty = realm.create_object(None);

        assert_eq!(
            validate(&realm, &Value::from("X"), &Value::Object(empty)),
            Err(MetaError::ConstructorNotFound)
        );
    }

    #[test]
    fn test_object_prototype_constructor_is_found() {
        let mut realm = Realm::new();
        let object_ctor = realm.create_function("Object", 0, |_, _| Ok(Value::Undefined)).unwrap();
        let root = realm.intrinsics().object_prototype;
        realm
            .define_property(root, "constructor", Property::data(object_ctor, Attributes::hidden()))
            .unwrap();
        let plain = realm.new_object();

        let descriptor = validate(&realm, &Value::from("X"), &Value::Object(plain)).unwrap();
        assert_eq!(descriptor.behavior.function, object_ctor);
    }

    #[test]
    fn test_accessor_constructor_rejected() {
        let mut realm = Realm::new();
        let template = realm.new_object();
        let getter = realm.create_method("get", 0, |_, _| Ok(Value::Undefined)).unwrap();
        realm
            .define_property(template, "constructor", Property::accessor(Some(getter), None))
            .unwrap();

        assert_eq!(
            validate(&realm, &Value::from("X"), &Value::Object(template)),
            Err(MetaError::ConstructorMustBeValue)
        );
    }

    #[test]
    fn test_locked_constructor_rejected() {
        let mut realm = Realm::new();
        let template = realm.new_object();
        let ctor = realm.create_method("constructor", 0, |_, _| Ok(Value::Undefined)).unwrap();
        realm
            .define_property(template, "constructor", Property::data(ctor, Attributes::locked()))
            .unwrap();

        assert_eq!(
            validate(&realm, &Value::from("X"), &Value::Object(template)),
            Err(MetaError::ConstructorMustBeConfigurable)
        );
    }

    #[test]
    fn test_non_callable_constructor_rejected() {
        let mut realm = Realm::new();
        let template = realm.new_object();
        realm.set(template, "constructor", 3).unwrap();

        assert_eq!(
            validate(&realm, &Value::from("X"), &Value::Object(template)),
            Err(MetaError::ConstructorNotCallable { found: "number" })
        );
    }

    #[test]
    fn test_inherited_class_constructor_is_strict() {
        let mut realm = Realm::new();
        let callee = realm.declare_class(ClassDeclaration::new("Callee")).unwrap();
        let callee_template = realm.prototype_for_target(callee).unwrap();
        let template = realm.create_object(Some(callee_template));
        realm.set(template, "a", 1).unwrap();

        let descriptor = validate(&realm, &Value::from("Caller"), &Value::Object(template)).unwrap();
        assert_eq!(descriptor.behavior.function, callee);
        assert_eq!(descriptor.behavior.style, Style::Strict);
        assert_eq!(descriptor.arity, 0);
    }
}
