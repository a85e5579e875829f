//! Callable creation, call and construct

use std::rc::Rc;

use super::context::Realm;
use super::heap::ObjectId;
use super::object::{
    ClassCode, FunctionCode, FunctionObject, HeapObject, Initializer, Invocation, NativeFn,
    ObjectKind, SuperArgs,
};
use super::property::{Attributes, Property};
use super::value::Value;
use crate::error::{MetaError, MetaResult};

/// Attributes of an auto-created function `prototype` slot
const FUNCTION_PROTOTYPE_SLOT: Attributes = Attributes {
    writable: true,
    enumerable: false,
    configurable: false,
};

/// Definition of a strict-style (declared class) constructor
#[derive(Clone)]
pub struct ClassDeclaration {
    /// Class name
    pub name: String,
    /// Declared parameter count
    pub length: usize,
    /// Parent constructor for derived classes
    pub parent: Option<ObjectId>,
    /// Initialization run on the constructed receiver
    pub initializer: Option<Initializer>,
    /// Maps arguments to the parent's arguments (identity when absent)
    pub super_args: Option<SuperArgs>,
}

impl ClassDeclaration {
    /// Create a base class declaration with no initializer
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            length: 0,
            parent: None,
            initializer: None,
            super_args: None,
        }
    }

    /// Extend a parent constructor
    pub fn extends(mut self, parent: ObjectId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Set the declared parameter count
    pub fn length(mut self, length: usize) -> Self {
        self.length = length;
        self
    }

    /// Set the per-instance initializer
    pub fn initializer(
        mut self,
        f: impl Fn(&mut Realm, ObjectId, &[Value]) -> MetaResult<()> + 'static,
    ) -> Self {
        self.initializer = Some(Rc::new(f));
        self
    }

    /// Set the parent argument mapping
    pub fn super_args(
        mut self,
        f: impl Fn(&mut Realm, &[Value]) -> MetaResult<Vec<Value>> + 'static,
    ) -> Self {
        self.super_args = Some(Rc::new(f));
        self
    }
}

/// Definition of a callable that extends the base callable type
#[derive(Clone)]
pub struct CallableExtension {
    /// Function name
    pub name: String,
    /// Declared parameter count
    pub length: usize,
    /// Delegation parent of the new callable (the extending type's template)
    pub prototype: ObjectId,
    /// Body run on every call and construct
    pub body: NativeFn,
}

impl Realm {
    fn make_function(
        &mut self,
        prototype: ObjectId,
        name: &str,
        length: usize,
        constructible: bool,
        code: FunctionCode,
    ) -> MetaResult<ObjectId> {
        let id = self.allocate(HeapObject::new(
            Some(prototype),
            ObjectKind::Function(FunctionObject {
                length,
                constructible,
                code,
            }),
        ));
        self.define_property(id, "length", Property::data(length, Attributes::read_only()))?;
        self.define_property(id, "name", Property::data(name, Attributes::read_only()))?;
        Ok(id)
    }

    /// Attach a fresh instance template with a `constructor` back-reference
    fn attach_instance_template(
        &mut self,
        function: ObjectId,
        parent: ObjectId,
        slot: Attributes,
    ) -> MetaResult<ObjectId> {
        let template = self.create_object(Some(parent));
        self.define_property(
            template,
            "constructor",
            Property::data(function, Attributes::hidden()),
        )?;
        self.define_property(function, "prototype", Property::data(template, slot))?;
        Ok(template)
    }

    /// Create a constructible native function with its own instance template
    pub fn create_function(
        &mut self,
        name: &str,
        length: usize,
        body: impl Fn(&mut Realm, Invocation<'_>) -> MetaResult<Value> + 'static,
    ) -> MetaResult<ObjectId> {
        let function_prototype = self.intrinsics().function_prototype;
        let object_prototype = self.intrinsics().object_prototype;
        let id = self.make_function(
            function_prototype,
            name,
            length,
            true,
            FunctionCode::Native(Rc::new(body)),
        )?;
        self.attach_instance_template(id, object_prototype, FUNCTION_PROTOTYPE_SLOT)?;
        Ok(id)
    }

    /// Create a callable that cannot be constructed (object-literal method)
    pub fn create_method(
        &mut self,
        name: &str,
        length: usize,
        body: impl Fn(&mut Realm, Invocation<'_>) -> MetaResult<Value> + 'static,
    ) -> MetaResult<ObjectId> {
        let function_prototype = self.intrinsics().function_prototype;
        self.make_function(
            function_prototype,
            name,
            length,
            false,
            FunctionCode::Native(Rc::new(body)),
        )
    }

    /// Create a method and store it on `target` under `name`
    pub fn define_method(
        &mut self,
        target: ObjectId,
        name: &str,
        length: usize,
        body: impl Fn(&mut Realm, Invocation<'_>) -> MetaResult<Value> + 'static,
    ) -> MetaResult<ObjectId> {
        let method = self.create_method(name, length, body)?;
        self.define_property(target, name, Property::data(method, Attributes::open()))?;
        Ok(method)
    }

    /// Declare a callable type extending the base callable type.
    ///
    /// The new callable delegates to `extension.prototype` from the moment it
    /// exists. Requires the `declared_extension` capability.
    pub fn extend_callable(&mut self, extension: CallableExtension) -> MetaResult<ObjectId> {
        if !self.capabilities().declared_extension {
            return Err(MetaError::Unsupported("declared-type extension of callables"));
        }
        let object_prototype = self.intrinsics().object_prototype;
        let id = self.make_function(
            extension.prototype,
            &extension.name,
            extension.length,
            true,
            FunctionCode::Native(extension.body),
        )?;
        self.attach_instance_template(id, object_prototype, FUNCTION_PROTOTYPE_SLOT)?;
        Ok(id)
    }

    /// Declare a strict-style class.
    ///
    /// Derived declarations require the `declared_extension` capability and a
    /// constructible parent; the instance template delegates to the parent's.
    pub fn declare_class(&mut self, declaration: ClassDeclaration) -> MetaResult<ObjectId> {
        let (static_parent, template_parent) = match declaration.parent {
            Some(parent) => {
                if !self.capabilities().declared_extension {
                    return Err(MetaError::Unsupported("derived class declarations"));
                }
                if !self.is_constructible(&Value::Object(parent)) {
                    return Err(MetaError::NotConstructible(
                        self.to_display_string(&Value::Object(parent)),
                    ));
                }
                (parent, self.prototype_for_target(parent)?)
            }
            None => (
                self.intrinsics().function_prototype,
                self.intrinsics().object_prototype,
            ),
        };

        let code = ClassCode {
            parent: declaration.parent,
            initializer: declaration.initializer,
            super_args: declaration.super_args,
        };
        let id = self.make_function(
            static_parent,
            &declaration.name,
            declaration.length,
            true,
            FunctionCode::Class(Rc::new(code)),
        )?;
        self.attach_instance_template(id, template_parent, Attributes::locked())?;
        Ok(id)
    }

    // ------------------------------------------------------------------
    // Invocation
    // ------------------------------------------------------------------

    fn function_of(&self, id: ObjectId) -> MetaResult<FunctionObject> {
        self.object(id)?
            .function()
            .cloned()
            .ok_or_else(|| MetaError::NotCallable(self.to_display_string(&Value::Object(id))))
    }

    fn enter(&mut self) -> MetaResult<()> {
        if self.depth >= self.options().max_call_depth {
            return Err(MetaError::StackOverflow(self.depth));
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Call a function with an explicit receiver
    pub fn call(&mut self, callee: ObjectId, this: &Value, args: &[Value]) -> MetaResult<Value> {
        let function = self.function_of(callee)?;
        let body = match function.code {
            FunctionCode::Native(body) => body,
            FunctionCode::Class(_) => {
                return Err(MetaError::ConstructionTargetRequired(self.function_name(callee)));
            }
        };

        self.enter()?;
        let result = body(
            self,
            Invocation {
                callee,
                this,
                args,
                new_target: None,
            },
        );
        self.leave();
        result
    }

    /// Construct with the callee as its own construction target
    pub fn construct(&mut self, callee: ObjectId, args: &[Value]) -> MetaResult<Value> {
        self.construct_with_target(callee, args, callee)
    }

    /// Construct with an explicit construction target.
    ///
    /// Requires the `reflective_construct` capability.
    pub fn reflect_construct(
        &mut self,
        callee: ObjectId,
        args: &[Value],
        new_target: ObjectId,
    ) -> MetaResult<Value> {
        if !self.capabilities().reflective_construct {
            return Err(MetaError::Unsupported("reflective construction"));
        }
        if !self.is_constructible(&Value::Object(new_target)) {
            return Err(MetaError::NotConstructible(
                self.to_display_string(&Value::Object(new_target)),
            ));
        }
        self.construct_with_target(callee, args, new_target)
    }

    fn construct_with_target(
        &mut self,
        callee: ObjectId,
        args: &[Value],
        new_target: ObjectId,
    ) -> MetaResult<Value> {
        let function = self.function_of(callee)?;
        if !function.constructible {
            return Err(MetaError::NotConstructible(self.function_name(callee)));
        }

        self.enter()?;
        let result = match function.code {
            FunctionCode::Native(body) => self.construct_native(&body, callee, args, new_target),
            FunctionCode::Class(code) => self.construct_class(&code, args, new_target),
        };
        self.leave();
        result
    }

    fn construct_native(
        &mut self,
        body: &NativeFn,
        callee: ObjectId,
        args: &[Value],
        new_target: ObjectId,
    ) -> MetaResult<Value> {
        let proto = self.prototype_for_target(new_target)?;
        let this = Value::Object(self.create_object(Some(proto)));
        let returned = body(
            self,
            Invocation {
                callee,
                this: &this,
                args,
                new_target: Some(new_target),
            },
        )?;
        Ok(if returned.is_object() { returned } else { this })
    }

    fn construct_class(
        &mut self,
        code: &ClassCode,
        args: &[Value],
        new_target: ObjectId,
    ) -> MetaResult<Value> {
        let this = match code.parent {
            Some(parent) => {
                let parent_args = self.parent_args(code, args)?;
                let constructed = self.construct_with_target(parent, &parent_args, new_target)?;
                constructed.as_object().ok_or_else(|| {
                    MetaError::Thrown("Derived constructors may only return object".to_string())
                })?
            }
            None => {
                let proto = self.prototype_for_target(new_target)?;
                self.create_object(Some(proto))
            }
        };
        if let Some(initializer) = &code.initializer {
            initializer(self, this, args)?;
        }
        Ok(Value::Object(this))
    }

    fn parent_args(&mut self, code: &ClassCode, args: &[Value]) -> MetaResult<Vec<Value>> {
        match &code.super_args {
            Some(map) => map(self, args),
            None => Ok(args.to_vec()),
        }
    }

    /// Run a constructor against a receiver the caller already allocated.
    ///
    /// Class chains run parent-first on the same receiver; a native body may
    /// still replace the receiver by returning an object.
    pub fn initialize_instance(
        &mut self,
        callee: ObjectId,
        this: ObjectId,
        args: &[Value],
    ) -> MetaResult<Value> {
        let function = self.function_of(callee)?;

        self.enter()?;
        let result = match function.code {
            FunctionCode::Native(body) => {
                let receiver = Value::Object(this);
                body(
                    self,
                    Invocation {
                        callee,
                        this: &receiver,
                        args,
                        new_target: None,
                    },
                )
                .map(|returned| if returned.is_object() { returned } else { receiver })
            }
            FunctionCode::Class(code) => self.initialize_class(&code, this, args),
        };
        self.leave();
        result
    }

    fn initialize_class(
        &mut self,
        code: &ClassCode,
        this: ObjectId,
        args: &[Value],
    ) -> MetaResult<Value> {
        let mut receiver = this;
        if let Some(parent) = code.parent {
            let parent_args = self.parent_args(code, args)?;
            let initialized = self.initialize_instance(parent, this, &parent_args)?;
            receiver = initialized.as_object().unwrap_or(this);
        }
        if let Some(initializer) = &code.initializer {
            initializer(self, receiver, args)?;
        }
        Ok(Value::Object(receiver))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realm::RealmOptions;

    fn point_class(realm: &mut Realm) -> ObjectId {
        realm
            .declare_class(
                ClassDeclaration::new("Point")
                    .length(2)
                    .initializer(|realm, this, args| {
                        realm.set(this, "x", args.first().cloned().unwrap_or_default())?;
                        realm.set(this, "y", args.get(1).cloned().unwrap_or_default())
                    }),
            )
            .unwrap()
    }

    #[test]
    fn test_create_function_slots() {
        let mut realm = Realm::new();
        let f = realm
            .create_function("add", 2, |_, inv| {
                let a = inv.arg(0).as_number().unwrap_or(0.0);
                let b = inv.arg(1).as_number().unwrap_or(0.0);
                Ok(Value::from(a + b))
            })
            .unwrap();

        assert_eq!(realm.get(f, "name").unwrap(), Value::from("add"));
        assert_eq!(realm.get(f, "length").unwrap(), Value::from(2));
        assert_eq!(realm.function_length(f), Some(2));
        let template = realm.get(f, "prototype").unwrap().as_object().unwrap();
        assert_eq!(realm.get(template, "constructor").unwrap(), Value::Object(f));

        let sum = realm
            .call(f, &Value::Undefined, &[Value::from(2), Value::from(3)])
            .unwrap();
        assert_eq!(sum, Value::from(5));
    }

    #[test]
    fn test_construct_native_uses_receiver() {
        let mut realm = Realm::new();
        let f = realm
            .create_function("Box", 1, |realm, inv| {
                let this = inv.this_object().ok_or("no receiver")?;
                realm.set(this, "v", inv.arg(0))?;
                Ok(Value::Undefined)
            })
            .unwrap();

        let boxed = realm.construct(f, &[Value::from(7)]).unwrap();
        let boxed = boxed.as_object().unwrap();
        assert_eq!(realm.get(boxed, "v").unwrap(), Value::from(7));
        assert!(realm.instance_of(&Value::Object(boxed), f).unwrap());
    }

    #[test]
    fn test_method_not_constructible() {
        let mut realm = Realm::new();
        let obj = realm.new_object();
        let m = realm.define_method(obj, "m", 0, |_, _| Ok(Value::Null)).unwrap();

        assert!(matches!(realm.construct(m, &[]), Err(MetaError::NotConstructible(_))));
        assert_eq!(realm.call(m, &Value::Undefined, &[]).unwrap(), Value::Null);
    }

    #[test]
    fn test_class_requires_construction_target() {
        let mut realm = Realm::new();
        let point = point_class(&mut realm);

        assert_eq!(
            realm.call(point, &Value::Undefined, &[]),
            Err(MetaError::ConstructionTargetRequired("Point".to_string()))
        );
        let p = realm.construct(point, &[Value::from(1), Value::from(2)]).unwrap();
        assert_eq!(realm.get(p.as_object().unwrap(), "y").unwrap(), Value::from(2));
    }

    #[test]
    fn test_derived_class_forwards_target() {
        let mut realm = Realm::new();
        let point = point_class(&mut realm);
        let colored = realm
            .declare_class(
                ClassDeclaration::new("ColoredPoint")
                    .extends(point)
                    .length(3)
                    .super_args(|_, args| Ok(args.iter().take(2).cloned().collect()))
                    .initializer(|realm, this, args| {
                        realm.set(this, "color", args.get(2).cloned().unwrap_or_default())
                    }),
            )
            .unwrap();

        let cp = realm
            .construct(colored, &[Value::from(1), Value::from(2), Value::from("red")])
            .unwrap();
        assert!(realm.instance_of(&cp, colored).unwrap());
        assert!(realm.instance_of(&cp, point).unwrap());
        let cp = cp.as_object().unwrap();
        assert_eq!(realm.get(cp, "x").unwrap(), Value::from(1));
        assert_eq!(realm.get(cp, "color").unwrap(), Value::from("red"));
        assert_eq!(realm.get_prototype_of(colored).unwrap(), Some(point));
    }

    #[test]
    fn test_reflect_construct_target() {
        let mut realm = Realm::new();
        let point = point_class(&mut realm);
        let other = realm.create_function("Other", 0, |_, _| Ok(Value::Undefined)).unwrap();

        let p = realm.reflect_construct(point, &[], other).unwrap();
        assert!(realm.instance_of(&p, other).unwrap());
        assert!(!realm.instance_of(&p, point).unwrap());
    }

    #[test]
    fn test_capabilities_gate_operations() {
        let mut realm = Realm::with_options(RealmOptions::legacy());
        let point = point_class(&mut realm);

        assert!(matches!(
            realm.reflect_construct(point, &[], point),
            Err(MetaError::Unsupported(_))
        ));
        assert!(matches!(
            realm.declare_class(ClassDeclaration::new("Sub").extends(point)),
            Err(MetaError::Unsupported(_))
        ));

        let proto = realm.new_object();
        let body: NativeFn =
            Rc::new(|_: &mut Realm, _: Invocation<'_>| -> MetaResult<Value> { Ok(Value::Undefined) });
        let extension = CallableExtension {
            name: "X".to_string(),
            length: 0,
            prototype: proto,
            body,
        };
        assert!(matches!(realm.extend_callable(extension), Err(MetaError::Unsupported(_))));
    }

    #[test]
    fn test_initialize_instance_on_fabricated_receiver() {
        let mut realm = Realm::new();
        let point = point_class(&mut realm);
        let template = realm.prototype_for_target(point).unwrap();
        let receiver = realm.create_object(Some(template));

        let result = realm
            .initialize_instance(point, receiver, &[Value::from(3), Value::from(4)])
            .unwrap();
        assert_eq!(result, Value::Object(receiver));
        assert_eq!(realm.get(receiver, "x").unwrap(), Value::from(3));
    }

    #[test]
    fn test_call_depth_limit() {
        let mut realm = Realm::with_options(RealmOptions {
            max_call_depth: 8,
            ..Default::default()
        });
        let f = realm
            .create_function("recurse", 0, |realm, inv| realm.call(inv.callee, inv.this, &[]))
            .unwrap();

        assert!(matches!(
            realm.call(f, &Value::Undefined, &[]),
            Err(MetaError::StackOverflow(8))
        ));
        assert_eq!(realm.depth, 0);
    }

    #[test]
    fn test_accessor_getter_and_setter() {
        let mut realm = Realm::new();
        let obj = realm.new_object();
        let getter = realm
            .create_method("get", 0, |realm, inv| {
                let this = inv.this_object().ok_or("no receiver")?;
                realm.get(this, "_v")
            })
            .unwrap();
        let setter = realm
            .create_method("set", 1, |realm, inv| {
                let this = inv.this_object().ok_or("no receiver")?;
                realm.set(this, "_v", inv.arg(0))?;
                Ok(Value::Undefined)
            })
            .unwrap();
        realm
            .define_property(obj, "v", Property::accessor(Some(getter), Some(setter)))
            .unwrap();

        let child = realm.create_object(Some(obj));
        realm.set(child, "v", 9).unwrap();
        assert_eq!(realm.get(child, "v").unwrap(), Value::from(9));
        assert!(realm.has_own_property(child, "_v").unwrap());
        assert!(!realm.has_own_property(obj, "_v").unwrap());
    }
}
