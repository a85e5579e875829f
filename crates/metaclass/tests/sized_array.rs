//! Fixed-length indexed-array consumer
//!
//! `SizedArray(n)` entities accept at most `n` positional arguments and raise
//! `TooManyArguments` otherwise. `Pair` and `NamedArray` build on top of it.

use std::collections::HashSet;

use metaclass::{
    Attributes, ClassDeclaration, Entity, MetaClass, MetaClassOptions, MetaError, MetaResult,
    ObjectId, Property, Realm, RealmOptions, Value,
};

fn sized_array(
    realm: &mut Realm,
    runtime: &MetaClass,
    length: usize,
    name: Option<&str>,
    use_empty_slots: bool,
) -> MetaResult<Entity> {
    let name = match name {
        Some(name) => name.to_string(),
        None if use_empty_slots => format!("SizedArray({}, true)", length),
        None => format!("SizedArray({})", length),
    };

    let template = realm.new_object();
    let error_name = name.clone();
    let ctor = realm.create_function("constructor", 0, move |realm, inv| {
        if inv.args.len() > length {
            return Err(MetaError::TooManyArguments {
                name: error_name.clone(),
                expected: length,
                got: inv.args.len(),
            });
        }
        let this = inv.this_object().ok_or("no receiver")?;
        for (i, arg) in inv.args.iter().enumerate() {
            realm.set(this, i.to_string(), arg.clone())?;
        }
        if !use_empty_slots {
            for i in inv.args.len()..length {
                realm.set(this, i.to_string(), Value::Undefined)?;
            }
        }
        realm.define_property(this, "length", Property::data(length, Attributes::locked()))?;
        Ok(Value::Undefined)
    })?;
    realm.set(template, "constructor", ctor)?;

    let tag = realm.intrinsics().to_string_tag;
    realm.define_property(template, "length", Property::data(length, Attributes::hidden()))?;
    realm.define_property(template, tag, Property::data(name.as_str(), Attributes::read_only()))?;

    let entity = runtime.synthesize(realm, name, template)?;
    let marker = realm.new_symbol("SizedArray##use_empty_slots_symbol");
    realm.define_property(
        entity.object(),
        marker,
        Property::data(use_empty_slots, Attributes::locked()),
    )?;
    Ok(entity)
}

/// Sized array whose slots are also reachable through names
fn named_array(
    realm: &mut Realm,
    runtime: &MetaClass,
    name: &str,
    index_names: &str,
) -> MetaResult<Entity> {
    let names: Vec<&str> = index_names.split(' ').collect();
    if names.iter().collect::<HashSet<_>>().len() != names.len() {
        return Err(MetaError::Thrown(
            "NamedArray index_names contains duplicates.".to_string(),
        ));
    }

    let entity = sized_array(realm, runtime, names.len(), Some(name), false)?;
    for (index, field) in names.iter().enumerate() {
        let key = index.to_string();
        let get_key = key.clone();
        let getter = realm.create_method("get_index", 0, move |realm, inv| {
            let this = inv.this_object().ok_or("no receiver")?;
            realm.get(this, get_key.as_str())
        })?;
        let setter = realm.create_method("set_index", 1, move |realm, inv| {
            let this = inv.this_object().ok_or("no receiver")?;
            realm.set(this, key.as_str(), inv.arg(0))?;
            Ok(Value::Undefined)
        })?;
        realm.define_property(
            entity.instance_template(),
            *field,
            Property::accessor(Some(getter), Some(setter)),
        )?;
    }
    Ok(entity)
}

fn element(realm: &mut Realm, array: &Value, index: usize) -> Value {
    realm.get(array.as_object().unwrap(), index.to_string()).unwrap()
}

fn realms() -> Vec<(Realm, MetaClass)> {
    [
        (RealmOptions::default(), MetaClassOptions::native()),
        (RealmOptions::default(), MetaClassOptions::manual()),
        (RealmOptions::restricted(), MetaClassOptions::default()),
        (RealmOptions::legacy(), MetaClassOptions::default()),
    ]
    .into_iter()
    .map(|(realm_options, options)| {
        let mut realm = Realm::with_options(realm_options);
        let runtime = MetaClass::with_options(&mut realm, options).unwrap();
        (realm, runtime)
    })
    .collect()
}

#[test]
fn test_fills_missing_slots() {
    for (mut realm, runtime) in realms() {
        let triple = sized_array(&mut realm, &runtime, 3, None, false).unwrap();
        assert_eq!(triple.name(), "SizedArray(3)");

        let array = triple.construct(&mut realm, &[Value::from(1)]).unwrap();
        let object = array.as_object().unwrap();
        assert_eq!(element(&mut realm, &array, 0), Value::from(1));
        assert!(realm.has_own_property(object, "2").unwrap());
        assert_eq!(realm.get(object, "length").unwrap(), Value::from(3));
        assert_eq!(realm.to_display_string(&array), "[object SizedArray(3)]");
    }
}

#[test]
fn test_empty_slots_stay_absent() {
    for (mut realm, runtime) in realms() {
        let sparse = sized_array(&mut realm, &runtime, 3, None, true).unwrap();
        assert_eq!(sparse.name(), "SizedArray(3, true)");

        let array = sparse.invoke(&mut realm, &[Value::from(1)]).unwrap();
        assert!(!realm.has_own_property(array.as_object().unwrap(), "1").unwrap());
    }
}

#[test]
fn test_too_many_arguments() {
    for (mut realm, runtime) in realms() {
        let pair = sized_array(&mut realm, &runtime, 2, Some("Pair"), false).unwrap();
        let args = [Value::from(1), Value::from(2), Value::from(3)];

        let err = pair.construct(&mut realm, &args).unwrap_err();
        assert_eq!(
            err,
            MetaError::TooManyArguments {
                name: "Pair".to_string(),
                expected: 2,
                got: 3,
            }
        );
        assert_eq!(
            err.to_string(),
            "Too many arguments to construct Pair (expected: 2, got: 3)"
        );
        assert!(pair.invoke(&mut realm, &args).is_err());
    }
}

#[test]
fn test_length_is_fixed() {
    for (mut realm, runtime) in realms() {
        let pair = sized_array(&mut realm, &runtime, 2, None, false).unwrap();
        let array = pair.construct(&mut realm, &[]).unwrap();

        let result = realm.set(array.as_object().unwrap(), "length", 5);
        assert!(matches!(result, Err(MetaError::ReadOnly(_))));
    }
}

#[test]
fn test_declared_pair_with_accessors() {
    let mut realm = Realm::new();
    let runtime = MetaClass::install(&mut realm).unwrap();
    let base = sized_array(&mut realm, &runtime, 2, Some("Pair"), false).unwrap();

    let pair = realm
        .declare_class(ClassDeclaration::new("Pair").extends(base.object()))
        .unwrap();
    let pair_template = realm.prototype_for_target(pair).unwrap();
    for (field, index) in [("first", "0"), ("second", "1")] {
        let getter = realm
            .create_method(field, 0, move |realm, inv| {
                let this = inv.this_object().ok_or("no receiver")?;
                realm.get(this, index)
            })
            .unwrap();
        realm
            .define_property(pair_template, field, Property::accessor(Some(getter), None))
            .unwrap();
    }

    let p = realm.construct(pair, &[Value::from("a"), Value::from("b")]).unwrap();
    let object: ObjectId = p.as_object().unwrap();
    assert_eq!(realm.get(object, "first").unwrap(), Value::from("a"));
    assert_eq!(realm.get(object, "second").unwrap(), Value::from("b"));
    assert!(base.is_instance(&mut realm, &p).unwrap());

    let err = realm.construct(pair, &[Value::Null, Value::Null, Value::Null]);
    assert!(matches!(err, Err(MetaError::TooManyArguments { got: 3, .. })));
}

#[test]
fn test_named_array() {
    for (mut realm, runtime) in realms() {
        let point = named_array(&mut realm, &runtime, "Point", "x y").unwrap();
        assert_eq!(point.arity(), 0);

        let p = point.construct(&mut realm, &[Value::from(1), Value::from(2)]).unwrap();
        let object = p.as_object().unwrap();
        assert_eq!(realm.get(object, "x").unwrap(), Value::from(1));

        realm.set(object, "y", 5).unwrap();
        assert_eq!(element(&mut realm, &p, 1), Value::from(5));
    }
}

#[test]
fn test_named_array_rejects_duplicates() {
    let mut realm = Realm::new();
    let runtime = MetaClass::install(&mut realm).unwrap();

    let err = named_array(&mut realm, &runtime, "Bad", "x x").unwrap_err();
    assert_eq!(
        err,
        MetaError::Thrown("NamedArray index_names contains duplicates.".to_string())
    );
    assert!(runtime.entities().is_empty());
}
