//! Integration tests for properties and events
//!
//! Tests cover:
//! - Properties forwarding to getter/setter members
//! - Change events declared for properties and fired by their setters
//! - Readonly properties and missing accessors
//! - Per-instance event objects
//! - Virtual getters resolved after override redirection

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use lattice_core::{
    ClassError, Function, NamingConventions, Private, PropertyConfig, Public, Type, TypeBuilder,
    Value,
};
use parking_lot::Mutex;

fn getter(field: &'static str) -> Function {
    Function::new(move |this, _| this.get(field))
}

fn setter(field: &'static str) -> Function {
    Function::new(move |this, args| {
        this.set(field, args.first().cloned().unwrap_or_default())?;
        Ok(Value::Undefined)
    })
}

/// Setter that stores the value and then fires `event` with it
fn notifying_setter(field: &'static str, event: &'static str) -> Function {
    Function::new(move |this, args| {
        let value = args.first().cloned().unwrap_or_default();
        this.set(field, value.clone())?;
        this.event(event)?.execute(&[value])?;
        Ok(Value::Undefined)
    })
}

fn person(config: PropertyConfig) -> Type {
    person_with_setter(config, setter("name"))
}

fn person_with_setter(config: PropertyConfig, set_name: Function) -> Type {
    TypeBuilder::new("Person")
        .member("name", Private::member(""))
        .member("GetName", Public::member(getter("name")))
        .member("SetName", Public::member(set_name))
        .member("Name", Public::property(config).unwrap())
        .build()
        .unwrap()
}

#[test]
fn test_property_forwards_to_accessors() {
    let p = person(PropertyConfig::new()).construct(&[]).unwrap();
    p.set("Name", "Ada").unwrap();
    assert_eq!(p.get("Name").unwrap(), Value::from("Ada"));
    assert_eq!(p.call("GetName", &[]).unwrap(), Value::from("Ada"));
    assert!(!p.has_member("NameChanged"));
}

#[test]
fn test_setter_fires_synthesized_change_event_once() {
    let p = person_with_setter(
        PropertyConfig::new().has_event(true),
        notifying_setter("name", "NameChanged"),
    )
    .construct(&[])
    .unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    {
        let seen = seen.clone();
        p.event("NameChanged")
            .unwrap()
            .attach(Function::free(move |args| {
                seen.lock().extend(args.iter().cloned());
                Ok(Value::Undefined)
            }));
    }

    p.set("Name", "Grace").unwrap();
    p.set("Name", "Linus").unwrap();
    assert_eq!(*seen.lock(), vec![Value::from("Grace"), Value::from("Linus")]);

    p.call("SetName", &[Value::from("Ken")]).unwrap();
    assert_eq!(seen.lock().len(), 3);
}

#[test]
fn test_property_write_does_not_fire_event_itself() {
    let p = person(PropertyConfig::new().has_event(true))
        .construct(&[])
        .unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    {
        let hits = hits.clone();
        p.event("NameChanged")
            .unwrap()
            .attach(Function::free(move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
                Ok(Value::Undefined)
            }));
    }

    p.set("Name", "Grace").unwrap();
    assert_eq!(p.get("Name").unwrap(), Value::from("Grace"));
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[test]
fn test_readonly_property() {
    let p = person(PropertyConfig::new().getter("GetName"))
        .construct(&[])
        .unwrap();

    assert_eq!(
        p.set("Name", "x").unwrap_err(),
        ClassError::ReadOnlyMember {
            member: "Name".to_string()
        }
    );
    assert_eq!(p.get("Name").unwrap(), Value::from(""));
    assert!(!p.has_member("NameChanged"));
}

#[test]
fn test_missing_accessor_fails_on_access() {
    let t = TypeBuilder::new("Thing")
        .member("Size", Public::property(PropertyConfig::new()).unwrap())
        .build()
        .unwrap();
    let thing = t.construct(&[]).unwrap();

    assert_eq!(
        thing.get("Size").unwrap_err(),
        ClassError::MissingAccessor {
            property: "Size".to_string(),
            accessor: "GetSize".to_string(),
        }
    );
    assert_eq!(
        thing.set("Size", 1).unwrap_err(),
        ClassError::MissingAccessor {
            property: "Size".to_string(),
            accessor: "SetSize".to_string(),
        }
    );
}

#[test]
fn test_explicit_event_member() {
    let t = TypeBuilder::new("Gauge")
        .member("level", Private::member(0))
        .member("Read", Public::member(getter("level")))
        .member("Write", Public::member(notifying_setter("level", "OnLevel")))
        .member("OnLevel", Public::event())
        .member(
            "Level",
            Public::property(
                PropertyConfig::new()
                    .getter("Read")
                    .setter("Write")
                    .readonly(false)
                    .event("OnLevel"),
            )
            .unwrap(),
        )
        .build()
        .unwrap();
    let gauge = t.construct(&[]).unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    {
        let hits = hits.clone();
        gauge.event("OnLevel").unwrap().attach(Function::free(move |_| {
            hits.fetch_add(1, Ordering::SeqCst);
            Ok(Value::Undefined)
        }));
    }

    gauge.set("Level", 5).unwrap();
    assert_eq!(gauge.get("Level").unwrap(), Value::from(5));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn test_events_are_per_instance() {
    let t = TypeBuilder::new("Button")
        .member("Clicked", Public::event())
        .build()
        .unwrap();
    let a = t.construct(&[]).unwrap();
    let b = t.construct(&[]).unwrap();

    let hits = Arc::new(AtomicUsize::new(0));
    let handler = {
        let hits = hits.clone();
        a.event("Clicked").unwrap().attach(Function::free(move |_| {
            hits.fetch_add(1, Ordering::SeqCst);
            Ok(Value::Undefined)
        }))
    };

    b.event("Clicked").unwrap().execute(&[]).unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 0);
    a.event("Clicked").unwrap().execute(&[]).unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    assert_eq!(
        b.event("Clicked").unwrap().detach(&handler),
        Err(ClassError::ForeignEventHandle)
    );
    a.event("Clicked").unwrap().detach(&handler).unwrap();
}

#[test]
fn test_events_are_not_assignable() {
    let t = TypeBuilder::new("Button")
        .member("Clicked", Public::event())
        .member("Label", Public::member("ok"))
        .build()
        .unwrap();
    let button = t.construct(&[]).unwrap();
    assert!(matches!(
        button.set("Clicked", 1),
        Err(ClassError::ReadOnlyMember { .. })
    ));
    assert!(matches!(
        button.event("Label"),
        Err(ClassError::NotAnEvent { .. })
    ));
}

#[test]
fn test_property_uses_virtual_getter_override() {
    let base = TypeBuilder::new("Base")
        .member("GetKind", Public::virtual_fn(Function::free(|_| Ok(Value::from("base")))))
        .member("Kind", Public::property(PropertyConfig::new().getter("GetKind")).unwrap())
        .build()
        .unwrap();
    let derived = TypeBuilder::new("Derived")
        .base(&base)
        .member(
            "GetKind",
            Public::override_fn(Function::free(|_| Ok(Value::from("derived")))),
        )
        .build()
        .unwrap();

    let obj = derived.construct(&[]).unwrap();
    assert_eq!(obj.get("Kind").unwrap(), Value::from("derived"));
    assert_eq!(
        obj.dynamic_view(&base).unwrap().get("Kind").unwrap(),
        Value::from("derived")
    );
}

#[test]
fn test_custom_naming_conventions() {
    let t = TypeBuilder::new("Snake")
        .conventions(NamingConventions {
            getter_prefix: "get_".to_string(),
            setter_prefix: "set_".to_string(),
            event_suffix: "_changed".to_string(),
        })
        .member("len", Private::member(0))
        .member("get_length", Public::member(getter("len")))
        .member("set_length", Public::member(setter("len")))
        .member("length", Public::property(PropertyConfig::new().has_event(true)).unwrap())
        .build()
        .unwrap();

    assert!(t.member("length_changed").unwrap().is_event());
    let s = t.construct(&[]).unwrap();
    s.set("length", 4).unwrap();
    assert_eq!(s.get("length").unwrap(), Value::from(4));
}

#[test]
fn test_static_view_reads_live_properties() {
    let ty = person(PropertyConfig::new());
    let p = ty.construct(&[]).unwrap();
    let frozen = p.static_view(&ty).unwrap();
    p.set("Name", "Barbara").unwrap();

    // properties call their getter, which reads the live record
    assert_eq!(frozen.get("Name").unwrap(), Value::from("Barbara"));
    assert!(matches!(
        frozen.set("Name", "x"),
        Err(ClassError::ReadOnlyMember { .. })
    ));
}
