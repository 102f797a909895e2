mod common;

use common::fixtures::{container, registry, Counter, Item};
use http::Method;
use resapi::resolver::ArgumentResolver;
use resapi::server::Request;
use resapi::value::{Object, TypeName, Value};
use resapi::{Error, FactoryInvoker, FactorySpec, InvocableDescriptor};
use std::sync::Arc;

#[test]
fn test_method_reference_normalizes_to_method_variant() {
    let registry = registry();
    let descriptor = InvocableDescriptor::normalize(FactorySpec::path("Item::show"), &registry).unwrap();
    assert!(matches!(
        &descriptor,
        InvocableDescriptor::UnboundMethod { type_name, method } if type_name.as_str() == "Item" && method == "show"
    ));
    assert_eq!(descriptor.to_string(), "Item::show");

    let factory = InvocableDescriptor::normalize(FactorySpec::path("Counter::starting_at"), &registry).unwrap();
    assert!(matches!(factory, InvocableDescriptor::StaticMethod { .. }));
}

#[test]
fn test_unknown_targets_are_invalid_factories() {
    let registry = registry();
    for path in ["Phantom::summon", "Item::vanish", "justaword", "::show", "Item::"] {
        let err = InvocableDescriptor::normalize(FactorySpec::path(path), &registry).unwrap_err();
        assert!(matches!(err, Error::InvalidFactorySpec(_)), "{path}");
    }
}

#[test]
fn test_self_return_types_resolve_to_declaring_type() {
    let registry = registry();
    let constructor = InvocableDescriptor::normalize(FactorySpec::path("Counter::new"), &registry).unwrap();
    assert_eq!(constructor.return_type(&registry).unwrap(), Some(TypeName::new("Counter")));

    let factory = InvocableDescriptor::normalize(FactorySpec::path("Counter::starting_at"), &registry).unwrap();
    assert_eq!(factory.return_type(&registry).unwrap(), Some(TypeName::new("Counter")));

    let show = InvocableDescriptor::normalize(FactorySpec::path("Item::show"), &registry).unwrap();
    assert_eq!(show.return_type(&registry).unwrap(), Some(TypeName::new("json")));
}

#[test]
fn test_create_object_prefers_self_factory() {
    let registry = registry();
    let resolver = ArgumentResolver::with_defaults(Arc::new(container()));
    let invoker = FactoryInvoker::new(&registry, &resolver);

    let counter = invoker.create_object(&TypeName::new("Counter")).unwrap();
    let counter = counter.downcast_ref::<Counter>().unwrap();
    assert_eq!((counter.value, counter.source), (10, "factory"));
}

#[test]
fn test_constructor_receives_services() {
    let registry = registry();
    let resolver = ArgumentResolver::with_defaults(Arc::new(container()));
    let invoker = FactoryInvoker::new(&registry, &resolver);

    let item = invoker.create_object(&TypeName::new("Item")).unwrap();
    assert_eq!(item.downcast_ref::<Item>().unwrap().catalog, "spring");

    let bare = ArgumentResolver::with_defaults(Arc::new(resapi::Container::new()));
    let item = FactoryInvoker::new(&registry, &bare)
        .create_object(&TypeName::new("Item"))
        .unwrap();
    assert_eq!(item.downcast_ref::<Item>().unwrap().catalog, "none");
}

#[test]
fn test_unbound_method_with_request_arguments() {
    let registry = registry();
    let resolver = ArgumentResolver::with_defaults(Arc::new(container()));
    let mut request = Request::new(Method::GET, "/items/8/price");
    request.set_path_params([("id", "8")]);
    let request = Arc::new(request);
    let invoker = FactoryInvoker::new(&registry, &resolver).with_request(&request);

    let value = invoker.invoke_factory(FactorySpec::path("Item::price()")).unwrap();
    let Value::Json(body) = value else {
        panic!("price returns JSON");
    };
    assert_eq!(body["amount"], 800);
    assert_eq!(body["currency"], "EUR");
}

#[test]
fn test_bound_method_on_existing_instance() {
    let registry = registry();
    let resolver = ArgumentResolver::with_defaults(Arc::new(container()));
    let invoker = FactoryInvoker::new(&registry, &resolver);

    let counter = Object::of(Counter {
        value: 41,
        source: "test",
    });
    let value = invoker
        .invoke_factory(FactorySpec::bound(counter, "increment"))
        .unwrap();
    assert!(matches!(value, Value::Json(ref body) if body["value"] == 42));
}
