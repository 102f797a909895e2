use super::descriptor::{FactorySpec, InvocableDescriptor};
use crate::error::{Error, Result};
use crate::reflect::{MethodKind, TypeRegistry};
use crate::resolver::{ArgumentResolver, ResolutionContext};
use crate::server::Request;
use crate::value::{Arguments, Object, TypeName, Value};
use std::sync::Arc;
use tracing::debug;

/// Invokes descriptors with arguments supplied by an [`ArgumentResolver`].
///
/// One invoker is created per dispatch (it borrows the current request), so it
/// is cheap: three references.
#[derive(Clone, Copy)]
pub struct FactoryInvoker<'a> {
    registry: &'a TypeRegistry,
    resolver: &'a ArgumentResolver,
    request: Option<&'a Arc<Request>>,
}

impl<'a> FactoryInvoker<'a> {
    #[must_use]
    pub fn new(registry: &'a TypeRegistry, resolver: &'a ArgumentResolver) -> Self {
        Self {
            registry,
            resolver,
            request: None,
        }
    }

    /// Seed argument resolution with the request being dispatched.
    #[must_use]
    pub fn with_request(mut self, request: &'a Arc<Request>) -> Self {
        self.request = Some(request);
        self
    }

    /// Normalize and invoke a factory.
    ///
    /// # Errors
    ///
    /// See [`FactoryInvoker::invoke`].
    pub fn invoke_factory(&self, spec: FactorySpec) -> Result<Value> {
        let descriptor = InvocableDescriptor::normalize(spec, self.registry)?;
        self.invoke(&descriptor)
    }

    /// Resolve the descriptor's arguments and call it.
    ///
    /// An unbound instance method first gets an owning instance through
    /// [`FactoryInvoker::create_object`].
    ///
    /// # Errors
    ///
    /// - `InvalidFactorySpec` when the target (or its owner) cannot be found
    /// - `UnresolvedArgument` when a parameter cannot be supplied
    /// - whatever the invoked body returns, see [`Error::from_application`]
    pub fn invoke(&self, descriptor: &InvocableDescriptor) -> Result<Value> {
        self.invoke_inner(descriptor, &mut Vec::new())
    }

    /// Build an instance of `type_name`, through its self-factory when it
    /// declares one and through its constructor otherwise.
    ///
    /// # Errors
    ///
    /// `InvalidFactorySpec` when the type is unknown, has neither factory nor
    /// constructor, its factory chain is circular, or its factory does not
    /// produce an object. Resolution and application errors propagate.
    pub fn create_object(&self, type_name: &TypeName) -> Result<Object> {
        self.create_object_inner(type_name, &mut Vec::new())
    }

    fn invoke_inner(
        &self,
        descriptor: &InvocableDescriptor,
        constructing: &mut Vec<TypeName>,
    ) -> Result<Value> {
        let signature = descriptor.signature(self.registry)?;
        let ctx = ResolutionContext {
            registry: self.registry,
            invocable: descriptor,
            request: self.request,
        };
        let args = Arguments::new(self.resolver.get_arguments(&ctx, signature.parameters())?);

        debug!(
            invocable = %descriptor,
            arguments = args.len(),
            "Invoking"
        );

        match descriptor {
            InvocableDescriptor::Constructor(type_name) => {
                let constructor = self.registry.constructor(type_name.as_str()).ok_or_else(|| {
                    Error::InvalidFactorySpec(format!("type `{type_name}` has no constructor"))
                })?;
                constructor
                    .construct(args)
                    .map(Value::Object)
                    .map_err(Error::from_application)
            }
            InvocableDescriptor::FreeFunction(name) => self
                .registry
                .function(name)
                .ok_or_else(|| Error::InvalidFactorySpec(format!("unknown function `{name}`")))?
                .call(args)
                .map_err(Error::from_application),
            InvocableDescriptor::Closure(callable) => {
                callable.call(args).map_err(Error::from_application)
            }
            InvocableDescriptor::StaticMethod { type_name, method } => {
                match self.method_kind(type_name, method)? {
                    MethodKind::Static(body) => body(args).map_err(Error::from_application),
                    MethodKind::Instance(_) => Err(Error::InvalidFactorySpec(format!(
                        "`{type_name}::{method}` is not a static method"
                    ))),
                }
            }
            InvocableDescriptor::BoundMethod { instance, method } => {
                let kind = self.method_kind(instance.type_name(), method)?;
                call_method(kind, instance, args)
            }
            InvocableDescriptor::UnboundMethod { type_name, method } => {
                let kind = self.method_kind(type_name, method)?;
                let owner = self.create_object_inner(type_name, constructing)?;
                call_method(kind, &owner, args)
            }
        }
    }

    fn create_object_inner(
        &self,
        type_name: &TypeName,
        constructing: &mut Vec<TypeName>,
    ) -> Result<Object> {
        if constructing.contains(type_name) {
            let chain: Vec<&str> = constructing.iter().map(TypeName::as_str).collect();
            return Err(Error::InvalidFactorySpec(format!(
                "circular factory chain: {} -> {type_name}",
                chain.join(" -> ")
            )));
        }

        constructing.push(type_name.clone());
        let result = self.build_object(type_name, constructing);
        constructing.pop();
        result
    }

    fn build_object(&self, type_name: &TypeName, constructing: &mut Vec<TypeName>) -> Result<Object> {
        let info = self.registry.type_info(type_name.as_str()).ok_or_else(|| {
            Error::InvalidFactorySpec(format!("unknown type `{type_name}`"))
        })?;

        let spec = match info.factory() {
            Some(factory) => {
                debug!(type_name = %type_name, "Constructing through self-factory");
                factory
            }
            None => FactorySpec::constructor(type_name.clone()),
        };

        let descriptor = InvocableDescriptor::normalize(spec, self.registry)?;
        match self.invoke_inner(&descriptor, constructing)? {
            Value::Object(obj) => Ok(obj),
            other => Err(Error::InvalidFactorySpec(format!(
                "factory `{descriptor}` for `{type_name}` produced a {} instead of an object",
                other.kind()
            ))),
        }
    }

    fn method_kind(&self, type_name: &TypeName, method: &str) -> Result<&'a MethodKind> {
        self.registry
            .method(type_name.as_str(), method)
            .map(|m| m.kind())
            .ok_or_else(|| {
                Error::InvalidFactorySpec(format!("type `{type_name}` has no method `{method}`"))
            })
    }
}

fn call_method(kind: &MethodKind, owner: &Object, args: Arguments) -> Result<Value> {
    let result = match kind {
        MethodKind::Instance(body) => body(owner, args),
        MethodKind::Static(body) => body(args),
    };
    result.map_err(Error::from_application)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::{Manufacturable, ParameterSpec, Resource, ReturnType, TypeBuilder};
    use serde::Serialize;

    #[derive(Debug, Serialize)]
    struct Oven {
        temperature: i64,
        source: &'static str,
    }

    impl Resource for Oven {
        const NAME: &'static str = "Oven";

        fn describe(ty: &mut TypeBuilder<Self>) {
            ty.constructor(
                vec![ParameterSpec::typed("temperature", "int").with_default(180)],
                |args| {
                    Ok(Oven {
                        temperature: args.json(0)?,
                        source: "constructor",
                    })
                },
            )
            .method("bake", vec![ParameterSpec::typed("minutes", "int")], ReturnType::named("string"), |this, args| {
                let minutes: i64 = args.json(0)?;
                Ok(Value::from(format!("{}@{}C for {minutes}m", this.source, this.temperature)))
            });
        }
    }

    /// Builds itself through `Bakery::open`, never through its constructor.
    #[derive(Debug, Serialize)]
    struct Bakery {
        source: &'static str,
    }

    impl Manufacturable for Bakery {
        fn factory() -> FactorySpec {
            FactorySpec::path("Bakery::open")
        }
    }

    impl Resource for Bakery {
        const NAME: &'static str = "Bakery";

        fn describe(ty: &mut TypeBuilder<Self>) {
            ty.constructor(vec![], |_| Ok(Bakery { source: "constructor" }))
                .static_factory("open", vec![], |_| Ok(Bakery { source: "factory" }))
                .method("sign", vec![], ReturnType::named("string"), |this, _| {
                    Ok(Value::from(this.source))
                })
                .manufacturable();
        }
    }

    /// Its factory is one of its own instance methods.
    #[derive(Debug, Serialize)]
    struct Ouroboros;

    impl Manufacturable for Ouroboros {
        fn factory() -> FactorySpec {
            FactorySpec::path("Ouroboros::rebuild")
        }
    }

    impl Resource for Ouroboros {
        const NAME: &'static str = "Ouroboros";

        fn describe(ty: &mut TypeBuilder<Self>) {
            ty.constructor(vec![], |_| Ok(Ouroboros))
                .method("rebuild", vec![], ReturnType::SelfType, |_, _| {
                    Ok(Value::Object(Object::of(Ouroboros)))
                })
                .manufacturable();
        }
    }

    /// Its factory yields a plain number.
    #[derive(Debug, Serialize)]
    struct Tally;

    impl Manufacturable for Tally {
        fn factory() -> FactorySpec {
            FactorySpec::closure(vec![], ReturnType::named("int"), |_| Ok(Value::from(5)))
        }
    }

    impl Resource for Tally {
        const NAME: &'static str = "Tally";

        fn describe(ty: &mut TypeBuilder<Self>) {
            ty.constructor(vec![], |_| Ok(Tally)).manufacturable();
        }
    }

    fn setup() -> (TypeRegistry, ArgumentResolver) {
        let mut registry = TypeRegistry::new();
        registry
            .register::<Oven>()
            .register::<Bakery>()
            .register::<Ouroboros>()
            .register::<Tally>()
            .register_function("preheat", vec![ParameterSpec::typed("to", "int").with_default(220)], ReturnType::named("int"), |args| {
                Ok(Value::from(args.json::<i64>(0)? + 1))
            });
        (registry, ArgumentResolver::new(Vec::new()))
    }

    #[test]
    fn test_constructor_uses_defaults() {
        let (registry, resolver) = setup();
        let invoker = FactoryInvoker::new(&registry, &resolver);
        let oven = invoker.create_object(&TypeName::new("Oven")).unwrap();
        assert_eq!(oven.downcast_ref::<Oven>().unwrap().temperature, 180);
    }

    #[test]
    fn test_free_function_invocation() {
        let (registry, resolver) = setup();
        let invoker = FactoryInvoker::new(&registry, &resolver);
        let value = invoker.invoke_factory(FactorySpec::path("preheat")).unwrap();
        assert_eq!(value.as_i64(), Some(221));
    }

    #[test]
    fn test_unbound_method_without_default_argument_fails() {
        let (registry, resolver) = setup();
        let invoker = FactoryInvoker::new(&registry, &resolver);
        let err = invoker.invoke_factory(FactorySpec::path("Oven::bake")).unwrap_err();
        assert!(matches!(err, Error::UnresolvedArgument(name) if name == "minutes"));
    }

    #[test]
    fn test_unbound_method_constructs_owner_through_self_factory() {
        let (registry, resolver) = setup();
        let invoker = FactoryInvoker::new(&registry, &resolver);
        let value = invoker.invoke_factory(FactorySpec::path("Bakery::sign")).unwrap();
        assert_eq!(value.as_str(), Some("factory"));
    }

    #[test]
    fn test_bound_method_uses_given_instance() {
        let (registry, resolver) = setup();
        let invoker = FactoryInvoker::new(&registry, &resolver);
        let bakery = Object::of(Bakery { source: "given" });
        let value = invoker.invoke_factory(FactorySpec::bound(bakery, "sign")).unwrap();
        assert_eq!(value.as_str(), Some("given"));
    }

    #[test]
    fn test_circular_factory_is_rejected() {
        let (registry, resolver) = setup();
        let invoker = FactoryInvoker::new(&registry, &resolver);
        let err = invoker.create_object(&TypeName::new("Ouroboros")).unwrap_err();
        assert!(matches!(err, Error::InvalidFactorySpec(msg) if msg.contains("circular")));
    }

    #[test]
    fn test_factory_producing_non_object_is_rejected() {
        let (registry, resolver) = setup();
        let invoker = FactoryInvoker::new(&registry, &resolver);
        let err = invoker.create_object(&TypeName::new("Tally")).unwrap_err();
        assert!(matches!(err, Error::InvalidFactorySpec(msg) if msg.contains("instead of an object")));
    }

    #[test]
    fn test_unknown_type_is_invalid_factory() {
        let (registry, resolver) = setup();
        let invoker = FactoryInvoker::new(&registry, &resolver);
        let err = invoker.create_object(&TypeName::new("Nowhere")).unwrap_err();
        assert!(matches!(err, Error::InvalidFactorySpec(_)));
    }

    #[test]
    fn test_closure_invocation() {
        let (registry, resolver) = setup();
        let invoker = FactoryInvoker::new(&registry, &resolver);
        let value = invoker
            .invoke_factory(FactorySpec::closure(vec![], ReturnType::Unknown, |_| Ok(Value::from(5))))
            .unwrap();
        assert_eq!(value.as_i64(), Some(5));
    }
}
