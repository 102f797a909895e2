use super::container::ServiceContainer;
use super::core::{ResolutionContext, ValueResolver};
use crate::error::{Error, Result};
use crate::reflect::ParameterSpec;
use crate::value::{TypeName, Value};
use std::sync::Arc;
use tracing::debug;

/// Convert a raw string into the declared scalar type.
///
/// `int`, `float` and `bool` are parsed; `string` and an unknown declared type
/// keep the raw string. Returns `None` when parsing fails or the declared type
/// is not a scalar.
#[must_use]
pub fn coerce_scalar(raw: &str, declared_type: Option<&TypeName>) -> Option<serde_json::Value> {
    use serde_json::Value as Json;

    let Some(ty) = declared_type else {
        return Some(Json::String(raw.to_string()));
    };
    match ty.as_str() {
        TypeName::INT => raw.parse::<i64>().ok().map(Json::from),
        TypeName::FLOAT => raw
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Json::Number),
        TypeName::BOOL => raw.parse::<bool>().ok().map(Json::from),
        TypeName::STRING => Some(Json::String(raw.to_string())),
        _ => None,
    }
}

fn accepts_scalar(param: &ParameterSpec) -> bool {
    param.declared_type().map_or(true, TypeName::is_scalar)
}

fn coerce_param(raw: &str, param: &ParameterSpec, source: &str) -> Result<Value> {
    coerce_scalar(raw, param.declared_type())
        .map(Value::Json)
        .ok_or_else(|| {
            debug!(
                parameter = %param.name(),
                declared_type = ?param.declared_type(),
                raw = %raw,
                source = source,
                "Scalar coercion failed"
            );
            Error::UnresolvedArgument(param.name().to_string())
        })
}

/// Supplies the current request to parameters declared as `Request`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestValueResolver;

impl ValueResolver for RequestValueResolver {
    fn name(&self) -> &'static str {
        "request"
    }

    fn supports(&self, ctx: &ResolutionContext<'_>, param: &ParameterSpec) -> bool {
        ctx.request.is_some() && param.is_type(TypeName::REQUEST)
    }

    fn resolve(&self, ctx: &ResolutionContext<'_>, param: &ParameterSpec) -> Result<Value> {
        ctx.request
            .map(|req| Value::Request(Arc::clone(req)))
            .ok_or_else(|| Error::UnresolvedArgument(param.name().to_string()))
    }
}

/// Supplies route placeholder values to parameters of the same name.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteParameterResolver;

impl ValueResolver for RouteParameterResolver {
    fn name(&self) -> &'static str {
        "route_parameter"
    }

    fn supports(&self, ctx: &ResolutionContext<'_>, param: &ParameterSpec) -> bool {
        accepts_scalar(param)
            && ctx
                .request
                .is_some_and(|req| req.path_param(param.name()).is_some())
    }

    fn resolve(&self, ctx: &ResolutionContext<'_>, param: &ParameterSpec) -> Result<Value> {
        let raw = ctx
            .request
            .and_then(|req| req.path_param(param.name()))
            .ok_or_else(|| Error::UnresolvedArgument(param.name().to_string()))?;
        coerce_param(raw, param, "path")
    }
}

/// Decodes the request body into the parameter's declared type.
///
/// Applies to `json` parameters and to registered types marked decodable.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestBodyResolver;

impl ValueResolver for RequestBodyResolver {
    fn name(&self) -> &'static str {
        "request_body"
    }

    fn supports(&self, ctx: &ResolutionContext<'_>, param: &ParameterSpec) -> bool {
        let Some(ty) = param.declared_type() else {
            return false;
        };
        let decodable = ty.is(TypeName::JSON) || ctx.registry.decoder(ty.as_str()).is_some();
        decodable && ctx.request.is_some_and(|req| !req.body().is_empty())
    }

    fn resolve(&self, ctx: &ResolutionContext<'_>, param: &ParameterSpec) -> Result<Value> {
        let unresolved = || Error::UnresolvedArgument(param.name().to_string());
        let body = ctx.request.map(|req| req.body()).ok_or_else(unresolved)?;
        let ty = param.declared_type().ok_or_else(unresolved)?;

        let decoded = if ty.is(TypeName::JSON) {
            serde_json::from_slice::<serde_json::Value>(body)
                .map(Value::Json)
                .map_err(anyhow::Error::from)
        } else {
            let decoder = ctx.registry.decoder(ty.as_str()).ok_or_else(unresolved)?;
            decoder(body).map(Value::Object)
        };

        decoded.map_err(|e| {
            debug!(
                parameter = %param.name(),
                declared_type = %ty,
                error = %e,
                "Request body could not be decoded"
            );
            unresolved()
        })
    }
}

/// Looks services up in a [`ServiceContainer`] by declared type.
#[derive(Clone)]
pub struct ServiceValueResolver {
    container: Arc<dyn ServiceContainer>,
}

impl ServiceValueResolver {
    #[must_use]
    pub fn new(container: Arc<dyn ServiceContainer>) -> Self {
        Self { container }
    }
}

impl ValueResolver for ServiceValueResolver {
    fn name(&self) -> &'static str {
        "service"
    }

    fn supports(&self, _ctx: &ResolutionContext<'_>, param: &ParameterSpec) -> bool {
        param
            .declared_type()
            .is_some_and(|ty| self.container.has(ty.as_str()))
    }

    fn resolve(&self, _ctx: &ResolutionContext<'_>, param: &ParameterSpec) -> Result<Value> {
        param
            .declared_type()
            .and_then(|ty| self.container.get(ty.as_str()))
            .ok_or_else(|| Error::UnresolvedArgument(param.name().to_string()))
    }
}

/// Supplies declared defaults, and `null` for nullable parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultValueResolver;

impl ValueResolver for DefaultValueResolver {
    fn name(&self) -> &'static str {
        "default"
    }

    fn supports(&self, _ctx: &ResolutionContext<'_>, param: &ParameterSpec) -> bool {
        param.has_default() || param.is_nullable()
    }

    fn resolve(&self, _ctx: &ResolutionContext<'_>, param: &ParameterSpec) -> Result<Value> {
        Ok(param.default_value().cloned().unwrap_or(Value::Null))
    }
}

/// Supplies query string values to parameters of the same name.
///
/// Not part of the default chain; add it with
/// [`ArgumentResolver::push`](super::ArgumentResolver::push) or `prepend`.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryParameterResolver;

impl ValueResolver for QueryParameterResolver {
    fn name(&self) -> &'static str {
        "query_parameter"
    }

    fn supports(&self, ctx: &ResolutionContext<'_>, param: &ParameterSpec) -> bool {
        accepts_scalar(param)
            && ctx
                .request
                .is_some_and(|req| req.query_param(param.name()).is_some())
    }

    fn resolve(&self, ctx: &ResolutionContext<'_>, param: &ParameterSpec) -> Result<Value> {
        let raw = ctx
            .request
            .and_then(|req| req.query_param(param.name()))
            .ok_or_else(|| Error::UnresolvedArgument(param.name().to_string()))?;
        coerce_param(raw, param, "query")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::InvocableDescriptor;
    use crate::reflect::{Callable, ReturnType, TypeRegistry};
    use crate::resolver::{ArgumentResolver, Container};
    use crate::server::Request;
    use http::Method;
    use serde_json::json;

    fn context_for<'a>(
        registry: &'a TypeRegistry,
        invocable: &'a InvocableDescriptor,
        request: Option<&'a Arc<Request>>,
    ) -> ResolutionContext<'a> {
        ResolutionContext {
            registry,
            invocable,
            request,
        }
    }

    fn closure() -> InvocableDescriptor {
        InvocableDescriptor::Closure(Callable::new(Vec::new(), ReturnType::Unknown, |_| {
            Ok(Value::Null)
        }))
    }

    fn request_with_id(id: &str) -> Arc<Request> {
        let mut req = Request::new(Method::GET, "/items/x?limit=5&flag=true");
        req.set_path_params([("id", id)]);
        Arc::new(req)
    }

    #[test]
    fn test_coerce_scalar() {
        let int = TypeName::new("int");
        let float = TypeName::new("float");
        let boolean = TypeName::new("bool");
        assert_eq!(coerce_scalar("42", Some(&int)), Some(json!(42)));
        assert_eq!(coerce_scalar("4x", Some(&int)), None);
        assert_eq!(coerce_scalar("1.5", Some(&float)), Some(json!(1.5)));
        assert_eq!(coerce_scalar("true", Some(&boolean)), Some(json!(true)));
        assert_eq!(coerce_scalar("yes", Some(&boolean)), None);
        assert_eq!(coerce_scalar("abc", None), Some(json!("abc")));
        assert_eq!(coerce_scalar("abc", Some(&TypeName::new("Item"))), None);
    }

    #[test]
    fn test_route_parameter_coerced_to_declared_type() {
        let registry = TypeRegistry::new();
        let invocable = closure();
        let req = request_with_id("42");
        let ctx = context_for(&registry, &invocable, Some(&req));

        let param = ParameterSpec::typed("id", "int");
        assert!(RouteParameterResolver.supports(&ctx, &param));
        assert_eq!(RouteParameterResolver.resolve(&ctx, &param).unwrap().as_i64(), Some(42));

        let other = ParameterSpec::typed("slug", "string");
        assert!(!RouteParameterResolver.supports(&ctx, &other));
    }

    #[test]
    fn test_route_parameter_coercion_failure_is_unresolved() {
        let registry = TypeRegistry::new();
        let invocable = closure();
        let req = request_with_id("forty-two");
        let ctx = context_for(&registry, &invocable, Some(&req));

        let err = RouteParameterResolver
            .resolve(&ctx, &ParameterSpec::typed("id", "int"))
            .unwrap_err();
        assert!(matches!(err, Error::UnresolvedArgument(name) if name == "id"));
    }

    #[test]
    fn test_request_value_only_with_request() {
        let registry = TypeRegistry::new();
        let invocable = closure();
        let param = ParameterSpec::typed("request", "Request");

        let none = context_for(&registry, &invocable, None);
        assert!(!RequestValueResolver.supports(&none, &param));

        let req = request_with_id("1");
        let some = context_for(&registry, &invocable, Some(&req));
        let value = RequestValueResolver.resolve(&some, &param).unwrap();
        assert_eq!(value.as_request().map(|r| r.path()), Some("/items/x"));
    }

    #[test]
    fn test_body_resolver_decodes_json() {
        let registry = TypeRegistry::new();
        let invocable = closure();
        let param = ParameterSpec::typed("payload", "json");

        let empty = Arc::new(Request::new(Method::POST, "/items"));
        let ctx = context_for(&registry, &invocable, Some(&empty));
        assert!(!RequestBodyResolver.supports(&ctx, &param));

        let good = Arc::new(Request::new(Method::POST, "/items").with_body(r#"{"a":1}"#));
        let ctx = context_for(&registry, &invocable, Some(&good));
        assert!(RequestBodyResolver.supports(&ctx, &param));
        let value = RequestBodyResolver.resolve(&ctx, &param).unwrap();
        assert!(matches!(value, Value::Json(v) if v == json!({"a": 1})));

        let bad = Arc::new(Request::new(Method::POST, "/items").with_body("{oops"));
        let ctx = context_for(&registry, &invocable, Some(&bad));
        let err = RequestBodyResolver.resolve(&ctx, &param).unwrap_err();
        assert!(matches!(err, Error::UnresolvedArgument(name) if name == "payload"));
    }

    #[test]
    fn test_service_resolver_uses_container() {
        let registry = TypeRegistry::new();
        let invocable = closure();
        let mut container = Container::new();
        container.insert("Clock", Value::from("tick"));
        let resolver = ServiceValueResolver::new(Arc::new(container));
        let ctx = context_for(&registry, &invocable, None);

        let clock = ParameterSpec::typed("clock", "Clock");
        assert!(resolver.supports(&ctx, &clock));
        assert_eq!(resolver.resolve(&ctx, &clock).unwrap().as_str(), Some("tick"));
        assert!(!resolver.supports(&ctx, &ParameterSpec::typed("db", "Database")));
        assert!(!resolver.supports(&ctx, &ParameterSpec::new("untyped")));
    }

    #[test]
    fn test_default_resolver_nullable_and_default() {
        let registry = TypeRegistry::new();
        let invocable = closure();
        let ctx = context_for(&registry, &invocable, None);

        let nullable = ParameterSpec::typed("note", "string").nullable();
        assert!(DefaultValueResolver.supports(&ctx, &nullable));
        assert!(DefaultValueResolver.resolve(&ctx, &nullable).unwrap().is_null());

        let defaulted = ParameterSpec::typed("page", "int").with_default(1);
        assert_eq!(DefaultValueResolver.resolve(&ctx, &defaulted).unwrap().as_i64(), Some(1));

        assert!(!DefaultValueResolver.supports(&ctx, &ParameterSpec::new("plain")));
    }

    #[test]
    fn test_query_resolver_is_opt_in() {
        let registry = TypeRegistry::new();
        let invocable = closure();
        let req = request_with_id("1");
        let ctx = context_for(&registry, &invocable, Some(&req));
        let params = vec![ParameterSpec::typed("limit", "int").with_default(10)];

        let defaults = ArgumentResolver::with_defaults(Arc::new(Container::new()));
        let args = defaults.get_arguments(&ctx, &params).unwrap();
        assert_eq!(args[0].as_i64(), Some(10));

        let mut with_query = defaults.clone();
        with_query.prepend(Arc::new(QueryParameterResolver));
        let args = with_query.get_arguments(&ctx, &params).unwrap();
        assert_eq!(args[0].as_i64(), Some(5));
    }

    #[test]
    fn test_route_parameter_beats_service_and_default() {
        let registry = TypeRegistry::new();
        let invocable = closure();
        let req = request_with_id("7");
        let ctx = context_for(&registry, &invocable, Some(&req));

        let mut container = Container::new();
        container.insert("int", Value::from(99));
        let chain = ArgumentResolver::with_defaults(Arc::new(container));

        let params = vec![ParameterSpec::typed("id", "int").with_default(1)];
        let args = chain.get_arguments(&ctx, &params).unwrap();
        assert_eq!(args[0].as_i64(), Some(7));
    }
}
