use super::builtin::{
    DefaultValueResolver, RequestBodyResolver, RequestValueResolver, RouteParameterResolver,
    ServiceValueResolver,
};
use super::container::ServiceContainer;
use crate::error::{Error, Result};
use crate::factory::InvocableDescriptor;
use crate::reflect::{ParameterSpec, TypeRegistry};
use crate::server::Request;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// What a resolver can see while answering for one parameter.
#[derive(Clone, Copy)]
pub struct ResolutionContext<'a> {
    /// Registry used for type lookups (body decoders)
    pub registry: &'a TypeRegistry,
    /// The callable whose parameters are being resolved
    pub invocable: &'a InvocableDescriptor,
    /// The request being dispatched, if any
    pub request: Option<&'a Arc<Request>>,
}

/// One strategy for supplying parameter values.
pub trait ValueResolver: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Whether this resolver can supply `param`.
    fn supports(&self, ctx: &ResolutionContext<'_>, param: &ParameterSpec) -> bool;

    /// Produce the value. Only called after `supports` returned `true`.
    ///
    /// # Errors
    ///
    /// Typically `UnresolvedArgument` when the source has a value that cannot
    /// be converted to the declared type.
    fn resolve(&self, ctx: &ResolutionContext<'_>, param: &ParameterSpec) -> Result<Value>;
}

/// Ordered chain of [`ValueResolver`]s.
#[derive(Clone, Default)]
pub struct ArgumentResolver {
    resolvers: Vec<Arc<dyn ValueResolver>>,
}

impl ArgumentResolver {
    /// A chain with exactly these resolvers, highest priority first.
    #[must_use]
    pub fn new(resolvers: Vec<Arc<dyn ValueResolver>>) -> Self {
        Self { resolvers }
    }

    /// The canonical dispatch chain, backed by `container` for services.
    #[must_use]
    pub fn with_defaults(container: Arc<dyn ServiceContainer>) -> Self {
        Self::new(vec![
            Arc::new(RequestValueResolver),
            Arc::new(RouteParameterResolver),
            Arc::new(RequestBodyResolver),
            Arc::new(ServiceValueResolver::new(container)),
            Arc::new(DefaultValueResolver),
        ])
    }

    /// Insert a resolver ahead of all others.
    pub fn prepend(&mut self, resolver: Arc<dyn ValueResolver>) -> &mut Self {
        self.resolvers.insert(0, resolver);
        self
    }

    /// Append a resolver behind all others.
    pub fn push(&mut self, resolver: Arc<dyn ValueResolver>) -> &mut Self {
        self.resolvers.push(resolver);
        self
    }

    /// Remove every resolver with the given name.
    pub fn remove(&mut self, name: &str) -> &mut Self {
        self.resolvers.retain(|r| r.name() != name);
        self
    }

    /// Resolver names in priority order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.resolvers.iter().map(|r| r.name()).collect()
    }

    /// Resolve every parameter, in declaration order.
    ///
    /// # Errors
    ///
    /// `UnresolvedArgument(name)` for the first parameter nobody can supply,
    /// or the error returned by the resolver that claimed a parameter.
    pub fn get_arguments(
        &self,
        ctx: &ResolutionContext<'_>,
        parameters: &[ParameterSpec],
    ) -> Result<Vec<Value>> {
        let mut arguments = Vec::with_capacity(parameters.len());
        for param in parameters {
            arguments.push(self.resolve_one(ctx, param)?);
        }
        Ok(arguments)
    }

    fn resolve_one(&self, ctx: &ResolutionContext<'_>, param: &ParameterSpec) -> Result<Value> {
        if let Some(resolver) = self.resolvers.iter().find(|r| r.supports(ctx, param)) {
            debug!(
                invocable = %ctx.invocable,
                parameter = %param.name(),
                position = param.position(),
                resolver = resolver.name(),
                "Argument resolved"
            );
            return resolver.resolve(ctx, param);
        }

        if let Some(default) = param.default_value() {
            debug!(
                invocable = %ctx.invocable,
                parameter = %param.name(),
                "Argument falls back to its default"
            );
            return Ok(default.clone());
        }

        debug!(
            invocable = %ctx.invocable,
            parameter = %param.name(),
            declared_type = ?param.declared_type(),
            "No resolver supports argument"
        );
        Err(Error::UnresolvedArgument(param.name().to_string()))
    }
}

impl fmt::Debug for ArgumentResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgumentResolver")
            .field("resolvers", &self.names())
            .finish()
    }
}
