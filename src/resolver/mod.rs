//! # Resolver Module
//!
//! Supplies the arguments of a call by walking its formal parameters.
//!
//! ## Overview
//!
//! For every parameter, in declaration order, the [`ArgumentResolver`] asks its
//! [`ValueResolver`]s in priority order whether they support the parameter.
//! The first one that does supplies the value. When none does, the declared
//! default is used; without a default, resolution fails with
//! `UnresolvedArgument(name)`.
//!
//! ## Canonical Chain
//!
//! [`ArgumentResolver::with_defaults`] builds the chain used by the dispatcher
//! (highest priority first):
//!
//! 1. [`RequestValueResolver`] - the current request, for `Request` parameters
//! 2. [`RouteParameterResolver`] - route placeholders, matched by name
//! 3. [`RequestBodyResolver`] - the body decoded into the declared type
//! 4. [`ServiceValueResolver`] - a [`ServiceContainer`] lookup by declared type
//! 5. [`DefaultValueResolver`] - declared defaults, `null` for nullable params
//!
//! The order is part of the contract. Custom resolvers go in front with
//! [`ArgumentResolver::prepend`] or behind with [`ArgumentResolver::push`].
//! [`QueryParameterResolver`] is provided but not part of the default chain.

mod builtin;
mod container;
mod core;

pub use self::core::{ArgumentResolver, ResolutionContext, ValueResolver};
pub use builtin::{
    coerce_scalar, DefaultValueResolver, QueryParameterResolver, RequestBodyResolver,
    RequestValueResolver, RouteParameterResolver, ServiceValueResolver,
};
pub use container::{Container, ServiceContainer};
