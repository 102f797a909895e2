//! # resapi
//!
//! **resapi** is a small dispatch core for resource-oriented APIs. Resource
//! types declare their own routes and, optionally, their own construction
//! strategy; the core matches each request to a resource and action, builds
//! the resource, fills the action's parameters from the request and from
//! shared services, and normalizes whatever comes back into a response.
//!
//! ## Architecture
//!
//! - **[`value`]** - dynamically typed values flowing through invocations
//! - **[`reflect`]** - the type registry: constructors, methods, signatures
//!   and capabilities of every resource type
//! - **[`factory`]** - turns factory references into invocable descriptors
//!   and invokes them
//! - **[`resolver`]** - the argument resolver chain and the service container
//! - **[`router`]** - route declarations, the route table and matching
//! - **[`server`]** - request context, response envelope, transport seam
//! - **[`dispatcher`]** - the [`Api`] state machine tying it all together
//! - **[`config`]**, **[`telemetry`]**, **[`ids`]** - configuration, logging
//!   and request ids
//!
//! ### Request Flow
//!
//! ```text
//! Transport::receive ─▶ RouteTable::match_request ─▶ FactoryInvoker::create_object
//!        ▲                        │ NoMatch → 404            │ InvalidFactorySpec → 404
//!        │                        ▼                          ▼
//! Transport::send ◀── normalize ◀── action(args) ◀── ArgumentResolver::get_arguments
//!                                         │ UnresolvedArgument → 400
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use http::Method;
//! use resapi::config::ApiConfig;
//! use resapi::reflect::{ParameterSpec, Resource, ReturnType, Routable, TypeBuilder, TypeRegistry};
//! use resapi::resolver::Container;
//! use resapi::router::{Route, RouteDeclaration};
//! use resapi::server::Request;
//! use resapi::value::Value;
//! use resapi::Api;
//! use serde::Serialize;
//!
//! #[derive(Debug, Default, Serialize)]
//! struct Item;
//!
//! impl Routable for Item {
//!     fn routes() -> Vec<RouteDeclaration> {
//!         vec![Route::new(Method::GET, "/items/{id}").action("show").into()]
//!     }
//! }
//!
//! impl Resource for Item {
//!     const NAME: &'static str = "Item";
//!
//!     fn describe(ty: &mut TypeBuilder<Self>) {
//!         ty.default_constructor()
//!             .method(
//!                 "show",
//!                 vec![ParameterSpec::typed("id", "int")],
//!                 ReturnType::named("json"),
//!                 |_, args| Value::json(serde_json::json!({ "id": args.json::<i64>(0)? })),
//!             )
//!             .routable();
//!     }
//! }
//!
//! # fn main() -> resapi::Result<()> {
//! let mut registry = TypeRegistry::new();
//! registry.register::<Item>();
//! let api = Api::new(Arc::new(registry), ["Item"], Arc::new(Container::new()), ApiConfig::default())?;
//!
//! let response = api.handle(Request::new(Method::GET, "/items/42"));
//! assert_eq!(response.status(), 200);
//! assert_eq!(response.body()["id"], 42);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod factory;
pub mod ids;
pub mod reflect;
pub mod resolver;
pub mod router;
pub mod server;
pub mod telemetry;
pub mod value;

pub use dispatcher::Api;
pub use error::{Error, HttpError, Result};
pub use factory::{FactoryInvoker, FactorySpec, InvocableDescriptor};
pub use reflect::{Manufacturable, ParameterSpec, Resource, ReturnType, Routable, TypeRegistry};
pub use resolver::{ArgumentResolver, Container, ServiceContainer, ValueResolver};
pub use router::{Route, RouteDeclaration, RouteTable};
pub use server::{Request, Response, Transport};
pub use value::{Arguments, Object, TypeName, Value};
