//! # Dispatcher Module
//!
//! Carries one request from matching to a response.
//!
//! ## Request Flow
//!
//! 1. The [`RouteTable`](crate::router::RouteTable) matches the request; no
//!    match answers 404.
//! 2. The route's resource type is built through
//!    [`FactoryInvoker::create_object`](crate::factory::FactoryInvoker::create_object)
//!    (its self-factory when it has one). An invalid factory answers 404.
//! 3. Without an action the resource itself is the payload. Otherwise the
//!    action is invoked on the resource with resolver-supplied arguments; an
//!    argument that cannot be supplied answers 400.
//! 4. The value is normalized into a [`Response`](crate::server::Response):
//!    JSON payload and 200 by default, a returned `Response` keeps its own
//!    status and headers, and the route's fixed status wins over both.
//! 5. The response goes back through the [`Transport`](crate::server::Transport).
//!
//! ## Error Handling
//!
//! An [`HttpError`](crate::HttpError) returned by application code becomes a
//! response with its status and headers. Everything else is logged at `error`
//! level and answered with a generic 500.
//!
//! Every response carries the request id in `x-request-id`.

mod core;

pub use self::core::{Api, DispatchState, HeaderVec, MAX_INLINE_HEADERS, RESOURCE_UNAVAILABLE};
