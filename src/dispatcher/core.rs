use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::factory::{FactoryInvoker, FactorySpec};
use crate::ids::RequestId;
use crate::reflect::TypeRegistry;
use crate::resolver::{ArgumentResolver, ServiceContainer};
use crate::router::{CompiledRoute, RouteTable};
use crate::server::{Request, Response, Transport, REQUEST_ID_HEADER};
use crate::value::{TypeName, Value};
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Maximum number of headers before heap allocation.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Header name/value pairs. Names are `Arc<str>` so static names clone cheaply.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Message of the 404 answered when a resource cannot be built.
pub const RESOURCE_UNAVAILABLE: &str = "resource unavailable";

/// Stages a request passes through.
///
/// ```text
/// Received ─▶ Matched ─▶ ResourceBuilt ─▶ ActionInvoked ─▶ ResponseBuilt ─▶ Sent
///    │           │             │                │
///    └───────────┴─────────────┴────────────────┴──────────▶ ErrorHandled ─▶ Sent
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Received,
    Matched,
    ResourceBuilt,
    ActionInvoked,
    ResponseBuilt,
    ErrorHandled,
    Sent,
}

impl DispatchState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DispatchState::Received => "received",
            DispatchState::Matched => "matched",
            DispatchState::ResourceBuilt => "resource_built",
            DispatchState::ActionInvoked => "action_invoked",
            DispatchState::ResponseBuilt => "response_built",
            DispatchState::ErrorHandled => "error_handled",
            DispatchState::Sent => "sent",
        }
    }
}

impl fmt::Display for DispatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dispatch failure, classified by the stage it happened in.
#[derive(Debug)]
enum Failure {
    /// 404: no route, or the resource cannot be built
    NotFound(Error),
    /// 400: the action's arguments are unusable
    BadRequest(Error),
    /// Passed through if it carries an [`HttpError`](crate::HttpError), else 500
    Unclassified(Error),
}

impl Failure {
    fn while_building(err: Error) -> Self {
        match err {
            Error::InvalidFactorySpec(_) | Error::InvalidArgument(_) => Failure::NotFound(err),
            other => Failure::Unclassified(other),
        }
    }

    fn while_invoking(err: Error) -> Self {
        match err {
            Error::UnresolvedArgument(_) | Error::InvalidArgument(_) => Failure::BadRequest(err),
            other => Failure::Unclassified(other),
        }
    }
}

/// The dispatch core: matches a request, builds the targeted resource,
/// invokes its action and normalizes the outcome into a [`Response`].
///
/// `Api` is immutable once built and can be shared across threads behind an
/// `Arc`; [`Api::handle`] takes `&self`.
pub struct Api {
    registry: Arc<TypeRegistry>,
    routes: RouteTable,
    resolver: ArgumentResolver,
    config: ApiConfig,
}

impl Api {
    /// Build the route table for `resources` and the default resolver chain.
    ///
    /// # Errors
    ///
    /// - `InvalidFactorySpec` when a resource type is not registered
    /// - `InvalidRoute` when a route declaration is malformed or names an
    ///   action its resource type does not have
    pub fn new<I>(
        registry: Arc<TypeRegistry>,
        resources: I,
        container: Arc<dyn ServiceContainer>,
        config: ApiConfig,
    ) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<TypeName>,
    {
        let resources: Vec<TypeName> = resources.into_iter().map(Into::into).collect();
        let routes = RouteTable::build(&registry, &resources)?.with_webroot(&config.webroot);
        for route in routes.routes() {
            check_action(&registry, route)?;
        }

        info!(
            resources_count = resources.len(),
            routes_count = routes.len(),
            webroot = %routes.webroot(),
            "Dispatcher ready"
        );

        Ok(Self {
            registry,
            routes,
            resolver: ArgumentResolver::with_defaults(container),
            config,
        })
    }

    /// Replace the argument resolver chain.
    #[must_use]
    pub fn with_resolver(mut self, resolver: ArgumentResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// The resolver chain, for `prepend`/`push` before serving.
    pub fn resolver_mut(&mut self) -> &mut ArgumentResolver {
        &mut self.resolver
    }

    #[must_use]
    pub fn resolver(&self) -> &ArgumentResolver {
        &self.resolver
    }

    #[must_use]
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    #[must_use]
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Serve every request `transport` yields, until it yields `None`.
    ///
    /// Returns the number of requests served.
    pub fn run<T: Transport + ?Sized>(&self, transport: &mut T) -> usize {
        let mut served = 0;
        while let Some(request) = transport.receive() {
            let request_id = request.id();
            let response = self.handle(request);
            transport.send(response);
            transition(request_id, DispatchState::Sent);
            served += 1;
        }
        info!(served, "Transport exhausted");
        served
    }

    /// Dispatch one request. Never fails: every error becomes a response.
    pub fn handle(&self, request: Request) -> Response {
        let started = Instant::now();
        let request_id = request.id();
        let method = request.method().clone();
        let path = request.path().to_string();
        transition(request_id, DispatchState::Received);

        let mut response = match self.process(request) {
            Ok(response) => {
                transition(request_id, DispatchState::ResponseBuilt);
                response
            }
            Err(failure) => {
                transition(request_id, DispatchState::ErrorHandled);
                error_response(request_id, failure)
            }
        };
        response.set_header(REQUEST_ID_HEADER, request_id.to_string());

        info!(
            request_id = %request_id,
            method = %method,
            path = %path,
            status = response.status(),
            duration_us = started.elapsed().as_micros(),
            "Request dispatched"
        );
        response
    }

    fn process(&self, mut request: Request) -> std::result::Result<Response, Failure> {
        let request_id = request.id();

        let route_match = self
            .routes
            .match_request(request.method(), request.path())
            .map_err(Failure::NotFound)?;
        let route = Arc::clone(&route_match.route);
        request.bind(route_match);
        let request = Arc::new(request);
        debug!(request_id = %request_id, route = %route, state = %DispatchState::Matched, "Dispatch state");

        let invoker = FactoryInvoker::new(&self.registry, &self.resolver).with_request(&request);

        let resource = invoker
            .create_object(route.resource())
            .map_err(Failure::while_building)?;
        transition(request_id, DispatchState::ResourceBuilt);

        let outcome = match route.action() {
            None => Value::Object(resource),
            Some(action) => {
                let value = invoker
                    .invoke_factory(FactorySpec::bound(resource, action))
                    .map_err(Failure::while_invoking)?;
                transition(request_id, DispatchState::ActionInvoked);
                value
            }
        };

        let mut response = into_response(outcome).map_err(Failure::Unclassified)?;
        if let Some(status) = route.status() {
            response.set_status(status);
        }
        Ok(response)
    }
}

impl fmt::Debug for Api {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Api")
            .field("routes", &self.routes.len())
            .field("resolver", &self.resolver)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn transition(request_id: RequestId, state: DispatchState) {
    debug!(request_id = %request_id, state = %state, "Dispatch state");
}

/// A route's action must exist on its resource type. Routes to unregistered
/// resource types are left alone; they answer 404 at request time.
fn check_action(registry: &TypeRegistry, route: &CompiledRoute) -> Result<()> {
    let Some(action) = route.action() else {
        return Ok(());
    };
    if !registry.contains_type(route.resource().as_str()) {
        warn!(route = %route, "Route targets an unregistered resource type");
        return Ok(());
    }
    if registry.method(route.resource().as_str(), action).is_none() {
        return Err(Error::InvalidRoute(format!(
            "route `{route}`: `{}` has no method `{action}`",
            route.resource()
        )));
    }
    Ok(())
}

/// Normalize an action's (or a resource's) value into a response.
fn into_response(value: Value) -> Result<Response> {
    match value {
        Value::Response(response) => Ok(response),
        Value::Json(body) => Ok(Response::ok(body)),
        Value::Null => Ok(Response::ok(serde_json::Value::Null)),
        Value::Object(obj) => obj.to_payload().map(Response::ok).map_err(|e| {
            Error::Application(e.context(format!("cannot render `{}` as a payload", obj.type_name())))
        }),
        Value::Request(_) => Err(Error::Application(anyhow::anyhow!(
            "an action returned the request itself"
        ))),
    }
}

fn error_response(request_id: RequestId, failure: Failure) -> Response {
    match failure {
        Failure::NotFound(err) => {
            warn!(request_id = %request_id, error = %err, "Not found");
            // Factory failures describe internal wiring; keep it in the log.
            let message = match &err {
                Error::InvalidFactorySpec(_) => RESOURCE_UNAVAILABLE.to_string(),
                _ => err.to_string(),
            };
            Response::json(
                404,
                serde_json::json!({ "error": "Not Found", "message": message }),
            )
        }
        Failure::BadRequest(err) => {
            warn!(request_id = %request_id, error = %err, "Bad request");
            Response::json(
                400,
                serde_json::json!({ "error": "Bad Request", "message": err.to_string() }),
            )
        }
        Failure::Unclassified(err) => match err.http() {
            Some(http) => {
                debug!(
                    request_id = %request_id,
                    status = http.status(),
                    error = %http,
                    "Application chose the response status"
                );
                let mut response = Response::error(http.status(), http.message());
                for (name, value) in http.headers() {
                    response.set_header(name, value.clone());
                }
                response
            }
            None => {
                error!(request_id = %request_id, error = ?err, "Unhandled dispatch error");
                Response::error(500, "Internal Server Error")
            }
        },
    }
}
