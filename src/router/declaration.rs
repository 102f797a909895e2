use super::route::{CompiledRoute, Route};
use crate::error::{Error, Result};
use crate::value::TypeName;
use http::Method;
use serde::Deserialize;

/// One entry returned by [`Routable::routes`](crate::reflect::Routable::routes).
#[derive(Debug, Clone)]
pub enum RouteDeclaration {
    /// A structured route
    Route(Route),
    /// A loose `{method, path, action?, status?}` object, `method` being a
    /// string or a list of strings
    Loose(serde_json::Value),
    /// The same loose object written as YAML
    Yaml(String),
}

impl From<Route> for RouteDeclaration {
    fn from(route: Route) -> Self {
        RouteDeclaration::Route(route)
    }
}

impl From<serde_json::Value> for RouteDeclaration {
    fn from(value: serde_json::Value) -> Self {
        RouteDeclaration::Loose(value)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseMethods {
    One(String),
    Many(Vec<String>),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct LooseRoute {
    method: LooseMethods,
    path: String,
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    status: Option<u16>,
}

impl RouteDeclaration {
    /// Validate and compile, using `declaring_type` as the resource unless a
    /// structured route names another one.
    pub(crate) fn compile(self, declaring_type: &TypeName) -> Result<CompiledRoute> {
        let value = match self {
            RouteDeclaration::Route(route) => return route.compile(declaring_type),
            RouteDeclaration::Loose(value) => value,
            RouteDeclaration::Yaml(text) => serde_yaml::from_str(&text).map_err(|e| {
                Error::InvalidRoute(format!("{declaring_type} route is not valid YAML: {e}"))
            })?,
        };
        loose_route(value, declaring_type)?.compile(declaring_type)
    }
}

fn loose_route(value: serde_json::Value, declaring_type: &TypeName) -> Result<Route> {
    if !value.is_object() {
        return Err(Error::InvalidRoute(format!(
            "{declaring_type} route must be an object, got `{value}`"
        )));
    }
    let loose: LooseRoute = serde_json::from_value(value)
        .map_err(|e| Error::InvalidRoute(format!("{declaring_type} route: {e}")))?;

    let names = match loose.method {
        LooseMethods::One(name) => vec![name],
        LooseMethods::Many(names) => names,
    };
    let methods = names
        .iter()
        .map(|name| {
            Method::from_bytes(name.to_ascii_uppercase().as_bytes()).map_err(|_| {
                Error::InvalidRoute(format!(
                    "{declaring_type} route `{}`: invalid method `{name}`",
                    loose.path
                ))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut route = Route::any_of(methods, &loose.path);
    if let Some(action) = loose.action {
        route = route.action(&action);
    }
    if let Some(status) = loose.status {
        route = route.status(status);
    }
    Ok(route)
}
