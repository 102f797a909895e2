use crate::error::{Error, Result};
use crate::value::TypeName;
use http::Method;
use once_cell::sync::Lazy;
use regex::Regex;
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;

use super::core::ParamVec;

/// Methods a route may answer to.
pub const SUPPORTED_METHODS: [Method; 8] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::PATCH,
    Method::OPTIONS,
    Method::HEAD,
    Method::TRACE,
];

/// Placeholder names: identifier characters only.
static PLACEHOLDER_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("placeholder name regex should be valid")
});

pub(crate) type MethodVec = SmallVec<[Method; 4]>;

/// A route as declared by a routable resource type.
///
/// Declaring never fails; the route is validated and compiled when the
/// [`RouteTable`](super::RouteTable) is built.
///
/// ```
/// use resapi::router::Route;
/// use http::Method;
///
/// let route = Route::new(Method::POST, "/items").action("create").status(201);
/// assert_eq!(route.path(), "/items");
/// ```
#[derive(Debug, Clone)]
pub struct Route {
    methods: MethodVec,
    path: String,
    resource: Option<TypeName>,
    action: Option<String>,
    status: Option<u16>,
}

impl Route {
    pub fn new(method: Method, path: &str) -> Self {
        Self::any_of([method], path)
    }

    /// A route answering to several methods.
    pub fn any_of(methods: impl IntoIterator<Item = Method>, path: &str) -> Self {
        Self {
            methods: methods.into_iter().collect(),
            path: path.to_string(),
            resource: None,
            action: None,
            status: None,
        }
    }

    /// Name the method invoked on the resource. Without one the resource
    /// itself is the response payload.
    #[must_use]
    pub fn action(mut self, action: &str) -> Self {
        self.action = Some(action.to_string());
        self
    }

    /// Fixed response status, overriding whatever the action produced.
    #[must_use]
    pub fn status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Target a resource type other than the declaring one.
    #[must_use]
    pub fn resource(mut self, resource: impl Into<TypeName>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    pub(crate) fn compile(self, declaring_type: &TypeName) -> Result<CompiledRoute> {
        let invalid = |reason: &str| {
            Error::InvalidRoute(format!(
                "{} route `{}`: {reason}",
                declaring_type, self.path
            ))
        };

        if self.methods.is_empty() {
            return Err(invalid("no methods"));
        }
        if let Some(method) = self.methods.iter().find(|m| !SUPPORTED_METHODS.contains(*m)) {
            return Err(invalid(&format!("unsupported method `{method}`")));
        }
        if let Some(status) = self.status.filter(|s| !(100..=599).contains(s)) {
            return Err(invalid(&format!("status {status} outside 100..=599")));
        }
        if self.action.as_deref().is_some_and(str::is_empty) {
            return Err(invalid("empty action name"));
        }

        let (regex, param_names) = path_to_regex(&self.path).map_err(|e| invalid(&e))?;

        Ok(CompiledRoute {
            methods: self.methods,
            regex,
            param_names,
            resource: self.resource.unwrap_or_else(|| declaring_type.clone()),
            action: self.action,
            status: self.status,
            path: self.path,
        })
    }
}

/// A validated route with its compiled path pattern.
#[derive(Debug, Clone)]
pub struct CompiledRoute {
    methods: MethodVec,
    path: String,
    regex: Regex,
    param_names: Vec<Arc<str>>,
    resource: TypeName,
    action: Option<String>,
    status: Option<u16>,
}

impl CompiledRoute {
    #[must_use]
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    /// The declared path pattern, e.g. `/items/{id}`.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Placeholder names in path order.
    #[must_use]
    pub fn param_names(&self) -> &[Arc<str>] {
        &self.param_names
    }

    #[must_use]
    pub fn resource(&self) -> &TypeName {
        &self.resource
    }

    #[must_use]
    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }

    #[must_use]
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Match `method` and `path` (no query string), returning the
    /// percent-decoded placeholder values on success.
    #[must_use]
    pub fn matches(&self, method: &Method, path: &str) -> Option<ParamVec> {
        if !self.methods.contains(method) {
            return None;
        }
        let captures = self.regex.captures(path)?;
        let mut params = ParamVec::new();
        for (i, name) in self.param_names.iter().enumerate() {
            let raw = captures.get(i + 1).map_or("", |m| m.as_str());
            let value = urlencoding::decode(raw)
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| raw.to_string());
            params.push((Arc::clone(name), value));
        }
        Some(params)
    }
}

impl fmt::Display for CompiledRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let methods: Vec<&str> = self.methods.iter().map(Method::as_str).collect();
        write!(f, "{} {} -> {}", methods.join("|"), self.path, self.resource)?;
        if let Some(action) = &self.action {
            write!(f, "::{action}")?;
        }
        if let Some(status) = self.status {
            write!(f, " [{status}]")?;
        }
        Ok(())
    }
}

/// Convert a path pattern into an anchored regex plus its placeholder names.
///
/// `/items/{id}` becomes `^/items/([^/]+)$` with names `["id"]`. Literal text
/// is escaped. A placeholder captures one non-empty path segment (or part of
/// one, e.g. `/files/{name}.json`).
pub(crate) fn path_to_regex(path: &str) -> std::result::Result<(Regex, Vec<Arc<str>>), String> {
    if !path.starts_with('/') {
        return Err("path must start with `/`".to_string());
    }

    let mut pattern = String::with_capacity(path.len() + 8);
    pattern.push('^');
    let mut param_names: Vec<Arc<str>> = Vec::with_capacity(path.matches('{').count());

    let mut rest = path;
    while let Some(open) = rest.find(['{', '}']) {
        let (literal, tail) = rest.split_at(open);
        if tail.starts_with('}') {
            return Err("unbalanced `}`".to_string());
        }
        let close = tail
            .find('}')
            .ok_or_else(|| "unterminated placeholder".to_string())?;
        let name = &tail[1..close];
        if !PLACEHOLDER_NAME.is_match(name) {
            return Err(format!("malformed placeholder `{{{name}}}`"));
        }
        if param_names.iter().any(|n| n.as_ref() == name) {
            return Err(format!("duplicate placeholder `{name}`"));
        }

        pattern.push_str(&regex::escape(literal));
        pattern.push_str("([^/]+)");
        param_names.push(Arc::from(name));
        rest = &tail[close + 1..];
    }

    pattern.push_str(&regex::escape(rest));
    pattern.push('$');
    let regex = Regex::new(&pattern).map_err(|e| e.to_string())?;
    Ok((regex, param_names))
}
