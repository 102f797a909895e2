use crate::dispatcher::HeaderVec;
use crate::ids::RequestId;
use crate::router::{CompiledRoute, ParamVec, RouteMatch};
use http::Method;
use std::sync::Arc;
use tracing::debug;

/// Header carrying the request id, both ways.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// The request context carried through dispatch.
///
/// The body is kept as raw bytes; only the body resolver decodes it, and only
/// into the type a parameter asks for.
#[derive(Debug, Clone)]
pub struct Request {
    id: RequestId,
    method: Method,
    path: String,
    query_params: ParamVec,
    headers: HeaderVec,
    body: Vec<u8>,
    route: Option<Arc<CompiledRoute>>,
    path_params: ParamVec,
}

impl Request {
    /// Build a request for `uri` (path plus optional `?query`).
    #[must_use]
    pub fn new(method: Method, uri: &str) -> Self {
        let (path, query) = uri.split_once('?').unwrap_or((uri, ""));
        let query_params = parse_query_params(query);
        debug!(
            param_count = query_params.len(),
            query_params = ?query_params,
            "Query params parsed"
        );
        Self {
            id: RequestId::new(),
            method,
            path: if path.is_empty() { "/".to_string() } else { path.to_string() },
            query_params,
            headers: HeaderVec::new(),
            body: Vec::new(),
            route: None,
            path_params: ParamVec::new(),
        }
    }

    /// Add a header. Names are stored lowercase.
    ///
    /// A valid ULID in `x-request-id` becomes the request id.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        let name = name.to_ascii_lowercase();
        let value = value.into();
        if name == REQUEST_ID_HEADER {
            self.id = RequestId::from_header_or_new(Some(&value));
        }
        self.headers.push((Arc::from(name), value));
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Set a JSON body and the matching content type.
    #[must_use]
    pub fn with_json(self, body: &serde_json::Value) -> Self {
        self.with_header("content-type", "application/json")
            .with_body(body.to_string())
    }

    /// Attach the matched route and its placeholder values.
    pub fn bind(&mut self, route_match: RouteMatch) {
        self.route = Some(route_match.route);
        self.path_params = route_match.path_params;
    }

    /// Replace the placeholder values without binding a route.
    pub fn set_path_params<K, V>(&mut self, params: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<Arc<str>>,
        V: Into<String>,
    {
        self.path_params = params
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
    }

    #[must_use]
    pub fn id(&self) -> RequestId {
        self.id
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Request path, without the query string.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn query_params(&self) -> &ParamVec {
        &self.query_params
    }

    /// Last value of a query parameter.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderVec {
        &self.headers
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// The matched route, once dispatch got past matching.
    #[must_use]
    pub fn route(&self) -> Option<&Arc<CompiledRoute>> {
        self.route.as_ref()
    }

    #[must_use]
    pub fn path_params(&self) -> &ParamVec {
        &self.path_params
    }

    #[must_use]
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Parse a query string (without the leading `?`), URL-decoding names and values.
#[must_use]
pub fn parse_query_params(query: &str) -> ParamVec {
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (Arc::from(k.as_ref()), v.into_owned()))
        .collect()
}
