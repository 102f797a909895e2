//! Route table and matcher - hot path for request routing.

use super::route::CompiledRoute;
use crate::error::{Error, Result};
use crate::reflect::TypeRegistry;
use crate::value::TypeName;
use http::Method;
use smallvec::SmallVec;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Maximum number of placeholders before heap allocation.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Placeholder name/value pairs. Names are shared with the route table.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Result of matching a request to a route.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    /// The matched route
    pub route: Arc<CompiledRoute>,
    /// Percent-decoded placeholder values, in path order
    pub path_params: ParamVec,
}

impl RouteMatch {
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Registration-ordered list of routes with first-match resolution.
///
/// Built once at startup from every routable resource type and shared
/// read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Arc<CompiledRoute>>,
    /// Prefix stripped from request paths before matching (e.g. `/api`)
    webroot: String,
}

impl RouteTable {
    /// Collect the routes of `resources`, in the order given.
    ///
    /// Types that are not routable contribute nothing.
    ///
    /// # Errors
    ///
    /// - `InvalidFactorySpec` when a resource type is not registered
    /// - `InvalidRoute` when a declaration cannot be compiled
    pub fn build(registry: &TypeRegistry, resources: &[TypeName]) -> Result<Self> {
        let mut routes = Vec::new();
        for resource in resources {
            let info = registry.type_info(resource.as_str()).ok_or_else(|| {
                Error::InvalidFactorySpec(format!("resource type `{resource}` is not registered"))
            })?;
            let Some(declarations) = info.routes() else {
                debug!(resource = %resource, "Resource is not routable");
                continue;
            };
            for declaration in declarations {
                routes.push(Arc::new(declaration.compile(resource)?));
            }
        }

        let routes_summary: Vec<String> = routes.iter().take(10).map(ToString::to_string).collect();
        info!(
            routes_count = routes.len(),
            resources_count = resources.len(),
            routes_summary = ?routes_summary,
            "Routing table loaded"
        );

        Ok(Self {
            routes,
            webroot: String::new(),
        })
    }

    /// Only match paths below `webroot`, with the prefix removed.
    #[must_use]
    pub fn with_webroot(mut self, webroot: &str) -> Self {
        let trimmed = webroot.trim_end_matches('/');
        self.webroot = if trimmed.is_empty() || trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{trimmed}")
        };
        self
    }

    #[must_use]
    pub fn webroot(&self) -> &str {
        &self.webroot
    }

    /// Log every registered route at `info` level.
    pub fn dump_routes(&self) {
        info!(
            webroot = %self.webroot,
            count = self.routes.len(),
            "Registered routes"
        );
        for (index, route) in self.routes.iter().enumerate() {
            info!(index, route = %route, "Route");
        }
    }

    /// Find the first route matching `method` and `path`.
    ///
    /// The query string, if any, is ignored.
    ///
    /// # Errors
    ///
    /// `NoMatch` when no route matches, or the path lies outside the webroot.
    pub fn match_request(&self, method: &Method, path: &str) -> Result<RouteMatch> {
        debug!(method = %method, path = %path, "Route match attempt");
        let match_start = Instant::now();

        let no_match = || Error::NoMatch {
            method: method.to_string(),
            path: path.to_string(),
        };

        let path = path.split_once('?').map_or(path, |(p, _)| p);
        let Some(path) = self.strip_webroot(path) else {
            warn!(method = %method, path = %path, webroot = %self.webroot, "Path outside webroot");
            return Err(no_match());
        };

        for route in &self.routes {
            if let Some(path_params) = route.matches(method, path) {
                let duration = match_start.elapsed();
                if duration > Duration::from_millis(1) {
                    warn!(
                        method = %method,
                        path = %path,
                        route = %route,
                        duration_us = duration.as_micros(),
                        "Slow route matching detected"
                    );
                } else {
                    debug!(
                        method = %method,
                        path = %path,
                        route = %route,
                        path_params = ?path_params,
                        duration_us = duration.as_micros(),
                        "Route matched"
                    );
                }
                return Ok(RouteMatch {
                    route: Arc::clone(route),
                    path_params,
                });
            }
        }

        warn!(
            method = %method,
            path = %path,
            duration_us = match_start.elapsed().as_micros(),
            "No route matched"
        );
        Err(no_match())
    }

    fn strip_webroot<'p>(&self, path: &'p str) -> Option<&'p str> {
        if self.webroot.is_empty() {
            return Some(path);
        }
        match path.strip_prefix(self.webroot.as_str())? {
            "" => Some("/"),
            rest if rest.starts_with('/') => Some(rest),
            _ => None,
        }
    }

    pub fn routes(&self) -> impl Iterator<Item = &Arc<CompiledRoute>> {
        self.routes.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
