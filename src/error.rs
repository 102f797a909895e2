//! # Error Module
//!
//! Typed failures raised by the dispatch core, plus [`HttpError`] for
//! application code that wants to choose its own HTTP status.
//!
//! Inner components (registry, factory invoker, argument resolver, route table)
//! never attempt recovery: they fail fast with an [`Error`] and let the
//! dispatcher classify it once, at its boundary:
//!
//! | Error                                   | Stage               | Response |
//! |-----------------------------------------|---------------------|----------|
//! | [`Error::NoMatch`]                      | matching            | 404      |
//! | [`Error::InvalidFactorySpec`]           | resource building   | 404      |
//! | [`Error::UnresolvedArgument`]           | action invocation   | 400      |
//! | [`HttpError`] inside `Application`      | any                 | verbatim |
//! | anything else                           | any                 | 500      |
//!
//! [`Error::InvalidRoute`] and an [`Error::InvalidFactorySpec`] raised while
//! building the route table are startup failures and never reach a request.

use crate::dispatcher::HeaderVec;
use std::fmt;
use std::sync::Arc;

/// Result alias used across the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failures of the dispatch core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A factory string or reference does not resolve to an existing
    /// function, type, method or constructor.
    #[error("invalid factory: {0}")]
    InvalidFactorySpec(String),

    /// No resolver and no default could supply a required parameter.
    #[error("could not resolve argument `{0}`")]
    UnresolvedArgument(String),

    /// A malformed route declaration.
    #[error("invalid route: {0}")]
    InvalidRoute(String),

    /// No route in the table matches the request.
    #[error("no route matches {method} {path}")]
    NoMatch {
        /// Request method
        method: String,
        /// Request path (after webroot stripping)
        path: String,
    },

    /// Application code rejected one of its inputs.
    ///
    /// Classified like [`Error::InvalidFactorySpec`] while a resource is being
    /// built and like [`Error::UnresolvedArgument`] while an action runs.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Any other error raised by a constructor, factory or action body.
    #[error(transparent)]
    Application(anyhow::Error),
}

impl Error {
    /// Wrap an error returned by application code.
    ///
    /// Core errors that travelled through an `anyhow::Error` (for instance an
    /// [`Error::InvalidArgument`] returned with `?` from an action) are
    /// unwrapped so the dispatcher can still classify them.
    #[must_use]
    pub fn from_application(err: anyhow::Error) -> Self {
        match err.downcast::<Error>() {
            Ok(inner) => inner,
            Err(other) => Error::Application(other),
        }
    }

    /// The HTTP classification carried by this error, if any.
    #[must_use]
    pub fn http(&self) -> Option<&HttpError> {
        match self {
            Error::Application(err) => err.downcast_ref::<HttpError>(),
            _ => None,
        }
    }
}

/// An error that already knows which HTTP response it should become.
///
/// Return it from an action wrapped in `anyhow::Error`; the dispatcher passes
/// its status and headers through unchanged.
///
/// ```rust
/// use resapi::HttpError;
///
/// let err = HttpError::new(409, "item already exists").with_header("retry-after", "5");
/// assert_eq!(err.status(), 409);
/// ```
#[derive(Debug, Clone)]
pub struct HttpError {
    status: u16,
    headers: HeaderVec,
    message: String,
}

impl HttpError {
    /// Create an error with the given status code and message.
    #[must_use]
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            headers: HeaderVec::new(),
            message: message.into(),
        }
    }

    /// 400 Bad Request
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(400, message)
    }

    /// 404 Not Found
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(404, message)
    }

    /// Add a response header.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((Arc::from(name), value.into()));
        self
    }

    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderVec {
        &self.headers
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}: {}", self.status, self.message)
    }
}

impl std::error::Error for HttpError {}
