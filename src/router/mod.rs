//! # Router Module
//!
//! Matches incoming requests to a resource type and action.
//!
//! ## Overview
//!
//! Resource types declare their own routes by implementing
//! [`Routable`](crate::reflect::Routable). Each declaration is either a
//! structured [`Route`] or a loose `{method, path, action?, status?}` object:
//!
//! ```rust,ignore
//! impl Routable for Item {
//!     fn routes() -> Vec<RouteDeclaration> {
//!         vec![
//!             Route::new(Method::GET, "/items/{id}").action("show").into(),
//!             json!({"method": ["POST"], "path": "/items", "action": "create", "status": 201}).into(),
//!         ]
//!     }
//! }
//! ```
//!
//! ## Architecture
//!
//! 1. **Compilation**: at startup, [`RouteTable::build`] walks the resource
//!    types in the order given, validates every declaration and compiles its
//!    path (e.g. `/items/{id}`) into an anchored regex.
//!
//! 2. **Matching**: [`RouteTable::match_request`] scans the routes in
//!    registration order; the first one whose method set and pattern match
//!    wins. Placeholder captures are percent-decoded. The query string never
//!    takes part in matching.

mod core;
mod declaration;
mod route;

pub use self::core::{ParamVec, RouteMatch, RouteTable, MAX_INLINE_PARAMS};
pub use declaration::RouteDeclaration;
pub use route::{CompiledRoute, Route, SUPPORTED_METHODS};
