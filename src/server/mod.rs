//! Request context, response envelope and the transport seam.

pub mod request;
pub mod response;
mod transport;

pub use request::{parse_query_params, Request, REQUEST_ID_HEADER};
pub use response::{status_reason, Response};
pub use transport::{MemoryTransport, Transport};
