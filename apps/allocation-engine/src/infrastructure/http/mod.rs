//! HTTP/REST API adapter.
//!
//! Inbound adapter implementing REST endpoints that delegate to application use cases.

mod controller;
mod request;
mod response;

pub use controller::{AppState, create_router};
pub use request::{
    REQUEST_ID_HEADER, RequestContext, STAFF_ID_HEADER, STAFF_NAME_HEADER, staff_from_headers,
};
pub use response::HealthResponse;
