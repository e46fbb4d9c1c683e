//! HTTP request context.
//!
//! The session layer in front of the engine authenticates staff and passes
//! their identity in headers.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;

use crate::domain::allocation::StaffIdentity;
use crate::domain::shared::StaffId;

/// Header carrying the staff id.
pub const STAFF_ID_HEADER: &str = "x-staff-id";
/// Header carrying the staff display name.
pub const STAFF_NAME_HEADER: &str = "x-staff-name";
/// Header carrying the caller's correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Per-request caller context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// Staff member making the request.
    pub staff: StaffIdentity,
    /// Correlation id, taken from the caller or generated.
    pub request_id: String,
}

impl RequestContext {
    /// Read the context from request headers.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            staff: staff_from_headers(headers),
            request_id: header_text(headers, REQUEST_ID_HEADER)
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for RequestContext {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

fn header_text(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}

/// Staff identity from headers; unknown when absent.
#[must_use]
pub fn staff_from_headers(headers: &HeaderMap) -> StaffIdentity {
    let staff_id = header_text(headers, STAFF_ID_HEADER)
        .and_then(|v| v.parse::<u64>().ok())
        .map(StaffId::new);
    match header_text(headers, STAFF_NAME_HEADER) {
        Some(name) => StaffIdentity::new(staff_id, name),
        None => StaffIdentity {
            staff_id,
            ..StaffIdentity::unknown()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn reads_staff_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(STAFF_ID_HEADER, HeaderValue::from_static("12"));
        headers.insert(STAFF_NAME_HEADER, HeaderValue::from_static(" Sam "));
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("req-1"));

        let ctx = RequestContext::from_headers(&headers);

        assert_eq!(ctx.staff, StaffIdentity::new(Some(StaffId::new(12)), "Sam"));
        assert_eq!(ctx.request_id, "req-1");
    }

    #[test]
    fn missing_headers_give_unknown_staff_and_fresh_id() {
        let ctx = RequestContext::from_headers(&HeaderMap::new());

        assert_eq!(ctx.staff, StaffIdentity::unknown());
        assert_eq!(ctx.request_id.len(), 36);
    }

    #[test]
    fn non_numeric_staff_id_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(STAFF_ID_HEADER, HeaderValue::from_static("abc"));

        assert_eq!(staff_from_headers(&headers).staff_id, None);
    }
}
