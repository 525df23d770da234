//! JSON:API media type handling

use axum::http::{header, HeaderMap};
use serde_json::Value;

use crate::handlers::{ApiError, ApiResult};

/// The JSON:API media type, set on every response
pub const MIMETYPE: &str = "application/vnd.api+json";

/// Media types accepted on request bodies
pub const ALLOWED_MIMETYPES: [&str; 2] = [MIMETYPE, "application/json"];

/// Check the request `Content-Type` against [`ALLOWED_MIMETYPES`]
///
/// An absent header is treated as JSON. Parameters such as `charset` are
/// ignored and the comparison is case-insensitive.
pub fn check_content_type(headers: &HeaderMap) -> ApiResult<()> {
    let Some(value) = headers.get(header::CONTENT_TYPE) else {
        return Ok(());
    };

    let value = value
        .to_str()
        .map_err(|_| ApiError::unsupported_media_type())?;
    let essence = value.split(';').next().unwrap_or_default().trim();

    if essence.is_empty()
        || ALLOWED_MIMETYPES
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(essence))
    {
        Ok(())
    } else {
        Err(ApiError::unsupported_media_type())
    }
}

/// Validate the content type and parse a request body as JSON
pub fn parse_json_body(headers: &HeaderMap, body: &[u8]) -> ApiResult<Value> {
    check_content_type(headers)?;
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!(error = %e, "Request body is not valid JSON");
        ApiError::bad_request("Failed to decode JSON object")
    })
}
