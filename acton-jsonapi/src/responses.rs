//! JSON:API response builders
//!
//! - **200 OK** - [`Document`], a single entity or a collection
//! - **201 Created** - [`Created`], with `Location` and `ETag`
//! - **204 No Content** - [`NoContent`], after DELETE
//! - **304 Not Modified** - [`NotModified`], GET with a matching `If-Match`
//!
//! Every builder sets `Content-Type: application/vnd.api+json`, including
//! the empty-bodied ones.

use axum::{
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::{etag, media::MIMETYPE};

fn set_header(response: &mut Response, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(header_value) => {
            response.headers_mut().insert(name, header_value);
        }
        Err(_) => {
            tracing::warn!(header = %name, value, "Dropping response header with invalid value");
        }
    }
}

fn with_media_type(mut response: Response) -> Response {
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(MIMETYPE));
    response
}

// ============================================================================
// 200 OK
// ============================================================================

/// HTTP 200 response carrying a JSON:API document
#[derive(Debug)]
pub struct Document<T> {
    body: T,
    etag: Option<String>,
}

impl<T> Document<T> {
    pub fn new(body: T) -> Self {
        Self { body, etag: None }
    }

    /// Set the `ETag` header (the value is quoted on the wire)
    pub fn with_etag(mut self, etag: impl Into<String>) -> Self {
        self.etag = Some(etag.into());
        self
    }
}

impl<T: Serialize> IntoResponse for Document<T> {
    fn into_response(self) -> Response {
        let mut response = (StatusCode::OK, Json(&self.body)).into_response();

        if let Some(current) = self.etag {
            set_header(&mut response, header::ETAG, &etag::quote(&current));
        }

        with_media_type(response)
    }
}

// ============================================================================
// 201 Created
// ============================================================================

/// HTTP 201 Created response
///
/// `Location` points at the GET-single URL of the new entity.
#[derive(Debug)]
pub struct Created<T> {
    body: T,
    location: Option<String>,
    etag: Option<String>,
}

impl<T> Created<T> {
    pub fn new(body: T) -> Self {
        Self {
            body,
            location: None,
            etag: None,
        }
    }

    /// Add a Location header pointing to the created resource
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_etag(mut self, etag: impl Into<String>) -> Self {
        self.etag = Some(etag.into());
        self
    }
}

impl<T: Serialize> IntoResponse for Created<T> {
    fn into_response(self) -> Response {
        let mut response = (StatusCode::CREATED, Json(&self.body)).into_response();

        if let Some(location) = self.location {
            set_header(&mut response, header::LOCATION, &location);
        }
        if let Some(current) = self.etag {
            set_header(&mut response, header::ETAG, &etag::quote(&current));
        }

        with_media_type(response)
    }
}

// ============================================================================
// 204 No Content
// ============================================================================

/// HTTP 204 No Content response
#[derive(Debug, Clone, Copy)]
pub struct NoContent;

impl IntoResponse for NoContent {
    fn into_response(self) -> Response {
        with_media_type(StatusCode::NO_CONTENT.into_response())
    }
}

// ============================================================================
// 304 Not Modified
// ============================================================================

/// HTTP 304 Not Modified response with an empty body
#[derive(Debug, Clone, Copy)]
pub struct NotModified;

impl IntoResponse for NotModified {
    fn into_response(self) -> Response {
        with_media_type(StatusCode::NOT_MODIFIED.into_response())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::json;

    #[test]
    fn test_document_sets_quoted_etag() {
        let response = Document::new(json!({"data": []})).with_etag("v1").into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::ETAG], "\"v1\"");
        assert_eq!(response.headers()[header::CONTENT_TYPE], MIMETYPE);
    }

    #[test]
    fn test_created_sets_location_and_etag() {
        let response = Created::new(json!({}))
            .with_location("https://example.com/user/1")
            .with_etag("v1")
            .into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[header::LOCATION], "https://example.com/user/1");
        assert_eq!(response.headers()[header::ETAG], "\"v1\"");
    }

    #[test]
    fn test_created_drops_invalid_location() {
        let response = Created::new(json!({}))
            .with_location("bad\nvalue")
            .into_response();
        assert!(response.headers().get(header::LOCATION).is_none());
    }

    #[tokio::test]
    async fn test_empty_bodies() {
        for response in [NoContent.into_response(), NotModified.into_response()] {
            assert_eq!(response.headers()[header::CONTENT_TYPE], MIMETYPE);
            let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            assert!(body.is_empty());
        }
    }
}
