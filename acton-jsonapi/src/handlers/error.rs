//! Error taxonomy and the HTTP error mapper
//!
//! Every request-time failure is an [`ApiError`]. Each [`ApiErrorKind`] maps
//! to exactly one HTTP status code, and [`IntoResponse`] turns the error into
//! the JSON:API error envelope:
//!
//! ```json
//! {"message": "JSON does not match expected schema",
//!  "errors": {"data": {"attributes": {"age": ["Not a valid integer."]}}}}
//! ```
//!
//! Only [`ApiErrorKind::UnprocessableEntity`] carries the `errors` member.
//!
//! # Example
//!
//! ```rust
//! use acton_jsonapi::handlers::{ApiError, ApiErrorKind};
//!
//! let error = ApiError::not_found("user", "42");
//! assert_eq!(error.kind, ApiErrorKind::NotFound);
//! assert_eq!(error.kind.status_code().as_u16(), 404);
//! ```

use std::fmt;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::media::MIMETYPE;

/// Result type for request handling
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Operation being performed when the error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiOperation {
    /// Listing the collection
    GetMany,
    /// Getting a single entity by id
    Get,
    /// Creating a new entity
    Create,
    /// Partially updating an entity
    Update,
    /// Deleting an entity
    Delete,
}

impl fmt::Display for ApiOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GetMany => write!(f, "get_many"),
            Self::Get => write!(f, "get"),
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Category of API error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    /// Malformed request (pagination arguments, unreadable body)
    BadRequest,
    /// Rejected by a pre-request hook
    Unauthorized,
    /// An id was supplied when creating an entity
    Forbidden,
    /// Entity lookup miss
    NotFound,
    /// Verb not enabled for the path
    MethodNotAllowed,
    /// Body `type` (or `id`) disagrees with the URL
    Conflict,
    /// `If-Match` does not match the current etag
    PreconditionFailed,
    /// Body content type is not a JSON media type
    UnsupportedMediaType,
    /// Field-level validation failed
    UnprocessableEntity,
    /// `If-Match` missing on a mutating request
    PreconditionRequired,
    /// Collaborator failure that is not a protocol error
    InternalError,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadRequest => write!(f, "bad_request"),
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::Forbidden => write!(f, "forbidden"),
            Self::NotFound => write!(f, "not_found"),
            Self::MethodNotAllowed => write!(f, "method_not_allowed"),
            Self::Conflict => write!(f, "conflict"),
            Self::PreconditionFailed => write!(f, "precondition_failed"),
            Self::UnsupportedMediaType => write!(f, "unsupported_media_type"),
            Self::UnprocessableEntity => write!(f, "unprocessable_entity"),
            Self::PreconditionRequired => write!(f, "precondition_required"),
            Self::InternalError => write!(f, "internal_error"),
        }
    }
}

impl ApiErrorKind {
    /// Get the HTTP status code for this error kind
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Conflict => StatusCode::CONFLICT,
            Self::PreconditionFailed => StatusCode::PRECONDITION_FAILED,
            Self::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::UnprocessableEntity => StatusCode::UNPROCESSABLE_ENTITY,
            Self::PreconditionRequired => StatusCode::PRECONDITION_REQUIRED,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Per-field validation messages, nested by field path
///
/// Serializes as a plain JSON object whose leaves are lists of messages,
/// e.g. `{"data": {"attributes": {"name": ["Not a valid string."]}}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Map<String, Value>);

impl ValidationErrors {
    /// Create an empty error set
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `message` under the field at `path`
    pub fn add(&mut self, path: &[&str], message: impl Into<String>) {
        let Some((leaf, parents)) = path.split_last() else {
            return;
        };

        let mut node = &mut self.0;
        for key in parents {
            let entry = node
                .entry((*key).to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            node = match entry {
                Value::Object(map) => map,
                _ => return,
            };
        }

        let messages = node
            .entry((*leaf).to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(list) = messages {
            list.push(Value::String(message.into()));
        }
    }

    /// Messages recorded at `path`, if any
    pub fn messages(&self, path: &[&str]) -> Vec<&str> {
        let Some((leaf, parents)) = path.split_last() else {
            return Vec::new();
        };

        let mut node = &self.0;
        for key in parents {
            match node.get(*key) {
                Some(Value::Object(map)) => node = map,
                _ => return Vec::new(),
            }
        }

        match node.get(*leaf) {
            Some(Value::Array(list)) => list.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        }
    }

    /// Whether no messages have been recorded
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Structured request failure
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    /// The category of error
    pub kind: ApiErrorKind,
    /// Human-readable error message
    pub message: String,
    /// Per-field messages, present only for validation failures
    pub errors: Option<ValidationErrors>,
    /// The operation being performed when the error occurred
    pub operation: Option<ApiOperation>,
    /// The resource type involved
    pub resource_type: Option<String>,
    /// The id of the entity involved
    pub entity_id: Option<String>,
}

impl ApiError {
    /// Create a new API error
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            errors: None,
            operation: None,
            resource_type: None,
            entity_id: None,
        }
    }

    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::BadRequest, message)
    }

    /// Create an unauthorized error, typically from a pre-request hook
    ///
    /// ```rust
    /// use acton_jsonapi::handlers::ApiError;
    ///
    /// let error = ApiError::unauthorized("Missing credentials");
    /// assert_eq!(error.kind.status_code().as_u16(), 401);
    /// ```
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Unauthorized, message)
    }

    /// Create a forbidden error
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Forbidden, message)
    }

    /// Create a "not found" error with entity context
    pub fn not_found(resource_type: impl Into<String>, entity_id: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::NotFound, "Entity not found")
            .with_entity(resource_type, entity_id)
    }

    /// Create a method not allowed error
    pub fn method_not_allowed() -> Self {
        Self::new(
            ApiErrorKind::MethodNotAllowed,
            "The method is not allowed for the requested URL.",
        )
    }

    /// Create a conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Conflict, message)
    }

    /// Create a precondition failed error
    pub fn precondition_failed() -> Self {
        Self::new(
            ApiErrorKind::PreconditionFailed,
            "The precondition on the request for the URL failed positive evaluation.",
        )
    }

    /// Create a precondition required error
    pub fn precondition_required() -> Self {
        Self::new(
            ApiErrorKind::PreconditionRequired,
            "This request is required to be conditional; try using \"If-Match\".",
        )
    }

    /// Create an unsupported media type error
    pub fn unsupported_media_type() -> Self {
        Self::new(ApiErrorKind::UnsupportedMediaType, "Unsupported media type")
    }

    /// Create a validation error carrying per-field messages
    ///
    /// ```rust
    /// use acton_jsonapi::handlers::{ApiError, ValidationErrors};
    ///
    /// let mut errors = ValidationErrors::new();
    /// errors.add(&["data", "attributes", "age"], "Not a valid integer.");
    /// let error = ApiError::unprocessable(errors);
    /// assert_eq!(error.kind.status_code().as_u16(), 422);
    /// ```
    pub fn unprocessable(errors: ValidationErrors) -> Self {
        let mut error = Self::new(
            ApiErrorKind::UnprocessableEntity,
            "JSON does not match expected schema",
        );
        error.errors = Some(errors);
        error
    }

    /// Create an internal error
    ///
    /// The message is logged but never sent to the client.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::InternalError, message)
    }

    /// Add entity context to an existing error
    #[must_use]
    pub fn with_entity(
        mut self,
        resource_type: impl Into<String>,
        entity_id: impl Into<String>,
    ) -> Self {
        self.resource_type = Some(resource_type.into());
        self.entity_id = Some(entity_id.into());
        self
    }

    /// Record the resource type, unless one is already recorded
    #[must_use]
    pub fn with_resource(mut self, resource_type: impl Into<String>) -> Self {
        if self.resource_type.is_none() {
            self.resource_type = Some(resource_type.into());
        }
        self
    }

    /// Set the operation that caused the error, unless one is already recorded
    #[must_use]
    pub fn with_operation(mut self, operation: ApiOperation) -> Self {
        self.operation.get_or_insert(operation);
        self
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "API {} error", self.kind)?;
        if let Some(operation) = self.operation {
            write!(f, " during {}", operation)?;
        }
        write!(f, ": {}", self.message)?;
        if let (Some(resource_type), Some(entity_id)) = (&self.resource_type, &self.entity_id) {
            write!(f, " [{}: {}]", resource_type, entity_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

/// Wire error envelope
#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<ValidationErrors>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.kind.status_code();
        let operation = self.operation.map(|op| op.to_string());

        let message = if status.is_server_error() {
            tracing::error!(
                kind = %self.kind,
                status = status.as_u16(),
                operation = ?operation,
                resource = ?self.resource_type,
                entity_id = ?self.entity_id,
                "API error: {}", self.message
            );
            "An internal error occurred".to_string()
        } else {
            tracing::warn!(
                kind = %self.kind,
                status = status.as_u16(),
                operation = ?operation,
                resource = ?self.resource_type,
                entity_id = ?self.entity_id,
                "API error: {}", self.message
            );
            self.message
        };

        let body = ErrorEnvelope {
            message,
            errors: self.errors,
        };

        let mut response = (status, Json(body)).into_response();
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(MIMETYPE));
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn test_api_error_kind_status_codes() {
        assert_eq!(ApiErrorKind::BadRequest.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiErrorKind::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiErrorKind::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ApiErrorKind::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiErrorKind::MethodNotAllowed.status_code(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(ApiErrorKind::Conflict.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ApiErrorKind::PreconditionFailed.status_code(),
            StatusCode::PRECONDITION_FAILED
        );
        assert_eq!(
            ApiErrorKind::UnsupportedMediaType.status_code(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
        assert_eq!(
            ApiErrorKind::UnprocessableEntity.status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiErrorKind::PreconditionRequired.status_code(),
            StatusCode::PRECONDITION_REQUIRED
        );
        assert_eq!(
            ApiErrorKind::InternalError.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_api_error_kind_display() {
        assert_eq!(ApiErrorKind::MethodNotAllowed.to_string(), "method_not_allowed");
        assert_eq!(ApiErrorKind::PreconditionRequired.to_string(), "precondition_required");
        assert_eq!(ApiErrorKind::UnprocessableEntity.to_string(), "unprocessable_entity");
    }

    #[test]
    fn test_validation_errors_nest_by_path() {
        let mut errors = ValidationErrors::new();
        errors.add(&["data", "attributes", "name"], "Not a valid string.");
        errors.add(&["data", "attributes", "name"], "Too short.");
        errors.add(&["data", "id"], "Missing data for required field.");

        assert_eq!(
            errors.messages(&["data", "attributes", "name"]),
            vec!["Not a valid string.", "Too short."]
        );
        assert_eq!(
            serde_json::to_value(&errors).unwrap(),
            serde_json::json!({
                "data": {
                    "attributes": {"name": ["Not a valid string.", "Too short."]},
                    "id": ["Missing data for required field."]
                }
            })
        );
    }

    #[test]
    fn test_validation_errors_empty_path_is_ignored() {
        let mut errors = ValidationErrors::new();
        errors.add(&[], "ignored");
        assert!(errors.is_empty());
        assert!(errors.messages(&["data"]).is_empty());
    }

    #[test]
    fn test_with_operation_keeps_first() {
        let error = ApiError::bad_request("bad")
            .with_operation(ApiOperation::GetMany)
            .with_operation(ApiOperation::Get);
        assert_eq!(error.operation, Some(ApiOperation::GetMany));
    }

    #[test]
    fn test_display_includes_entity() {
        let error = ApiError::not_found("user", "7").with_operation(ApiOperation::Get);
        assert_eq!(
            error.to_string(),
            "API not_found error during get: Entity not found [user: 7]"
        );
    }

    #[tokio::test]
    async fn test_validation_error_response_body() {
        let mut errors = ValidationErrors::new();
        errors.add(&["data", "attributes", "age"], "Not a valid integer.");
        let response = ApiError::unprocessable(errors).into_response();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.headers()[header::CONTENT_TYPE], MIMETYPE);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["message"], "JSON does not match expected schema");
        assert_eq!(json["errors"]["data"]["attributes"]["age"][0], "Not a valid integer.");
    }

    #[tokio::test]
    async fn test_internal_error_hides_details() {
        let response = ApiError::internal("connection pool exhausted").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, serde_json::json!({"message": "An internal error occurred"}));
    }
}
