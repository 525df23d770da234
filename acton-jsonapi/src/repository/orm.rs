//! Write-path collaborator

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::Entity;
use crate::{handlers::ApiResult, request::RequestContext};

/// Persists changes for POST, PATCH and DELETE
///
/// Attributes arrive already validated against the resource schema.
/// Implementations that need atomic check-and-set semantics should compare
/// the etag of `existing` against storage inside `update_entity` and
/// `delete_entity`; the protocol engine performs no locking.
#[async_trait]
pub trait OrmIntegration<E: Entity>: Send + Sync {
    /// Create an entity; the store assigns the id and the first etag
    async fn create_entity(
        &self,
        attributes: Map<String, Value>,
        ctx: &RequestContext,
    ) -> ApiResult<E>;

    /// Apply a partial update; fields absent from `attributes` keep their values
    async fn update_entity(
        &self,
        existing: E,
        attributes: Map<String, Value>,
        ctx: &RequestContext,
    ) -> ApiResult<E>;

    async fn delete_entity(&self, entity: E, ctx: &RequestContext) -> ApiResult<()>;
}
