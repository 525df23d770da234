//! Read-path collaborator

use async_trait::async_trait;

use super::Entity;
use crate::{handlers::ApiResult, pagination::PaginationArgs, request::RequestContext};

/// Loads entities for GET, PATCH and DELETE
#[async_trait]
pub trait Fetcher<E: Entity>: Send + Sync {
    /// Look up a single entity; `Ok(None)` becomes a 404
    async fn get_entity(&self, entity_id: &str, ctx: &RequestContext) -> ApiResult<Option<E>>;

    /// Load one page of the collection
    ///
    /// `pagination` is `None` when the resource is not paginated, in which
    /// case every entity is expected.
    async fn get_many_entities(
        &self,
        pagination: Option<PaginationArgs>,
        ctx: &RequestContext,
    ) -> ApiResult<Vec<E>>;

    /// Total number of entities in the collection, for `meta.total_count`
    async fn get_total_entities(&self, ctx: &RequestContext) -> ApiResult<u64>;
}
