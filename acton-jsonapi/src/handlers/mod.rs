//! Method handlers for the JSON:API resource protocol
//!
//! One handler per operation, each a short sequential protocol over the
//! resource's collaborators:
//!
//! | Operation | Protocol |
//! |---|---|
//! | GET-many | pagination args → fetch page → count → encode → 200 |
//! | GET-single | fetch → `If-Match` match? 304 : encode → 200 + `ETag` |
//! | POST | decode (create) → create → encode → 201 + `Location` + `ETag` |
//! | PATCH | fetch → precondition → decode (partial) → update → 200 + `ETag` |
//! | DELETE | fetch → precondition → delete → 204 |
//!
//! Every step is awaited before the next one starts. Failures surface as
//! [`ApiError`] and are mapped to the error envelope by its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.
//!
//! Handlers are not routed directly; [`ResourceRouter`](crate::routing::ResourceRouter)
//! wires them according to each resource's enabled methods.

mod delete;
mod error;
mod get_many;
mod get_single;
mod patch;
mod post;

pub use error::{ApiError, ApiErrorKind, ApiOperation, ApiResult, ValidationErrors};

pub(crate) use delete::delete;
pub(crate) use get_many::get_many;
pub(crate) use get_single::get_single;
pub(crate) use patch::patch;
pub(crate) use post::post;

use crate::{
    repository::Entity,
    request::RequestContext,
    resource::Resource,
};

/// The entity id of an entity-scoped request
fn entity_id(ctx: &RequestContext) -> ApiResult<&str> {
    ctx.entity_id()
        .ok_or_else(|| ApiError::internal("Entity route matched without an entity id"))
}

/// Load the entity addressed by the request, or fail with `NotFound`
async fn fetch_existing<E: Entity>(
    resource: &Resource<E>,
    entity_id: &str,
    ctx: &RequestContext,
) -> ApiResult<E> {
    resource
        .fetcher()
        .get_entity(entity_id, ctx)
        .await?
        .ok_or_else(|| ApiError::not_found(resource.name(), entity_id))
}
