//! GET on one entity

use axum::response::{IntoResponse, Response};

use super::{entity_id, fetch_existing, ApiResult};
use crate::{
    envelope::ResponseEnvelope,
    etag,
    repository::Entity,
    request::RequestContext,
    resource::Resource,
    responses::{Document, NotModified},
};

pub(crate) async fn get_single<E: Entity>(
    resource: &Resource<E>,
    ctx: &RequestContext,
) -> ApiResult<Response> {
    let entity_id = entity_id(ctx)?;
    let entity = fetch_existing(resource, entity_id, ctx).await?;
    let current_etag = entity.etag();

    if ctx
        .if_match()
        .is_some_and(|if_match| etag::etag_matches(if_match, &current_etag))
    {
        tracing::debug!(resource = resource.name(), entity_id, "Entity not modified");
        return Ok(NotModified.into_response());
    }

    let only = ctx.sparse_fieldset(resource.name());
    let data = resource.codec().encode(&entity, only.as_deref())?;

    Ok(Document::new(ResponseEnvelope::single(data, ctx.url()))
        .with_etag(current_etag)
        .into_response())
}
