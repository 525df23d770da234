//! PATCH on one entity

use axum::response::{IntoResponse, Response};

use super::{entity_id, fetch_existing, ApiResult};
use crate::{
    envelope::{DecodeMode, ResponseEnvelope},
    etag, media,
    repository::Entity,
    request::RequestContext,
    resource::Resource,
    responses::Document,
};

pub(crate) async fn patch<E: Entity>(
    resource: &Resource<E>,
    ctx: &RequestContext,
    body: &[u8],
) -> ApiResult<Response> {
    let entity_id = entity_id(ctx)?;
    let entity = fetch_existing(resource, entity_id, ctx).await?;
    etag::verify_precondition(&entity.etag(), ctx.if_match())?;

    let body = media::parse_json_body(ctx.headers(), body)?;
    let codec = resource.codec();
    let data = codec.decode(&body, DecodeMode::Update { entity_id })?;

    let updated = resource
        .orm()
        .update_entity(entity, data.attributes, ctx)
        .await?;
    let current_etag = updated.etag();

    tracing::info!(resource = resource.name(), entity_id, "Updated entity");

    let data = codec.encode(&updated, None)?;
    Ok(Document::new(ResponseEnvelope::single(data, ctx.url()))
        .with_etag(current_etag)
        .into_response())
}
