//! POST on the collection

use axum::response::{IntoResponse, Response};

use super::ApiResult;
use crate::{
    envelope::{DecodeMode, ResponseEnvelope},
    media,
    repository::Entity,
    request::RequestContext,
    resource::Resource,
    responses::Created,
};

pub(crate) async fn post<E: Entity>(
    resource: &Resource<E>,
    ctx: &RequestContext,
    body: &[u8],
) -> ApiResult<Response> {
    let body = media::parse_json_body(ctx.headers(), body)?;
    let codec = resource.codec();
    let data = codec.decode(&body, DecodeMode::Create)?;

    let entity = resource.orm().create_entity(data.attributes, ctx).await?;
    let entity_id = entity.id();
    let current_etag = entity.etag();
    let location = ctx.child_url(&entity_id);

    tracing::info!(resource = resource.name(), entity_id = %entity_id, "Created entity");

    let data = codec.encode(&entity, None)?;
    Ok(Created::new(ResponseEnvelope::single(data, location.clone()))
        .with_location(location)
        .with_etag(current_etag)
        .into_response())
}
