//! GET on the collection

use axum::response::{IntoResponse, Response};

use super::ApiResult;
use crate::{
    envelope::{CollectionMeta, ResponseEnvelope},
    repository::Entity,
    request::RequestContext,
    resource::Resource,
    responses::Document,
};

pub(crate) async fn get_many<E: Entity>(
    resource: &Resource<E>,
    ctx: &RequestContext,
) -> ApiResult<Response> {
    let paginator = resource.paginator();
    let args = paginator.pagination_args(ctx)?;

    let entities = resource.fetcher().get_many_entities(args, ctx).await?;
    let total_count = resource.fetcher().get_total_entities(ctx).await?;

    let only = ctx.sparse_fieldset(resource.name());
    let codec = resource.codec();
    let data = entities
        .iter()
        .map(|entity| codec.encode(entity, only.as_deref()))
        .collect::<ApiResult<Vec<_>>>()?;

    let links = paginator.pagination_links(total_count, args, ctx);
    let meta = CollectionMeta {
        total_count,
        extra: paginator.extra_meta(args),
    };

    tracing::debug!(
        resource = resource.name(),
        returned = data.len(),
        total_count,
        "Listed entities"
    );

    Ok(Document::new(ResponseEnvelope::many(data, links, meta)).into_response())
}
