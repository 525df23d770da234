//! DELETE on one entity

use axum::response::{IntoResponse, Response};

use super::{entity_id, fetch_existing, ApiResult};
use crate::{
    etag, repository::Entity, request::RequestContext, resource::Resource, responses::NoContent,
};

pub(crate) async fn delete<E: Entity>(
    resource: &Resource<E>,
    ctx: &RequestContext,
) -> ApiResult<Response> {
    let entity_id = entity_id(ctx)?;
    let entity = fetch_existing(resource, entity_id, ctx).await?;
    etag::verify_precondition(&entity.etag(), ctx.if_match())?;

    resource.orm().delete_entity(entity, ctx).await?;
    tracing::info!(resource = resource.name(), entity_id, "Deleted entity");

    Ok(NoContent.into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::{test_support::*, ApiErrorKind};
    use axum::http::{Method, StatusCode};

    #[tokio::test]
    async fn test_delete_requires_precondition() {
        let store = NoteStore::with_note("first");
        let err = delete(&resource(&store), &ctx(Method::DELETE, "https://x.io/note/1", None))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::PreconditionRequired);
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn test_delete_with_wildcard() {
        let store = NoteStore::with_note("first");
        let response = delete(
            &resource(&store),
            &ctx(Method::DELETE, "https://x.io/note/1", Some("*")),
        )
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(store.notes.lock().unwrap().is_empty());
    }
}
