//! Data-access collaborators
//!
//! The protocol engine never touches storage itself. Each resource is
//! handed two collaborators:
//!
//! - [`Fetcher`]: the read path (lookup by id, list a page, count)
//! - [`OrmIntegration`]: the write path (create, update, delete)
//!
//! Both are async traits held as `Arc<dyn ...>`, so one store type can
//! implement both and be shared by several resources.
//!
//! # Example
//!
//! ```rust,ignore
//! use acton_jsonapi::prelude::*;
//!
//! #[derive(Clone, Serialize)]
//! struct User {
//!     id: String,
//!     etag: String,
//!     name: String,
//! }
//!
//! impl Entity for User {
//!     fn id(&self) -> String {
//!         self.id.clone()
//!     }
//!
//!     fn etag(&self) -> String {
//!         self.etag.clone()
//!     }
//! }
//!
//! struct UserStore {
//!     pool: PgPool,
//! }
//!
//! #[async_trait]
//! impl Fetcher<User> for UserStore {
//!     async fn get_entity(&self, entity_id: &str, _ctx: &RequestContext) -> ApiResult<Option<User>> {
//!         sqlx::query_as!(User, "SELECT * FROM users WHERE id = $1", entity_id)
//!             .fetch_optional(&self.pool)
//!             .await
//!             .map_err(|e| ApiError::internal(e.to_string()))
//!     }
//!
//!     // get_many_entities, get_total_entities ...
//! }
//! ```

mod fetcher;
mod orm;

pub use fetcher::Fetcher;
pub use orm::OrmIntegration;

use serde::Serialize;

/// A domain object exposed as a JSON:API resource
///
/// The serialized form must be a JSON object; its keys are matched against
/// the resource [`Schema`](crate::schema::Schema) to build `attributes`.
pub trait Entity: Serialize + Send + Sync + 'static {
    /// Stable identifier, used as `data.id`
    fn id(&self) -> String;

    /// Current version token, used for `meta.etag` and the `ETag` header
    fn etag(&self) -> String;
}
