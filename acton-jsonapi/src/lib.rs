//! # acton-jsonapi
//!
//! JSON:API resource protocol engine for axum services.
//!
//! Describe a resource (a field schema plus pluggable data-access
//! collaborators) and get the conventional endpoints speaking the JSON:API
//! envelope:
//!
//! | Verb | Path | Enabled by |
//! |---|---|---|
//! | GET | `/user` | [`HttpMethod::GetMany`](resource::HttpMethod::GetMany) |
//! | POST | `/user` | [`HttpMethod::Post`](resource::HttpMethod::Post) |
//! | GET | `/user/{entity_id}` | [`HttpMethod::Get`](resource::HttpMethod::Get) |
//! | PATCH | `/user/{entity_id}` | [`HttpMethod::Patch`](resource::HttpMethod::Patch) |
//! | DELETE | `/user/{entity_id}` | [`HttpMethod::Delete`](resource::HttpMethod::Delete) |
//!
//! ## Features
//!
//! - **Optimistic concurrency**: `ETag` on every read and write, `If-Match`
//!   required for PATCH and DELETE, 304 on a matching GET
//! - **Validation**: field-descriptor schemas with all-or-nothing 422 errors
//! - **Pagination**: `page[number]` / `page[size]` with navigation links
//! - **Sparse fieldsets**: `fields[<type>]=a,b`
//! - **Fixed error taxonomy**: every failure maps to exactly one status code
//!
//! ## Example
//!
//! ```rust,ignore
//! use acton_jsonapi::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load()?;
//!     init_tracing(&config)?;
//!
//!     let store = Arc::new(UserStore::default());
//!     let schema = Schema::new()
//!         .field(FieldSpec::string("name").required())
//!         .field(FieldSpec::integer("age"));
//!
//!     let users = Resource::new("user", "/user", schema, store.clone(), store)
//!         .with_paginator(PageSizePagination::from_config(&config.pagination));
//!
//!     let app = ResourceRouter::new(config).register(users)?.into_router();
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod envelope;
pub mod error;
pub mod etag;
pub mod handlers;
pub mod media;
pub mod observability;
pub mod pagination;
pub mod repository;
pub mod request;
pub mod resource;
pub mod responses;
pub mod routing;
pub mod schema;

/// Commonly used types
pub mod prelude {
    pub use crate::config::{Config, PaginationConfig};
    pub use crate::envelope::{EntityData, EnvelopeCodec, Links, ResponseEnvelope};
    pub use crate::error::{Error, Result};
    pub use crate::handlers::{ApiError, ApiErrorKind, ApiResult, ValidationErrors};
    pub use crate::media::MIMETYPE;
    pub use crate::observability::init_tracing;
    pub use crate::pagination::{NoPagination, PageSizePagination, PaginationArgs, Paginator};
    pub use crate::repository::{Entity, Fetcher, OrmIntegration};
    pub use crate::request::RequestContext;
    pub use crate::resource::{HttpMethod, HttpMethods, Resource, UrlMapping};
    pub use crate::routing::ResourceRouter;
    pub use crate::schema::{FieldKind, FieldSpec, Schema};

    pub use async_trait::async_trait;
    pub use axum::Router;
    pub use serde::{Deserialize, Serialize};
    pub use std::sync::Arc;
}
