//! Routing table builder and the axum router for JSON:API resources
//!
//! [`build_routes`] is the pure policy: given a resource's enabled methods
//! and URL mapping, which `(path, verb)` pairs exist and which handler
//! serves each. [`ResourceRouter`] turns that table into an
//! [`axum::Router`]:
//!
//! - every path shape of the URL mapping is registered, so a verb that is
//!   not enabled answers 405 rather than 404
//! - every path also answers with a trailing slash
//! - pre-request hooks run before any enabled handler
//! - `Content-Type: application/vnd.api+json` is forced on every response
//!
//! # Example
//!
//! ```rust,ignore
//! use acton_jsonapi::prelude::*;
//!
//! let store = Arc::new(UserStore::default());
//! let users = Resource::new("user", "/user", user_schema(), store.clone(), store)
//!     .with_paginator(PageSizePagination::from_config(&config.pagination));
//!
//! let api = ResourceRouter::new(config)
//!     .before_request(|ctx: &RequestContext| match ctx.headers().get("authorization") {
//!         Some(_) => Ok(()),
//!         None => Err(ApiError::unauthorized("Missing credentials")),
//!     })
//!     .register(users)?
//!     .into_router();
//!
//! let app = Router::new().nest("/api", api);
//! ```

use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    fmt,
    sync::Arc,
};

use axum::{
    body::{to_bytes, Bytes},
    extract::{Path, Request},
    http::{header, HeaderValue, Method},
    response::{IntoResponse, Response},
    routing::{MethodFilter, MethodRouter},
    Router,
};
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};

use crate::{
    config::Config,
    error::{Error, Result},
    handlers::{self, ApiError, ApiResult},
    media::MIMETYPE,
    repository::Entity,
    request::RequestContext,
    resource::{HttpMethod, HttpMethods, Resource, UrlMapping, BASE_URL_PLACEHOLDER, ENTITY_ID_PARAM},
};

/// One entry of a resource's routing table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// Endpoint name, `<resource>.<method>`
    pub endpoint: String,
    /// axum path pattern, e.g. `/user/{entity_id}`
    pub pattern: String,
    /// HTTP verb
    pub verb: Method,
    /// Handler serving the route
    pub method: HttpMethod,
    /// Path parameter carrying the entity id, for entity-scoped methods
    pub entity_param: Option<String>,
}

/// Expand a path template into an axum path pattern
///
/// `{}` becomes `base_url` and each `<name>` becomes `{name}`. Returns the
/// pattern and the parameter names in order.
pub fn expand_template(template: &str, base_url: &str) -> (String, Vec<String>) {
    let base_url = base_url.trim_end_matches('/');
    let expanded = template.replace(BASE_URL_PLACEHOLDER, base_url);

    let mut pattern = String::with_capacity(expanded.len() + 1);
    let mut params = Vec::new();
    let mut rest = expanded.as_str();
    while let Some(start) = rest.find('<') {
        let Some(len) = rest[start..].find('>') else {
            break;
        };
        let name = &rest[start + 1..start + len];
        pattern.push_str(&rest[..start]);
        pattern.push('{');
        pattern.push_str(name);
        pattern.push('}');
        params.push(name.to_string());
        rest = &rest[start + len + 1..];
    }
    pattern.push_str(rest);

    if !pattern.starts_with('/') {
        pattern.insert(0, '/');
    }
    if pattern.len() > 1 {
        let trimmed = pattern.trim_end_matches('/').len().max(1);
        pattern.truncate(trimmed);
    }

    (pattern, params)
}

/// Build the routing table for one resource
///
/// Only enabled methods produce routes. GET and GET-many share a verb and
/// are kept apart by their path templates.
pub fn build_routes(
    resource_name: &str,
    base_url: &str,
    enabled: HttpMethods,
    url_mapping: &UrlMapping,
) -> Vec<Route> {
    enabled
        .iter()
        .filter_map(|method| {
            let template = url_mapping.template(method)?;
            let (pattern, params) = expand_template(template, base_url);
            let entity_param = if method.is_entity_scoped() {
                params
                    .iter()
                    .find(|param| *param == ENTITY_ID_PARAM)
                    .or_else(|| params.last())
                    .cloned()
            } else {
                None
            };

            Some(Route {
                endpoint: format!("{}.{}", resource_name, method),
                pattern,
                verb: method.verb(),
                method,
                entity_param,
            })
        })
        .collect()
}

/// Every path shape of a URL mapping, enabled or not
pub fn path_shapes(base_url: &str, url_mapping: &UrlMapping) -> BTreeSet<String> {
    url_mapping
        .iter()
        .map(|(_, template)| expand_template(template, base_url).0)
        .collect()
}

fn trailing_slash_alias(pattern: &str) -> Option<String> {
    (pattern != "/").then(|| format!("{}/", pattern))
}

/// Pattern with parameter names erased; `/a/{x}` and `/a/{y}` collide
fn route_key(pattern: &str) -> String {
    pattern
        .split('/')
        .map(|segment| {
            if segment.starts_with('{') && segment.ends_with('}') {
                "{}"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn method_filter(method: HttpMethod) -> MethodFilter {
    match method {
        HttpMethod::GetMany | HttpMethod::Get => MethodFilter::GET,
        HttpMethod::Post => MethodFilter::POST,
        HttpMethod::Patch => MethodFilter::PATCH,
        HttpMethod::Delete => MethodFilter::DELETE,
    }
}

async fn method_not_allowed() -> ApiError {
    ApiError::method_not_allowed()
}

/// Synchronous check run before every enabled handler
pub type BeforeRequestHook = Arc<dyn Fn(&RequestContext) -> ApiResult<()> + Send + Sync>;

struct Shared {
    config: Config,
    hooks: Vec<BeforeRequestHook>,
}

type Registration = Box<dyn FnOnce(Arc<Shared>) -> Router + Send>;

/// Groups resources into one axum [`Router`]
pub struct ResourceRouter {
    config: Config,
    hooks: Vec<BeforeRequestHook>,
    registrations: Vec<Registration>,
    patterns: BTreeSet<String>,
}

impl fmt::Debug for ResourceRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceRouter")
            .field("config", &self.config)
            .field("hooks", &self.hooks.len())
            .field("patterns", &self.patterns)
            .finish()
    }
}

impl ResourceRouter {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            hooks: Vec::new(),
            registrations: Vec::new(),
            patterns: BTreeSet::new(),
        }
    }

    /// Add a pre-request hook
    ///
    /// Hooks run in registration order; the first error ends the request.
    /// They apply to every resource of this router, including resources
    /// registered before the hook.
    #[must_use]
    pub fn before_request<F>(mut self, hook: F) -> Self
    where
        F: Fn(&RequestContext) -> ApiResult<()> + Send + Sync + 'static,
    {
        self.hooks.push(Arc::new(hook));
        self
    }

    /// Register a resource
    ///
    /// Fails if the resource name is empty, the base URL is not absolute, a
    /// template is ambiguous, or a path is already taken by another resource.
    pub fn register<E: Entity>(mut self, resource: Resource<E>) -> Result<Self> {
        if resource.name().is_empty() {
            return Err(Error::InvalidResource("resource name must not be empty".to_string()));
        }
        if !resource.base_url().starts_with('/') {
            return Err(Error::InvalidResource(format!(
                "base url of \"{}\" must start with '/': {}",
                resource.name(),
                resource.base_url()
            )));
        }

        let routes = build_routes(
            resource.name(),
            resource.base_url(),
            resource.methods(),
            resource.url_mapping(),
        );

        let mut seen = HashSet::new();
        for route in &routes {
            if route.method.is_entity_scoped() && route.entity_param.is_none() {
                return Err(Error::InvalidResource(format!(
                    "{} has no entity id parameter in {}",
                    route.endpoint, route.pattern
                )));
            }
            if !seen.insert((route.pattern.clone(), route.verb.clone())) {
                return Err(Error::InvalidResource(format!(
                    "{} {} is mapped to more than one handler",
                    route.verb, route.pattern
                )));
            }
        }

        let shapes = path_shapes(resource.base_url(), resource.url_mapping());
        let mut keys = HashSet::new();
        for shape in &shapes {
            if !keys.insert(route_key(shape)) {
                return Err(Error::InvalidResource(format!(
                    "path templates of \"{}\" differ only in parameter names: {}",
                    resource.name(),
                    shape
                )));
            }
        }
        for shape in &shapes {
            let taken = std::iter::once(shape.clone())
                .chain(trailing_slash_alias(shape))
                .find(|path| self.patterns.contains(&route_key(path)));
            if let Some(path) = taken {
                return Err(Error::InvalidResource(format!(
                    "path {} of \"{}\" is already registered",
                    path,
                    resource.name()
                )));
            }
        }
        for shape in &shapes {
            self.patterns.insert(route_key(shape));
            self.patterns
                .extend(trailing_slash_alias(shape).map(|alias| route_key(&alias)));
        }

        tracing::debug!(
            resource = resource.name(),
            base_url = resource.base_url(),
            methods = ?resource.methods(),
            "Registered JSON:API resource"
        );

        let resource = Arc::new(resource);
        self.registrations
            .push(Box::new(move |shared| resource_router(resource, routes, shapes, shared)));
        Ok(self)
    }

    /// Build the axum router
    pub fn into_router(self) -> Router {
        let shared = Arc::new(Shared {
            config: self.config,
            hooks: self.hooks,
        });

        let router = self
            .registrations
            .into_iter()
            .fold(Router::new(), |router, register| {
                router.merge(register(Arc::clone(&shared)))
            });

        router
            .layer(SetResponseHeaderLayer::overriding(
                header::CONTENT_TYPE,
                HeaderValue::from_static(MIMETYPE),
            ))
            .layer(TraceLayer::new_for_http())
    }
}

fn resource_router<E: Entity>(
    resource: Arc<Resource<E>>,
    routes: Vec<Route>,
    shapes: BTreeSet<String>,
    shared: Arc<Shared>,
) -> Router {
    let mut method_routers: BTreeMap<String, MethodRouter> = shapes
        .into_iter()
        .map(|shape| (shape, MethodRouter::new().fallback(method_not_allowed)))
        .collect();

    for route in routes {
        let endpoint = Endpoint {
            resource: Arc::clone(&resource),
            shared: Arc::clone(&shared),
            method: route.method,
            entity_param: route.entity_param.clone(),
        };
        let filter = method_filter(route.method);
        let has_params = route.pattern.contains('{');

        let method_router = method_routers
            .remove(&route.pattern)
            .unwrap_or_else(|| MethodRouter::new().fallback(method_not_allowed));
        let method_router = if has_params {
            method_router.on(
                filter,
                move |Path(params): Path<HashMap<String, String>>, request: Request| {
                    let endpoint = endpoint.clone();
                    async move { endpoint.handle(params, request).await }
                },
            )
        } else {
            method_router.on(filter, move |request: Request| {
                let endpoint = endpoint.clone();
                async move { endpoint.handle(HashMap::new(), request).await }
            })
        };
        method_routers.insert(route.pattern, method_router);
    }

    method_routers
        .into_iter()
        .fold(Router::new(), |router, (pattern, method_router)| {
            let router = match trailing_slash_alias(&pattern) {
                Some(alias) => router.route(&alias, method_router.clone()),
                None => router,
            };
            router.route(&pattern, method_router)
        })
}

/// One enabled handler of one resource
struct Endpoint<E: Entity> {
    resource: Arc<Resource<E>>,
    shared: Arc<Shared>,
    method: HttpMethod,
    entity_param: Option<String>,
}

impl<E: Entity> Clone for Endpoint<E> {
    fn clone(&self) -> Self {
        Self {
            resource: Arc::clone(&self.resource),
            shared: Arc::clone(&self.shared),
            method: self.method,
            entity_param: self.entity_param.clone(),
        }
    }
}

impl<E: Entity> Endpoint<E> {
    async fn handle(self, params: HashMap<String, String>, request: Request) -> Response {
        match self.dispatch(params, request).await {
            Ok(response) => response,
            Err(err) => err
                .with_operation(self.method.operation())
                .with_resource(self.resource.name())
                .into_response(),
        }
    }

    async fn dispatch(
        &self,
        params: HashMap<String, String>,
        request: Request,
    ) -> ApiResult<Response> {
        let (parts, body) = request.into_parts();
        let config = &self.shared.config;

        let mut ctx = RequestContext::from_parts(&parts, config)?.with_path_params(params);
        if let Some(entity_id) = self
            .entity_param
            .as_deref()
            .and_then(|param| ctx.path_param(param))
            .map(str::to_string)
        {
            ctx = ctx.with_entity_id(entity_id);
        }

        for hook in &self.shared.hooks {
            hook(&ctx)?;
        }

        let body = match self.method {
            HttpMethod::Post | HttpMethod::Patch => {
                to_bytes(body, config.body_limit_bytes).await.map_err(|e| {
                    tracing::debug!(error = %e, "Failed to read request body");
                    ApiError::bad_request("Request body could not be read or is too large")
                })?
            }
            _ => Bytes::new(),
        };

        tracing::debug!(
            verb = %ctx.method(),
            resource = self.resource.name(),
            handler = %self.method,
            entity_id = ?ctx.entity_id(),
            body = %String::from_utf8_lossy(&body),
            "Dispatching JSON:API request"
        );

        let resource = self.resource.as_ref();
        match self.method {
            HttpMethod::GetMany => handlers::get_many(resource, &ctx).await,
            HttpMethod::Get => handlers::get_single(resource, &ctx).await,
            HttpMethod::Post => handlers::post(resource, &ctx, &body).await,
            HttpMethod::Patch => handlers::patch(resource, &ctx, &body).await,
            HttpMethod::Delete => handlers::delete(resource, &ctx).await,
        }
    }
}
