//! Resource definitions
//!
//! A [`Resource`] ties a resource type name and base URL to its schema, its
//! data-access collaborators and its protocol configuration: which
//! [`HttpMethods`] are enabled, the [`UrlMapping`] of path templates and
//! the [`Paginator`]. Everything here is fixed once the resource is
//! registered with a [`ResourceRouter`](crate::routing::ResourceRouter).

use std::{
    collections::BTreeMap,
    fmt,
    ops::{BitOr, BitOrAssign},
    sync::Arc,
};

use axum::http::Method;

use crate::{
    envelope::EnvelopeCodec,
    handlers::ApiOperation,
    pagination::{NoPagination, Paginator},
    repository::{Entity, Fetcher, OrmIntegration},
    schema::Schema,
};

/// One protocol operation of a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HttpMethod {
    /// `GET` on the collection
    GetMany,
    /// `GET` on one entity
    Get,
    /// `POST` on the collection
    Post,
    /// `PATCH` on one entity
    Patch,
    /// `DELETE` on one entity
    Delete,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 5] = [
        HttpMethod::GetMany,
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Patch,
        HttpMethod::Delete,
    ];

    /// The HTTP verb this operation answers to
    pub fn verb(self) -> Method {
        match self {
            Self::GetMany | Self::Get => Method::GET,
            Self::Post => Method::POST,
            Self::Patch => Method::PATCH,
            Self::Delete => Method::DELETE,
        }
    }

    /// Whether the operation targets a single entity
    pub const fn is_entity_scoped(self) -> bool {
        matches!(self, Self::Get | Self::Patch | Self::Delete)
    }

    pub const fn operation(self) -> ApiOperation {
        match self {
            Self::GetMany => ApiOperation::GetMany,
            Self::Get => ApiOperation::Get,
            Self::Post => ApiOperation::Create,
            Self::Patch => ApiOperation::Update,
            Self::Delete => ApiOperation::Delete,
        }
    }

    const fn bit(self) -> u8 {
        match self {
            Self::GetMany => 1,
            Self::Get => 1 << 1,
            Self::Post => 1 << 2,
            Self::Patch => 1 << 3,
            Self::Delete => 1 << 4,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GetMany => write!(f, "get_many"),
            Self::Get => write!(f, "get"),
            Self::Post => write!(f, "post"),
            Self::Patch => write!(f, "patch"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Set of enabled [`HttpMethod`]s
///
/// ```rust
/// use acton_jsonapi::resource::{HttpMethod, HttpMethods};
///
/// let methods = HttpMethod::GetMany | HttpMethod::Post;
/// assert!(methods.contains(HttpMethod::Post));
/// assert!(!methods.contains(HttpMethod::Delete));
/// assert!(HttpMethods::ALL.contains(HttpMethod::Delete));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct HttpMethods(u8);

impl HttpMethods {
    pub const NONE: HttpMethods = HttpMethods(0);
    pub const ALL: HttpMethods = HttpMethods(0b1_1111);
    pub const READ_ONLY: HttpMethods =
        HttpMethods(HttpMethod::GetMany.bit() | HttpMethod::Get.bit());

    pub const fn contains(self, method: HttpMethod) -> bool {
        self.0 & method.bit() != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Enabled methods in declaration order
    pub fn iter(self) -> impl Iterator<Item = HttpMethod> {
        HttpMethod::ALL
            .into_iter()
            .filter(move |method| self.contains(*method))
    }
}

impl Default for HttpMethods {
    fn default() -> Self {
        Self::ALL
    }
}

impl fmt::Debug for HttpMethods {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl From<HttpMethod> for HttpMethods {
    fn from(method: HttpMethod) -> Self {
        HttpMethods(method.bit())
    }
}

impl FromIterator<HttpMethod> for HttpMethods {
    fn from_iter<I: IntoIterator<Item = HttpMethod>>(iter: I) -> Self {
        iter.into_iter().fold(Self::NONE, |set, method| set | method)
    }
}

impl BitOr for HttpMethods {
    type Output = HttpMethods;

    fn bitor(self, rhs: HttpMethods) -> HttpMethods {
        HttpMethods(self.0 | rhs.0)
    }
}

impl BitOr<HttpMethod> for HttpMethods {
    type Output = HttpMethods;

    fn bitor(self, rhs: HttpMethod) -> HttpMethods {
        HttpMethods(self.0 | rhs.bit())
    }
}

impl BitOr for HttpMethod {
    type Output = HttpMethods;

    fn bitor(self, rhs: HttpMethod) -> HttpMethods {
        HttpMethods(self.bit() | rhs.bit())
    }
}

impl BitOrAssign<HttpMethod> for HttpMethods {
    fn bitor_assign(&mut self, rhs: HttpMethod) {
        self.0 |= rhs.bit();
    }
}

/// Path template per [`HttpMethod`]
///
/// `{}` is replaced by the resource base URL and `<name>` marks a path
/// parameter. The default maps the collection operations to `"{}"` and the
/// entity operations to `"{}/<entity_id>"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlMapping(BTreeMap<HttpMethod, String>);

/// Placeholder for the resource base URL in a path template
pub const BASE_URL_PLACEHOLDER: &str = "{}";

/// Default path parameter carrying the entity id
pub const ENTITY_ID_PARAM: &str = "entity_id";

impl Default for UrlMapping {
    fn default() -> Self {
        let entity = format!("{}/<{}>", BASE_URL_PLACEHOLDER, ENTITY_ID_PARAM);
        Self(
            HttpMethod::ALL
                .into_iter()
                .map(|method| {
                    let template = if method.is_entity_scoped() {
                        entity.clone()
                    } else {
                        BASE_URL_PLACEHOLDER.to_string()
                    };
                    (method, template)
                })
                .collect(),
        )
    }
}

impl UrlMapping {
    /// Override the template of one method
    #[must_use]
    pub fn with(mut self, method: HttpMethod, template: impl Into<String>) -> Self {
        self.0.insert(method, template.into());
        self
    }

    pub fn template(&self, method: HttpMethod) -> Option<&str> {
        self.0.get(&method).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (HttpMethod, &str)> {
        self.0.iter().map(|(method, template)| (*method, template.as_str()))
    }
}

/// A resource exposed over HTTP
pub struct Resource<E: Entity> {
    name: String,
    base_url: String,
    schema: Schema,
    fetcher: Arc<dyn Fetcher<E>>,
    orm: Arc<dyn OrmIntegration<E>>,
    paginator: Arc<dyn Paginator>,
    methods: HttpMethods,
    url_mapping: UrlMapping,
}

impl<E: Entity> fmt::Debug for Resource<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("schema", &self.schema)
            .field("methods", &self.methods)
            .field("url_mapping", &self.url_mapping)
            .finish_non_exhaustive()
    }
}

impl<E: Entity> Resource<E> {
    /// Create a resource with every method enabled and no pagination
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        schema: Schema,
        fetcher: Arc<dyn Fetcher<E>>,
        orm: Arc<dyn OrmIntegration<E>>,
    ) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            schema,
            fetcher,
            orm,
            paginator: Arc::new(NoPagination),
            methods: HttpMethods::ALL,
            url_mapping: UrlMapping::default(),
        }
    }

    #[must_use]
    pub fn with_methods(mut self, methods: impl Into<HttpMethods>) -> Self {
        self.methods = methods.into();
        self
    }

    #[must_use]
    pub fn with_paginator(mut self, paginator: impl Paginator + 'static) -> Self {
        self.paginator = Arc::new(paginator);
        self
    }

    #[must_use]
    pub fn with_url_mapping(mut self, url_mapping: UrlMapping) -> Self {
        self.url_mapping = url_mapping;
        self
    }

    /// The resource type, used as `data.type`
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn fetcher(&self) -> &dyn Fetcher<E> {
        self.fetcher.as_ref()
    }

    pub fn orm(&self) -> &dyn OrmIntegration<E> {
        self.orm.as_ref()
    }

    pub fn paginator(&self) -> &dyn Paginator {
        self.paginator.as_ref()
    }

    pub fn methods(&self) -> HttpMethods {
        self.methods
    }

    pub fn url_mapping(&self) -> &UrlMapping {
        &self.url_mapping
    }

    pub fn codec(&self) -> EnvelopeCodec<'_> {
        EnvelopeCodec::new(&self.name, &self.schema)
    }
}
