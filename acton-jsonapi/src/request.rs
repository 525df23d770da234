//! Per-request context handed to hooks, handlers and collaborators

use std::collections::BTreeMap;

use axum::{
    extract::OriginalUri,
    http::{header, request::Parts, HeaderMap, Method},
};
use url::Url;

use crate::{
    config::Config,
    handlers::{ApiError, ApiResult},
};

/// Everything the protocol engine knows about the current request
///
/// Built once per request after routing. The URL is absolute: the scheme
/// comes from [`Config::server_protocol`], the host from
/// [`Config::server_name`] or the `Host` header, and the path from the
/// original (pre-nesting) request URI.
#[derive(Debug, Clone)]
pub struct RequestContext {
    method: Method,
    url: Url,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    path_params: BTreeMap<String, String>,
    entity_id: Option<String>,
}

impl RequestContext {
    /// Build a context from an absolute URL
    pub fn new(method: Method, url: &str, headers: HeaderMap) -> ApiResult<Self> {
        let url = Url::parse(url).map_err(|e| {
            tracing::debug!(error = %e, url, "Request URL could not be parsed");
            ApiError::bad_request("Invalid request URL")
        })?;
        let query = url.query_pairs().into_owned().collect();

        Ok(Self {
            method,
            url,
            query,
            headers,
            path_params: BTreeMap::new(),
            entity_id: None,
        })
    }

    /// Build a context from the request head
    pub fn from_parts(parts: &Parts, config: &Config) -> ApiResult<Self> {
        let uri = parts
            .extensions
            .get::<OriginalUri>()
            .map(|original| &original.0)
            .unwrap_or(&parts.uri);

        let host = config
            .server_name
            .clone()
            .or_else(|| {
                parts
                    .headers
                    .get(header::HOST)
                    .and_then(|h| h.to_str().ok())
                    .map(str::to_string)
            })
            .or_else(|| uri.authority().map(|a| a.to_string()))
            .unwrap_or_else(|| "localhost".to_string());

        let path_and_query = uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");

        let url = format!("{}://{}{}", config.server_protocol, host, path_and_query);
        Self::new(parts.method.clone(), &url, parts.headers.clone())
    }

    /// Attach the parameters matched in the URL path
    #[must_use]
    pub fn with_path_params(mut self, params: impl IntoIterator<Item = (String, String)>) -> Self {
        self.path_params.extend(params);
        self
    }

    /// Attach the entity id taken from the URL
    #[must_use]
    pub fn with_entity_id(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }

    /// HTTP method of the request
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The full request URL, including the query string
    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// The request URL without its query string
    pub fn path_url(&self) -> String {
        let mut url = self.url.clone();
        url.set_query(None);
        url.set_fragment(None);
        url.into()
    }

    /// The request URL without its query, extended by one path segment
    ///
    /// A trailing slash on the request path is not duplicated and the
    /// segment is percent-encoded.
    pub fn child_url(&self, segment: &str) -> String {
        let mut url = self.url.clone();
        url.set_query(None);
        url.set_fragment(None);
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(segment);
        }
        url.into()
    }

    /// Request path component
    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// Decoded query parameters in their original order
    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    /// First value of a query parameter
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// A parameter matched in the URL path
    ///
    /// Besides the entity id this carries any parameter in the resource
    /// base URL, e.g. `org_id` for `/org/<org_id>/user`.
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(String::as_str)
    }

    /// Request headers
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Entity id from the URL, for entity-scoped routes
    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    /// `If-Match` header value; an empty header counts as absent
    pub fn if_match(&self) -> Option<&str> {
        self.headers
            .get(header::IF_MATCH)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    /// Fields requested through `fields[<resource_type>]`
    ///
    /// Returns `None` when the parameter is absent, meaning all fields.
    pub fn sparse_fieldset(&self, resource_type: &str) -> Option<Vec<String>> {
        let key = format!("fields[{}]", resource_type);
        self.query_param(&key).map(|fields| {
            fields
                .split(',')
                .map(str::trim)
                .filter(|field| !field.is_empty())
                .map(str::to_string)
                .collect()
        })
    }
}
