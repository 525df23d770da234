//! Pagination strategies for GET-many
//!
//! A [`Paginator`] turns the request query into [`PaginationArgs`] and builds
//! the collection `links`. Two strategies ship with the crate:
//!
//! - [`NoPagination`] (the default): the whole collection, `self` link only.
//! - [`PageSizePagination`]: `page[number]` / `page[size]` with
//!   `first`/`last`/`prev`/`next` links.
//!
//! ```rust
//! use acton_jsonapi::pagination::{PageSizePagination, PaginationArgs};
//!
//! let paginator = PageSizePagination::new(10, 100);
//! assert_eq!(paginator.max_size(), 100);
//! assert_eq!(PaginationArgs::new(3, 20).offset(), 40);
//! ```

use std::num::IntErrorKind;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use url::form_urlencoded;

use crate::{
    config::PaginationConfig,
    envelope::{Links, NavigationLinks},
    handlers::{ApiError, ApiResult},
    request::RequestContext,
};

/// Query parameter selecting the page
pub const PAGE_NUMBER_PARAM: &str = "page[number]";

/// Query parameter selecting the page size
pub const PAGE_SIZE_PARAM: &str = "page[size]";

/// A page window; `page >= 1` and `1 <= size <= max`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaginationArgs {
    pub page: u64,
    pub size: u64,
}

impl PaginationArgs {
    pub fn new(page: u64, size: u64) -> Self {
        Self {
            page: page.max(1),
            size: size.max(1),
        }
    }

    /// Number of entities before this page
    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.size)
    }

    /// Maximum number of entities on this page
    pub fn limit(&self) -> u64 {
        self.size
    }
}

/// Pagination policy for a resource
pub trait Paginator: Send + Sync {
    /// Derive the page window from the request, `None` for no pagination
    fn pagination_args(&self, ctx: &RequestContext) -> ApiResult<Option<PaginationArgs>>;

    /// Build the collection `links` member
    fn pagination_links(
        &self,
        total_count: u64,
        args: Option<PaginationArgs>,
        ctx: &RequestContext,
    ) -> Links;

    /// Extra information for `meta.extra`
    fn extra_meta(&self, _args: Option<PaginationArgs>) -> Option<Value> {
        None
    }
}

/// Returns the whole collection with a `self` link only
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPagination;

impl Paginator for NoPagination {
    fn pagination_args(&self, _ctx: &RequestContext) -> ApiResult<Option<PaginationArgs>> {
        Ok(None)
    }

    fn pagination_links(
        &self,
        _total_count: u64,
        _args: Option<PaginationArgs>,
        ctx: &RequestContext,
    ) -> Links {
        Links::self_only(ctx.url())
    }
}

/// `page[number]` / `page[size]` pagination
///
/// Absent parameters default to page 1 and the configured default size.
/// Non-integer or non-positive values are rejected with a 400; sizes above
/// the maximum are clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSizePagination {
    default_size: u64,
    max_size: u64,
}

impl Default for PageSizePagination {
    fn default() -> Self {
        Self::from_config(&PaginationConfig::default())
    }
}

impl PageSizePagination {
    pub fn new(default_size: u64, max_size: u64) -> Self {
        let max_size = max_size.max(1);
        Self {
            default_size: default_size.clamp(1, max_size),
            max_size,
        }
    }

    pub fn from_config(config: &PaginationConfig) -> Self {
        Self::new(config.default_size, config.max_size)
    }

    pub fn default_size(&self) -> u64 {
        self.default_size
    }

    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    fn parse_param(ctx: &RequestContext, name: &str, default: u64) -> ApiResult<u64> {
        let raw = match ctx.query_param(name).map(str::trim) {
            None | Some("") => return Ok(default),
            Some(raw) => raw,
        };

        // Integers beyond the u64 range saturate; the size is clamped later
        let value = match raw.parse::<u64>() {
            Ok(value) => value,
            Err(e) if *e.kind() == IntErrorKind::PosOverflow => u64::MAX,
            Err(_) => match raw.parse::<i64>() {
                Ok(_) => 0,
                Err(e) if *e.kind() == IntErrorKind::NegOverflow => 0,
                Err(_) => {
                    return Err(ApiError::bad_request(
                        "page[number] and page[size] must be integers",
                    ))
                }
            },
        };

        if value < 1 {
            return Err(ApiError::bad_request(
                "Both page[number] and page[size] must be at least 1",
            ));
        }
        Ok(value)
    }

    fn page_link(ctx: &RequestContext, page: u64, size: u64) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        for (key, value) in ctx.query_pairs() {
            if key != PAGE_NUMBER_PARAM && key != PAGE_SIZE_PARAM {
                query.append_pair(key, value);
            }
        }
        query.append_pair(PAGE_NUMBER_PARAM, &page.to_string());
        query.append_pair(PAGE_SIZE_PARAM, &size.to_string());

        format!("{}?{}", ctx.path_url(), query.finish())
    }
}

impl Paginator for PageSizePagination {
    fn pagination_args(&self, ctx: &RequestContext) -> ApiResult<Option<PaginationArgs>> {
        let page = Self::parse_param(ctx, PAGE_NUMBER_PARAM, 1)?;
        let size = Self::parse_param(ctx, PAGE_SIZE_PARAM, self.default_size)?;

        Ok(Some(PaginationArgs::new(page, size.min(self.max_size))))
    }

    fn pagination_links(
        &self,
        total_count: u64,
        args: Option<PaginationArgs>,
        ctx: &RequestContext,
    ) -> Links {
        let args = args.unwrap_or_else(|| PaginationArgs::new(1, self.default_size));
        let mut navigation = NavigationLinks::default();

        if total_count > 0 {
            let num_pages = total_count.div_ceil(args.size);
            navigation.first = Some(Self::page_link(ctx, 1, args.size));
            navigation.last = Some(Self::page_link(ctx, num_pages, args.size));
            if args.page > 1 {
                navigation.prev = Some(Self::page_link(ctx, args.page - 1, args.size));
            }
            if args.page < num_pages {
                navigation.next = Some(Self::page_link(ctx, args.page + 1, args.size));
            }
        }

        Links {
            self_link: ctx.url().to_string(),
            navigation: Some(navigation),
        }
    }

    fn extra_meta(&self, args: Option<PaginationArgs>) -> Option<Value> {
        args.map(|args| json!({"page": args.page, "size": args.size}))
    }
}
