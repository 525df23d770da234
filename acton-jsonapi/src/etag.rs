//! ETag / concurrency guard
//!
//! `If-Match` values are lists of entity tags compared with the strong
//! comparison function: weak tags (`W/"..."`) never match, and the wildcard
//! `*` matches any current etag.

use crate::handlers::{ApiError, ApiResult};

/// The wildcard entity tag
pub const WILDCARD: &str = "*";

/// An entity tag parsed from an `If-Match` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityTag {
    /// `*`
    Any,
    /// `"abc"` or bare `abc`
    Strong(String),
    /// `W/"abc"`
    Weak(String),
}

/// Parse a comma separated `If-Match` header value
pub fn parse_if_match(value: &str) -> Vec<EntityTag> {
    value
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(|tag| {
            if tag == WILDCARD {
                EntityTag::Any
            } else if let Some(weak) = tag.strip_prefix("W/").or_else(|| tag.strip_prefix("w/")) {
                EntityTag::Weak(unquote(weak).to_string())
            } else {
                EntityTag::Strong(unquote(tag).to_string())
            }
        })
        .collect()
}

fn unquote(tag: &str) -> &str {
    tag.strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(tag)
}

/// Quote an etag for use in a response `ETag` header
pub fn quote(etag: &str) -> String {
    format!("\"{}\"", etag)
}

/// Whether `if_match` is satisfied by `current_etag`
pub fn etag_matches(if_match: &str, current_etag: &str) -> bool {
    parse_if_match(if_match).iter().any(|tag| match tag {
        EntityTag::Any => true,
        EntityTag::Strong(tag) => tag == current_etag,
        EntityTag::Weak(_) => false,
    })
}

/// Precondition check for mutating requests
///
/// Fails with `PreconditionRequired` when no `If-Match` was sent and with
/// `PreconditionFailed` when it does not match `current_etag`.
pub fn verify_precondition(current_etag: &str, if_match: Option<&str>) -> ApiResult<()> {
    let if_match = if_match.ok_or_else(ApiError::precondition_required)?;
    if etag_matches(if_match, current_etag) {
        Ok(())
    } else {
        Err(ApiError::precondition_failed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::ApiErrorKind;

    #[test]
    fn test_parse_if_match_list() {
        assert_eq!(
            parse_if_match(r#""abc", W/"def", ghi, *"#),
            vec![
                EntityTag::Strong("abc".to_string()),
                EntityTag::Weak("def".to_string()),
                EntityTag::Strong("ghi".to_string()),
                EntityTag::Any,
            ]
        );
    }

    #[test]
    fn test_etag_matches() {
        assert!(etag_matches("\"v1\"", "v1"));
        assert!(etag_matches("v1", "v1"));
        assert!(etag_matches("\"v0\", \"v1\"", "v1"));
        assert!(etag_matches("*", "anything"));
        assert!(!etag_matches("\"v0\"", "v1"));
        assert!(!etag_matches("W/\"v1\"", "v1"));
        assert!(!etag_matches("", "v1"));
    }

    #[test]
    fn test_verify_precondition_missing() {
        let err = verify_precondition("v1", None).unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::PreconditionRequired);
    }

    #[test]
    fn test_verify_precondition_mismatch() {
        let err = verify_precondition("v1", Some("\"v0\"")).unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::PreconditionFailed);
    }

    #[test]
    fn test_verify_precondition_wildcard_and_match() {
        assert!(verify_precondition("v1", Some("*")).is_ok());
        assert!(verify_precondition("v1", Some("\"v1\"")).is_ok());
    }

    #[test]
    fn test_quote() {
        assert_eq!(quote("v1"), "\"v1\"");
    }
}
