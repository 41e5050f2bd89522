//! Immutable caching for versioned assets

use async_trait::async_trait;

use super::{Decision, FilterRequest, HeaderAnnotations, RequestFilter};

/// Query-string marker of a versioned asset URL
pub const VERSION_MARKER: &str = "vsn=";
/// One year, no revalidation
pub const IMMUTABLE_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

/// Tags `?vsn=` requests with long-lived immutable caching; never terminates
#[derive(Debug, Default, Clone, Copy)]
pub struct AssetCacheFilter;

impl AssetCacheFilter {
    /// Raw substring match anywhere in the query, not a parameter parse
    pub fn is_versioned(query: &str) -> bool {
        query.contains(VERSION_MARKER)
    }
}

#[async_trait]
impl RequestFilter for AssetCacheFilter {
    fn name(&self) -> &'static str {
        "asset_cache"
    }

    async fn filter(&self, req: &FilterRequest) -> Decision {
        if Self::is_versioned(&req.query) {
            Decision::Pass(HeaderAnnotations::with(
                "cache-control",
                IMMUTABLE_CACHE_CONTROL,
            ))
        } else {
            Decision::pass()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::request::test_support::*;

    #[tokio::test]
    async fn test_versioned_query_gets_immutable_caching() {
        let decision = AssetCacheFilter
            .filter(&with_query(request("/app.js"), "vsn=abc123"))
            .await;
        assert_eq!(decision.status(), None);
        assert_eq!(decision.header("cache-control"), Some(IMMUTABLE_CACHE_CONTROL));
    }

    #[tokio::test]
    async fn test_marker_matches_anywhere_in_query() {
        for query in ["a=1&vsn=2", "q=xvsn=1", "ref=vsn=", "vsn="] {
            let decision = AssetCacheFilter
                .filter(&with_query(request("/app.css"), query))
                .await;
            assert_eq!(
                decision.header("cache-control"),
                Some(IMMUTABLE_CACHE_CONTROL),
                "query {query:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_unversioned_query_passes_bare() {
        for query in ["", "v=1", "vsn", "VSN=1", "version=2"] {
            let decision = AssetCacheFilter
                .filter(&with_query(request("/app.css"), query))
                .await;
            assert_eq!(decision, Decision::pass(), "query {query:?}");
        }
    }

    #[tokio::test]
    async fn test_path_is_ignored() {
        let decision = AssetCacheFilter.filter(&request("/vsn=1/app.js")).await;
        assert_eq!(decision, Decision::pass());
    }
}
