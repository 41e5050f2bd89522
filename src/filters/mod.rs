//! Request decision filters
//!
//! Each filter inspects one request and either passes (optionally carrying
//! header annotations for the eventual response) or terminates it. Filters
//! are stateless and shared across connections; the only I/O they perform is
//! existence probing of the static-output tree.

pub mod asset_cache;
pub mod chain;
pub mod decision;
pub mod probe;
pub mod request;
pub mod root_index;
pub mod self_link;

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

pub use chain::FilterChain;
pub use decision::{Decision, HeaderAnnotations, TerminalResponse};
pub use probe::{DiskProbe, FsProbe};
pub use request::FilterRequest;
pub use root_index::REPROXY_HEADER;

use crate::config::FilterKind;

/// A single request-time decision handler
#[async_trait]
pub trait RequestFilter: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &'static str;

    /// Decide what to do with `req`
    async fn filter(&self, req: &FilterRequest) -> Decision;
}

/// Settings shared by filters that probe the static-output tree
#[derive(Debug, Clone)]
pub struct FilterSettings {
    pub static_out_dir: PathBuf,
    pub reproxy_prefix: String,
}

/// Instantiate a configured filter
pub fn build_filter(
    kind: FilterKind,
    settings: &FilterSettings,
    probe: &Arc<dyn FsProbe>,
) -> Arc<dyn RequestFilter> {
    match kind {
        FilterKind::AssetCache => Arc::new(asset_cache::AssetCacheFilter),
        FilterKind::SelfLink => Arc::new(self_link::SelfLinkFilter),
        FilterKind::TombstoneLink => Arc::new(self_link::TombstoneLinkFilter::new(
            settings.static_out_dir.clone(),
            Arc::clone(probe),
        )),
        FilterKind::RootIndex => Arc::new(root_index::RootIndexFilter::new(
            settings.static_out_dir.clone(),
            settings.reproxy_prefix.clone(),
            Arc::clone(probe),
        )),
    }
}

/// Build a chain from an ordered list of filter kinds
pub fn build_chain(
    kinds: &[FilterKind],
    settings: &FilterSettings,
    probe: &Arc<dyn FsProbe>,
) -> FilterChain {
    FilterChain::new(
        kinds
            .iter()
            .map(|kind| build_filter(*kind, settings, probe))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_chain_preserves_order() {
        let settings = FilterSettings {
            static_out_dir: PathBuf::from("out/"),
            reproxy_prefix: "/__out__".to_string(),
        };
        let probe: Arc<dyn FsProbe> = Arc::new(DiskProbe);
        let chain = build_chain(
            &[
                FilterKind::AssetCache,
                FilterKind::RootIndex,
                FilterKind::TombstoneLink,
                FilterKind::SelfLink,
            ],
            &settings,
            &probe,
        );
        assert_eq!(
            chain.names(),
            ["asset_cache", "root_index", "tombstone_link", "self_link"]
        );
    }
}
