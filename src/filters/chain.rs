//! Ordered filter chain

use std::fmt;
use std::sync::Arc;

use super::{Decision, FilterRequest, HeaderAnnotations, RequestFilter, TerminalResponse};
use crate::logger;

/// Result of running a whole chain
#[derive(Debug, Default)]
pub struct ChainOutcome {
    /// Annotations from every filter that passed before the outcome
    pub annotations: HeaderAnnotations,
    /// First terminal response, if any filter produced one
    pub terminal: Option<TerminalResponse>,
}

/// Filters run in order until one terminates
#[derive(Clone, Default)]
pub struct FilterChain {
    filters: Vec<Arc<dyn RequestFilter>>,
}

impl FilterChain {
    pub fn new(filters: Vec<Arc<dyn RequestFilter>>) -> Self {
        Self { filters }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    pub async fn run(&self, req: &FilterRequest) -> ChainOutcome {
        let mut outcome = ChainOutcome::default();

        for filter in &self.filters {
            let decision = filter.filter(req).await;
            logger::log_decision(filter.name(), &req.script_name, &req.path, &decision);

            match decision {
                Decision::Pass(annotations) => outcome.annotations.extend(annotations),
                Decision::Terminate(resp) => {
                    outcome.terminal = Some(resp);
                    break;
                }
            }
        }

        outcome
    }
}

impl fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::asset_cache::{AssetCacheFilter, IMMUTABLE_CACHE_CONTROL};
    use crate::filters::probe::MemoryProbe;
    use crate::filters::request::test_support::*;
    use crate::filters::root_index::RootIndexFilter;
    use crate::filters::self_link::SelfLinkFilter;

    fn chain(files: &[&str]) -> FilterChain {
        let probe = Arc::new(MemoryProbe::with_files(files.iter().copied()));
        FilterChain::new(vec![
            Arc::new(AssetCacheFilter),
            Arc::new(SelfLinkFilter),
            Arc::new(RootIndexFilter::new("out/", "/__out__", probe)),
        ])
    }

    #[tokio::test]
    async fn test_all_pass_collects_annotations_in_order() {
        let outcome = chain(&[]).run(&with_query(request("/app.js"), "vsn=1")).await;
        assert!(outcome.terminal.is_none());
        let names: Vec<&str> = outcome.annotations.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["cache-control", "link"]);
        assert_eq!(
            outcome.annotations.get("cache-control"),
            Some(IMMUTABLE_CACHE_CONTROL)
        );
    }

    #[tokio::test]
    async fn test_terminal_keeps_earlier_annotations() {
        let outcome = chain(&["out/bar/index.html"]).run(&request("/bar")).await;
        let terminal = outcome.terminal.unwrap();
        assert_eq!(terminal.status.as_u16(), 307);
        assert!(outcome.annotations.get("link").is_some());
    }

    #[tokio::test]
    async fn test_chain_stops_at_first_terminal() {
        // self_link refuses at the guard depth, so root_index never sees the request
        let req = with_delegations(request("/bar/"), 5);
        let outcome = chain(&[]).run(&req).await;
        assert_eq!(outcome.terminal.unwrap().status.as_u16(), 401);
        assert!(outcome.annotations.is_empty());
    }

    #[test]
    fn test_names() {
        assert_eq!(chain(&[]).names(), ["asset_cache", "self_link", "root_index"]);
        assert_eq!(
            format!("{:?}", chain(&[])),
            r#"["asset_cache", "self_link", "root_index"]"#
        );
    }
}
