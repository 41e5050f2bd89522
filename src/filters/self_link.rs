//! Canonical self-link filters
//!
//! Both filters refuse requests at the guarded delegation depth and
//! annotate everything else with a `link: <...>; rel="self"` header. The
//! tombstone variant additionally answers `410 Gone` for retired pages.

use async_trait::async_trait;
use hyper::StatusCode;
use std::path::PathBuf;
use std::sync::Arc;

use super::probe::{sentinel_exists, FsProbe, TOMBSTONE_FILE};
use super::{Decision, FilterRequest, HeaderAnnotations, RequestFilter, TerminalResponse};

/// Delegation depth at which link filters refuse the request (equality only)
pub const LOOP_GUARD_DEPTH: u32 = 5;
pub const DENIED_BODY: &str = "Where do you think you're going??";
pub const GONE_BODY: &str = "Gone";

fn loop_guard(req: &FilterRequest) -> Option<Decision> {
    (req.remaining_delegations == LOOP_GUARD_DEPTH).then(|| {
        Decision::Terminate(TerminalResponse::new(StatusCode::UNAUTHORIZED).body(DENIED_BODY))
    })
}

fn annotate_self_link(req: &FilterRequest) -> Decision {
    Decision::Pass(HeaderAnnotations::with("link", req.self_link()))
}

/// Self-link annotation without tombstone checks
#[derive(Debug, Default, Clone, Copy)]
pub struct SelfLinkFilter;

#[async_trait]
impl RequestFilter for SelfLinkFilter {
    fn name(&self) -> &'static str {
        "self_link"
    }

    async fn filter(&self, req: &FilterRequest) -> Decision {
        loop_guard(req).unwrap_or_else(|| annotate_self_link(req))
    }
}

/// Self-link annotation plus `gone` sentinel detection
pub struct TombstoneLinkFilter {
    root: PathBuf,
    probe: Arc<dyn FsProbe>,
}

impl TombstoneLinkFilter {
    pub fn new(root: impl Into<PathBuf>, probe: Arc<dyn FsProbe>) -> Self {
        Self {
            root: root.into(),
            probe,
        }
    }
}

#[async_trait]
impl RequestFilter for TombstoneLinkFilter {
    fn name(&self) -> &'static str {
        "tombstone_link"
    }

    async fn filter(&self, req: &FilterRequest) -> Decision {
        if let Some(denied) = loop_guard(req) {
            return denied;
        }

        if sentinel_exists(self.probe.as_ref(), &self.root, &req.path, TOMBSTONE_FILE).await {
            return Decision::Terminate(
                TerminalResponse::new(StatusCode::GONE)
                    .header("link", req.self_link())
                    .body(GONE_BODY),
            );
        }

        annotate_self_link(req)
    }
}
