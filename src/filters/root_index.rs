//! Trailing-slash canonicalization and pre-rendered index reproxying

use async_trait::async_trait;
use hyper::StatusCode;
use std::path::PathBuf;
use std::sync::Arc;

use super::probe::{sentinel_exists, FsProbe, INDEX_FILE};
use super::{Decision, FilterRequest, RequestFilter, TerminalResponse};

/// Cookie substring that disables index reproxying
pub const BYPASS_COOKIE: &str = "wheeeee=C";
/// Header instructing the host to re-dispatch internally
pub const REPROXY_HEADER: &str = "x-reproxy-url";

/// Strip trailing slashes from a non-root path
///
/// Returns `None` when the path is already canonical.
pub fn normalize_trailing_slash(path: &str) -> Option<&str> {
    if path == "/" || !path.ends_with('/') {
        return None;
    }
    match path.trim_end_matches('/') {
        "" => Some("/"),
        trimmed => Some(trimmed),
    }
}

/// Percent-encode each segment of a decoded path, keeping the slashes
///
/// The result is safe both as a header value and as a rewrite target that
/// is later split at `?`.
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Redirects `/dir/` to `/dir` and reproxies pages that have a
/// pre-rendered `index.html` to the static-output mount
pub struct RootIndexFilter {
    root: PathBuf,
    reproxy_prefix: String,
    probe: Arc<dyn FsProbe>,
}

impl RootIndexFilter {
    pub fn new(
        root: impl Into<PathBuf>,
        reproxy_prefix: impl Into<String>,
        probe: Arc<dyn FsProbe>,
    ) -> Self {
        Self {
            root: root.into(),
            reproxy_prefix: reproxy_prefix.into(),
            probe,
        }
    }

    fn has_bypass_cookie(req: &FilterRequest) -> bool {
        req.cookie()
            .is_some_and(|cookie| cookie.contains(BYPASS_COOKIE))
    }
}

#[async_trait]
impl RequestFilter for RootIndexFilter {
    fn name(&self) -> &'static str {
        "root_index"
    }

    async fn filter(&self, req: &FilterRequest) -> Decision {
        if let Some(normalized) = normalize_trailing_slash(&req.path) {
            let mut location = format!("{}{}", req.script_name, encode_path(normalized));
            if !req.query.is_empty() {
                location.push('?');
                location.push_str(&req.query);
            }
            return Decision::Terminate(
                TerminalResponse::new(StatusCode::MOVED_PERMANENTLY).header("location", location),
            );
        }

        if !Self::has_bypass_cookie(req)
            && sentinel_exists(self.probe.as_ref(), &self.root, &req.path, INDEX_FILE).await
        {
            let target = format!("{}{}", self.reproxy_prefix, encode_path(&req.path));
            return Decision::Terminate(
                TerminalResponse::new(StatusCode::TEMPORARY_REDIRECT).header(REPROXY_HEADER, target),
            );
        }

        Decision::pass()
    }
}
