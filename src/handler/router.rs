//! Request dispatch module
//!
//! Entry point for HTTP request processing. Resolves the mount, runs its
//! filter chain, follows internal reproxy rewrites while the delegation
//! budget lasts, and falls through to the static file server when every
//! filter passes.

use crate::config::AppState;
use crate::filters::{FilterRequest, HeaderAnnotations, REPROXY_HEADER};
use crate::handler::static_files::{self, FileRequest};
use crate::http;
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::{Body as _, Bytes};
use hyper::header::{HeaderName, HOST, IF_NONE_MATCH, REFERER, USER_AGENT};
use hyper::http::request::Parts;
use hyper::{HeaderMap, Method, Request, Response, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

/// Client request facts that survive internal re-dispatch
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    /// URL-decoded path
    pub path: String,
    pub query: String,
    pub headers: HeaderMap,
    pub scheme: String,
    pub server_name: String,
    pub is_head: bool,
}

/// Result of dispatching one client request
pub struct Dispatched {
    pub response: Response<Full<Bytes>>,
    /// Number of internal reproxy hops taken
    pub delegations: u32,
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    remote_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    // Request bodies are never read
    let (parts, _body) = req.into_parts();

    let (response, delegations) = match preflight(&parts, &state) {
        Some(resp) => (resp, 0),
        None => match build_dispatch_request(&parts, &state) {
            Some(dreq) => {
                let dispatched = dispatch(&state, dreq).await;
                (dispatched.response, dispatched.delegations)
            }
            None => {
                logger::log_warning(&format!(
                    "Undecodable request path: {}",
                    parts.uri.path()
                ));
                (http::build_400_response(), 0)
            }
        },
    };

    if state.cached_access_log.load(Ordering::Relaxed) {
        log_access(&parts, &response, remote_addr, started, delegations, &state);
    }

    Ok(response)
}

/// Method and body-size checks that precede any filter
fn preflight(req: &Parts, state: &AppState) -> Option<Response<Full<Bytes>>> {
    match req.method {
        Method::GET | Method::HEAD => {}
        Method::OPTIONS => return Some(http::build_options_response()),
        _ => {
            logger::log_warning(&format!("Method not allowed: {}", req.method));
            return Some(http::build_405_response());
        }
    }

    let max_body_size = state.config.http.max_body_size;
    let size = req
        .headers
        .get("content-length")?
        .to_str()
        .ok()?
        .parse::<u64>()
        .ok()?;
    if size > max_body_size {
        logger::log_error(&format!(
            "Request body too large: {size} bytes (max: {max_body_size})"
        ));
        return Some(http::build_413_response());
    }
    None
}

/// Capture the request descriptor; `None` if the path does not decode
fn build_dispatch_request(req: &Parts, state: &AppState) -> Option<DispatchRequest> {
    let uri = &req.uri;
    let path = urlencoding::decode(uri.path()).ok()?.into_owned();

    let server_name = req
        .headers
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| uri.host())
        .map_or_else(
            || state.config.http.server_name.clone(),
            |host| strip_port(host).to_string(),
        );

    Some(DispatchRequest {
        path,
        query: uri.query().unwrap_or_default().to_string(),
        headers: req.headers.clone(),
        scheme: uri
            .scheme_str()
            .unwrap_or(&state.config.gate.default_scheme)
            .to_string(),
        server_name,
        is_head: req.method == Method::HEAD,
    })
}

/// Host name without a trailing `:port` (IPv6 literals keep their brackets)
fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        return host.find(']').map_or(host, |end| &host[..=end]);
    }
    host.split(':').next().unwrap_or(host)
}

/// Split an internal rewrite target into decoded path and raw query
///
/// `None` if the path part does not percent-decode to UTF-8.
fn split_target(target: &str) -> Option<(String, String)> {
    let (path, query) = target.split_once('?').unwrap_or((target, ""));
    let path = urlencoding::decode(path).ok()?.into_owned();
    Some((path, query.to_string()))
}

/// Run the filter chains for `req`, following reproxy rewrites
pub async fn dispatch(state: &AppState, mut req: DispatchRequest) -> Dispatched {
    let max_delegations = state.config.gate.max_delegations;
    let mut remaining = max_delegations;

    loop {
        let delegations = max_delegations - remaining;
        let done = |response| Dispatched {
            response,
            delegations,
        };

        let Some((mount, path_info)) = state.resolve_mount(&req.path) else {
            return done(http::build_404_response());
        };
        let path_info = path_info.to_string();

        let filter_req = FilterRequest {
            script_name: mount.prefix.clone(),
            path: path_info.clone(),
            query: req.query.clone(),
            headers: req.headers.clone(),
            scheme: req.scheme.clone(),
            server_name: req.server_name.clone(),
            remaining_delegations: remaining,
        };
        let outcome = mount.chain.run(&filter_req).await;

        let Some(mut terminal) = outcome.terminal else {
            let file_req = FileRequest {
                path: &path_info,
                is_head: req.is_head,
                if_none_match: req.headers.get(IF_NONE_MATCH).and_then(|v| v.to_str().ok()),
            };
            let mut response =
                static_files::serve_directory(&file_req, &mount.dir, &state.config.http.index_files)
                    .await;
            http::apply_annotations(&mut response, &outcome.annotations);
            return done(response);
        };

        if mount.reproxy {
            if let Some(target) = terminal.header_value(REPROXY_HEADER) {
                if remaining == 0 {
                    logger::log_error(&format!(
                        "Reproxy of {} to {target} refused: delegation budget exhausted",
                        req.path
                    ));
                    return done(http::build_delegation_exhausted_response());
                }
                let Some((path, query)) = split_target(target) else {
                    logger::log_error(&format!("Undecodable reproxy target: {target}"));
                    return done(http::build_400_response());
                };
                remaining -= 1;
                logger::log_reproxy(&req.path, &path, remaining);
                req.path = path;
                req.query = query;
                continue;
            }
        }

        // The terminating filter's own headers win over earlier annotations
        let mut headers: HeaderAnnotations = outcome.annotations;
        headers.extend(std::mem::take(&mut terminal.headers));
        terminal.headers = headers;
        return done(http::build_terminal_response(terminal, req.is_head));
    }
}

fn log_access(
    req: &Parts,
    response: &Response<Full<Bytes>>,
    remote_addr: SocketAddr,
    started: Instant,
    delegations: u32,
    state: &AppState,
) {
    let header = |name: HeaderName| {
        req.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    };

    let mut entry = AccessLogEntry::new(
        remote_addr.ip().to_string(),
        req.method.to_string(),
        req.uri.path().to_string(),
    );
    entry.query = req.uri.query().map(ToString::to_string);
    entry.http_version = match req.version {
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        _ => "1.1",
    }
    .to_string();
    entry.status = response.status().as_u16();
    entry.body_bytes = usize::try_from(response.body().size_hint().exact().unwrap_or(0))
        .unwrap_or(usize::MAX);
    entry.referer = header(REFERER);
    entry.user_agent = header(USER_AGENT);
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
    entry.delegations = delegations;

    logger::log_access(&entry, &state.config.logging.access_log_format);
}
