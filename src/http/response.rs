//! HTTP response building module
//!
//! Provides builders for the responses the gate produces on its own, plus
//! conversion of filter decisions into real responses.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderName, HeaderValue, ALLOW};
use hyper::Response;

use crate::filters::{HeaderAnnotations, TerminalResponse};
use crate::logger;

/// Build a plain-text error response
fn build_text_response(status: u16, body: &'static str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("Content-Type", "text/plain")
        .body(Full::new(Bytes::from_static(body.as_bytes())))
        .unwrap_or_else(|e| {
            log_build_error(status, &e);
            Response::new(Full::new(Bytes::from_static(body.as_bytes())))
        })
}

/// Build 304 Not Modified response
pub fn build_304_response(etag: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(304)
        .header("ETag", etag)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error(304, &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 400 Bad Request response
pub fn build_400_response() -> Response<Full<Bytes>> {
    build_text_response(400, "400 Bad Request")
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<Full<Bytes>> {
    build_text_response(404, "404 Not Found")
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> Response<Full<Bytes>> {
    let mut resp = build_text_response(405, "405 Method Not Allowed");
    resp.headers_mut()
        .insert(ALLOW, HeaderValue::from_static("GET, HEAD, OPTIONS"));
    resp
}

/// Build OPTIONS response
pub fn build_options_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(204)
        .header("Allow", "GET, HEAD, OPTIONS")
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error(204, &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 413 Payload Too Large response
pub fn build_413_response() -> Response<Full<Bytes>> {
    build_text_response(413, "413 Payload Too Large")
}

/// Build 502 response for exhausted internal delegations
pub fn build_delegation_exhausted_response() -> Response<Full<Bytes>> {
    build_text_response(502, "too many internal delegations")
}

/// Build success response for a served file
pub fn build_file_response(
    data: Bytes,
    content_type: &str,
    etag: &str,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let content_length = data.len();
    let body = if is_head { Bytes::new() } else { data };

    Response::builder()
        .status(200)
        .header("Content-Type", content_type)
        .header("Content-Length", content_length)
        .header("ETag", etag)
        .header("Cache-Control", "public, max-age=3600")
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error(200, &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Turn a filter's terminal decision into a response
pub fn build_terminal_response(terminal: TerminalResponse, is_head: bool) -> Response<Full<Bytes>> {
    let body = if is_head { Bytes::new() } else { terminal.body };
    let mut resp = Response::new(Full::new(body));
    *resp.status_mut() = terminal.status;
    apply_annotations(&mut resp, &terminal.headers);
    resp
}

/// Merge header annotations into a response, replacing same-named headers
///
/// Values that cannot be encoded as a header are logged and skipped.
pub fn apply_annotations(resp: &mut Response<Full<Bytes>>, annotations: &HeaderAnnotations) {
    for (name, value) in annotations.iter() {
        match HeaderValue::from_bytes(value.as_bytes()) {
            Ok(v) => {
                resp.headers_mut().insert(HeaderName::from_static(name), v);
            }
            Err(_) => {
                logger::log_warning(&format!("Dropping unencodable {name} header: {value:?}"));
            }
        }
    }
}

/// Log response build error
fn log_build_error(status: u16, error: &hyper::http::Error) {
    logger::log_error(&format!("Failed to build {status} response: {error}"));
}
