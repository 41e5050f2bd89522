//! HTTP cache validation module
//!
//! Provides `ETag` generation and conditional request handling for files
//! the gate serves after every filter has passed.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Generate a quoted `ETag` from file content
pub fn generate_etag(content: &[u8]) -> String {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    format!("\"{:x}\"", hasher.finish())
}

/// Whether the client's `If-None-Match` covers `etag` (list or `*`)
pub fn check_etag_match(if_none_match: Option<&str>, etag: &str) -> bool {
    if_none_match.is_some_and(|client_etag| {
        client_etag
            .split(',')
            .map(|e| e.trim().trim_start_matches("W/"))
            .any(|e| e == etag || e == "*")
    })
}
