//! Static file serving module
//!
//! Serves files from a mount directory once every filter in the mount's
//! chain has passed.

use crate::http::{self, cache, mime};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Request details the file server needs
pub struct FileRequest<'a> {
    /// Path relative to the mount directory
    pub path: &'a str,
    pub is_head: bool,
    pub if_none_match: Option<&'a str>,
}

/// Serve `req.path` from `dir`, falling back to index files for directories
pub async fn serve_directory(
    req: &FileRequest<'_>,
    dir: &Path,
    index_files: &[String],
) -> Response<Full<Bytes>> {
    let Some(file_path) = resolve_file(dir, req.path, index_files).await else {
        return http::build_404_response();
    };

    let content = match fs::read(&file_path).await {
        Ok(c) => c,
        Err(e) => {
            logger::log_error(&format!(
                "Failed to read file '{}': {e}",
                file_path.display()
            ));
            return http::build_404_response();
        }
    };

    let etag = cache::generate_etag(&content);
    if cache::check_etag_match(req.if_none_match, &etag) {
        return http::build_304_response(&etag);
    }

    let content_type = mime::get_content_type(file_path.extension().and_then(|e| e.to_str()));
    http::build_file_response(Bytes::from(content), content_type, &etag, req.is_head)
}

/// Map a request path to an existing file inside `dir`
async fn resolve_file(dir: &Path, path: &str, index_files: &[String]) -> Option<PathBuf> {
    let relative = path.trim_start_matches('/');
    let mut file_path = dir.join(relative);

    if fs::metadata(&file_path).await.ok()?.is_dir() {
        let mut found = None;
        for index_file in index_files {
            let candidate = file_path.join(index_file);
            if fs::metadata(&candidate).await.is_ok_and(|m| m.is_file()) {
                found = Some(candidate);
                break;
            }
        }
        file_path = found?;
    }

    // Security: ensure file_path is within dir
    let dir_canonical = match fs::canonicalize(dir).await {
        Ok(p) => p,
        Err(e) => {
            logger::log_warning(&format!(
                "Static directory not found or inaccessible '{}': {e}",
                dir.display()
            ));
            return None;
        }
    };
    let file_canonical = fs::canonicalize(&file_path).await.ok()?;
    if !file_canonical.starts_with(&dir_canonical) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {path} -> {}",
            file_canonical.display()
        ));
        return None;
    }

    Some(file_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    fn index_files() -> Vec<String> {
        vec!["index.html".to_string(), "index.htm".to_string()]
    }

    fn get(path: &str) -> FileRequest<'_> {
        FileRequest {
            path,
            is_head: false,
            if_none_match: None,
        }
    }

    async fn body_of(resp: Response<Full<Bytes>>) -> Bytes {
        resp.into_body().collect().await.unwrap().to_bytes()
    }

    #[tokio::test]
    async fn test_serves_file_with_type_and_etag() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("app.css"), "body{}").unwrap();

        let resp = serve_directory(&get("/app.css"), dir.path(), &index_files()).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["content-type"], "text/css; charset=utf-8");
        assert!(resp.headers().contains_key("etag"));
        assert_eq!(body_of(resp).await, "body{}");
    }

    #[tokio::test]
    async fn test_directory_resolves_index_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("bar")).unwrap();
        std::fs::write(dir.path().join("bar/index.htm"), "<p>bar</p>").unwrap();

        let resp = serve_directory(&get("/bar"), dir.path(), &index_files()).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(body_of(resp).await, "<p>bar</p>");
    }

    #[tokio::test]
    async fn test_directory_without_index_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("empty")).unwrap();
        let resp = serve_directory(&get("/empty"), dir.path(), &index_files()).await;
        assert_eq!(resp.status(), 404);
    }

    #[tokio::test]
    async fn test_missing_and_traversal_are_not_found() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("public")).unwrap();
        std::fs::write(root.path().join("secret.txt"), "s").unwrap();
        let public = root.path().join("public");

        let resp = serve_directory(&get("/nope.txt"), &public, &index_files()).await;
        assert_eq!(resp.status(), 404);
        let resp = serve_directory(&get("/../secret.txt"), &public, &index_files()).await;
        assert_eq!(resp.status(), 404);
    }

    #[tokio::test]
    async fn test_conditional_and_head_requests() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "hello").unwrap();
        let etag = cache::generate_etag(b"hello");

        let req = FileRequest {
            path: "/a.txt",
            is_head: false,
            if_none_match: Some(&etag),
        };
        let resp = serve_directory(&req, dir.path(), &index_files()).await;
        assert_eq!(resp.status(), 304);

        let req = FileRequest {
            path: "/a.txt",
            is_head: true,
            if_none_match: None,
        };
        let resp = serve_directory(&req, dir.path(), &index_files()).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["content-length"], "5");
        assert!(body_of(resp).await.is_empty());
    }
}
