//! Filesystem existence probes
//!
//! The static-output tree is owned by an external generator and may change
//! between requests, so nothing here caches.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};

/// Sentinel marking a retired resource
pub const TOMBSTONE_FILE: &str = "gone";
/// Pre-rendered companion document
pub const INDEX_FILE: &str = "index.html";

/// Existence check capability injected into filters
#[async_trait]
pub trait FsProbe: Send + Sync {
    /// Whether `path` exists; any error counts as absent
    async fn exists(&self, path: &Path) -> bool;
}

/// Probe backed by the real filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct DiskProbe;

#[async_trait]
impl FsProbe for DiskProbe {
    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }
}

/// Join `root`, a request path and a sentinel file name
///
/// Returns `None` for paths with `..` segments; callers treat that as absent.
pub fn sentinel_path(root: &Path, request_path: &str, file: &str) -> Option<PathBuf> {
    let relative = Path::new(request_path.trim_start_matches('/'));
    if relative
        .components()
        .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
    {
        return None;
    }
    Some(root.join(relative).join(file))
}

/// Probe `root + request_path + file`
pub async fn sentinel_exists(
    probe: &dyn FsProbe,
    root: &Path,
    request_path: &str,
    file: &str,
) -> bool {
    match sentinel_path(root, request_path, file) {
        Some(path) => probe.exists(&path).await,
        None => false,
    }
}

/// In-memory probe for tests
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryProbe {
    files: std::collections::HashSet<PathBuf>,
}

#[cfg(test)]
impl MemoryProbe {
    pub fn with_files<I, P>(files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            files: files.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl FsProbe for MemoryProbe {
    async fn exists(&self, path: &Path) -> bool {
        self.files.contains(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_path_joins_like_a_relative_path() {
        let root = Path::new("out/");
        assert_eq!(
            sentinel_path(root, "/foo/", TOMBSTONE_FILE),
            Some(PathBuf::from("out/foo/gone"))
        );
        assert_eq!(
            sentinel_path(root, "/", INDEX_FILE),
            Some(PathBuf::from("out/index.html"))
        );
        assert_eq!(
            sentinel_path(root, "//a//b", INDEX_FILE),
            Some(PathBuf::from("out/a/b/index.html"))
        );
    }

    #[test]
    fn test_sentinel_path_rejects_parent_segments() {
        assert_eq!(sentinel_path(Path::new("out"), "/../etc", INDEX_FILE), None);
        assert_eq!(sentinel_path(Path::new("out"), "/a/../../b", TOMBSTONE_FILE), None);
    }

    #[tokio::test]
    async fn test_disk_probe() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("foo")).unwrap();
        std::fs::write(dir.path().join("foo/gone"), b"").unwrap();

        let probe = DiskProbe;
        assert!(sentinel_exists(&probe, dir.path(), "/foo", TOMBSTONE_FILE).await);
        assert!(!sentinel_exists(&probe, dir.path(), "/bar", TOMBSTONE_FILE).await);
        assert!(!sentinel_exists(&probe, dir.path(), "/foo/../foo", TOMBSTONE_FILE).await);
    }

    #[tokio::test]
    async fn test_disk_probe_sees_changes_between_calls() {
        let dir = tempfile::tempdir().unwrap();
        let probe = DiskProbe;
        assert!(!sentinel_exists(&probe, dir.path(), "/", INDEX_FILE).await);
        std::fs::write(dir.path().join(INDEX_FILE), b"<p>hi</p>").unwrap();
        assert!(sentinel_exists(&probe, dir.path(), "/", INDEX_FILE).await);
    }
}
