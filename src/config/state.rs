// Application state module
// Holds the loaded configuration and the compiled mount table

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::sync::Notify;

use super::types::Config;
use crate::filters::{self, DiskProbe, FilterChain, FilterSettings, FsProbe};

/// A compiled mount point
#[derive(Debug)]
pub struct Mount {
    /// Path prefix without trailing slash ("" for the root mount)
    pub prefix: String,
    pub chain: FilterChain,
    pub dir: PathBuf,
    pub reproxy: bool,
}

impl Mount {
    /// Path relative to this mount, or `None` if the mount does not cover `path`
    pub fn path_info<'p>(&self, path: &'p str) -> Option<&'p str> {
        let rest = path.strip_prefix(self.prefix.as_str())?;
        if rest.is_empty() {
            Some("/")
        } else if rest.starts_with('/') {
            Some(rest)
        } else {
            None
        }
    }
}

/// Application state
pub struct AppState {
    pub config: Config,
    /// Mounts ordered longest prefix first
    pub mounts: Vec<Mount>,
    pub shutdown_signal: Arc<Notify>,

    // Cached config values for fast access without locks
    pub cached_access_log: Arc<AtomicBool>,
}

impl AppState {
    /// Build state with filters probing the real filesystem
    pub fn new(config: &Config) -> Self {
        Self::with_probe(config, Arc::new(DiskProbe))
    }

    /// Build state with an injected probe
    pub fn with_probe(config: &Config, probe: Arc<dyn FsProbe>) -> Self {
        let settings = FilterSettings {
            static_out_dir: PathBuf::from(&config.gate.static_out_dir),
            reproxy_prefix: config.gate.reproxy_prefix.clone(),
        };

        let mut mounts: Vec<Mount> = config
            .effective_mounts()
            .into_iter()
            .map(|m| Mount {
                prefix: m.path.trim_end_matches('/').to_string(),
                chain: filters::build_chain(&m.filters, &settings, &probe),
                dir: m
                    .dir
                    .map_or_else(|| settings.static_out_dir.clone(), PathBuf::from),
                reproxy: m.reproxy,
            })
            .collect();
        mounts.sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()));

        Self {
            config: config.clone(),
            mounts,
            shutdown_signal: Arc::new(Notify::new()),
            cached_access_log: Arc::new(AtomicBool::new(config.logging.access_log)),
        }
    }

    /// Longest mount covering `path`, with the mount-relative remainder
    pub fn resolve_mount<'p>(&self, path: &'p str) -> Option<(&Mount, &'p str)> {
        self.mounts
            .iter()
            .find_map(|m| m.path_info(path).map(|info| (m, info)))
    }
}
