// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
    pub gate: GateConfig,
    /// Mount points; empty means use the built-in layout
    #[serde(default)]
    pub mounts: Vec<MountConfig>,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Minimum level: error, warn, info or debug
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
    /// Listen backlog
    pub backlog: i32,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    /// Fallback server name when the request carries no Host
    pub server_name: String,
    pub max_body_size: u64,
    /// Directory index files, tried in order
    pub index_files: Vec<String>,
}

/// Filter and reproxy configuration
#[derive(Debug, Deserialize, Clone)]
pub struct GateConfig {
    /// Root of the generated static tree probed for `gone` and `index.html`
    pub static_out_dir: String,
    /// Internal prefix reproxied requests are sent to
    pub reproxy_prefix: String,
    /// Initial delegation counter of every client request
    pub max_delegations: u32,
    /// Scheme used in self-links when the request line has none
    pub default_scheme: String,
}

/// One mount point: a path prefix, its filter chain and the directory
/// served once every filter passes
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct MountConfig {
    pub path: String,
    #[serde(default)]
    pub filters: Vec<FilterKind>,
    /// Directory served after the chain; defaults to `gate.static_out_dir`
    #[serde(default)]
    pub dir: Option<String>,
    /// Honour `x-reproxy-url` from this mount's filters
    #[serde(default)]
    pub reproxy: bool,
}

/// Filters that can be placed in a mount's chain
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    AssetCache,
    TombstoneLink,
    SelfLink,
    RootIndex,
}

impl std::fmt::Display for FilterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AssetCache => write!(f, "asset_cache"),
            Self::TombstoneLink => write!(f, "tombstone_link"),
            Self::SelfLink => write!(f, "self_link"),
            Self::RootIndex => write!(f, "root_index"),
        }
    }
}
