// Configuration module entry point
// Loads layered configuration and builds the runtime state

mod state;
mod types;

use std::collections::HashSet;
use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::{Config, FilterKind, MountConfig};

/// Environment override for the static-output root
pub const STATIC_OUT_DIR_ENV: &str = "SR2_STATIC_GEN_OUT_DIR";

type Builder = config::ConfigBuilder<config::builder::DefaultState>;

/// Built-in defaults, lowest precedence
fn with_defaults(builder: Builder) -> Result<Builder, config::ConfigError> {
    builder
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 8080)?
        .set_default("logging.level", "info")?
        .set_default("logging.access_log", true)?
        .set_default("performance.keep_alive_timeout", 75)?
        .set_default("performance.read_timeout", 30)?
        .set_default("performance.write_timeout", 30)?
        .set_default("performance.backlog", 1024)?
        .set_default("http.server_name", "localhost")?
        .set_default("http.max_body_size", 1_048_576)? // 1MB
        .set_default("http.index_files", vec!["index.html", "index.htm"])?
        .set_default("gate.static_out_dir", "out/")?
        .set_default("gate.reproxy_prefix", "/__out__")?
        .set_default("gate.max_delegations", 5)?
        .set_default("gate.default_scheme", "http")
}

impl Config {
    /// Load configuration from specified file path (without extension)
    ///
    /// Precedence, highest first: `SR2_STATIC_GEN_OUT_DIR`, `SERVER_*`
    /// environment variables, the config file, built-in defaults.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = with_defaults(config::Config::builder())?
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("SERVER")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_override_option("gate.static_out_dir", std::env::var(STATIC_OUT_DIR_ENV).ok())?
            .build()?;

        let cfg: Self = settings.try_deserialize()?;
        cfg.validate().map_err(config::ConfigError::Message)?;
        Ok(cfg)
    }

    /// Configuration from built-in defaults only
    #[cfg(test)]
    pub fn defaults() -> Self {
        with_defaults(config::Config::builder())
            .and_then(|builder| builder.build())
            .and_then(|settings| settings.try_deserialize())
            .expect("built-in defaults must deserialize")
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    /// Configured mounts, or the built-in layout when none are given
    ///
    /// The built-in layout serves `public/` at `/` behind the asset and
    /// root-index filters, and the static-output tree at the reproxy prefix
    /// behind the tombstone filter.
    pub fn effective_mounts(&self) -> Vec<MountConfig> {
        if !self.mounts.is_empty() {
            return self.mounts.clone();
        }
        vec![
            MountConfig {
                path: self.gate.reproxy_prefix.clone(),
                filters: vec![FilterKind::TombstoneLink],
                dir: None,
                reproxy: false,
            },
            MountConfig {
                path: "/".to_string(),
                filters: vec![FilterKind::AssetCache, FilterKind::RootIndex],
                dir: Some("public/".to_string()),
                reproxy: true,
            },
        ]
    }

    /// Reject configurations the dispatcher cannot serve
    pub fn validate(&self) -> Result<(), String> {
        if !self.gate.reproxy_prefix.starts_with('/') {
            return Err(format!(
                "gate.reproxy_prefix must start with '/': '{}'",
                self.gate.reproxy_prefix
            ));
        }

        let mut seen = HashSet::new();
        for mount in &self.mounts {
            if !mount.path.starts_with('/') {
                return Err(format!("mount path must start with '/': '{}'", mount.path));
            }
            if mount.filters.is_empty() && mount.dir.is_none() {
                return Err(format!(
                    "mount '{}' has neither filters nor a directory",
                    mount.path
                ));
            }
            let key = mount.path.trim_end_matches('/');
            if !seen.insert(key) {
                return Err(format!("duplicate mount path: '{}'", mount.path));
            }
        }

        Ok(())
    }
}
